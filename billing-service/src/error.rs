use error_common::{codes, IpsError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("La cita {appointment_id} no está en estado ATENDIDO (estado actual: {status})")]
    NotAttended { appointment_id: i64, status: String },

    #[error("Las citas {ids:?} ya se encuentran facturadas")]
    AlreadyInvoiced { ids: Vec<i64> },

    #[error("No se pudo determinar el valor de la cita {appointment_id}")]
    MissingUnitValue { appointment_id: i64 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend answered {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Batch-level failure carrying the message shown to the user
    #[error("{message}: {source}")]
    Operation {
        message: String,
        #[source]
        source: Box<BillingError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type BillingResult<T> = Result<T, BillingError>;

impl BillingError {
    /// Wrap a failure at a use case boundary with a user-facing message
    pub fn operation(message: impl Into<String>, source: BillingError) -> Self {
        Self::Operation {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through `Operation` wrappers
    pub fn root(&self) -> &BillingError {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => codes::validation::INVALID_INPUT,
            Self::NotFound(_) => codes::backend::NOT_FOUND,
            Self::NotAttended { .. } => codes::billing::APPOINTMENT_NOT_ATTENDED,
            Self::AlreadyInvoiced { .. } => codes::billing::APPOINTMENT_ALREADY_INVOICED,
            Self::MissingUnitValue { .. } => codes::billing::UNIT_VALUE_UNAVAILABLE,
            Self::Network(_) => codes::backend::UNREACHABLE,
            Self::Http { .. } => codes::backend::UNEXPECTED_STATUS,
            Self::Authentication(_) => codes::authentication::SESSION_EXPIRED,
            Self::Serialization(_) => codes::backend::MALFORMED_RESPONSE,
            Self::Operation { source, .. } => source.code(),
            Self::Config(_) => codes::system::CONFIGURATION,
        }
    }
}

impl From<BillingError> for IpsError {
    fn from(err: BillingError) -> Self {
        let message = err.to_string();
        let code = err.code();
        match err.root() {
            BillingError::Validation(_) => IpsError::ValidationError(message),
            BillingError::NotFound(_) => IpsError::NotFound(message),
            BillingError::NotAttended { .. }
            | BillingError::AlreadyInvoiced { .. }
            | BillingError::MissingUnitValue { .. } => IpsError::business(code, message),
            BillingError::Authentication(_) => IpsError::AuthError(message),
            BillingError::Network(_) | BillingError::Http { .. } | BillingError::Serialization(_) => {
                IpsError::backend(code, message)
            }
            BillingError::Config(_) => IpsError::ConfigError(message),
            BillingError::Operation { .. } => IpsError::InternalError(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_keeps_root_code() {
        let err = BillingError::operation(
            "Error al obtener las citas atendidas",
            BillingError::Http {
                status: 503,
                body: "unavailable".to_string(),
            },
        );

        assert_eq!(err.code(), codes::backend::UNEXPECTED_STATUS);
        assert!(err.to_string().starts_with("Error al obtener las citas atendidas"));
        assert!(matches!(IpsError::from(err), IpsError::BackendError { .. }));
    }

    #[test]
    fn test_not_attended_mentions_appointment() {
        let err = BillingError::NotAttended {
            appointment_id: 2,
            status: "PENDIENTE".to_string(),
        };
        assert!(err.to_string().contains("cita 2"));
        assert!(matches!(IpsError::from(err), IpsError::BusinessError { .. }));
    }

    #[test]
    fn test_cli_error_code_matches_root_code() {
        let wrapped = |err| BillingError::operation("Error al crear la factura", err);
        let errors = vec![
            wrapped(BillingError::NotAttended {
                appointment_id: 2,
                status: "PENDIENTE".to_string(),
            }),
            wrapped(BillingError::AlreadyInvoiced { ids: vec![7] }),
            wrapped(BillingError::MissingUnitValue { appointment_id: 3 }),
            wrapped(BillingError::Http {
                status: 502,
                body: String::new(),
            }),
            wrapped(BillingError::Serialization(
                serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
            )),
            BillingError::Validation("sin citas".to_string()),
            BillingError::NotFound("Cita 9".to_string()),
            BillingError::Authentication("sesión".to_string()),
            BillingError::Config("base_url".to_string()),
        ];

        for err in errors {
            let code = err.code();
            assert_eq!(IpsError::from(err).code(), code);
        }
        assert_eq!(
            IpsError::from(wrapped(BillingError::AlreadyInvoiced { ids: vec![7] })).code(),
            codes::billing::APPOINTMENT_ALREADY_INVOICED
        );
    }
}
