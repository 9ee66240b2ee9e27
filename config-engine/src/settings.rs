use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// REST backend connection
    pub api: ApiConfig,

    /// Billing business policy
    pub billing: BillingPolicy,

    /// Logging and redaction
    pub logging: LoggerConfig,
}

/// REST backend connection settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,

    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Bearer token to start the session with
    pub access_token: Option<String>,

    /// Refresh token paired with `access_token`
    pub refresh_token: Option<String>,

    pub login_path: String,

    pub refresh_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 30,
            access_token: None,
            refresh_token: None,
            login_path: "/auth/login".to_string(),
            refresh_path: "/auth/refresh".to_string(),
        }
    }
}

/// Business rules applied while reconciling appointments and invoices
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct BillingPolicy {
    /// Page size used for every collection fetch. Records beyond it are not seen.
    pub fetch_limit: usize,

    /// Hard cap on appointments aggregated into one invoice
    pub max_appointments_per_invoice: usize,

    /// Unit value (COP) used when neither the appointment nor its CUPS code
    /// carries one. `None` turns the fallback off and makes creation fail instead.
    pub fallback_unit_value: Option<u64>,

    /// Invoices returned by a listing when the caller gives no limit
    pub default_list_limit: usize,

    /// Invoices considered when computing a summary
    pub summary_limit: usize,

    /// Prefix of generated invoice numbers (`FM-202410-123456`)
    pub invoice_prefix: String,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            fetch_limit: 1000,
            max_appointments_per_invoice: 50,
            fallback_unit_value: Some(50_000),
            default_list_limit: 10,
            summary_limit: 1000,
            invoice_prefix: "FM".to_string(),
        }
    }
}
