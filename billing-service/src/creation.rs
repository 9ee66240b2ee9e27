//! Building and persisting a new invoice from attended appointments.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use config_engine::BillingPolicy;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::directory::{DoctorDirectory, DoctorQuery};
use crate::error::{BillingError, BillingResult};
use crate::invoices::collect_invoiced_ids;
use crate::lenient::decimal_to_json;
use crate::models::{
    CreatedInvoice, InvoiceLine, InvoiceStatus, NewInvoice, NOT_AVAILABLE, UNKNOWN_PATIENT,
};
use crate::normalize::{parse_appointment_payload, parse_billing_code, parse_patient, AppointmentPayload};
use crate::repository::{PageRequest, Repositories};

pub const CREATION_FAILURE: &str = "Error al crear la factura";

/// `{prefix}-{YYYY}{MM}-{last six digits of the epoch millis}`.
///
/// Display only: two invoices created in the same month can collide.
pub fn invoice_number(prefix: &str, now: DateTime<Utc>) -> String {
    format!(
        "{prefix}-{}-{:06}",
        now.format("%Y%m"),
        now.timestamp_millis().rem_euclid(1_000_000)
    )
}

fn validate_request(data: &Value, appointment_ids: &[i64], max: usize) -> BillingResult<()> {
    if !data.is_object() {
        return Err(BillingError::Validation(
            "Los datos de la factura son requeridos".to_string(),
        ));
    }
    if appointment_ids.is_empty() {
        return Err(BillingError::Validation(
            "Debe seleccionar al menos una cita".to_string(),
        ));
    }
    if appointment_ids.len() > max {
        return Err(BillingError::Validation(format!(
            "No se pueden facturar más de {max} citas en una sola factura"
        )));
    }

    let mut seen = HashSet::new();
    if let Some(repeated) = appointment_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(BillingError::Validation(format!(
            "La cita {repeated} está repetida"
        )));
    }
    Ok(())
}

pub struct InvoiceCreation {
    repositories: Repositories,
    policy: BillingPolicy,
}

impl InvoiceCreation {
    pub fn new(repositories: Repositories, policy: BillingPolicy) -> Self {
        Self {
            repositories,
            policy,
        }
    }

    /// Create one invoice covering `appointment_ids`.
    ///
    /// `data` supplies the caller's own fields (notes, payer, ...). Every
    /// appointment must exist, be ATENDIDO and be on no other invoice, or
    /// nothing is created.
    ///
    /// # Errors
    ///
    /// Validation errors come back as they are, before any request is made.
    /// Later failures are wrapped with [`CREATION_FAILURE`].
    pub async fn execute(&self, data: &Value, appointment_ids: &[i64]) -> BillingResult<CreatedInvoice> {
        validate_request(data, appointment_ids, self.policy.max_appointments_per_invoice)?;

        self.create(data, appointment_ids).await.map_err(|e| {
            error!(error = %e, ?appointment_ids, "Invoice creation failed");
            BillingError::operation(CREATION_FAILURE, e)
        })
    }

    async fn create(&self, data: &Value, appointment_ids: &[i64]) -> BillingResult<CreatedInvoice> {
        let mut appointments = Vec::with_capacity(appointment_ids.len());
        for &id in appointment_ids {
            appointments.push((id, self.attended_appointment(id).await?));
        }

        let invoiced =
            collect_invoiced_ids(self.repositories.invoices.as_ref(), self.policy.fetch_limit).await?;
        let already: Vec<i64> = appointment_ids
            .iter()
            .copied()
            .filter(|id| invoiced.contains(id))
            .collect();
        if !already.is_empty() {
            return Err(BillingError::AlreadyInvoiced { ids: already });
        }

        let directory = self.load_directory().await;
        let mut lines = Vec::with_capacity(appointments.len());
        for (id, payload) in &appointments {
            lines.push(self.invoice_line(*id, payload, &directory).await?);
        }
        let total: Decimal = lines.iter().map(|line| line.unit_value).sum();

        let now = Utc::now();
        let number = invoice_number(&self.policy.invoice_prefix, now);
        let computed = computed_fields(&number, now, &lines, total)?;

        let mut body = data.as_object().cloned().unwrap_or_default();
        body.extend(computed.clone());
        body.insert("referencia".to_string(), Value::String(Uuid::new_v4().to_string()));
        let encoded = serde_json::to_string(&body)?;
        body.insert("jsonData".to_string(), Value::String(encoded));

        let created = self
            .repositories
            .invoices
            .create_invoice(&NewInvoice { body })
            .await?;

        let mut record = match serde_json::to_value(&created)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        record.extend(computed);

        info!(
            invoice_id = ?created.id,
            number = %number,
            appointments = lines.len(),
            total = %total,
            "Invoice created"
        );

        Ok(CreatedInvoice {
            id: created.id,
            number,
            issued_at: now,
            lines,
            total,
            status: InvoiceStatus::Pendiente,
            record,
        })
    }

    async fn attended_appointment(&self, id: i64) -> BillingResult<AppointmentPayload> {
        let record = self
            .repositories
            .appointments
            .get_appointment(id)
            .await?
            .ok_or_else(|| BillingError::NotFound(format!("La cita {id} no existe")))?;

        let payload = parse_appointment_payload(&record).map_err(|e| {
            BillingError::Validation(format!("Los datos de la cita {id} no son válidos: {e}"))
        })?;

        if !payload.is_attended() {
            return Err(BillingError::NotAttended {
                appointment_id: id,
                status: payload
                    .status_raw
                    .clone()
                    .unwrap_or_else(|| "desconocido".to_string()),
            });
        }
        Ok(payload)
    }

    async fn load_directory(&self) -> DoctorDirectory {
        match self
            .repositories
            .employees
            .list_employees(&PageRequest::of_size(self.policy.fetch_limit))
            .await
        {
            Ok(page) => DoctorDirectory::from_employees(&page.content),
            Err(e) => {
                warn!(error = %e, "Employee listing failed; invoice lines use the appointment's doctor data");
                DoctorDirectory::default()
            }
        }
    }

    async fn invoice_line(
        &self,
        id: i64,
        payload: &AppointmentPayload,
        directory: &DoctorDirectory,
    ) -> BillingResult<InvoiceLine> {
        let patient = match payload.patient_id {
            Some(patient_id) => self.repositories.patients.get_patient(patient_id).await?,
            None => None,
        }
        .map(|record| parse_patient(&record));

        let code = match payload.procedure_code.as_deref() {
            Some(code) => self.repositories.billing_codes.get_billing_code(code).await?,
            None => None,
        }
        .map(|record| parse_billing_code(&record));

        let doctor = directory.resolve(DoctorQuery {
            id: payload.doctor_id,
            document: payload.doctor_document.as_deref(),
            name: payload.doctor_name.as_deref(),
        });

        let unit_value = match payload
            .unit_value
            .or_else(|| code.as_ref().and_then(|c| c.value))
        {
            Some(value) => value,
            None => match self.policy.fallback_unit_value {
                Some(fallback) => {
                    warn!(
                        appointment_id = id,
                        procedure_code = payload.procedure_code.as_deref().unwrap_or(NOT_AVAILABLE),
                        fallback,
                        "No unit value for appointment; using the configured fallback"
                    );
                    Decimal::from(fallback)
                }
                None => return Err(BillingError::MissingUnitValue { appointment_id: id }),
            },
        };
        debug!(appointment_id = id, %unit_value, "Invoice line priced");

        Ok(InvoiceLine {
            appointment_id: id,
            patient_id: payload.patient_id,
            patient_name: patient
                .as_ref()
                .and_then(|p| p.full_name.clone())
                .or_else(|| payload.patient_name.clone())
                .unwrap_or_else(|| UNKNOWN_PATIENT.to_string()),
            patient_document: patient
                .as_ref()
                .and_then(|p| p.document.clone())
                .or_else(|| payload.patient_document.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            doctor_name: doctor
                .and_then(|d| d.name.clone())
                .or_else(|| payload.doctor_name.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            doctor_document: doctor
                .and_then(|d| d.document.clone())
                .or_else(|| payload.doctor_document.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            scheduled_at: payload.scheduled_at.clone(),
            procedure_code: payload.procedure_code.clone(),
            procedure_name: code
                .as_ref()
                .and_then(|c| c.name.clone())
                .or_else(|| payload.procedure_name.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            unit_value,
        })
    }
}

/// Fields computed here; they override both the caller's data and the backend's echo
fn computed_fields(
    number: &str,
    now: DateTime<Utc>,
    lines: &[InvoiceLine],
    total: Decimal,
) -> BillingResult<Map<String, Value>> {
    let mut fields = Map::new();
    fields.insert("numeroFactura".to_string(), Value::String(number.to_string()));
    fields.insert(
        "fechaEmision".to_string(),
        Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    fields.insert("citas".to_string(), serde_json::to_value(lines)?);
    fields.insert("total".to_string(), decimal_to_json(total));
    fields.insert(
        "estado".to_string(),
        Value::String(InvoiceStatus::Pendiente.as_str().to_string()),
    );
    Ok(fields)
}
