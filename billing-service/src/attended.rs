//! Attended appointments that are not yet on any invoice.

use chrono::NaiveDate;
use config_engine::BillingPolicy;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::directory::{normalize_name, DoctorDirectory, DoctorQuery};
use crate::error::{BillingError, BillingResult};
use crate::invoices::collect_invoiced_ids;
use crate::models::{AppointmentRecord, BillableAppointment, AppointmentStatus, NOT_AVAILABLE, UNKNOWN_PATIENT};
use crate::normalize::{parse_appointment_payload, parse_billing_code, parse_patient, AppointmentPayload};
use crate::ordering::sort_newest_first;
use crate::repository::{PageRequest, Repositories};

pub const ATTENDED_FAILURE: &str = "Error al obtener las citas atendidas";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFilters {
    /// Inclusive
    pub start_date: Option<NaiveDate>,
    /// Inclusive
    pub end_date: Option<NaiveDate>,
    pub patient_document: Option<String>,
    pub doctor: Option<String>,
    /// Substring of the procedure name or CUPS code
    pub procedure: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl AppointmentFilters {
    fn page_request(&self, size: usize) -> PageRequest {
        PageRequest::of_size(size)
            .with_filter("fechaInicio", self.start_date)
            .with_filter("fechaFin", self.end_date)
            .with_filter("documentoPaciente", non_blank(self.patient_document.as_ref()))
            .with_filter("medico", non_blank(self.doctor.as_ref()))
            .with_filter("procedimiento", non_blank(self.procedure.as_ref()))
    }

    pub fn matches(&self, appointment: &BillableAppointment) -> bool {
        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(date) = appointment.scheduled.map(|d| d.date_naive()) else {
                return false;
            };
            if self.start_date.is_some_and(|start| date < start)
                || self.end_date.is_some_and(|end| date > end)
            {
                return false;
            }
        }

        if let Some(document) = non_blank(self.patient_document.as_ref()) {
            if !appointment.patient_document.contains(document) {
                return false;
            }
        }

        if let Some(doctor) = non_blank(self.doctor.as_ref()) {
            if !normalize_name(&appointment.doctor_name).contains(&normalize_name(doctor)) {
                return false;
            }
        }

        if let Some(procedure) = non_blank(self.procedure.as_ref()) {
            let wanted = normalize_name(procedure);
            let by_name = normalize_name(&appointment.procedure_name).contains(&wanted);
            let by_code = appointment
                .procedure_code
                .as_deref()
                .is_some_and(|code| normalize_name(code).contains(&wanted));
            if !by_name && !by_code {
                return false;
            }
        }

        true
    }
}

pub struct AttendedAppointments {
    repositories: Repositories,
    policy: BillingPolicy,
}

impl AttendedAppointments {
    pub fn new(repositories: Repositories, policy: BillingPolicy) -> Self {
        Self {
            repositories,
            policy,
        }
    }

    /// Attended, uninvoiced appointments, enriched and newest first.
    ///
    /// # Errors
    ///
    /// Fails as a whole only when appointments or invoices cannot be listed.
    /// An appointment whose enrichment fails is left out.
    pub async fn execute(&self, filters: &AppointmentFilters) -> BillingResult<Vec<BillableAppointment>> {
        self.run(filters).await.map_err(|e| {
            error!(error = %e, "Attended appointment retrieval failed");
            BillingError::operation(ATTENDED_FAILURE, e)
        })
    }

    async fn run(&self, filters: &AppointmentFilters) -> BillingResult<Vec<BillableAppointment>> {
        let page = self
            .repositories
            .appointments
            .list_appointments(&filters.page_request(self.policy.fetch_limit))
            .await?;
        let fetched = page.content.len();

        let attended: Vec<(AppointmentRecord, AppointmentPayload)> = page
            .content
            .into_iter()
            .filter_map(|record| match parse_appointment_payload(&record) {
                Ok(payload) if payload.is_attended() => Some((record, payload)),
                Ok(_) => None,
                Err(e) => {
                    warn!(appointment_id = record.id, error = %e, "Dropping appointment with unreadable payload");
                    None
                }
            })
            .collect();
        let attended = sort_newest_first(attended, |(_, payload)| payload.scheduled);

        let invoiced =
            collect_invoiced_ids(self.repositories.invoices.as_ref(), self.policy.fetch_limit).await?;
        let pending: Vec<(AppointmentRecord, AppointmentPayload)> = attended
            .into_iter()
            .filter(|(record, _)| !invoiced.contains(&record.id))
            .collect();

        let directory = self.load_directory().await;
        let enriched = join_all(
            pending
                .iter()
                .map(|(record, payload)| self.enrich(record, payload, &directory)),
        )
        .await;

        let result: Vec<BillableAppointment> = enriched
            .into_iter()
            .zip(&pending)
            .filter_map(|(outcome, (record, _))| match outcome {
                Ok(appointment) => Some(appointment),
                Err(e) => {
                    warn!(appointment_id = record.id, error = %e, "Dropping appointment that could not be enriched");
                    None
                }
            })
            .filter(|appointment| filters.matches(appointment))
            .collect();

        info!(
            fetched,
            invoiced = invoiced.len(),
            billable = result.len(),
            "Attended appointments resolved"
        );
        Ok(result)
    }

    /// Employees, once per batch; without them doctors fall back to the appointment's own data
    async fn load_directory(&self) -> DoctorDirectory {
        match self
            .repositories
            .employees
            .list_employees(&PageRequest::of_size(self.policy.fetch_limit))
            .await
        {
            Ok(page) => {
                let directory = DoctorDirectory::from_employees(&page.content);
                debug!(doctors = directory.len(), "Doctor directory built");
                directory
            }
            Err(e) => {
                warn!(error = %e, "Employee listing failed; doctor details will be incomplete");
                DoctorDirectory::default()
            }
        }
    }

    async fn enrich(
        &self,
        record: &AppointmentRecord,
        payload: &AppointmentPayload,
        directory: &DoctorDirectory,
    ) -> BillingResult<BillableAppointment> {
        let patient = async {
            match payload.patient_id {
                Some(id) => self.repositories.patients.get_patient(id).await,
                None => Ok(None),
            }
        };
        let code = async {
            match payload.procedure_code.as_deref() {
                Some(code) => self.repositories.billing_codes.get_billing_code(code).await,
                None => Ok(None),
            }
        };
        let (patient, code) = futures::try_join!(patient, code)?;

        let patient = patient.as_ref().map(parse_patient);
        let code = code.as_ref().map(parse_billing_code);
        let doctor = directory.resolve(DoctorQuery {
            id: payload.doctor_id,
            document: payload.doctor_document.as_deref(),
            name: payload.doctor_name.as_deref(),
        });

        Ok(BillableAppointment {
            id: record.id,
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
            scheduled: payload.scheduled,
            reason: payload.reason.clone(),
            procedure_code: payload.procedure_code.clone(),
            procedure_name: code
                .as_ref()
                .and_then(|c| c.name.clone())
                .or_else(|| payload.procedure_name.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            unit_value: payload.unit_value.or_else(|| code.as_ref().and_then(|c| c.value)),
            status: AppointmentStatus::Atendido,
        })
    }
}
