use std::sync::Arc;

use config_engine::{ApiConfig, BillingPolicy};
use serde_json::Value;

use crate::attended::{AppointmentFilters, AttendedAppointments};
use crate::client::ApiClient;
use crate::creation::InvoiceCreation;
use crate::error::BillingResult;
use crate::http::HttpRepositories;
use crate::invoices::{InvoiceFilters, InvoiceQueries};
use crate::models::{BillableAppointment, CreatedInvoice, Invoice, InvoiceDetail, InvoiceSummary};
use crate::repository::Repositories;

/// Billing service
pub struct BillingService {
    attended: AttendedAppointments,
    queries: InvoiceQueries,
    creation: InvoiceCreation,
}

impl BillingService {
    /// Create a billing service over the given repositories
    pub fn new(repositories: Repositories, policy: BillingPolicy) -> Self {
        Self {
            queries: InvoiceQueries::new(repositories.invoices.clone(), policy.clone()),
            attended: AttendedAppointments::new(repositories.clone(), policy.clone()),
            creation: InvoiceCreation::new(repositories, policy),
        }
    }

    /// Billing service talking to the REST backend through `client`
    pub fn over_http(client: Arc<ApiClient>, policy: BillingPolicy) -> Self {
        let backend = Arc::new(HttpRepositories::new(client));
        Self::new(Repositories::from_backend(backend), policy)
    }

    /// Client and service from configuration alone
    pub fn from_config(api: &ApiConfig, policy: BillingPolicy) -> BillingResult<(Arc<ApiClient>, Self)> {
        let client = Arc::new(ApiClient::from_config(api)?);
        Ok((client.clone(), Self::over_http(client, policy)))
    }

    /// Attended appointments not yet invoiced
    pub async fn attended_appointments(
        &self,
        filters: &AppointmentFilters,
    ) -> BillingResult<Vec<BillableAppointment>> {
        self.attended.execute(filters).await
    }

    pub async fn list_invoices(&self, filters: &InvoiceFilters) -> BillingResult<Vec<Invoice>> {
        self.queries.list(filters).await
    }

    pub async fn invoice_summary(&self, filters: &InvoiceFilters) -> BillingResult<InvoiceSummary> {
        self.queries.summary(filters).await
    }

    pub async fn invoice(&self, id: i64) -> BillingResult<InvoiceDetail> {
        self.queries.get_by_id(id).await
    }

    /// Invoice the given appointments
    pub async fn create_invoice(
        &self,
        data: &Value,
        appointment_ids: &[i64],
    ) -> BillingResult<CreatedInvoice> {
        self.creation.execute(data, appointment_ids).await
    }
}
