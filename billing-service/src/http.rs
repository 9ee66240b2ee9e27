//! Repositories backed by the REST API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::client::ApiClient;
use crate::error::BillingResult;
use crate::models::{
    AppointmentRecord, BillingCodeRecord, EmployeeRecord, InvoiceRecord, NewInvoice, PatientRecord,
};
use crate::repository::{
    AppointmentRepository, BillingCodeRepository, EmployeeRepository, InvoiceRepository, Page,
    PageRequest, PatientRepository,
};

/// Collections come back paged, or as a bare array from older endpoints
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPage {
    Paged {
        content: Vec<Value>,
        #[serde(rename = "totalElements", default)]
        total_elements: Option<u64>,
    },
    Bare(Vec<Value>),
}

/// Decode records one by one; a record that does not fit is skipped
fn decode_page<T: DeserializeOwned>(raw: RawPage, entity: &'static str) -> Page<T> {
    let (items, total_elements) = match raw {
        RawPage::Paged {
            content,
            total_elements,
        } => (content, total_elements),
        RawPage::Bare(items) => (items, None),
    };

    let content = items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| {
            serde_json::from_value(item)
                .map_err(|e| warn!(entity, position, error = %e, "Skipping unreadable record"))
                .ok()
        })
        .collect();

    Page {
        content,
        total_elements,
    }
}

/// `codigos-cups/codigo/{code}` with the code as a single escaped segment
fn billing_code_path(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    Some(format!("codigos-cups/codigo/{}", urlencoding::encode(code)))
}

pub struct HttpRepositories {
    client: Arc<ApiClient>,
}

impl HttpRepositories {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        request: &PageRequest,
        entity: &'static str,
    ) -> BillingResult<Page<T>> {
        let raw: RawPage = self.client.get_json(path, &request.query()).await?;
        let page = decode_page(raw, entity);
        if page.is_truncated() {
            warn!(
                entity,
                returned = page.content.len(),
                total = page.total_elements,
                "Backend holds more records than the page size; the rest are ignored"
            );
        }
        Ok(page)
    }
}

#[async_trait]
impl AppointmentRepository for HttpRepositories {
    async fn list_appointments(&self, request: &PageRequest) -> BillingResult<Page<AppointmentRecord>> {
        self.list("citas", request, "cita").await
    }

    async fn get_appointment(&self, id: i64) -> BillingResult<Option<AppointmentRecord>> {
        self.client.get_optional(&format!("citas/{id}")).await
    }
}

#[async_trait]
impl PatientRepository for HttpRepositories {
    async fn get_patient(&self, id: i64) -> BillingResult<Option<PatientRecord>> {
        self.client.get_optional(&format!("pacientes/{id}")).await
    }
}

#[async_trait]
impl BillingCodeRepository for HttpRepositories {
    async fn get_billing_code(&self, code: &str) -> BillingResult<Option<BillingCodeRecord>> {
        match billing_code_path(code) {
            Some(path) => self.client.get_optional(&path).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl EmployeeRepository for HttpRepositories {
    async fn list_employees(&self, request: &PageRequest) -> BillingResult<Page<EmployeeRecord>> {
        self.list("empleados", request, "empleado").await
    }
}

#[async_trait]
impl InvoiceRepository for HttpRepositories {
    async fn list_invoices(&self, request: &PageRequest) -> BillingResult<Page<InvoiceRecord>> {
        self.list("facturas", request, "factura").await
    }

    async fn get_invoice(&self, id: i64) -> BillingResult<Option<InvoiceRecord>> {
        self.client.get_optional(&format!("facturas/{id}")).await
    }

    async fn create_invoice(&self, invoice: &NewInvoice) -> BillingResult<InvoiceRecord> {
        self.client.post_json("facturas", invoice).await
    }
}
