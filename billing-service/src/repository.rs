//! Backend collections the use cases read from and write to.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::BillingResult;
use crate::models::{
    AppointmentRecord, BillingCodeRecord, EmployeeRecord, InvoiceRecord, NewInvoice, PatientRecord,
};

/// First page of a collection; the backend is never paged past page 0
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub size: usize,
    /// Extra query parameters forwarded verbatim
    pub filters: Vec<(String, String)>,
}

impl PageRequest {
    pub fn of_size(size: usize) -> Self {
        Self {
            size,
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.filters.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Query string pairs including `page` and `size`
    pub fn query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), "0".to_string()),
            ("size".to_string(), self.size.to_string()),
        ];
        query.extend(self.filters.iter().cloned());
        query
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(rename = "totalElements", default)]
    pub total_elements: Option<u64>,
}

impl<T> Page<T> {
    pub fn of(content: Vec<T>) -> Self {
        Self {
            content,
            total_elements: None,
        }
    }

    /// True when the backend reports more records than were returned
    pub fn is_truncated(&self) -> bool {
        self.total_elements
            .is_some_and(|total| total > self.content.len() as u64)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn list_appointments(&self, request: &PageRequest) -> BillingResult<Page<AppointmentRecord>>;
    async fn get_appointment(&self, id: i64) -> BillingResult<Option<AppointmentRecord>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn get_patient(&self, id: i64) -> BillingResult<Option<PatientRecord>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingCodeRepository: Send + Sync {
    async fn get_billing_code(&self, code: &str) -> BillingResult<Option<BillingCodeRecord>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn list_employees(&self, request: &PageRequest) -> BillingResult<Page<EmployeeRecord>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn list_invoices(&self, request: &PageRequest) -> BillingResult<Page<InvoiceRecord>>;
    async fn get_invoice(&self, id: i64) -> BillingResult<Option<InvoiceRecord>>;
    async fn create_invoice(&self, invoice: &NewInvoice) -> BillingResult<InvoiceRecord>;
}

/// Every collection the use cases need, wired once at the composition root
#[derive(Clone)]
pub struct Repositories {
    pub appointments: Arc<dyn AppointmentRepository>,
    pub patients: Arc<dyn PatientRepository>,
    pub billing_codes: Arc<dyn BillingCodeRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
}

impl Repositories {
    /// All collections served by one backend implementation
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: AppointmentRepository
            + PatientRepository
            + BillingCodeRepository
            + EmployeeRepository
            + InvoiceRepository
            + 'static,
    {
        Self {
            appointments: backend.clone(),
            patients: backend.clone(),
            billing_codes: backend.clone(),
            employees: backend.clone(),
            invoices: backend,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_includes_filters() {
        let request = PageRequest::of_size(1000)
            .with_filter("fechaInicio", Some("2024-10-01"))
            .with_filter("medico", None::<String>);

        assert_eq!(
            request.query(),
            vec![
                ("page".to_string(), "0".to_string()),
                ("size".to_string(), "1000".to_string()),
                ("fechaInicio".to_string(), "2024-10-01".to_string()),
            ]
        );
    }

    #[test]
    fn test_truncation_detection() {
        let page = Page {
            content: vec![1, 2],
            total_elements: Some(1500),
        };
        assert!(page.is_truncated());
        assert!(!Page::of(vec![1]).is_truncated());
    }
}
