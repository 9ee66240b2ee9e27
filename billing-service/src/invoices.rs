use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use config_engine::BillingPolicy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::directory::normalize_name;
use crate::error::{BillingError, BillingResult};
use crate::models::{Invoice, InvoiceDetail, InvoiceStatus, InvoiceSummary};
use crate::normalize::{invoice_body, parse_invoice, record_appointment_ids};
use crate::ordering::sort_newest_first;
use crate::repository::{InvoiceRepository, PageRequest};

const LIST_FAILURE: &str = "Error al obtener las facturas";
const DETAIL_FAILURE: &str = "Error al obtener la factura";

/// Every appointment id already listed in some invoice's `citas`
pub async fn collect_invoiced_ids(
    invoices: &dyn InvoiceRepository,
    limit: usize,
) -> BillingResult<HashSet<i64>> {
    let page = invoices.list_invoices(&PageRequest::of_size(limit)).await?;
    Ok(page
        .content
        .iter()
        .flat_map(record_appointment_ids)
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFilters {
    /// Substring of the invoice number
    pub number: Option<String>,
    /// Substring of the patient's name or document
    pub patient: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<usize>,
}

fn contains_folded(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|haystack| normalize_name(haystack).contains(&normalize_name(needle)))
}

impl InvoiceFilters {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        if let Some(number) = self.number.as_deref().filter(|s| !s.trim().is_empty()) {
            let wanted = number.trim().to_lowercase();
            if !invoice
                .number
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&wanted))
            {
                return false;
            }
        }

        if let Some(patient) = self.patient.as_deref().filter(|s| !s.trim().is_empty()) {
            if !contains_folded(invoice.patient_name.as_deref(), patient)
                && !contains_folded(invoice.patient_document.as_deref(), patient)
            {
                return false;
            }
        }

        if let Some(status) = self.status.as_deref().filter(|s| !s.trim().is_empty()) {
            let wanted = status.trim().to_ascii_uppercase();
            let actual = invoice
                .status
                .map(InvoiceStatus::as_str)
                .map(str::to_string)
                .or_else(|| invoice.status_raw.as_deref().map(|s| s.trim().to_ascii_uppercase()));
            if actual.as_deref() != Some(wanted.as_str()) {
                return false;
            }
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(date) = invoice.sort_date().map(|d| d.date_naive()) else {
                return false;
            };
            if self.start_date.is_some_and(|start| date < start)
                || self.end_date.is_some_and(|end| date > end)
            {
                return false;
            }
        }

        true
    }
}

/// Counts by status plus the billed total
pub fn summarize(invoices: &[Invoice]) -> InvoiceSummary {
    invoices.iter().fold(
        InvoiceSummary {
            total_invoices: invoices.len(),
            ..InvoiceSummary::default()
        },
        |mut summary, invoice| {
            summary.total_billed += invoice.total;
            match invoice.status {
                Some(InvoiceStatus::Pendiente) => summary.pending += 1,
                Some(InvoiceStatus::Pagada) => summary.paid += 1,
                Some(InvoiceStatus::Vencida) => summary.overdue += 1,
                Some(InvoiceStatus::Cancelada) => summary.cancelled += 1,
                None => {}
            }
            summary
        },
    )
}

/// Invoice listing, summary and detail
pub struct InvoiceQueries {
    invoices: Arc<dyn InvoiceRepository>,
    policy: BillingPolicy,
}

impl InvoiceQueries {
    pub fn new(invoices: Arc<dyn InvoiceRepository>, policy: BillingPolicy) -> Self {
        Self { invoices, policy }
    }

    /// Filtered invoices, newest first, at most `filters.limit`
    pub async fn list(&self, filters: &InvoiceFilters) -> BillingResult<Vec<Invoice>> {
        let page = self
            .invoices
            .list_invoices(&PageRequest::of_size(self.policy.fetch_limit))
            .await
            .map_err(|e| {
                error!(error = %e, "Invoice listing failed");
                BillingError::operation(LIST_FAILURE, e)
            })?;

        let matching: Vec<Invoice> = page
            .content
            .iter()
            .map(parse_invoice)
            .filter(|invoice| filters.matches(invoice))
            .collect();

        let mut sorted = sort_newest_first(matching, Invoice::sort_date);
        sorted.truncate(filters.limit.unwrap_or(self.policy.default_list_limit));
        Ok(sorted)
    }

    pub async fn summary(&self, filters: &InvoiceFilters) -> BillingResult<InvoiceSummary> {
        let filters = InvoiceFilters {
            limit: Some(self.policy.summary_limit),
            ..filters.clone()
        };
        let invoices = self.list(&filters).await?;
        let summary = summarize(&invoices);
        info!(
            total = summary.total_invoices,
            pending = summary.pending,
            "Invoice summary computed"
        );
        Ok(summary)
    }

    /// Raw record with its flattened body merged on top
    pub async fn get_by_id(&self, id: i64) -> BillingResult<InvoiceDetail> {
        let record = self
            .invoices
            .get_invoice(id)
            .await
            .and_then(|found| found.ok_or_else(|| BillingError::NotFound(format!("Factura {id}"))))
            .map_err(|e| BillingError::operation(DETAIL_FAILURE, e))?;

        let mut merged = match serde_json::to_value(&record) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        merged.extend(invoice_body(&record));
        merged.insert("detallesCompletos".to_string(), Value::Bool(true));

        Ok(InvoiceDetail {
            invoice: parse_invoice(&record),
            record: merged,
        })
    }
}
