use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;

/// Appointment status as stored by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pendiente,
    Confirmada,
    /// Attended: the only status eligible for billing
    Atendido,
    Cancelada,
    NoAsistio,
}

impl AppointmentStatus {
    /// Parse a backend status string. Unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDIENTE" => Some(Self::Pendiente),
            "CONFIRMADA" => Some(Self::Confirmada),
            "ATENDIDO" => Some(Self::Atendido),
            "CANCELADA" => Some(Self::Cancelada),
            "NO_ASISTIO" => Some(Self::NoAsistio),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pendiente => "PENDIENTE",
            Self::Confirmada => "CONFIRMADA",
            Self::Atendido => "ATENDIDO",
            Self::Cancelada => "CANCELADA",
            Self::NoAsistio => "NO_ASISTIO",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoice status as stored by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pendiente,
    Pagada,
    Vencida,
    Cancelada,
}

impl InvoiceStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDIENTE" => Some(Self::Pendiente),
            "PAGADA" => Some(Self::Pagada),
            "VENCIDA" => Some(Self::Vencida),
            "CANCELADA" => Some(Self::Cancelada),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pendiente => "PENDIENTE",
            Self::Pagada => "PAGADA",
            Self::Vencida => "VENCIDA",
            Self::Cancelada => "CANCELADA",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Wire records, as returned by the REST backend
// ---------------------------------------------------------------------------

/// Medical appointment (`CitaMedica`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,

    #[serde(rename = "pacienteId", default, deserialize_with = "lenient::opt_id")]
    pub patient_id: Option<i64>,

    #[serde(rename = "medicoAsignado", default, deserialize_with = "lenient::opt_string")]
    pub assigned_doctor: Option<String>,

    #[serde(rename = "fechaHoraCita", default, deserialize_with = "lenient::opt_string")]
    pub scheduled_at: Option<String>,

    #[serde(rename = "motivo", default, deserialize_with = "lenient::opt_string")]
    pub reason: Option<String>,

    #[serde(rename = "estado", default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,

    #[serde(rename = "codigoCups", default, deserialize_with = "lenient::opt_string")]
    pub procedure_code: Option<String>,

    /// Free-form blob, an object or a JSON string, sometimes nested once more
    #[serde(rename = "datosJson", default, skip_serializing_if = "Option::is_none")]
    pub datos_json: Option<Value>,

    #[serde(rename = "jsonData", default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<Value>,
}

impl AppointmentRecord {
    pub fn payload(&self) -> Option<&Value> {
        self.datos_json.as_ref().or(self.json_data.as_ref())
    }
}

/// Patient (`Paciente`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,

    #[serde(rename = "numeroDocumento", default, deserialize_with = "lenient::opt_string")]
    pub document_number: Option<String>,

    #[serde(rename = "tipoDocumento", default, deserialize_with = "lenient::opt_string")]
    pub document_type: Option<String>,

    #[serde(rename = "datosJson", default, skip_serializing_if = "Option::is_none")]
    pub datos_json: Option<Value>,

    #[serde(rename = "jsonData", default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<Value>,

    /// Any other top-level field (names, contact data)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PatientRecord {
    pub fn payload(&self) -> Option<&Value> {
        self.datos_json.as_ref().or(self.json_data.as_ref())
    }
}

/// Employee (`Empleado`); doctors are employees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,

    #[serde(rename = "numeroDocumento", default, deserialize_with = "lenient::opt_string")]
    pub document_number: Option<String>,

    #[serde(rename = "datosJson", default, skip_serializing_if = "Option::is_none")]
    pub datos_json: Option<Value>,

    #[serde(rename = "jsonData", default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<Value>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EmployeeRecord {
    pub fn payload(&self) -> Option<&Value> {
        self.datos_json.as_ref().or(self.json_data.as_ref())
    }
}

/// CUPS procedure code (`CodigoCups`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingCodeRecord {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub id: Option<i64>,

    #[serde(rename = "codigo", alias = "codigoCups", default, deserialize_with = "lenient::opt_string")]
    pub code: Option<String>,

    #[serde(rename = "nombreCups", alias = "nombre", default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,

    /// Number or string; see [`lenient::value_to_decimal`]
    #[serde(rename = "valor", default)]
    pub value: Option<Value>,

    #[serde(rename = "categoria", default, deserialize_with = "lenient::opt_string")]
    pub category: Option<String>,

    #[serde(rename = "requiereAutorizacion", default, deserialize_with = "lenient::opt_bool")]
    pub requires_authorization: Option<bool>,
}

/// Invoice (`Factura`).
///
/// Decoding must accept every invoice shape; a skipped invoice leaves its
/// `citas` billable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// `None` when the backend sends a non-numeric id
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub id: Option<i64>,

    #[serde(rename = "numeroFactura", default, deserialize_with = "lenient::opt_string")]
    pub number: Option<String>,

    #[serde(rename = "fechaEmision", default, deserialize_with = "lenient::opt_string")]
    pub issued_at: Option<String>,

    #[serde(rename = "total", default)]
    pub total: Option<Value>,

    #[serde(rename = "estado", default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,

    #[serde(rename = "fechaCreacion", alias = "createdAt", default, deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,

    /// Body holding the `citas` array, possibly nested one extra level
    #[serde(rename = "jsonData", default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<Value>,

    /// Older records carry the body here instead, some carry both
    #[serde(rename = "datosJson", default, skip_serializing_if = "Option::is_none")]
    pub datos_json: Option<Value>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl InvoiceRecord {
    /// Bodies present on the record, `datosJson` first and `jsonData` last
    pub fn payloads(&self) -> impl Iterator<Item = &Value> {
        self.datos_json.iter().chain(self.json_data.iter())
    }
}

/// Request body for `POST /facturas`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NewInvoice {
    pub body: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// Shown when an appointment's patient cannot be found
pub const UNKNOWN_PATIENT: &str = "Paciente no identificado";

/// Shown for any other missing display value
pub const NOT_AVAILABLE: &str = "N/A";

/// Attended, not yet invoiced appointment enriched for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillableAppointment {
    #[serde(rename = "id")]
    pub id: i64,

    #[serde(rename = "pacienteId")]
    pub patient_id: Option<i64>,

    #[serde(rename = "pacienteNombre")]
    pub patient_name: String,

    #[serde(rename = "pacienteDocumento")]
    pub patient_document: String,

    #[serde(rename = "medicoNombre")]
    pub doctor_name: String,

    #[serde(rename = "medicoDocumento")]
    pub doctor_document: String,

    /// As received, even when it does not parse
    #[serde(rename = "fechaHoraCita")]
    pub scheduled_at: Option<String>,

    #[serde(skip)]
    pub scheduled: Option<DateTime<Utc>>,

    #[serde(rename = "motivo")]
    pub reason: Option<String>,

    #[serde(rename = "codigoCups")]
    pub procedure_code: Option<String>,

    #[serde(rename = "procedimiento")]
    pub procedure_name: String,

    #[serde(rename = "valor", serialize_with = "lenient::opt_money")]
    pub unit_value: Option<Decimal>,

    #[serde(rename = "estado")]
    pub status: AppointmentStatus,
}

/// One invoiced appointment inside a new invoice's `citas` array
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLine {
    #[serde(rename = "id")]
    pub appointment_id: i64,

    #[serde(rename = "pacienteId")]
    pub patient_id: Option<i64>,

    #[serde(rename = "pacienteNombre")]
    pub patient_name: String,

    #[serde(rename = "pacienteDocumento")]
    pub patient_document: String,

    #[serde(rename = "medicoNombre")]
    pub doctor_name: String,

    #[serde(rename = "medicoDocumento")]
    pub doctor_document: String,

    #[serde(rename = "fechaHoraCita")]
    pub scheduled_at: Option<String>,

    #[serde(rename = "codigoCups")]
    pub procedure_code: Option<String>,

    #[serde(rename = "procedimiento")]
    pub procedure_name: String,

    #[serde(rename = "valor", serialize_with = "lenient::money")]
    pub unit_value: Decimal,
}

/// Normalized invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    #[serde(rename = "id")]
    pub id: Option<i64>,

    #[serde(rename = "numeroFactura")]
    pub number: Option<String>,

    #[serde(rename = "fechaEmision")]
    pub issued_at: Option<String>,

    #[serde(skip)]
    pub issued: Option<DateTime<Utc>>,

    #[serde(skip)]
    pub created: Option<DateTime<Utc>>,

    /// Status as received; `status` is `None` when this is not a known value
    #[serde(rename = "estado")]
    pub status_raw: Option<String>,

    #[serde(skip)]
    pub status: Option<InvoiceStatus>,

    #[serde(rename = "total", serialize_with = "lenient::money")]
    pub total: Decimal,

    #[serde(rename = "citas")]
    pub appointment_ids: Vec<i64>,

    #[serde(rename = "pacienteNombre")]
    pub patient_name: Option<String>,

    #[serde(rename = "pacienteDocumento")]
    pub patient_document: Option<String>,

    #[serde(rename = "notas")]
    pub notes: Option<String>,
}

impl Invoice {
    /// Emission date, or creation date when the invoice carries none
    pub fn sort_date(&self) -> Option<DateTime<Utc>> {
        self.issued.or(self.created)
    }
}

/// Counts and totals over a set of invoices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    #[serde(rename = "totalFacturas")]
    pub total_invoices: usize,

    #[serde(rename = "totalFacturado", serialize_with = "lenient::money")]
    pub total_billed: Decimal,

    #[serde(rename = "facturasPendientes")]
    pub pending: usize,

    #[serde(rename = "facturasPagadas")]
    pub paid: usize,

    #[serde(rename = "facturasVencidas")]
    pub overdue: usize,

    #[serde(rename = "facturasCanceladas")]
    pub cancelled: usize,
}

/// Invoice fetched by id: raw record with its parsed body merged on top
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    /// Merged record, including `detallesCompletos: true`
    pub record: Map<String, Value>,
}

/// Result of creating an invoice
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedInvoice {
    pub id: Option<i64>,
    pub number: String,
    pub issued_at: DateTime<Utc>,
    pub lines: Vec<InvoiceLine>,
    pub total: Decimal,
    pub status: InvoiceStatus,
    /// Backend response with the locally computed fields merged over it
    pub record: Map<String, Value>,
}
