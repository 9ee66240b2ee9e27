//! Normalizers for the loosely typed payloads stored by the backend.
//!
//! Every entity carries a JSON blob (`datosJson` / `jsonData`) that may be an
//! object, a JSON-encoded string, or a string whose object wraps yet another
//! `jsonData` string. The functions here accept every shape seen so far and
//! fail closed: a payload that cannot be read becomes an empty map, never a
//! propagated error, except where a caller explicitly asks for the error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::lenient::{value_to_decimal, value_to_id, value_to_string};
use crate::models::{
    AppointmentRecord, AppointmentStatus, BillingCodeRecord, EmployeeRecord, Invoice,
    InvoiceRecord, InvoiceStatus, PatientRecord,
};

/// Keys under which an extra level of JSON is stored
const NESTING_KEYS: [&str; 2] = ["jsonData", "datosJson"];

/// Deepest nesting accepted; the backend has only ever produced two levels
const MAX_NESTING: usize = 4;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("nesting deeper than {MAX_NESTING} levels")]
    TooDeep,
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode string layers until a non-string value remains. Blank strings decode to `null`.
pub fn decode_layers(value: &Value) -> Result<Value, BlobError> {
    let mut current = value.clone();
    for _ in 0..=MAX_NESTING {
        match current {
            Value::String(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(Value::Null);
                }
                current = serde_json::from_str(text)?;
            }
            other => return Ok(other),
        }
    }
    Err(BlobError::TooDeep)
}

/// Flatten a payload to its innermost object.
///
/// Keys found at outer levels are kept only when the inner object does not
/// define them; the nesting keys themselves never appear in the result.
pub fn try_unwrap_json_blob(value: &Value) -> Result<Map<String, Value>, BlobError> {
    let mut merged = Map::new();
    let mut current = decode_layers(value)?;

    for _ in 0..MAX_NESTING {
        let mut object = match current {
            Value::Object(object) => object,
            Value::Null => return Ok(merged),
            other => return Err(BlobError::NotAnObject(kind(&other))),
        };

        let mut nested = None;
        for key in NESTING_KEYS {
            if let Some(inner) = object.remove(key) {
                if nested.is_none() && !inner.is_null() {
                    nested = Some(inner);
                }
            }
        }

        // Walking outside-in, so later (inner) levels overwrite
        merged.extend(object);

        match nested {
            Some(inner) => current = decode_layers(&inner)?,
            None => return Ok(merged),
        }
    }

    Err(BlobError::TooDeep)
}

/// Like [`try_unwrap_json_blob`] but logs and returns an empty map on failure
pub fn unwrap_json_blob(value: &Value) -> Map<String, Value> {
    try_unwrap_json_blob(value).unwrap_or_else(|e| {
        warn!(error = %e, "Discarding unreadable JSON payload");
        Map::new()
    })
}

fn blob_or_empty(value: Option<&Value>, entity: &'static str, id: Option<i64>) -> Map<String, Value> {
    match value.map(try_unwrap_json_blob) {
        Some(Ok(map)) => map,
        Some(Err(e)) => {
            warn!(entity, id = ?id, error = %e, "Discarding unreadable JSON payload");
            Map::new()
        }
        None => Map::new(),
    }
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

/// First key holding a non-empty string or a number
pub fn field_string(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| fields.get(*key).and_then(value_to_string))
}

pub fn field_id(fields: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| fields.get(*key).and_then(value_to_id))
}

pub fn field_decimal(fields: &Map<String, Value>, keys: &[&str]) -> Option<Decimal> {
    keys.iter().find_map(|key| fields.get(*key).and_then(value_to_decimal))
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse the timestamp shapes the backend emits.
///
/// Timestamps without an offset are read as UTC wall-clock time, which keeps
/// their calendar date intact for date-range filters.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    // Epoch milliseconds
    if text.len() >= 10 && text.chars().all(|c| c.is_ascii_digit()) {
        return text.parse().ok().and_then(DateTime::from_timestamp_millis);
    }
    None
}

/// Rebuild a display name from the name parts used across entities
pub fn display_name(fields: &Map<String, Value>) -> Option<String> {
    let join = |keys: &[&str]| {
        let parts: Vec<String> = keys
            .iter()
            .filter_map(|key| field_string(fields, &[*key]))
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    };

    join(&["primerNombre", "segundoNombre", "primerApellido", "segundoApellido"])
        .or_else(|| join(&["nombres", "apellidos"]))
        .or_else(|| field_string(fields, &["nombreCompleto", "nombre"]))
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

/// Fixed-shape view of an appointment and its blob
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentPayload {
    pub status: Option<AppointmentStatus>,
    /// Status text as found, for error messages
    pub status_raw: Option<String>,
    pub scheduled_at: Option<String>,
    pub scheduled: Option<DateTime<Utc>>,
    pub patient_id: Option<i64>,
    pub patient_document: Option<String>,
    pub patient_name: Option<String>,
    pub doctor_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub doctor_document: Option<String>,
    pub reason: Option<String>,
    pub procedure_code: Option<String>,
    pub procedure_name: Option<String>,
    pub unit_value: Option<Decimal>,
}

impl AppointmentPayload {
    pub fn is_attended(&self) -> bool {
        self.status == Some(AppointmentStatus::Atendido)
    }
}

/// Merge an appointment's top-level fields with its blob; blob fields win.
///
/// An absent blob is fine. A blob that cannot be read is an error so callers
/// can decide whether to drop the appointment or abort.
pub fn parse_appointment_payload(record: &AppointmentRecord) -> Result<AppointmentPayload, BlobError> {
    let mut fields = Map::new();
    let top_level = [
        ("pacienteId", record.patient_id.map(Value::from)),
        ("medicoAsignado", record.assigned_doctor.clone().map(Value::from)),
        ("fechaHoraCita", record.scheduled_at.clone().map(Value::from)),
        ("motivo", record.reason.clone().map(Value::from)),
        ("estado", record.status.clone().map(Value::from)),
        ("codigoCups", record.procedure_code.clone().map(Value::from)),
    ];
    for (key, value) in top_level {
        if let Some(value) = value {
            fields.insert(key.to_string(), value);
        }
    }

    if let Some(payload) = record.payload() {
        fields.extend(try_unwrap_json_blob(payload)?);
    }

    let scheduled_at = field_string(&fields, &["fechaHoraCita", "fechaHora"]).or_else(|| {
        let date = field_string(&fields, &["fecha", "fechaCita"])?;
        Some(match field_string(&fields, &["hora", "horaCita"]) {
            Some(time) => format!("{date}T{time}"),
            None => date,
        })
    });
    let status_raw = field_string(&fields, &["estado"]);

    Ok(AppointmentPayload {
        status: status_raw.as_deref().and_then(AppointmentStatus::parse),
        status_raw,
        scheduled: scheduled_at.as_deref().and_then(parse_timestamp),
        scheduled_at,
        patient_id: field_id(&fields, &["pacienteId", "idPaciente"]),
        patient_document: field_string(&fields, &["documentoPaciente", "pacienteDocumento"]),
        patient_name: field_string(&fields, &["pacienteNombre", "nombrePaciente"]),
        doctor_id: field_id(&fields, &["medicoId", "empleadoId", "idMedico"]),
        doctor_name: field_string(&fields, &["medicoAsignado", "medicoNombre", "medico"]),
        doctor_document: field_string(&fields, &["documentoMedico", "medicoDocumento"]),
        reason: field_string(&fields, &["motivo", "motivoConsulta"]),
        procedure_code: field_string(&fields, &["codigoCups", "codigoProcedimiento", "procedimientoCodigo"]),
        procedure_name: field_string(&fields, &["procedimiento", "nombreProcedimiento", "nombreCups"]),
        unit_value: field_decimal(&fields, &["valor", "valorProcedimiento"]),
    })
}

// ---------------------------------------------------------------------------
// People
// ---------------------------------------------------------------------------

/// Patient or employee identity flattened out of its nested blobs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonInfo {
    pub id: i64,
    pub document: Option<String>,
    pub document_type: Option<String>,
    pub full_name: Option<String>,
    /// Everything found, innermost values winning
    pub fields: Map<String, Value>,
}

fn parse_person(
    entity: &'static str,
    id: i64,
    top_level: &Map<String, Value>,
    payload: Option<&Value>,
    nested_keys: &[&str],
) -> Map<String, Value> {
    let mut fields = top_level.clone();
    fields.extend(blob_or_empty(payload, entity, Some(id)));

    for key in nested_keys {
        if let Some(inner) = fields.remove(*key) {
            fields.extend(blob_or_empty(Some(&inner), entity, Some(id)));
        }
    }
    fields
}

/// Patient with `datosJson.informacionPersonalJson` unwrapped
pub fn parse_patient(record: &PatientRecord) -> PersonInfo {
    let fields = parse_person(
        "paciente",
        record.id,
        &record.fields,
        record.payload(),
        &["informacionPersonalJson"],
    );

    PersonInfo {
        id: record.id,
        document: record
            .document_number
            .clone()
            .or_else(|| field_string(&fields, &["numeroDocumento", "documento", "numeroIdentificacion"])),
        document_type: record
            .document_type
            .clone()
            .or_else(|| field_string(&fields, &["tipoDocumento"])),
        full_name: display_name(&fields),
        fields,
    }
}

/// Employee with personal and labor blobs unwrapped
pub fn parse_employee(record: &EmployeeRecord) -> PersonInfo {
    let fields = parse_person(
        "empleado",
        record.id,
        &record.fields,
        record.payload(),
        &["informacionPersonalJson", "informacionLaboralJson"],
    );

    PersonInfo {
        id: record.id,
        document: record
            .document_number
            .clone()
            .or_else(|| field_string(&fields, &["numeroDocumento", "documento", "numeroIdentificacion"])),
        document_type: field_string(&fields, &["tipoDocumento"]),
        full_name: display_name(&fields),
        fields,
    }
}

// ---------------------------------------------------------------------------
// Billing codes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillingCodeInfo {
    pub code: Option<String>,
    pub name: Option<String>,
    pub value: Option<Decimal>,
    pub category: Option<String>,
    pub requires_authorization: bool,
}

pub fn parse_billing_code(record: &BillingCodeRecord) -> BillingCodeInfo {
    BillingCodeInfo {
        code: record.code.clone(),
        name: record.name.clone(),
        value: record.value.as_ref().and_then(value_to_decimal),
        category: record.category.clone(),
        requires_authorization: record.requires_authorization.unwrap_or(false),
    }
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

/// The invoice's body, flattened; `jsonData` wins over `datosJson` when both are present
pub fn invoice_body(record: &InvoiceRecord) -> Map<String, Value> {
    record
        .payloads()
        .fold(Map::new(), |mut body, payload| {
            body.extend(blob_or_empty(Some(payload), "factura", record.id));
            body
        })
}

/// Appointment ids listed in an invoice body's `citas` array.
///
/// Entries may be ids, numeric strings, or objects carrying `id`/`citaId`.
/// The array itself may also arrive JSON-encoded.
pub fn invoiced_appointment_ids(body: &Map<String, Value>) -> Vec<i64> {
    let Some(citas) = body.get("citas") else {
        return Vec::new();
    };
    match decode_layers(citas) {
        Ok(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(entry) => field_id(entry, &["id", "citaId", "idCita"]),
                other => value_to_id(other),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Appointment ids from every body the invoice carries, in first-seen order
pub fn record_appointment_ids(record: &InvoiceRecord) -> Vec<i64> {
    let mut ids = Vec::new();
    for payload in record.payloads() {
        for id in invoiced_appointment_ids(&blob_or_empty(Some(payload), "factura", record.id)) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

fn invoice_patient(body: &Map<String, Value>) -> (Option<String>, Option<String>) {
    let mut name = field_string(body, &["pacienteNombre", "nombrePaciente"]);
    let mut document = field_string(body, &["pacienteDocumento", "documentoPaciente"]);

    if let Some(Value::Object(patient)) = body.get("paciente") {
        name = name.or_else(|| display_name(patient));
        document = document.or_else(|| field_string(patient, &["numeroDocumento", "documento"]));
    }

    if let Some(Value::Array(citas)) = body.get("citas") {
        for entry in citas.iter().filter_map(Value::as_object) {
            name = name.or_else(|| field_string(entry, &["pacienteNombre", "nombrePaciente"]));
            document = document.or_else(|| field_string(entry, &["pacienteDocumento", "documentoPaciente"]));
        }
    }

    (name, document)
}

/// Normalize an invoice: record fields first, body as fallback
pub fn parse_invoice(record: &InvoiceRecord) -> Invoice {
    let body = invoice_body(record);

    let issued_at = record
        .issued_at
        .clone()
        .or_else(|| field_string(&body, &["fechaEmision"]));
    let created_at = record
        .created_at
        .clone()
        .or_else(|| field_string(&body, &["fechaCreacion", "createdAt"]));
    let status_raw = record.status.clone().or_else(|| field_string(&body, &["estado"]));
    let total = record
        .total
        .as_ref()
        .and_then(value_to_decimal)
        .or_else(|| field_decimal(&body, &["total"]))
        .unwrap_or(Decimal::ZERO);
    let (patient_name, patient_document) = invoice_patient(&body);

    Invoice {
        id: record.id,
        number: record
            .number
            .clone()
            .or_else(|| field_string(&body, &["numeroFactura"])),
        issued: issued_at.as_deref().and_then(parse_timestamp),
        issued_at,
        created: created_at.as_deref().and_then(parse_timestamp),
        status: status_raw.as_deref().and_then(InvoiceStatus::parse),
        status_raw,
        total,
        appointment_ids: record_appointment_ids(record),
        patient_name,
        patient_document,
        notes: field_string(&body, &["notas", "observaciones"])
            .or_else(|| field_string(&record.fields, &["notas", "observaciones"])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_flat_object() {
        let map = try_unwrap_json_blob(&json!({"citas": [{"id": 7}]})).unwrap();
        assert_eq!(Value::Object(map), json!({"citas": [{"id": 7}]}));
    }

    #[test]
    fn test_single_nested_string() {
        let map = try_unwrap_json_blob(&json!("{\"citas\":[{\"id\":7}]}")).unwrap();
        assert_eq!(Value::Object(map), json!({"citas": [{"id": 7}]}));
    }

    #[test]
    fn test_double_nested_json_data() {
        let innermost = json!({"citas": [{"id": 7}], "total": 90000}).to_string();
        let middle = json!({ "jsonData": innermost }).to_string();
        let outer = json!({ "jsonData": middle });

        let map = try_unwrap_json_blob(&outer).unwrap();
        assert_eq!(Value::Object(map), json!({"citas": [{"id": 7}], "total": 90000}));
    }

    #[test]
    fn test_double_encoded_string() {
        let inner = json!({"primerNombre": "Ana"}).to_string();
        let twice = Value::String(serde_json::to_string(&inner).unwrap());

        let map = try_unwrap_json_blob(&twice).unwrap();
        assert_eq!(map.get("primerNombre"), Some(&json!("Ana")));
    }

    #[test]
    fn test_inner_level_wins_over_outer() {
        let outer = json!({
            "estado": "PENDIENTE",
            "numeroFactura": "FM-1",
            "jsonData": "{\"estado\":\"PAGADA\"}"
        });

        let map = try_unwrap_json_blob(&outer).unwrap();
        assert_eq!(map.get("estado"), Some(&json!("PAGADA")));
        assert_eq!(map.get("numeroFactura"), Some(&json!("FM-1")));
        assert!(!map.contains_key("jsonData"));
    }

    #[test]
    fn test_malformed_payloads_fail_closed() {
        assert!(try_unwrap_json_blob(&json!("{not json")).is_err());
        assert!(try_unwrap_json_blob(&json!([1, 2])).is_err());
        assert!(unwrap_json_blob(&json!("{not json")).is_empty());
        assert!(unwrap_json_blob(&json!("")).is_empty());
        assert!(unwrap_json_blob(&Value::Null).is_empty());
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        let rfc = parse_timestamp("2024-10-01T09:30:00-05:00").unwrap();
        assert_eq!(rfc.hour(), 14);

        let naive = parse_timestamp("2024-10-01T09:30:00").unwrap();
        assert_eq!((naive.day(), naive.hour()), (1, 9));

        assert!(parse_timestamp("2024-10-01 09:30:00.123").is_some());
        assert!(parse_timestamp("2024-10-01T09:30").is_some());
        assert_eq!(parse_timestamp("2024-10-01").unwrap().hour(), 0);
        assert_eq!(parse_timestamp("1727774400000").unwrap().year(), 2024);
        assert!(parse_timestamp("mañana").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_appointment_blob_wins_over_top_level() {
        let record: AppointmentRecord = serde_json::from_value(json!({
            "id": 5,
            "estado": "PENDIENTE",
            "medicoAsignado": "Carlos Ruiz",
            "datosJson": {
                "jsonData": "{\"estado\":\"ATENDIDO\",\"codigoCups\":\"890201\",\"valor\":\"45000\",\"fecha\":\"2024-10-01\",\"hora\":\"08:15\"}"
            }
        }))
        .unwrap();

        let payload = parse_appointment_payload(&record).unwrap();
        assert!(payload.is_attended());
        assert_eq!(payload.doctor_name.as_deref(), Some("Carlos Ruiz"));
        assert_eq!(payload.procedure_code.as_deref(), Some("890201"));
        assert_eq!(payload.unit_value, Some(Decimal::from(45_000)));
        assert_eq!(payload.scheduled_at.as_deref(), Some("2024-10-01T08:15"));
        assert!(payload.scheduled.is_some());
    }

    #[test]
    fn test_appointment_with_unreadable_blob_is_an_error() {
        let record = AppointmentRecord {
            id: 9,
            status: Some("ATENDIDO".to_string()),
            datos_json: Some(json!("{broken")),
            ..Default::default()
        };
        assert!(parse_appointment_payload(&record).is_err());
    }

    #[test]
    fn test_patient_personal_info_double_encoded() {
        let personal = json!({
            "primerNombre": "Ana",
            "segundoNombre": "María",
            "primerApellido": "Pérez",
            "telefono": "3001234567"
        })
        .to_string();
        let record: PatientRecord = serde_json::from_value(json!({
            "id": 1,
            "numeroDocumento": "1032456789",
            "tipoDocumento": "CC",
            "datosJson": json!({
                "informacionPersonalJson": serde_json::to_string(&personal).unwrap()
            }).to_string()
        }))
        .unwrap();

        let patient = parse_patient(&record);
        assert_eq!(patient.full_name.as_deref(), Some("Ana María Pérez"));
        assert_eq!(patient.document.as_deref(), Some("1032456789"));
        assert_eq!(patient.document_type.as_deref(), Some("CC"));
        assert_eq!(patient.fields.get("telefono"), Some(&json!("3001234567")));
    }

    #[test]
    fn test_patient_same_identity_across_nesting_shapes() {
        let person = json!({
            "primerNombre": "Ana",
            "primerApellido": "Pérez",
            "numeroDocumento": "1032456789"
        });
        let mut flat = json!({"id": 1});
        if let (Some(flat), Some(person)) = (flat.as_object_mut(), person.as_object()) {
            flat.extend(person.clone());
        }
        let shapes = [
            flat,
            json!({"id": 1, "jsonData": person.to_string()}),
            json!({"id": 1, "jsonData": json!({"jsonData": person.to_string()}).to_string()}),
            json!({"id": 1, "datosJson": {"informacionPersonalJson": person.to_string()}}),
        ];

        for shape in shapes {
            let record: PatientRecord = serde_json::from_value(shape.clone()).unwrap();
            let patient = parse_patient(&record);
            assert_eq!(patient.full_name.as_deref(), Some("Ana Pérez"), "shape {shape}");
            assert_eq!(patient.document.as_deref(), Some("1032456789"), "shape {shape}");
        }
    }

    #[test]
    fn test_patient_with_broken_blob_keeps_top_level() {
        let record: PatientRecord = serde_json::from_value(json!({
            "id": 2,
            "numeroDocumento": "52123456",
            "nombres": "Luis",
            "apellidos": "Gómez",
            "datosJson": "{oops"
        }))
        .unwrap();

        let patient = parse_patient(&record);
        assert_eq!(patient.full_name.as_deref(), Some("Luis Gómez"));
        assert_eq!(patient.document.as_deref(), Some("52123456"));
    }

    #[test]
    fn test_invoiced_ids_from_mixed_entries() {
        let body = json!({"citas": [{"id": 7}, {"citaId": "8"}, 9, "10", {"otro": 1}]});
        let ids = invoiced_appointment_ids(body.as_object().unwrap());
        assert_eq!(ids, vec![7, 8, 9, 10]);

        let encoded = json!({"citas": "[11, {\"id\": 12}]"});
        assert_eq!(invoiced_appointment_ids(encoded.as_object().unwrap()), vec![11, 12]);
    }

    #[test]
    fn test_parse_invoice_prefers_record_over_body() {
        let record: InvoiceRecord = serde_json::from_value(json!({
            "id": 3,
            "numeroFactura": "FM-202410-000003",
            "estado": "PAGADA",
            "jsonData": json!({
                "jsonData": json!({
                    "estado": "PENDIENTE",
                    "total": 120000,
                    "fechaEmision": "2024-10-02T10:00:00",
                    "paciente": {"primerNombre": "Ana", "primerApellido": "Pérez", "numeroDocumento": "1032456789"},
                    "citas": [{"id": 5}, {"id": 6}]
                }).to_string()
            }).to_string()
        }))
        .unwrap();

        let invoice = parse_invoice(&record);
        assert_eq!(invoice.status, Some(InvoiceStatus::Pagada));
        assert_eq!(invoice.total, Decimal::from(120_000));
        assert_eq!(invoice.appointment_ids, vec![5, 6]);
        assert_eq!(invoice.patient_name.as_deref(), Some("Ana Pérez"));
        assert_eq!(invoice.patient_document.as_deref(), Some("1032456789"));
        assert!(invoice.issued.is_some());
    }
}
