//! Doctor lookup table built once per batch from the employee list.

use std::collections::HashMap;

use tracing::debug;

use crate::models::EmployeeRecord;
use crate::normalize::parse_employee;

/// Courtesy titles ignored when matching names
const TITLES: [&str; 4] = ["dr", "dr.", "dra", "dra."];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctor {
    pub id: i64,
    pub name: Option<String>,
    pub document: Option<String>,
    normalized_name: String,
}

/// What an appointment tells us about its doctor
#[derive(Debug, Clone, Copy, Default)]
pub struct DoctorQuery<'a> {
    pub id: Option<i64>,
    pub document: Option<&'a str>,
    pub name: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct DoctorDirectory {
    doctors: Vec<Doctor>,
    by_id: HashMap<i64, usize>,
    by_document: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

/// Lower-case, fold accents, drop titles and collapse whitespace
pub fn normalize_name(raw: &str) -> String {
    let folded: String = raw.to_lowercase().chars().map(fold_accent).collect();
    folded
        .split_whitespace()
        .filter(|token| !TITLES.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

fn normalize_document(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_uppercase()
}

impl DoctorDirectory {
    pub fn from_employees(employees: &[EmployeeRecord]) -> Self {
        let mut directory = Self::default();

        for employee in employees {
            let info = parse_employee(employee);
            let doctor = Doctor {
                id: info.id,
                normalized_name: info.full_name.as_deref().map(normalize_name).unwrap_or_default(),
                name: info.full_name,
                document: info.document,
            };
            let index = directory.doctors.len();

            directory.by_id.entry(doctor.id).or_insert(index);
            if let Some(document) = doctor.document.as_deref().map(normalize_document) {
                if !document.is_empty() {
                    directory.by_document.entry(document).or_insert(index);
                }
            }
            if !doctor.normalized_name.is_empty() {
                directory
                    .by_name
                    .entry(doctor.normalized_name.clone())
                    .or_insert(index);
            }
            directory.doctors.push(doctor);
        }

        directory
    }

    pub fn len(&self) -> usize {
        self.doctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }

    /// Resolve by id, then document, then exact name, then partial name
    pub fn resolve(&self, query: DoctorQuery<'_>) -> Option<&Doctor> {
        if let Some(doctor) = query.id.and_then(|id| self.by_id.get(&id)).and_then(|i| self.doctors.get(*i)) {
            return Some(doctor);
        }

        if let Some(doctor) = query
            .document
            .map(normalize_document)
            .and_then(|document| self.by_document.get(&document))
            .and_then(|i| self.doctors.get(*i))
        {
            return Some(doctor);
        }

        let name = normalize_name(query.name?);
        if name.is_empty() {
            return None;
        }
        if let Some(doctor) = self.by_name.get(&name).and_then(|i| self.doctors.get(*i)) {
            return Some(doctor);
        }

        self.resolve_partial(&name)
    }

    // Legacy: appointments only carry the doctor's display name, often abbreviated.
    // Remove once the backend stores medicoId on every appointment.
    fn resolve_partial(&self, name: &str) -> Option<&Doctor> {
        let wanted: Vec<&str> = name.split(' ').collect();
        let found = self.doctors.iter().find(|doctor| {
            let tokens: Vec<&str> = doctor.normalized_name.split(' ').collect();
            wanted.iter().all(|token| tokens.contains(token))
        });

        if let Some(doctor) = found {
            debug!(query = name, doctor_id = doctor.id, "Doctor resolved by partial name match");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn employee(id: i64, document: &str, personal: serde_json::Value) -> EmployeeRecord {
        serde_json::from_value(json!({
            "id": id,
            "numeroDocumento": document,
            "datosJson": json!({ "informacionPersonalJson": personal.to_string() }).to_string()
        }))
        .unwrap()
    }

    fn directory() -> DoctorDirectory {
        DoctorDirectory::from_employees(&[
            employee(
                10,
                "79.456.123",
                json!({"primerNombre": "Carlos", "primerApellido": "Ruiz", "segundoApellido": "Peña"}),
            ),
            employee(11, "52111222", json!({"nombres": "María José", "apellidos": "Gómez"})),
        ])
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Dr.  Carlos   RUIZ Peña "), "carlos ruiz pena");
        assert_eq!(normalize_name("Dra. María"), "maria");
    }

    #[test]
    fn test_resolution_order() {
        let directory = directory();
        assert_eq!(directory.len(), 2);

        let by_id = directory.resolve(DoctorQuery { id: Some(11), name: Some("Carlos Ruiz"), ..Default::default() });
        assert_eq!(by_id.map(|d| d.id), Some(11));

        let by_document = directory.resolve(DoctorQuery { document: Some("79456123"), ..Default::default() });
        assert_eq!(by_document.map(|d| d.id), Some(10));

        let by_name = directory.resolve(DoctorQuery { name: Some("Dr. Carlos Ruiz Pena"), ..Default::default() });
        assert_eq!(by_name.map(|d| d.id), Some(10));
        assert_eq!(by_name.and_then(|d| d.name.as_deref()), Some("Carlos Ruiz Peña"));
    }

    #[test]
    fn test_partial_name_match() {
        let directory = directory();
        let found = directory.resolve(DoctorQuery { name: Some("maria gomez"), ..Default::default() });
        assert_eq!(found.map(|d| d.id), Some(11));

        let missing = directory.resolve(DoctorQuery { name: Some("Pedro Gómez"), ..Default::default() });
        assert!(missing.is_none());
    }

    #[test]
    fn test_empty_directory() {
        let directory = DoctorDirectory::default();
        assert!(directory.is_empty());
        assert!(directory.resolve(DoctorQuery { id: Some(1), name: Some("Ana"), ..Default::default() }).is_none());
    }
}
