//! Tracing setup with automatic PII redaction
//!
//! Billing logs routinely carry patient document numbers, phone numbers and
//! email addresses pulled out of backend payloads. This crate installs the
//! process-wide `tracing` subscriber and filters every formatted line through
//! [`PiiRedactor`] before it reaches the terminal.
//!
//! # Detected Data Types
//!
//! - **Documents**: `CC 1032456789` → `CC *******789`, and any field whose
//!   name contains `documento`
//! - **Phone Numbers**: `+57 300 123 4567` → `*** *** ****`
//! - **Email Addresses**: `ana@ips.co` → `a***@i***`
//!
//! With `hash_for_correlation` the values are replaced by a short SHA-256
//! digest instead, so the same patient can still be followed across lines.
//!
//! # Example
//!
//! ```rust,no_run
//! use logger_redacted::{init_logging, LoggerConfig};
//!
//! init_logging(&LoggerConfig::default()).unwrap();
//! tracing::info!(documento_paciente = "1032456789", "Factura creada");
//! // documento_paciente="*******789" Factura creada
//! ```

pub mod config;
pub mod redactor;
pub mod subscriber;

pub use config::*;
pub use redactor::*;
pub use subscriber::*;
