//! Billing reconciliation for an IPS (Colombian healthcare provider)
//!
//! Reads appointments, patients, employees, CUPS codes and invoices from the
//! IPS REST backend and provides:
//! - Attended appointments that no invoice covers yet, enriched for display
//! - Invoice listing, filtering and status summaries
//! - Invoice creation from a set of attended appointments
//!
//! The backend stores most entities with loosely typed JSON blobs, nested
//! one or two levels deep; [`normalize`] turns those into fixed shapes.

pub mod attended;
pub mod client;
pub mod creation;
pub mod directory;
pub mod error;
pub mod http;
pub mod invoices;
pub mod lenient;
pub mod models;
pub mod normalize;
pub mod ordering;
pub mod repository;
pub mod service;
pub mod session;

pub use attended::{AppointmentFilters, AttendedAppointments};
pub use client::{ApiClient, HttpTokenRefresher};
pub use creation::{invoice_number, InvoiceCreation};
pub use error::*;
pub use http::HttpRepositories;
pub use invoices::{InvoiceFilters, InvoiceQueries};
pub use models::*;
pub use repository::{Page, PageRequest, Repositories};
pub use service::*;
pub use session::{SessionManager, SessionTokens, TokenRefresher};
