//! Common error handling utilities for the IPS billing engine
//!
//! Library crates keep their own `thiserror` enums close to the code that
//! raises them. This crate provides what sits above them:
//!
//! - **`IpsError`**: the error returned by binaries, built from any library
//!   error through `From` conversions
//! - **Error codes**: stable strings that identify a failure class in logs
//!   and CLI output independently of the (Spanish, user-facing) message
//!
//! # Example
//!
//! ```rust
//! use error_common::{codes, IpsError};
//!
//! fn check_ids(ids: &[i64]) -> error_common::Result<()> {
//!     if ids.is_empty() {
//!         return Err(IpsError::ValidationError(
//!             "Debe seleccionar al menos una cita".to_string(),
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! let err = check_ids(&[]).unwrap_err();
//! assert_eq!(err.code(), codes::validation::INVALID_INPUT);
//! ```

pub mod codes;
pub mod types;

pub use types::*;
