//! Configuration loading for the IPS billing engine
//!
//! Settings are resolved in layers, later layers overriding earlier ones:
//!
//! 1. Built-in defaults (`AppConfig::default()`)
//! 2. An optional configuration file (YAML, TOML or JSON, by extension)
//! 3. Environment variables prefixed with `IPS`, using `__` between path
//!    segments (`IPS__API__BASE_URL`, `IPS__BILLING__FETCH_LIMIT`)
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::ConfigEngine;
//!
//! let config = ConfigEngine::new()
//!     .with_file("ips-billing.yaml")
//!     .load()
//!     .unwrap();
//!
//! println!("Backend: {}", config.api.base_url);
//! ```

pub mod engine;
pub mod error;
pub mod settings;
pub mod validation;

pub use engine::*;
pub use error::*;
pub use settings::*;
pub use validation::*;
