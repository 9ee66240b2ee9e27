//! Operator CLI for IPS billing reconciliation
//!
//! ```bash
//! # Start a session and export the token
//! ips-billing login --usuario facturacion
//! export IPS__API__ACCESS_TOKEN=...
//!
//! # What is left to invoice this month
//! ips-billing atendidas --desde 2024-10-01 --hasta 2024-10-31 --medico ruiz
//!
//! # Invoice two appointments
//! ips-billing crear --cita 41 --cita 42 --notas "Control mensual"
//!
//! # Status overview
//! ips-billing resumen --desde 2024-10-01
//! ```
//!
//! JSON results go to stdout; headings and logs go to stderr.

pub mod cli;
pub mod commands;

use billing_service::BillingService;
use config_engine::{AppConfig, ConfigEngine};
use error_common::{IpsError, Result};
use logger_redacted::init_logging;

pub use cli::{Cli, Command};
pub use commands::{execute, Output};

/// Resolve configuration: defaults, then the file, then `IPS__*` variables
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    let engine = match &cli.config {
        Some(path) => ConfigEngine::new().with_required_file(path),
        None => ConfigEngine::new().with_file("ips-billing.yaml"),
    };
    resolve_config(cli, &engine)
}

/// Load through `engine`, then apply command-line overrides
pub fn resolve_config(cli: &Cli, engine: &ConfigEngine) -> Result<AppConfig> {
    let mut config = engine.load()?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    Ok(config)
}

/// Composition root: configuration, logging, backend client and service
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    init_logging(&config.logging).map_err(|e| IpsError::ConfigError(e.to_string()))?;

    let (client, service) = BillingService::from_config(&config.api, config.billing.clone())?;
    let mut output = Output {
        out: std::io::stdout(),
        err: std::io::stderr(),
    };
    execute(cli.command, &client, &service, &mut output).await
}
