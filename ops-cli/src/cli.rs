use std::path::PathBuf;

use billing_service::{AppointmentFilters, InvoiceFilters};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

/// IPS billing reconciliation
#[derive(Parser, Debug)]
#[command(name = "ips-billing")]
#[command(about = "Attended appointments, invoices and invoice creation against the IPS backend")]
#[command(version)]
pub struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, global = true, env = "IPS_BILLING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Obtain a session token
    Login {
        #[arg(long)]
        usuario: String,

        #[arg(long, env = "IPS_BILLING_CLAVE", hide_env_values = true)]
        clave: String,
    },

    /// Attended appointments not yet invoiced
    Atendidas(AppointmentArgs),

    /// List invoices
    Facturas(InvoiceArgs),

    /// Invoice counts and billed total
    Resumen(InvoiceArgs),

    /// One invoice with its full body
    Factura { id: i64 },

    /// Create an invoice for attended appointments
    Crear {
        /// Appointment id; repeat or list several
        #[arg(long = "cita", required = true, num_args = 1..)]
        citas: Vec<i64>,

        #[arg(long)]
        notas: Option<String>,

        /// Extra invoice fields as a JSON object
        #[arg(long, value_parser = parse_json_object)]
        datos: Option<Map<String, Value>>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct AppointmentArgs {
    #[arg(long)]
    pub desde: Option<NaiveDate>,

    #[arg(long)]
    pub hasta: Option<NaiveDate>,

    /// Patient document (substring)
    #[arg(long)]
    pub documento: Option<String>,

    /// Doctor name (substring)
    #[arg(long)]
    pub medico: Option<String>,

    /// Procedure name or CUPS code (substring)
    #[arg(long)]
    pub procedimiento: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InvoiceArgs {
    #[arg(long)]
    pub numero: Option<String>,

    /// Patient name or document (substring)
    #[arg(long)]
    pub paciente: Option<String>,

    /// PENDIENTE, PAGADA, VENCIDA or CANCELADA
    #[arg(long)]
    pub estado: Option<String>,

    #[arg(long)]
    pub desde: Option<NaiveDate>,

    #[arg(long)]
    pub hasta: Option<NaiveDate>,

    #[arg(long)]
    pub limite: Option<usize>,
}

fn parse_json_object(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("se esperaba un objeto JSON".to_string()),
        Err(e) => Err(format!("JSON inválido: {e}")),
    }
}

impl From<AppointmentArgs> for AppointmentFilters {
    fn from(args: AppointmentArgs) -> Self {
        Self {
            start_date: args.desde,
            end_date: args.hasta,
            patient_document: args.documento,
            doctor: args.medico,
            procedure: args.procedimiento,
        }
    }
}

impl From<InvoiceArgs> for InvoiceFilters {
    fn from(args: InvoiceArgs) -> Self {
        Self {
            number: args.numero,
            patient: args.paciente,
            status: args.estado,
            start_date: args.desde,
            end_date: args.hasta,
            limit: args.limite,
        }
    }
}

/// Invoice data from `--datos` with `--notas` on top
pub fn invoice_data(datos: Option<Map<String, Value>>, notas: Option<String>) -> Value {
    let mut data = datos.unwrap_or_default();
    if let Some(notas) = notas {
        data.insert("notas".to_string(), Value::String(notas));
    }
    Value::Object(data)
}
