use std::io::Write;

use anyhow::Context;
use billing_service::{
    ApiClient, BillableAppointment, BillingService, CreatedInvoice, Invoice, InvoiceDetail,
    InvoiceSummary,
};
use colored::Colorize;
use error_common::Result;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::cli::{invoice_data, Command};

/// Where command output goes: JSON to `out`, headings to `err`
pub struct Output<O: Write, E: Write> {
    pub out: O,
    pub err: E,
}

impl<O: Write, E: Write> Output<O, E> {
    fn heading(&mut self, text: &str) -> Result<()> {
        writeln!(self.err, "{}", text.bright_cyan().bold()).context(WRITE_FAILURE)?;
        Ok(())
    }

    fn json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let rendered =
            serde_json::to_string_pretty(value).context("No se pudo serializar la salida")?;
        writeln!(self.out, "{rendered}").context(WRITE_FAILURE)?;
        Ok(())
    }
}

const WRITE_FAILURE: &str = "Error de escritura";

pub fn render_attended<O: Write, E: Write>(
    output: &mut Output<O, E>,
    appointments: &[BillableAppointment],
) -> Result<()> {
    output.heading(&format!("{} citas atendidas por facturar", appointments.len()))?;
    output.json(&appointments)
}

pub fn render_invoices<O: Write, E: Write>(output: &mut Output<O, E>, invoices: &[Invoice]) -> Result<()> {
    output.heading(&format!("{} facturas", invoices.len()))?;
    output.json(&invoices)
}

pub fn render_summary<O: Write, E: Write>(output: &mut Output<O, E>, summary: &InvoiceSummary) -> Result<()> {
    output.heading("Resumen de facturación")?;
    writeln!(
        output.err,
        "  {} {}   {} {}   {} {}   {} {}",
        "pendientes".yellow(),
        summary.pending,
        "pagadas".green(),
        summary.paid,
        "vencidas".red(),
        summary.overdue,
        "canceladas".dimmed(),
        summary.cancelled
    )
    .context(WRITE_FAILURE)?;
    output.json(summary)
}

pub fn render_detail<O: Write, E: Write>(output: &mut Output<O, E>, detail: &InvoiceDetail) -> Result<()> {
    output.heading(&format!(
        "Factura {}",
        detail.invoice.number.as_deref().unwrap_or("sin número")
    ))?;
    output.json(&detail.record)
}

pub fn render_created<O: Write, E: Write>(output: &mut Output<O, E>, created: &CreatedInvoice) -> Result<()> {
    output.heading(&format!(
        "Factura {} creada por {} ({} citas)",
        created.number,
        created.total,
        created.lines.len()
    ))?;
    output.json(&created.record)
}

/// Run one subcommand against the backend
pub async fn execute<O: Write, E: Write>(
    command: Command,
    client: &ApiClient,
    service: &BillingService,
    output: &mut Output<O, E>,
) -> Result<()> {
    match command {
        Command::Login { usuario, clave } => {
            let tokens = client.login(&usuario, &clave).await?;
            info!(usuario = %usuario, "Session started");
            output.heading("Sesión iniciada")?;
            output.json(&json!({
                "accessToken": tokens.access_token,
                "refreshToken": tokens.refresh_token,
            }))
        }
        Command::Atendidas(args) => {
            let appointments = service.attended_appointments(&args.into()).await?;
            render_attended(output, &appointments)
        }
        Command::Facturas(args) => {
            let invoices = service.list_invoices(&args.into()).await?;
            render_invoices(output, &invoices)
        }
        Command::Resumen(args) => {
            let summary = service.invoice_summary(&args.into()).await?;
            render_summary(output, &summary)
        }
        Command::Factura { id } => {
            let detail = service.invoice(id).await?;
            render_detail(output, &detail)
        }
        Command::Crear {
            citas,
            notas,
            datos,
        } => {
            let data: Value = invoice_data(datos, notas);
            let created = service.create_invoice(&data, &citas).await?;
            render_created(output, &created)
        }
    }
}
