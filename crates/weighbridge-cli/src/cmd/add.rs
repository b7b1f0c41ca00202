//! `wb add`: record a new ticket through the add form.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use weighbridge_core::ErrorCode;
use weighbridge_core::form::{AddTicketForm, FieldErrors, SubmitOutcome};
use weighbridge_core::model::TicketId;

use crate::output::{CliError, OutputMode, render_error, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Vehicle license number.
    #[arg(short, long, default_value = "")]
    pub license: String,

    /// Driver name.
    #[arg(short, long, default_value = "")]
    pub driver: String,

    /// Weight when the vehicle entered.
    #[arg(short, long, default_value = "", allow_hyphen_values = true)]
    pub inbound: String,

    /// Weight when the vehicle left.
    #[arg(short, long, default_value = "", allow_hyphen_values = true)]
    pub outbound: String,

    /// Ticket date (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_rfc3339)]
    pub date: Option<DateTime<Utc>>,
}

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

#[derive(Debug, Serialize)]
struct AddOutput {
    outcome: SubmitOutcome,
    id: Option<TicketId>,
}

/// Execute `wb add`.
///
/// # Errors
///
/// Returns an error if a weight is not a number, a required field is
/// missing, or the store rejects the ticket.
pub async fn run_add(args: &AddArgs, session: &Session) -> Result<()> {
    let mut form = AddTicketForm::new(session.repository.clone());
    if let Some(date) = args.date {
        form.set_date(date);
    }
    form.set_license_number(&args.license);
    form.set_driver_name(&args.driver);
    if !form.set_inbound_weight(&args.inbound) {
        bail!("inbound weight must be a number, got '{}'", args.inbound);
    }
    if !form.set_outbound_weight(&args.outbound) {
        bail!("outbound weight must be a number, got '{}'", args.outbound);
    }

    let outcome = form.submit().await;
    report_outcome(session.output, outcome, form.errors(), "add")?;

    let output = AddOutput {
        outcome,
        id: form.added_id(),
    };
    render_mode(
        session.output,
        &output,
        |o, w| writeln!(w, "{}", o.id.map_or_else(String::new, |id| id.to_string())),
        |o, w| match o.id {
            Some(id) => writeln!(w, "Added ticket #{id}"),
            None => writeln!(w, "Added ticket"),
        },
    )
}

/// Render and return the failure for a non-successful submit.
pub fn report_outcome(
    output: OutputMode,
    outcome: SubmitOutcome,
    errors: FieldErrors,
    action: &str,
) -> Result<()> {
    match outcome {
        SubmitOutcome::Success => Ok(()),
        SubmitOutcome::IncompleteForm => {
            let message = format!("missing {}", errors.missing().join(", "));
            render_error(output, &CliError::new(ErrorCode::IncompleteForm, &message))?;
            bail!("{}: {message}", ErrorCode::IncompleteForm.code())
        }
        SubmitOutcome::Error => {
            let message = format!("failed to {action} ticket; see logs for the cause");
            render_error(output, &CliError::new(ErrorCode::StoreFailure, &message))?;
            bail!("{}: {message}", ErrorCode::StoreFailure.code())
        }
    }
}
