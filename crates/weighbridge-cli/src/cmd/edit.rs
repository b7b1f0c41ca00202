//! `wb edit`: change the weights of an existing ticket.

use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use weighbridge_core::form::{EditTicketForm, SubmitOutcome};
use weighbridge_core::model::TicketId;

use super::add::report_outcome;
use crate::output::{CliError, pretty_kv, render_error, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Ticket id to edit.
    pub id: TicketId,

    /// New inbound weight. Pass an empty string to clear it.
    #[arg(short, long, allow_hyphen_values = true)]
    pub inbound: Option<String>,

    /// New outbound weight. Pass an empty string to clear it.
    #[arg(short, long, allow_hyphen_values = true)]
    pub outbound: Option<String>,
}

#[derive(Debug, Serialize)]
struct EditOutput {
    outcome: SubmitOutcome,
    id: TicketId,
    inbound_weight: String,
    outbound_weight: String,
}

/// Execute `wb edit <id>`.
///
/// # Errors
///
/// Returns an error if the ticket does not exist, a weight is not a number
/// or is left empty, or the store rejects the update.
pub async fn run_edit(args: &EditArgs, session: &Session) -> Result<()> {
    let mut form = EditTicketForm::new(session.repository.clone());
    if let Err(err) = form.load(args.id).await {
        render_error(session.output, &CliError::from(&err))?;
        return Err(err.into());
    }

    if let Some(text) = &args.inbound
        && !form.set_inbound_weight(text)
    {
        bail!("inbound weight must be a number, got '{text}'");
    }
    if let Some(text) = &args.outbound
        && !form.set_outbound_weight(text)
    {
        bail!("outbound weight must be a number, got '{text}'");
    }

    let outcome = form.submit().await;
    report_outcome(session.output, outcome, form.errors(), "update")?;

    let output = EditOutput {
        outcome,
        id: args.id,
        inbound_weight: form.inbound_weight().to_string(),
        outbound_weight: form.outbound_weight().to_string(),
    };
    render_mode(
        session.output,
        &output,
        |o, w| writeln!(w, "{}\t{}\t{}", o.id, o.inbound_weight, o.outbound_weight),
        |o, w| {
            writeln!(w, "Updated ticket #{}", o.id)?;
            pretty_kv(w, "Inbound", &o.inbound_weight)?;
            pretty_kv(w, "Outbound", &o.outbound_weight)
        },
    )
}
