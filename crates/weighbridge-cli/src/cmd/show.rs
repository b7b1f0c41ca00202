//! `wb show`: display every field of a single ticket.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use weighbridge_core::list::RowViewObject;
use weighbridge_core::model::TicketId;

use crate::output::{CliError, pretty_kv, pretty_rule, render_error, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Ticket id to display.
    pub id: TicketId,
}

#[derive(Debug, Serialize)]
struct ShowTicket {
    #[serde(flatten)]
    row: RowViewObject,
    date_display: String,
}

/// Execute `wb show <id>`.
///
/// # Errors
///
/// Returns an error if the ticket does not exist or the lookup fails.
pub async fn run_show(args: &ShowArgs, session: &Session) -> Result<()> {
    let ticket = match session.repository.get_by_id(args.id).await {
        Ok(ticket) => ticket,
        Err(err) => {
            render_error(session.output, &CliError::from(&err))?;
            return Err(err.into());
        }
    };

    let shown = ShowTicket {
        date_display: session.format_date(ticket.date),
        row: RowViewObject::new(&ticket, true),
    };

    render_mode(
        session.output,
        &shown,
        |t, w| {
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                t.row.id,
                t.date_display,
                t.row.license_number,
                t.row.driver_name,
                t.row.inbound_weight,
                t.row.outbound_weight,
                t.row.net_weight
            )
        },
        |t, w| {
            writeln!(w, "Ticket #{}", t.row.id)?;
            pretty_rule(w)?;
            pretty_kv(w, "Date", &t.date_display)?;
            pretty_kv(w, "License", &t.row.license_number)?;
            pretty_kv(w, "Driver", &t.row.driver_name)?;
            pretty_kv(w, "Inbound", &t.row.inbound_weight)?;
            pretty_kv(w, "Outbound", &t.row.outbound_weight)?;
            pretty_kv(w, "Net", &t.row.net_weight)
        },
    )
}
