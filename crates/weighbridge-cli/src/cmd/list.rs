//! `wb list`: show the ticket list with an optional filter, sort and
//! expanded rows.

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use weighbridge_core::list::{
    Filter, ListControls, RowViewObject, Sort, TicketListViewModel, ViewState,
};
use weighbridge_core::model::TicketId;

use crate::output::{CliError, pretty_rule, render_error, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only tickets whose driver name contains this text (case-insensitive).
    #[arg(long, conflicts_with_all = ["license", "from"])]
    pub driver: Option<String>,

    /// Only tickets whose license number contains this text (case-insensitive).
    #[arg(long, conflicts_with_all = ["driver", "from"])]
    pub license: Option<String>,

    /// Only tickets dated strictly after this instant (RFC 3339 or YYYY-MM-DD).
    #[arg(long, requires = "to", value_parser = parse_instant)]
    pub from: Option<DateTime<Utc>>,

    /// Only tickets dated strictly before this instant (RFC 3339 or YYYY-MM-DD).
    #[arg(long, requires = "from", value_parser = parse_instant)]
    pub to: Option<DateTime<Utc>>,

    /// Sort order: date-asc, date-desc, license-asc, license-desc, driver-asc, driver-desc.
    #[arg(short, long)]
    pub sort: Option<Sort>,

    /// Show inbound and outbound weight for this ticket id. Repeatable.
    #[arg(short, long = "expand", value_name = "ID")]
    pub expand: Vec<TicketId>,

    /// Expand every row.
    #[arg(long, conflicts_with = "expand")]
    pub expand_all: bool,
}

impl ListArgs {
    fn filter(&self) -> Option<Filter> {
        if let Some(substring) = &self.driver {
            return Some(Filter::Driver {
                substring: substring.clone(),
            });
        }
        if let Some(substring) = &self.license {
            return Some(Filter::LicenseNumber {
                substring: substring.clone(),
            });
        }
        match (self.from, self.to) {
            (Some(start), Some(end)) => Some(Filter::DateRange { start, end }),
            _ => None,
        }
    }
}

/// Parse an RFC 3339 timestamp, or a calendar date meaning local midnight.
fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("expected RFC 3339 or YYYY-MM-DD, got '{raw}'"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("invalid date '{raw}'"))?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("'{raw}' does not exist in the local time zone"))
}

#[derive(Debug, Serialize)]
struct ListOutput {
    filter: Option<Filter>,
    sort: Option<Sort>,
    count: usize,
    rows: Vec<ListRow>,
}

#[derive(Debug, Serialize)]
struct ListRow {
    #[serde(flatten)]
    row: RowViewObject,
    date_display: String,
}

/// Execute `wb list`.
///
/// # Errors
///
/// Returns an error if the ticket list cannot be read or rendered.
pub async fn run_list(args: &ListArgs, session: &Session) -> Result<()> {
    let controls = ListControls {
        filter: args.filter(),
        sort: args.sort.or(session.config.list.default_sort),
        expanded: args.expand.iter().copied().collect::<BTreeSet<_>>(),
    };
    let vm = TicketListViewModel::with_controls(&session.repository, controls);

    if args.expand_all {
        vm.settled().await;
        for row in vm.state().rows() {
            vm.set_expanded(row.id, true);
        }
    }

    let (rows, filter, sort) = match vm.settled().await {
        ViewState::Success { rows, filter, sort } => (rows, filter, sort),
        ViewState::Error(err) => {
            render_error(session.output, &CliError::from(&err))?;
            return Err(err.into());
        }
        ViewState::Loading => bail!("ticket store closed before producing a list"),
    };

    let output = ListOutput {
        filter,
        sort,
        count: rows.len(),
        rows: rows
            .into_iter()
            .map(|row| ListRow {
                date_display: session.format_date(row.date),
                row,
            })
            .collect(),
    };

    render_mode(session.output, &output, render_text, render_pretty)
}

fn render_text(output: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "id\tdate\tlicense\tdriver\tnet\tinbound\toutbound")?;
    for ListRow { row, date_display } in &output.rows {
        let (inbound, outbound) = if row.expanded {
            (row.inbound_weight.as_str(), row.outbound_weight.as_str())
        } else {
            ("", "")
        };
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.id, date_display, row.license_number, row.driver_name, row.net_weight, inbound, outbound
        )?;
    }
    Ok(())
}

fn render_pretty(output: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let mut heading = format!("{} ticket(s)", output.count);
    if let Some(filter) = &output.filter {
        heading.push_str(&format!(", filter: {filter}"));
    }
    if let Some(sort) = output.sort {
        heading.push_str(&format!(", sort: {sort}"));
    }
    writeln!(w, "{heading}")?;
    pretty_rule(w)?;

    if output.rows.is_empty() {
        writeln!(w, "No tickets found.")?;
        return Ok(());
    }

    for ListRow { row, date_display } in &output.rows {
        writeln!(
            w,
            "#{:<5} {:<24} {:<12} {:<16} net {}",
            row.id, date_display, row.license_number, row.driver_name, row.net_weight
        )?;
        if row.expanded {
            writeln!(
                w,
                "       inbound {}  outbound {}",
                row.inbound_weight, row.outbound_weight
            )?;
        }
    }
    Ok(())
}
