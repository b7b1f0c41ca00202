//! `wb options`: list the filters and sort orders `wb list` accepts.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use weighbridge_core::list::{FilterField, Sort, TicketListViewModel};

use crate::output::{OutputMode, pretty_kv, pretty_rule, render_mode};

#[derive(Debug, Serialize)]
struct Options {
    filters: Vec<FilterOption>,
    sorts: Vec<Sort>,
}

#[derive(Debug, Serialize)]
struct FilterOption {
    field: FilterField,
    flag: &'static str,
}

const fn flag_for(field: FilterField) -> &'static str {
    match field {
        FilterField::Date => "--from <T> --to <T>",
        FilterField::DriverName => "--driver <TEXT>",
        FilterField::LicenseNumber => "--license <TEXT>",
    }
}

/// Execute `wb options`.
///
/// # Errors
///
/// Returns an error if output rendering fails.
pub fn run_options(output: OutputMode) -> Result<()> {
    let options = Options {
        filters: TicketListViewModel::available_filters()
            .into_iter()
            .map(|field| FilterOption {
                field,
                flag: flag_for(field),
            })
            .collect(),
        sorts: TicketListViewModel::available_sorts().to_vec(),
    };

    render_mode(
        output,
        &options,
        |o, w| {
            for filter in &o.filters {
                writeln!(w, "filter\t{}", filter.field)?;
            }
            for sort in &o.sorts {
                writeln!(w, "sort\t{sort}")?;
            }
            Ok(())
        },
        |o, w| {
            writeln!(w, "Filters")?;
            pretty_rule(w)?;
            for filter in &o.filters {
                pretty_kv(w, filter.field.as_str(), filter.flag)?;
            }
            writeln!(w)?;
            writeln!(w, "Sorts")?;
            pretty_rule(w)?;
            for sort in &o.sorts {
                writeln!(w, "{sort}")?;
            }
            Ok(())
        },
    )
}
