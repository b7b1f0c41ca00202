//! Add and edit form state machines.
//!
//! Both forms keep every field as the raw text the user typed, plus one
//! error flag per validated field. Submitting validates, calls the
//! repository, and reports a [`SubmitOutcome`]. Repository failures are
//! logged and collapsed into [`SubmitOutcome::Error`].

pub mod add;
pub mod edit;

use serde::Serialize;
use std::fmt;

pub use add::AddTicketForm;
pub use edit::EditTicketForm;

/// Terminal result of a form submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitOutcome {
    /// The repository accepted the ticket.
    Success,
    /// At least one required field is empty; nothing reached the store.
    IncompleteForm,
    /// The repository call failed. The cause is only in the logs.
    Error,
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::IncompleteForm => "incomplete-form",
            Self::Error => "error",
        })
    }
}

/// Per-field validation flags. `true` means the field is missing.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub license_number: bool,
    pub driver_name: bool,
    pub inbound_weight: bool,
    pub outbound_weight: bool,
}

impl FieldErrors {
    #[must_use]
    pub const fn any(&self) -> bool {
        self.license_number || self.driver_name || self.inbound_weight || self.outbound_weight
    }

    /// Names of the flagged fields, in form order.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (self.license_number, "license number"),
            (self.driver_name, "driver name"),
            (self.inbound_weight, "inbound weight"),
            (self.outbound_weight, "outbound weight"),
        ]
        .into_iter()
        .filter_map(|(flagged, name)| flagged.then_some(name))
        .collect()
    }
}

/// Whether a weight field may take `text`: empty, or a finite number.
///
/// Deliberately stricter than plain `f64` parsing: `NaN`, `inf` and
/// `Infinity` parse as floats but are rejected here.
pub(crate) fn accepts_weight(text: &str) -> bool {
    text.is_empty() || parse_weight(text).is_some()
}

pub(crate) fn parse_weight(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Apply a weight edit. Returns false, leaving `field` alone, when the text
/// is rejected.
pub(crate) fn update_weight(field: &mut String, error: &mut bool, text: &str) -> bool {
    if !accepts_weight(text) {
        return false;
    }
    text.clone_into(field);
    *error = text.is_empty();
    true
}
