use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::model::Ticket;

/// The single active filter of a ticket list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", rename_all = "kebab-case")]
pub enum Filter {
    /// Tickets dated strictly after `start` and strictly before `end`.
    DateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Case-insensitive substring of the driver name.
    Driver { substring: String },
    /// Case-insensitive substring of the license number.
    LicenseNumber { substring: String },
}

impl Filter {
    /// Returns true if `ticket` passes this filter.
    ///
    /// An empty substring places no constraint on the field.
    #[must_use]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        match self {
            Self::DateRange { start, end } => ticket.date > *start && ticket.date < *end,
            Self::Driver { substring } => contains_ignore_case(&ticket.driver_name, substring),
            Self::LicenseNumber { substring } => {
                contains_ignore_case(&ticket.license_number, substring)
            }
        }
    }

    /// Which field this filter constrains.
    #[must_use]
    pub const fn field(&self) -> FilterField {
        match self {
            Self::DateRange { .. } => FilterField::Date,
            Self::Driver { .. } => FilterField::DriverName,
            Self::LicenseNumber { .. } => FilterField::LicenseNumber,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DateRange { start, end } => write!(
                f,
                "{} in ({}, {})",
                self.field(),
                start.to_rfc3339(),
                end.to_rfc3339()
            ),
            Self::Driver { substring } | Self::LicenseNumber { substring } => {
                write!(f, "{} ~ {substring:?}", self.field())
            }
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Fields a ticket list can be filtered on, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterField {
    Date,
    DriverName,
    LicenseNumber,
}

impl FilterField {
    /// Every filterable field, in the order a picker should offer them.
    pub const AVAILABLE: [Self; 3] = [Self::Date, Self::DriverName, Self::LicenseNumber];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DriverName => "driver-name",
            Self::LicenseNumber => "license-number",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
