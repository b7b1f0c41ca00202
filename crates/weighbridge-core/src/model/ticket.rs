use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseIntError, str::FromStr};

/// Store-assigned ticket identifier. Never reused once assigned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TicketId(pub i64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TicketId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// One weighbridge record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    pub id: TicketId,
    pub date: DateTime<Utc>,
    pub license_number: String,
    pub driver_name: String,
    pub inbound_weight: f64,
    pub outbound_weight: f64,
}

impl Ticket {
    /// Outbound minus inbound weight. Negative when the vehicle left lighter.
    #[must_use]
    pub const fn net_weight(&self) -> f64 {
        self.outbound_weight - self.inbound_weight
    }
}

/// Field values for a ticket that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub date: DateTime<Utc>,
    pub license_number: String,
    pub driver_name: String,
    pub inbound_weight: f64,
    pub outbound_weight: f64,
}

/// Render a weight the way forms and rows display it.
///
/// Uses the shortest text that round-trips to the same `f64`, and always
/// keeps a fractional part (`1.0`, not `1`), so the text can be fed straight
/// back into a weight field.
#[must_use]
pub fn format_weight(value: f64) -> String {
    format!("{value:?}")
}
