use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

use crate::model::Ticket;

/// Sort order for ticket lists.
///
/// Comparisons only look at the sort key; callers use a stable sort so tied
/// tickets keep their store order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sort {
    /// Oldest ticket first.
    DateAsc,
    /// Newest ticket first.
    DateDesc,
    LicenseAsc,
    LicenseDesc,
    DriverAsc,
    DriverDesc,
}

impl Sort {
    /// Every sort order, in the order a picker should offer them.
    pub const ALL: [Self; 6] = [
        Self::DateAsc,
        Self::DateDesc,
        Self::LicenseAsc,
        Self::LicenseDesc,
        Self::DriverAsc,
        Self::DriverDesc,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DateAsc => "date-asc",
            Self::DateDesc => "date-desc",
            Self::LicenseAsc => "license-asc",
            Self::LicenseDesc => "license-desc",
            Self::DriverAsc => "driver-asc",
            Self::DriverDesc => "driver-desc",
        }
    }

    /// Compare two tickets by this order's key and direction.
    #[must_use]
    pub fn compare(self, a: &Ticket, b: &Ticket) -> Ordering {
        match self {
            Self::DateAsc => a.date.cmp(&b.date),
            Self::DateDesc => b.date.cmp(&a.date),
            Self::LicenseAsc => a.license_number.cmp(&b.license_number),
            Self::LicenseDesc => b.license_number.cmp(&a.license_number),
            Self::DriverAsc => a.driver_name.cmp(&b.driver_name),
            Self::DriverDesc => b.driver_name.cmp(&a.driver_name),
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "date-asc" | "oldest" => Ok(Self::DateAsc),
            "date-desc" | "newest" => Ok(Self::DateDesc),
            "license-asc" | "license-number-asc" => Ok(Self::LicenseAsc),
            "license-desc" | "license-number-desc" => Ok(Self::LicenseDesc),
            "driver-asc" => Ok(Self::DriverAsc),
            "driver-desc" => Ok(Self::DriverDesc),
            other => bail!(
                "unknown sort order '{other}': expected one of date-asc, date-desc, license-asc, license-desc, driver-asc, driver-desc"
            ),
        }
    }
}
