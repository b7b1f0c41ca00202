use std::fmt;

use crate::model::TicketId;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    TicketNotFound,
    IncompleteForm,
    StoreFailure,
    StoreLocked,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::TicketNotFound => "E2001",
            Self::IncompleteForm => "E2002",
            Self::StoreFailure => "E3001",
            Self::StoreLocked => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::TicketNotFound => "Ticket not found",
            Self::IncompleteForm => "Ticket form is incomplete",
            Self::StoreFailure => "Ticket store failure",
            Self::StoreLocked => "Ticket store is locked",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => {
                Some("Fix syntax in weighbridge/config.toml under your config directory.")
            }
            Self::TicketNotFound => Some("Run `wb list` to see the ids that exist."),
            Self::IncompleteForm => {
                Some("Provide license number, driver name, inbound and outbound weight.")
            }
            Self::StoreFailure => Some("Check disk space and permissions on the ticket database."),
            Self::StoreLocked => Some("Retry after the other `wb` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failures surfaced by the ticket store and repository.
///
/// The error is `Clone` so a failed observation can be held inside a
/// published [`ViewState`](crate::list::ViewState).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    #[error("{}: ticket {0} not found", ErrorCode::TicketNotFound.code())]
    NotFound(TicketId),
    #[error("{}: {0}", ErrorCode::StoreFailure.code())]
    Store(String),
    /// A store call panicked or was cancelled before it returned.
    #[error("{}: {0}", ErrorCode::InternalUnexpected.code())]
    Internal(String),
}

impl TicketError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::TicketNotFound,
            Self::Store(_) => ErrorCode::StoreFailure,
            Self::Internal(_) => ErrorCode::InternalUnexpected,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    pub(crate) fn store(context: &str, err: impl fmt::Display) -> Self {
        Self::Store(format!("{context}: {err}"))
    }
}

impl From<rusqlite::Error> for TicketError {
    fn from(err: rusqlite::Error) -> Self {
        Self::store("sqlite", err)
    }
}
