//! Ticket store contract and the volatile in-process implementation.
//!
//! A store persists raw ticket records and publishes a live, newest-first
//! snapshot of every record after each committed write. Observers hold a
//! [`watch::Receiver`] and see the latest snapshot; intermediate snapshots may
//! be skipped when writes outpace the observer.

pub mod memory;

use std::sync::Arc;
use tokio::sync::watch;

use crate::error::TicketError;
use crate::model::TicketId;

pub use memory::MemoryTicketStore;

/// Latest published result of the live "all tickets" query.
///
/// `None` until the store has produced its first snapshot.
pub type StoreSnapshot = Option<Result<Arc<[TicketRecord]>, TicketError>>;

/// A persisted ticket row, in the store's own shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketRecord {
    pub id: TicketId,
    /// Milliseconds since the Unix epoch, UTC.
    pub date_ms: i64,
    pub license_number: String,
    pub driver_name: String,
    pub inbound_weight: f64,
    pub outbound_weight: f64,
}

/// A row to insert or to replace an existing row with. The id is the store's.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicketRecord {
    pub date_ms: i64,
    pub license_number: String,
    pub driver_name: String,
    pub inbound_weight: f64,
    pub outbound_weight: f64,
}

impl NewTicketRecord {
    pub(crate) fn with_id(self, id: TicketId) -> TicketRecord {
        TicketRecord {
            id,
            date_ms: self.date_ms,
            license_number: self.license_number,
            driver_name: self.driver_name,
            inbound_weight: self.inbound_weight,
            outbound_weight: self.outbound_weight,
        }
    }
}

/// Persistence contract consumed by [`TicketRepository`](crate::repository::TicketRepository).
///
/// Methods are blocking; the repository moves them off the async executor.
pub trait TicketStore: Send + Sync {
    /// Subscribe to the live "all tickets, newest first" query.
    fn observe_all(&self) -> watch::Receiver<StoreSnapshot>;

    /// Point lookup.
    ///
    /// # Errors
    ///
    /// [`TicketError::NotFound`] when no record has `id`,
    /// [`TicketError::Store`] on I/O failure.
    fn get_by_id(&self, id: TicketId) -> Result<TicketRecord, TicketError>;

    /// Insert a record and return the id the store assigned.
    ///
    /// # Errors
    ///
    /// [`TicketError::Store`] on I/O failure.
    fn insert(&self, record: &NewTicketRecord) -> Result<TicketId, TicketError>;

    /// Replace every field of the record identified by `id`.
    ///
    /// # Errors
    ///
    /// [`TicketError::NotFound`] when `id` no longer exists,
    /// [`TicketError::Store`] on I/O failure.
    fn replace(&self, id: TicketId, record: &NewTicketRecord) -> Result<(), TicketError>;
}
