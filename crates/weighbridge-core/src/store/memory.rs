use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::debug;

use super::{NewTicketRecord, StoreSnapshot, TicketRecord, TicketStore};
use crate::error::TicketError;
use crate::model::TicketId;

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    /// Insertion order, oldest first.
    records: Vec<TicketRecord>,
}

/// Volatile [`TicketStore`] with the same contract as the `SQLite` store.
///
/// Ids start at 1 and are never reused.
#[derive(Debug)]
pub struct MemoryTicketStore {
    state: Mutex<MemoryState>,
    snapshots: watch::Sender<StoreSnapshot>,
}

impl Default for MemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTicketStore {
    /// Create an empty store. The empty snapshot is published immediately.
    #[must_use]
    pub fn new() -> Self {
        let (snapshots, _) = watch::channel(Some(Ok(Arc::from(Vec::<TicketRecord>::new()))));
        Self {
            state: Mutex::new(MemoryState {
                next_id: 1,
                records: Vec::new(),
            }),
            snapshots,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &MemoryState) {
        let newest_first: Vec<TicketRecord> = state.records.iter().rev().cloned().collect();
        self.snapshots.send_replace(Some(Ok(Arc::from(newest_first))));
    }
}

impl TicketStore for MemoryTicketStore {
    fn observe_all(&self) -> watch::Receiver<StoreSnapshot> {
        self.snapshots.subscribe()
    }

    fn get_by_id(&self, id: TicketId) -> Result<TicketRecord, TicketError> {
        self.lock()
            .records
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or(TicketError::NotFound(id))
    }

    fn insert(&self, record: &NewTicketRecord) -> Result<TicketId, TicketError> {
        let mut state = self.lock();
        let id = TicketId(state.next_id);
        state.next_id += 1;
        state.records.push(record.clone().with_id(id));
        debug!(%id, "memory store inserted ticket");
        self.publish(&state);
        Ok(id)
    }

    fn replace(&self, id: TicketId, record: &NewTicketRecord) -> Result<(), TicketError> {
        let mut state = self.lock();
        let slot = state
            .records
            .iter_mut()
            .find(|existing| existing.id == id)
            .ok_or(TicketError::NotFound(id))?;
        *slot = record.clone().with_id(id);
        debug!(%id, "memory store replaced ticket");
        self.publish(&state);
        Ok(())
    }
}
