//! Translation layer between store records and domain [`Ticket`] values.
//!
//! Store calls are blocking, so every repository operation runs them on
//! tokio's blocking pool and suspends the caller until they finish. The live
//! list is exposed as a [`TicketFeed`].

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::error::TicketError;
use crate::model::{NewTicket, Ticket, TicketId};
use crate::store::{NewTicketRecord, StoreSnapshot, TicketRecord, TicketStore};

/// Handle to the ticket store, shared by every state machine of a session.
#[derive(Clone)]
pub struct TicketRepository {
    store: Arc<dyn TicketStore>,
}

impl std::fmt::Debug for TicketRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketRepository").finish_non_exhaustive()
    }
}

impl TicketRepository {
    #[must_use]
    pub const fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    /// Subscribe to the live, newest-first ticket list.
    #[must_use]
    pub fn observe_all(&self) -> TicketFeed {
        TicketFeed::new(self.store.observe_all())
    }

    /// Fetch one ticket.
    ///
    /// # Errors
    ///
    /// [`TicketError::NotFound`] if no ticket has `id`, or
    /// [`TicketError::Store`] on store failure, [`TicketError::Internal`] if
    /// the store call panicked.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: TicketId) -> Result<Ticket, TicketError> {
        let record = self.blocking(move |store| store.get_by_id(id)).await?;
        ticket_from_record(record)
    }

    /// Insert a new ticket; the store assigns its id.
    ///
    /// # Errors
    ///
    /// [`TicketError::Store`] on store failure, [`TicketError::Internal`] if
    /// the store call panicked.
    #[instrument(skip(self, ticket), fields(license = %ticket.license_number))]
    pub async fn add(&self, ticket: NewTicket) -> Result<TicketId, TicketError> {
        let record = record_from_new(ticket);
        let id = self.blocking(move |store| store.insert(&record)).await?;
        debug!(%id, "ticket added");
        Ok(id)
    }

    /// Replace every field of the ticket identified by `ticket.id`.
    ///
    /// # Errors
    ///
    /// [`TicketError::NotFound`] if the id no longer exists, or
    /// [`TicketError::Store`] on store failure, [`TicketError::Internal`] if
    /// the store call panicked.
    #[instrument(skip(self, ticket), fields(id = %ticket.id))]
    pub async fn update(&self, ticket: Ticket) -> Result<(), TicketError> {
        let id = ticket.id;
        let record = record_from_new(NewTicket {
            date: ticket.date,
            license_number: ticket.license_number,
            driver_name: ticket.driver_name,
            inbound_weight: ticket.inbound_weight,
            outbound_weight: ticket.outbound_weight,
        });
        self.blocking(move |store| store.replace(id, &record)).await?;
        debug!(%id, "ticket updated");
        Ok(())
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, TicketError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TicketStore) -> Result<T, TicketError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|err| TicketError::Internal(format!("store task: {err}")))?
    }
}

/// Live sequence of ticket lists.
///
/// The first call to [`TicketFeed::next`] yields the store's current list as
/// soon as one exists; each later call waits for the next change. Only the
/// latest list is kept, so a slow reader skips intermediate lists.
#[derive(Debug)]
pub struct TicketFeed {
    rx: watch::Receiver<StoreSnapshot>,
}

impl TicketFeed {
    fn new(mut rx: watch::Receiver<StoreSnapshot>) -> Self {
        rx.mark_changed();
        Self { rx }
    }

    /// Wait for the next list, or the next store failure.
    ///
    /// Returns `None` only once the store itself has been dropped.
    pub async fn next(&mut self) -> Option<Result<Vec<Ticket>, TicketError>> {
        loop {
            self.rx.changed().await.ok()?;
            let snapshot = self.rx.borrow_and_update().clone();
            match snapshot {
                None => {}
                Some(Ok(records)) => return Some(tickets_from_records(&records)),
                Some(Err(err)) => return Some(Err(err)),
            }
        }
    }
}

fn tickets_from_records(records: &[TicketRecord]) -> Result<Vec<Ticket>, TicketError> {
    records.iter().cloned().map(ticket_from_record).collect()
}

fn ticket_from_record(record: TicketRecord) -> Result<Ticket, TicketError> {
    let date = DateTime::<Utc>::from_timestamp_millis(record.date_ms).ok_or_else(|| {
        TicketError::Store(format!(
            "ticket {} has out-of-range date {}",
            record.id, record.date_ms
        ))
    })?;
    Ok(Ticket {
        id: record.id,
        date,
        license_number: record.license_number,
        driver_name: record.driver_name,
        inbound_weight: record.inbound_weight,
        outbound_weight: record.outbound_weight,
    })
}

fn record_from_new(ticket: NewTicket) -> NewTicketRecord {
    NewTicketRecord {
        date_ms: ticket.date.timestamp_millis(),
        license_number: ticket.license_number,
        driver_name: ticket.driver_name,
        inbound_weight: ticket.inbound_weight,
        outbound_weight: ticket.outbound_weight,
    }
}
