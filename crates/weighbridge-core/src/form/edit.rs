use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, instrument};

use super::{FieldErrors, SubmitOutcome, parse_weight, update_weight};
use crate::error::TicketError;
use crate::model::{Ticket, TicketId, format_weight};
use crate::repository::TicketRepository;

/// State machine behind the "edit ticket" form.
///
/// [`Self::load`] must run before anything else. License number and driver
/// name are carried along read-only; only the two weights are validated.
#[derive(Debug)]
pub struct EditTicketForm {
    repository: TicketRepository,
    id: Option<TicketId>,
    date: DateTime<Utc>,
    license_number: String,
    driver_name: String,
    inbound_weight: String,
    outbound_weight: String,
    errors: FieldErrors,
    loading: watch::Sender<bool>,
}

impl EditTicketForm {
    #[must_use]
    pub fn new(repository: TicketRepository) -> Self {
        Self {
            repository,
            id: None,
            date: Utc::now(),
            license_number: String::new(),
            driver_name: String::new(),
            inbound_weight: String::new(),
            outbound_weight: String::new(),
            errors: FieldErrors::default(),
            loading: watch::channel(false).0,
        }
    }

    /// Fetch ticket `id` and populate every field from it.
    ///
    /// # Errors
    ///
    /// [`TicketError::NotFound`] if the ticket does not exist, or
    /// [`TicketError::Store`] if the lookup failed. The form is left
    /// untouched on error.
    #[instrument(skip(self))]
    pub async fn load(&mut self, id: TicketId) -> Result<(), TicketError> {
        let ticket = self.repository.get_by_id(id).await?;
        self.id = Some(ticket.id);
        self.date = ticket.date;
        self.license_number = ticket.license_number;
        self.driver_name = ticket.driver_name;
        self.inbound_weight = format_weight(ticket.inbound_weight);
        self.outbound_weight = format_weight(ticket.outbound_weight);
        self.errors = FieldErrors::default();
        debug!("ticket loaded into edit form");
        Ok(())
    }

    /// Id of the loaded ticket, if [`Self::load`] has succeeded.
    #[must_use]
    pub const fn id(&self) -> Option<TicketId> {
        self.id
    }

    #[must_use]
    pub const fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[must_use]
    pub fn license_number(&self) -> &str {
        &self.license_number
    }

    #[must_use]
    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    #[must_use]
    pub fn inbound_weight(&self) -> &str {
        &self.inbound_weight
    }

    #[must_use]
    pub fn outbound_weight(&self) -> &str {
        &self.outbound_weight
    }

    #[must_use]
    pub const fn errors(&self) -> FieldErrors {
        self.errors
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    #[must_use]
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Returns false, keeping the previous text, if `text` is not a number.
    pub fn set_inbound_weight(&mut self, text: &str) -> bool {
        update_weight(&mut self.inbound_weight, &mut self.errors.inbound_weight, text)
    }

    /// Returns false, keeping the previous text, if `text` is not a number.
    pub fn set_outbound_weight(&mut self, text: &str) -> bool {
        update_weight(&mut self.outbound_weight, &mut self.errors.outbound_weight, text)
    }

    /// Validate the weights and write the full ticket back.
    #[instrument(skip(self), fields(id = ?self.id))]
    pub async fn submit(&mut self) -> SubmitOutcome {
        self.loading.send_replace(true);
        let outcome = self.try_submit().await;
        self.loading.send_replace(false);
        debug!(%outcome, "edit ticket submitted");
        outcome
    }

    async fn try_submit(&mut self) -> SubmitOutcome {
        self.errors.inbound_weight = self.inbound_weight.is_empty();
        self.errors.outbound_weight = self.outbound_weight.is_empty();
        if self.errors.any() {
            return SubmitOutcome::IncompleteForm;
        }

        let Some(id) = self.id else {
            error!("edit form submitted before a ticket was loaded");
            return SubmitOutcome::Error;
        };
        let (Some(inbound_weight), Some(outbound_weight)) = (
            parse_weight(&self.inbound_weight),
            parse_weight(&self.outbound_weight),
        ) else {
            error!(
                inbound = %self.inbound_weight,
                outbound = %self.outbound_weight,
                "weight text failed to parse after validation"
            );
            return SubmitOutcome::Error;
        };

        let ticket = Ticket {
            id,
            date: self.date,
            license_number: self.license_number.trim().to_string(),
            driver_name: self.driver_name.trim().to_string(),
            inbound_weight,
            outbound_weight,
        };
        match self.repository.update(ticket).await {
            Ok(()) => SubmitOutcome::Success,
            Err(err) => {
                error!(%err, %id, "failed to update ticket");
                SubmitOutcome::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTicket;
    use crate::store::testing::ScriptedStore;
    use crate::store::{MemoryTicketStore, TicketRecord};
    use chrono::TimeZone;
    use std::sync::{Arc, PoisonError};

    async fn seeded() -> (TicketRepository, TicketId) {
        let repo = TicketRepository::new(Arc::new(MemoryTicketStore::new()));
        let id = repo
            .add(NewTicket {
                date: Utc.timestamp_millis_opt(1_000).single().expect("valid date"),
                license_number: "  A7223KL ".to_string(),
                driver_name: "Budi ".to_string(),
                inbound_weight: 1.0,
                outbound_weight: 1.4,
            })
            .await
            .expect("add");
        (repo, id)
    }

    #[tokio::test]
    async fn load_populates_every_field() {
        let (repo, id) = seeded().await;
        let mut form = EditTicketForm::new(repo);
        form.load(id).await.expect("load");

        assert_eq!(form.id(), Some(id));
        assert_eq!(form.date().timestamp_millis(), 1_000);
        assert_eq!(form.license_number(), "  A7223KL ");
        assert_eq!(form.driver_name(), "Budi ");
        assert_eq!(form.inbound_weight(), "1.0");
        assert_eq!(form.outbound_weight(), "1.4");
        assert_eq!(form.errors(), FieldErrors::default());
    }

    #[tokio::test]
    async fn load_of_missing_ticket_fails() {
        let repo = TicketRepository::new(Arc::new(MemoryTicketStore::new()));
        let mut form = EditTicketForm::new(repo);
        assert_eq!(
            form.load(TicketId(5)).await,
            Err(TicketError::NotFound(TicketId(5)))
        );
        assert_eq!(form.id(), None);
    }

    #[tokio::test]
    async fn submit_trims_text_and_updates() {
        let (repo, id) = seeded().await;
        let mut form = EditTicketForm::new(repo.clone());
        form.load(id).await.expect("load");
        assert!(form.set_outbound_weight("3.5"));

        assert_eq!(form.submit().await, SubmitOutcome::Success);
        let saved = repo.get_by_id(id).await.expect("get");
        assert_eq!(saved.license_number, "A7223KL");
        assert_eq!(saved.driver_name, "Budi");
        assert!((saved.outbound_weight - 3.5).abs() < f64::EPSILON);
        assert!((saved.net_weight() - 2.5).abs() < f64::EPSILON);
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn empty_weight_is_incomplete() {
        let (repo, id) = seeded().await;
        let mut form = EditTicketForm::new(repo.clone());
        form.load(id).await.expect("load");
        assert!(form.set_inbound_weight(""));
        assert!(!form.set_outbound_weight("heavy"));

        assert_eq!(form.submit().await, SubmitOutcome::IncompleteForm);
        assert_eq!(form.errors().missing(), vec!["inbound weight"]);
        let saved = repo.get_by_id(id).await.expect("get");
        assert!((saved.inbound_weight - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn submit_without_load_is_an_error() {
        let repo = TicketRepository::new(Arc::new(MemoryTicketStore::new()));
        let mut form = EditTicketForm::new(repo);
        assert!(form.set_inbound_weight("1"));
        assert!(form.set_outbound_weight("2"));
        assert_eq!(form.submit().await, SubmitOutcome::Error);
    }

    #[tokio::test]
    async fn store_failure_is_a_generic_error() {
        let store = Arc::new(ScriptedStore::with_records(vec![TicketRecord {
            id: TicketId(2),
            date_ms: 10,
            license_number: "B2223KK".to_string(),
            driver_name: "Fredy".to_string(),
            inbound_weight: 1.2,
            outbound_weight: 1.3,
        }]));
        let mut form = EditTicketForm::new(TicketRepository::new(store.clone()));
        form.load(TicketId(2)).await.expect("load");

        store.sample_during_writes(form.loading());
        store.fail_writes(TicketError::Store("read-only".to_string()));
        assert_eq!(form.submit().await, SubmitOutcome::Error);
        assert_eq!(store.progress_during_writes(), vec![true]);
        assert!(!form.is_loading());
        assert!(
            store
                .replaced
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
        );
    }
}
