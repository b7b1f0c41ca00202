use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, instrument};

use super::{FieldErrors, SubmitOutcome, parse_weight, update_weight};
use crate::model::{NewTicket, TicketId};
use crate::repository::TicketRepository;

/// State machine behind the "new ticket" form.
///
/// The date defaults to the moment the form was opened and is never
/// flagged. License number and driver name are flagged when blank; weights
/// are flagged when empty and refuse text that is not a number.
#[derive(Debug)]
pub struct AddTicketForm {
    repository: TicketRepository,
    date: DateTime<Utc>,
    license_number: String,
    driver_name: String,
    inbound_weight: String,
    outbound_weight: String,
    errors: FieldErrors,
    loading: watch::Sender<bool>,
    added: Option<TicketId>,
}

impl AddTicketForm {
    #[must_use]
    pub fn new(repository: TicketRepository) -> Self {
        Self {
            repository,
            date: Utc::now(),
            license_number: String::new(),
            driver_name: String::new(),
            inbound_weight: String::new(),
            outbound_weight: String::new(),
            errors: FieldErrors::default(),
            loading: watch::channel(false).0,
            added: None,
        }
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

    /// Id the store assigned on the last successful submit.
    #[must_use]
    pub const fn added_id(&self) -> Option<TicketId> {
        self.added
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Observe the loading flag, e.g. to show progress during [`Self::submit`].
    #[must_use]
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub const fn set_date(&mut self, date: DateTime<Utc>) {
        self.date = date;
    }

    pub fn set_license_number(&mut self, text: &str) {
        text.clone_into(&mut self.license_number);
        self.errors.license_number = text.trim().is_empty();
    }

    pub fn set_driver_name(&mut self, text: &str) {
        text.clone_into(&mut self.driver_name);
        self.errors.driver_name = text.trim().is_empty();
    }

    /// Returns false, keeping the previous text, if `text` is not a number.
    pub fn set_inbound_weight(&mut self, text: &str) -> bool {
        update_weight(&mut self.inbound_weight, &mut self.errors.inbound_weight, text)
    }

    /// Returns false, keeping the previous text, if `text` is not a number.
    pub fn set_outbound_weight(&mut self, text: &str) -> bool {
        update_weight(&mut self.outbound_weight, &mut self.errors.outbound_weight, text)
    }

    /// Validate and, if every field is present, add the ticket.
    #[instrument(skip(self), fields(license = %self.license_number))]
    pub async fn submit(&mut self) -> SubmitOutcome {
        self.loading.send_replace(true);
        let outcome = self.try_submit().await;
        self.loading.send_replace(false);
        debug!(%outcome, "add ticket submitted");
        outcome
    }

    async fn try_submit(&mut self) -> SubmitOutcome {
        self.validate();
        if self.errors.any() {
            return SubmitOutcome::IncompleteForm;
        }

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

        let ticket = NewTicket {
            date: self.date,
            license_number: self.license_number.clone(),
            driver_name: self.driver_name.clone(),
            inbound_weight,
            outbound_weight,
        };
        match self.repository.add(ticket).await {
            Ok(id) => {
                self.added = Some(id);
                SubmitOutcome::Success
            }
            Err(err) => {
                error!(%err, form = ?self.snapshot(), "failed to add ticket");
                SubmitOutcome::Error
            }
        }
    }

    fn validate(&mut self) {
        self.errors = FieldErrors {
            license_number: self.license_number.trim().is_empty(),
            driver_name: self.driver_name.trim().is_empty(),
            inbound_weight: self.inbound_weight.is_empty(),
            outbound_weight: self.outbound_weight.is_empty(),
        };
    }

    fn snapshot(&self) -> [&str; 4] {
        [
            &self.license_number,
            &self.driver_name,
            &self.inbound_weight,
            &self.outbound_weight,
        ]
    }
}
