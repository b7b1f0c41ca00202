//! Live ticket list state machine.
//!
//! [`TicketListViewModel`] combines the repository's live ticket feed with
//! the user's filter, sort and expanded rows, and republishes a single
//! [`ViewState`] whenever any of them changes:
//!
//! ```text
//! Loading --first list--> Success --any input--> Success
//!    |                      |   ^
//!    +--first failure--> Error -+ (next successful list)
//! ```
//!
//! Control changes are applied synchronously by the caller; feed updates
//! arrive on a background task that lives as long as the view model. If the
//! store goes away before producing a list, the state stays `Loading` and
//! [`TicketListViewModel::settled`] returns it.

pub mod filter;
pub mod sort;
pub mod view;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::error::TicketError;
use crate::model::{Ticket, TicketId};
use crate::repository::TicketRepository;

pub use filter::{Filter, FilterField};
pub use sort::Sort;
pub use view::{ListControls, RowViewObject, ViewState, project_rows, view_state};

struct ListModel {
    latest: Option<Result<Vec<Ticket>, TicketError>>,
    controls: ListControls,
    state: watch::Sender<ViewState>,
}

impl ListModel {
    fn recompute(&self) {
        let next = view_state(self.latest.as_ref(), &self.controls);
        debug!(rows = next.rows().len(), "ticket list recomputed");
        self.state.send_replace(next);
    }
}

/// State machine behind the ticket list screen.
///
/// Must be created inside a tokio runtime. Dropping the view model cancels
/// its feed subscription.
pub struct TicketListViewModel {
    model: Arc<Mutex<ListModel>>,
    state: watch::Receiver<ViewState>,
    feed_closed: watch::Receiver<bool>,
    feed_task: JoinHandle<()>,
}

impl std::fmt::Debug for TicketListViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketListViewModel")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl TicketListViewModel {
    /// Start observing `repository` with no filter, sort or expanded rows.
    #[must_use]
    pub fn new(repository: &TicketRepository) -> Self {
        Self::with_controls(repository, ListControls::default())
    }

    /// Start observing `repository` with preset controls.
    #[must_use]
    pub fn with_controls(repository: &TicketRepository, controls: ListControls) -> Self {
        let (state_tx, state) = watch::channel(ViewState::Loading);
        let model = Arc::new(Mutex::new(ListModel {
            latest: None,
            controls,
            state: state_tx,
        }));

        let (closed_tx, feed_closed) = watch::channel(false);
        let mut feed = repository.observe_all();
        let task_model = Arc::clone(&model);
        let feed_task = tokio::spawn(async move {
            while let Some(update) = feed.next().await {
                if let Err(err) = &update {
                    warn!(%err, "ticket feed failed");
                }
                let mut model = lock(&task_model);
                model.latest = Some(update);
                model.recompute();
            }
            debug!("ticket feed closed");
            closed_tx.send_replace(true);
        });

        Self {
            model,
            state,
            feed_closed,
            feed_task,
        }
    }

    /// Current view state.
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published view state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.clone()
    }

    /// Wait until the first list or failure has arrived, or the feed has
    /// closed, then return the current state.
    ///
    /// The result is still [`ViewState::Loading`] only when the store went
    /// away without ever producing a list.
    pub async fn settled(&self) -> ViewState {
        let mut state_rx = self.state.clone();
        let mut closed_rx = self.feed_closed.clone();
        tokio::select! {
            biased;
            Ok(settled) = state_rx.wait_for(|state| !state.is_loading()) => settled.clone(),
            _ = closed_rx.wait_for(|closed| *closed) => self.state(),
        }
    }

    /// Current filter, sort and expanded rows.
    #[must_use]
    pub fn controls(&self) -> ListControls {
        lock(&self.model).controls.clone()
    }

    /// Replace the active filter. `None` shows every ticket.
    pub fn set_filter(&self, filter: Option<Filter>) {
        self.update_controls(|controls| controls.filter = filter);
    }

    /// Replace the active sort. `None` keeps store order.
    pub fn set_sort(&self, sort: Option<Sort>) {
        self.update_controls(|controls| controls.sort = sort);
    }

    /// Flip whether `id` is expanded. Ids not currently listed are tracked
    /// too, so a ticket that reappears keeps its expansion.
    pub fn toggle_expanded(&self, id: TicketId) {
        self.update_controls(|controls| {
            if !controls.expanded.remove(&id) {
                controls.expanded.insert(id);
            }
        });
    }

    /// Set whether `id` is expanded.
    pub fn set_expanded(&self, id: TicketId, expanded: bool) {
        self.update_controls(|controls| {
            if expanded {
                controls.expanded.insert(id);
            } else {
                controls.expanded.remove(&id);
            }
        });
    }

    /// Fields a filter picker should offer.
    #[must_use]
    pub const fn available_filters() -> [FilterField; 3] {
        FilterField::AVAILABLE
    }

    /// Orders a sort picker should offer.
    #[must_use]
    pub const fn available_sorts() -> [Sort; 6] {
        Sort::ALL
    }

    fn update_controls(&self, change: impl FnOnce(&mut ListControls)) {
        let mut model = lock(&self.model);
        change(&mut model.controls);
        model.recompute();
    }
}

impl Drop for TicketListViewModel {
    fn drop(&mut self) {
        self.feed_task.abort();
    }
}

fn lock(model: &Mutex<ListModel>) -> MutexGuard<'_, ListModel> {
    model.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TicketRecord;
    use crate::store::testing::ScriptedStore;
    use std::time::Duration;

    fn record(id: i64, date_ms: i64, license: &str, driver: &str, inb: f64, out: f64) -> TicketRecord {
        TicketRecord {
            id: TicketId(id),
            date_ms,
            license_number: license.to_string(),
            driver_name: driver.to_string(),
            inbound_weight: inb,
            outbound_weight: out,
        }
    }

    fn scenario() -> Vec<TicketRecord> {
        vec![
            record(0, 1, "B2223KK", "Fredy", 1.2, 1.3),
            record(1, 1, "A7223KL", "Fredy", 1.0, 1.4),
            record(3, 5, "A7223KL", "Budi", 1.0, 1.4),
        ]
    }

    fn ids(state: &ViewState) -> Vec<i64> {
        state.rows().iter().map(|row| row.id.0).collect()
    }

    async fn wait_until(
        vm: &TicketListViewModel,
        predicate: impl FnMut(&ViewState) -> bool,
    ) -> ViewState {
        let mut rx = vm.subscribe();
        let state = rx.wait_for(predicate).await.expect("view model alive");
        state.clone()
    }

    #[tokio::test]
    async fn starts_loading_until_first_list() {
        let store = Arc::new(ScriptedStore::pending());
        let vm = TicketListViewModel::new(&TicketRepository::new(store.clone()));
        assert_eq!(vm.state(), ViewState::Loading);

        store.push(Ok(scenario()));
        let state = vm.settled().await;
        assert_eq!(ids(&state), vec![0, 1, 3]);
        assert!(state.rows().iter().all(|row| !row.expanded));
    }

    #[tokio::test]
    async fn failure_is_sticky_until_next_success() {
        let store = Arc::new(ScriptedStore::pending());
        let vm = TicketListViewModel::new(&TicketRepository::new(store.clone()));

        store.push(Err(TicketError::Store("disk gone".to_string())));
        let state = vm.settled().await;
        assert_eq!(state, ViewState::Error(TicketError::Store("disk gone".to_string())));

        vm.set_sort(Some(Sort::DateAsc));
        assert!(matches!(vm.state(), ViewState::Error(_)));

        store.push(Ok(scenario()));
        let state = wait_until(&vm, |s| matches!(s, ViewState::Success { .. })).await;
        assert_eq!(ids(&state), vec![0, 1, 3]);

        store.push(Err(TicketError::Store("again".to_string())));
        let state = wait_until(&vm, |s| matches!(s, ViewState::Error(_))).await;
        assert_eq!(state, ViewState::Error(TicketError::Store("again".to_string())));
    }

    #[tokio::test]
    async fn filter_and_sort_recompute_immediately() {
        let store = Arc::new(ScriptedStore::with_records(scenario()));
        let vm = TicketListViewModel::new(&TicketRepository::new(store));
        vm.settled().await;

        let fre = Filter::Driver {
            substring: "Fre".to_string(),
        };
        vm.set_filter(Some(fre.clone()));
        match vm.state() {
            ViewState::Success { rows, filter, sort } => {
                assert_eq!(rows.iter().map(|r| r.id.0).collect::<Vec<_>>(), vec![0, 1]);
                assert_eq!(filter, Some(fre));
                assert_eq!(sort, None);
            }
            other => panic!("expected success, got {other:?}"),
        }

        vm.set_filter(None);
        vm.set_sort(Some(Sort::LicenseAsc));
        assert_eq!(ids(&vm.state()), vec![1, 3, 0]);
    }

    #[tokio::test]
    async fn toggling_expansion_flips_single_row() {
        let store = Arc::new(ScriptedStore::with_records(scenario()));
        let vm = TicketListViewModel::new(&TicketRepository::new(store));
        vm.settled().await;

        vm.toggle_expanded(TicketId(1));
        let expanded: Vec<bool> = vm.state().rows().iter().map(|r| r.expanded).collect();
        assert_eq!(expanded, vec![false, true, false]);

        vm.toggle_expanded(TicketId(1));
        assert!(vm.state().rows().iter().all(|r| !r.expanded));
    }

    #[tokio::test]
    async fn expansion_of_absent_id_survives_until_it_appears() {
        let store = Arc::new(ScriptedStore::with_records(scenario()));
        let vm = TicketListViewModel::new(&TicketRepository::new(store.clone()));
        vm.settled().await;

        vm.toggle_expanded(TicketId(9));
        assert!(vm.controls().expanded.contains(&TicketId(9)));
        assert!(vm.state().rows().iter().all(|r| !r.expanded));

        let mut with_new = vec![record(9, 7, "C1", "Ani", 2.0, 3.0)];
        with_new.extend(scenario());
        store.push(Ok(with_new));

        let state = wait_until(&vm, |s| s.rows().len() == 4).await;
        assert_eq!(state.rows()[0].id, TicketId(9));
        assert!(state.rows()[0].expanded);
    }

    #[tokio::test]
    async fn controls_apply_to_later_feed_updates() {
        let store = Arc::new(ScriptedStore::with_records(scenario()));
        let vm = TicketListViewModel::with_controls(
            &TicketRepository::new(store.clone()),
            ListControls {
                sort: Some(Sort::DriverAsc),
                ..ListControls::default()
            },
        );
        assert_eq!(ids(&vm.settled().await), vec![3, 0, 1]);

        store.push(Ok(vec![record(4, 9, "Z", "Adi", 1.0, 1.0)]));
        let state = wait_until(&vm, |s| s.rows().len() == 1).await;
        assert_eq!(ids(&state), vec![4]);
    }

    #[tokio::test]
    async fn set_expanded_is_idempotent() {
        let store = Arc::new(ScriptedStore::with_records(scenario()));
        let vm = TicketListViewModel::new(&TicketRepository::new(store));
        vm.settled().await;

        vm.set_expanded(TicketId(3), true);
        vm.set_expanded(TicketId(3), true);
        assert_eq!(vm.controls().expanded.len(), 1);
        vm.set_expanded(TicketId(3), false);
        assert!(vm.controls().expanded.is_empty());
    }

    #[tokio::test]
    async fn settled_returns_loading_when_feed_closes_first() {
        let repo = TicketRepository::new(Arc::new(ScriptedStore::pending()));
        let vm = TicketListViewModel::new(&repo);
        drop(repo);

        let state = tokio::time::timeout(Duration::from_secs(2), vm.settled())
            .await
            .expect("settled returns once the feed closes");
        assert_eq!(state, ViewState::Loading);
    }

    #[tokio::test]
    async fn dropping_view_model_releases_feed_subscription() {
        let store = Arc::new(ScriptedStore::with_records(scenario()));
        let vm = TicketListViewModel::new(&TicketRepository::new(store.clone()));
        vm.settled().await;
        assert_eq!(store.snapshots.receiver_count(), 1);

        drop(vm);
        tokio::time::timeout(Duration::from_secs(2), async {
            while store.snapshots.receiver_count() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("feed task cancelled on drop");
    }

    #[test]
    fn pickers_offer_every_option() {
        assert_eq!(TicketListViewModel::available_filters().len(), 3);
        assert_eq!(TicketListViewModel::available_sorts().len(), 6);
    }
}
