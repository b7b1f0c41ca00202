//! Pure view computation for the ticket list.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use super::{filter::Filter, sort::Sort};
use crate::error::TicketError;
use crate::model::{Ticket, TicketId, format_weight};

/// One row of the rendered ticket list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowViewObject {
    pub id: TicketId,
    pub date: DateTime<Utc>,
    pub license_number: String,
    pub driver_name: String,
    pub inbound_weight: String,
    pub outbound_weight: String,
    pub net_weight: String,
    /// Whether the row shows inbound/outbound detail next to the net weight.
    pub expanded: bool,
}

impl RowViewObject {
    #[must_use]
    pub fn new(ticket: &Ticket, expanded: bool) -> Self {
        Self {
            id: ticket.id,
            date: ticket.date,
            license_number: ticket.license_number.clone(),
            driver_name: ticket.driver_name.clone(),
            inbound_weight: format_weight(ticket.inbound_weight),
            outbound_weight: format_weight(ticket.outbound_weight),
            net_weight: format_weight(ticket.net_weight()),
            expanded,
        }
    }
}

/// The single rendered state of the ticket list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// No ticket list has arrived yet.
    Loading,
    /// The latest observation failed. Replaced by the next successful list.
    Error(TicketError),
    Success {
        rows: Vec<RowViewObject>,
        filter: Option<Filter>,
        sort: Option<Sort>,
    },
}

impl ViewState {
    /// Rows of a successful state, or an empty slice.
    #[must_use]
    pub fn rows(&self) -> &[RowViewObject] {
        match self {
            Self::Success { rows, .. } => rows,
            Self::Loading | Self::Error(_) => &[],
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// User-controlled inputs of the list pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListControls {
    pub filter: Option<Filter>,
    pub sort: Option<Sort>,
    pub expanded: BTreeSet<TicketId>,
}

/// Run the list pipeline over `tickets`, which arrive in store order.
///
/// Rows are projected with their expansion flag, filtered, then stably
/// sorted; with no sort the store order is kept.
#[must_use]
pub fn project_rows(tickets: &[Ticket], controls: &ListControls) -> Vec<RowViewObject> {
    let mut kept: Vec<&Ticket> = tickets
        .iter()
        .filter(|ticket| {
            controls
                .filter
                .as_ref()
                .is_none_or(|filter| filter.matches(ticket))
        })
        .collect();

    if let Some(sort) = controls.sort {
        kept.sort_by(|a, b| sort.compare(a, b));
    }

    kept.into_iter()
        .map(|ticket| RowViewObject::new(ticket, controls.expanded.contains(&ticket.id)))
        .collect()
}

/// Derive the view state from the latest repository value and the controls.
#[must_use]
pub fn view_state(
    latest: Option<&Result<Vec<Ticket>, TicketError>>,
    controls: &ListControls,
) -> ViewState {
    match latest {
        None => ViewState::Loading,
        Some(Err(err)) => ViewState::Error(err.clone()),
        Some(Ok(tickets)) => ViewState::Success {
            rows: project_rows(tickets, controls),
            filter: controls.filter.clone(),
            sort: controls.sort,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("valid timestamp")
    }

    fn ticket(id: i64, date_ms: i64, license: &str, driver: &str, inb: f64, out: f64) -> Ticket {
        Ticket {
            id: TicketId(id),
            date: at(date_ms),
            license_number: license.to_string(),
            driver_name: driver.to_string(),
            inbound_weight: inb,
            outbound_weight: out,
        }
    }

    fn scenario() -> Vec<Ticket> {
        vec![
            ticket(0, 1, "B2223KK", "Fredy", 1.2, 1.3),
            ticket(1, 1, "A7223KL", "Fredy", 1.0, 1.4),
            ticket(3, 5, "A7223KL", "Budi", 1.0, 1.4),
        ]
    }

    fn ids(rows: &[RowViewObject]) -> Vec<i64> {
        rows.iter().map(|row| row.id.0).collect()
    }

    fn with_filter(filter: Filter) -> ListControls {
        ListControls {
            filter: Some(filter),
            ..ListControls::default()
        }
    }

    fn with_sort(sort: Sort) -> ListControls {
        ListControls {
            sort: Some(sort),
            ..ListControls::default()
        }
    }

    #[test]
    fn no_controls_keeps_store_order() {
        assert_eq!(ids(&project_rows(&scenario(), &ListControls::default())), vec![0, 1, 3]);
    }

    #[test]
    fn filters_match_scenario() {
        let cases = [
            (Filter::Driver { substring: String::new() }, vec![0, 1, 3]),
            (Filter::Driver { substring: "Fre".to_string() }, vec![0, 1]),
            (Filter::LicenseNumber { substring: "B".to_string() }, vec![0]),
            (Filter::LicenseNumber { substring: "b".to_string() }, vec![0]),
            (Filter::LicenseNumber { substring: "2".to_string() }, vec![0, 1, 3]),
            (Filter::DateRange { start: at(0), end: at(4) }, vec![0, 1]),
            (Filter::DateRange { start: at(3), end: at(6) }, vec![3]),
            (Filter::DateRange { start: at(1), end: at(5) }, vec![]),
        ];
        for (filter, expected) in cases {
            let rows = project_rows(&scenario(), &with_filter(filter.clone()));
            assert_eq!(ids(&rows), expected, "{filter}");
        }
    }

    #[test]
    fn sorts_match_scenario_and_are_stable() {
        let cases = [
            (Sort::DateAsc, vec![0, 1, 3]),
            (Sort::DateDesc, vec![3, 0, 1]),
            (Sort::LicenseAsc, vec![1, 3, 0]),
            (Sort::LicenseDesc, vec![0, 1, 3]),
            (Sort::DriverAsc, vec![3, 0, 1]),
            (Sort::DriverDesc, vec![0, 1, 3]),
        ];
        for (sort, expected) in cases {
            assert_eq!(ids(&project_rows(&scenario(), &with_sort(sort))), expected, "{sort}");
        }
    }

    #[test]
    fn filter_then_sort_compose() {
        let controls = ListControls {
            filter: Some(Filter::LicenseNumber {
                substring: "a7".to_string(),
            }),
            sort: Some(Sort::DriverAsc),
            expanded: BTreeSet::new(),
        };
        assert_eq!(ids(&project_rows(&scenario(), &controls)), vec![3, 1]);
    }

    #[test]
    fn expansion_marks_only_listed_ids() {
        let controls = ListControls {
            expanded: BTreeSet::from([TicketId(1), TicketId(42)]),
            ..ListControls::default()
        };
        let rows = project_rows(&scenario(), &controls);
        let expanded: Vec<(i64, bool)> = rows.iter().map(|r| (r.id.0, r.expanded)).collect();
        assert_eq!(expanded, vec![(0, false), (1, true), (3, false)]);
    }

    #[test]
    fn rows_carry_weight_text() {
        let rows = project_rows(&scenario(), &ListControls::default());
        assert_eq!(rows[1].inbound_weight, "1.0");
        assert_eq!(rows[1].outbound_weight, "1.4");
        assert_eq!(rows[1].net_weight, format_weight(1.4 - 1.0));
    }

    #[test]
    fn view_state_follows_latest_value() {
        let controls = with_sort(Sort::DateDesc);
        assert_eq!(view_state(None, &controls), ViewState::Loading);

        let failure: Result<Vec<Ticket>, TicketError> = Err(TicketError::Store("boom".to_string()));
        assert_eq!(
            view_state(Some(&failure), &controls),
            ViewState::Error(TicketError::Store("boom".to_string()))
        );

        let ok = Ok(scenario());
        match view_state(Some(&ok), &controls) {
            ViewState::Success { rows, filter, sort } => {
                assert_eq!(ids(&rows), vec![3, 0, 1]);
                assert_eq!(filter, None);
                assert_eq!(sort, Some(Sort::DateDesc));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    fn arb_tickets() -> impl Strategy<Value = Vec<Ticket>> {
        prop::collection::vec(
            (0_i64..50, "[a-cA-C]{1,3}", "[a-cA-C]{1,3}"),
            0..40,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(idx, (date, license, driver))| {
                    let id = i64::try_from(idx).unwrap_or(i64::MAX);
                    ticket(id, date, &license, &driver, 1.0, 2.0)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn desc_reverses_asc_when_keys_are_distinct(dates in prop::collection::btree_set(0_i64..10_000, 0..30)) {
            let tickets: Vec<Ticket> = dates
                .iter()
                .rev()
                .enumerate()
                .map(|(idx, date)| ticket(i64::try_from(idx).unwrap_or(0), *date, "A", "B", 1.0, 2.0))
                .collect();
            let mut asc = ids(&project_rows(&tickets, &with_sort(Sort::DateAsc)));
            let desc = ids(&project_rows(&tickets, &with_sort(Sort::DateDesc)));
            asc.reverse();
            prop_assert_eq!(asc, desc);
        }

        #[test]
        fn sorting_is_stable(tickets in arb_tickets()) {
            for sort in Sort::ALL {
                let rows = project_rows(&tickets, &with_sort(sort));
                for pair in rows.windows(2) {
                    let a = tickets.iter().find(|t| t.id == pair[0].id).expect("row ticket");
                    let b = tickets.iter().find(|t| t.id == pair[1].id).expect("row ticket");
                    prop_assert_ne!(sort.compare(a, b), std::cmp::Ordering::Greater);
                    if sort.compare(a, b) == std::cmp::Ordering::Equal {
                        prop_assert!(a.id < b.id, "tie broke store order under {}", sort);
                    }
                }
            }
        }

        #[test]
        fn empty_driver_filter_is_identity(tickets in arb_tickets()) {
            let all = ids(&project_rows(&tickets, &ListControls::default()));
            let filtered = ids(&project_rows(
                &tickets,
                &with_filter(Filter::Driver { substring: String::new() }),
            ));
            prop_assert_eq!(all, filtered);
        }

        #[test]
        fn filtered_rows_are_a_subsequence(tickets in arb_tickets(), needle in "[a-c]{0,2}") {
            let rows = project_rows(
                &tickets,
                &with_filter(Filter::LicenseNumber { substring: needle.clone() }),
            );
            let expected: Vec<i64> = tickets
                .iter()
                .filter(|t| t.license_number.to_lowercase().contains(&needle))
                .map(|t| t.id.0)
                .collect();
            prop_assert_eq!(ids(&rows), expected);
        }
    }
}
