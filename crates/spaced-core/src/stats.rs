//! Deck summary statistics.
//!
//! Counts and averages over a set of items at a given instant, used by the
//! `stats` command.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{CardState, Item, Timestamp};
use crate::scheduler::Scheduler;
use crate::traits::MemoryModel;

/// Summary of a deck at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckStats {
    pub total: usize,
    /// Items that carry a review record.
    pub with_review: usize,
    /// Items due now, suspended ones excluded.
    pub due: usize,
    pub suspended: usize,
    /// Item count per lifecycle state, keyed by the state's display name.
    pub by_state: BTreeMap<String, usize>,
    pub total_lapses: u64,
    /// Mean retrievability of items reviewed at least once.
    pub mean_retrievability: Option<f64>,
    /// Earliest due time still in the future, suspended items excluded.
    pub next_due: Option<Timestamp>,
}

/// Compute deck statistics at `now`.
pub fn compute_stats<M: MemoryModel>(
    scheduler: &Scheduler<M>,
    items: &[Item],
    now: Timestamp,
) -> DeckStats {
    let mut by_state: BTreeMap<String, usize> = CardState::ALL
        .iter()
        .map(|state| (state.to_string(), 0))
        .collect();

    let mut with_review = 0;
    let mut due = 0;
    let mut suspended = 0;
    let mut total_lapses = 0u64;
    let mut retrievabilities = Vec::new();
    let mut next_due: Option<Timestamp> = None;

    for review in items.iter().filter_map(|item| item.review.as_ref()) {
        with_review += 1;
        *by_state.entry(review.state.to_string()).or_default() += 1;
        total_lapses += u64::from(review.lapses);

        if review.is_suspended() {
            suspended += 1;
            continue;
        }
        if review.is_due(now) {
            due += 1;
        } else {
            next_due = Some(next_due.map_or(review.due, |t| t.min(review.due)));
        }
        if review.last_review.is_some() && review.state != CardState::New {
            retrievabilities.push(scheduler.retrievability_now(Some(review), now));
        }
    }

    let mean_retrievability = if retrievabilities.is_empty() {
        None
    } else {
        Some(retrievabilities.iter().sum::<f64>() / retrievabilities.len() as f64)
    };

    DeckStats {
        total: items.len(),
        with_review,
        due,
        suspended,
        by_state,
        total_lapses,
        mean_retrievability,
        next_due,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Grade, DAY_MS};

    #[test]
    fn empty_deck() {
        let stats = compute_stats(&Scheduler::default(), &[], 0);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.due, 0);
        assert_eq!(stats.by_state["new"], 0);
        assert!(stats.mean_retrievability.is_none());
        assert!(stats.next_due.is_none());
    }

    #[test]
    fn counts_states_due_and_suspended() {
        let scheduler = Scheduler::default();
        let now = 10 * DAY_MS;

        let fresh = Item::new("fresh", "Fresh", now);

        let mut reviewed = Item::new("reviewed", "Reviewed", 0);
        let state = reviewed.review.take().unwrap();
        let state = scheduler.review_once(&state, Grade::Easy, 0).unwrap();
        let upcoming = state.due;
        reviewed.review = Some(state);

        let mut paused = Item::new("paused", "Paused", 0);
        if let Some(review) = paused.review.as_mut() {
            review.set_suspended(true);
        }

        let mut plain = Item::new("plain", "No review", 0);
        plain.review = None;

        let items = vec![fresh, reviewed, paused, plain];
        let stats = compute_stats(&scheduler, &items, now);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.with_review, 3);
        assert_eq!(stats.suspended, 1);
        assert_eq!(stats.by_state["new"], 2);
        assert_eq!(stats.by_state["review"], 1);

        if upcoming <= now {
            assert_eq!(stats.due, 2);
            assert!(stats.next_due.is_none());
        } else {
            assert_eq!(stats.due, 1);
            assert_eq!(stats.next_due, Some(upcoming));
        }

        let mean = stats.mean_retrievability.unwrap();
        assert!(mean > 0.0 && mean <= 1.0);
    }

    #[test]
    fn lapses_are_summed() {
        let mut items = vec![Item::new("a", "A", 0), Item::new("b", "B", 0)];
        for (item, lapses) in items.iter_mut().zip([2, 3]) {
            if let Some(review) = item.review.as_mut() {
                review.lapses = lapses;
            }
        }
        let stats = compute_stats(&Scheduler::default(), &items, 0);
        assert_eq!(stats.total_lapses, 5);
    }
}
