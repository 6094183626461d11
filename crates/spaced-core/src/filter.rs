//! Filter and sort engine.
//!
//! Applies a [`ParsedQuery`] to a list of items: tag filter first, then the
//! recognized operators, then ordering. Items that lack the data an operator
//! needs are excluded rather than failing the query.

use crate::compare::compare;
use crate::model::{Item, ReviewState, Timestamp};
use crate::query::{Direction, Order, OrderField, ParsedQuery};
use crate::scheduler::Scheduler;
use crate::traits::MemoryModel;

/// Operator keys the engine understands. Any other key is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Company,
    Topic,
    Difficulty,
    Type,
    Category,
    Is,
    Interval,
    Stability,
}

impl Operator {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "company" => Some(Operator::Company),
            "topic" => Some(Operator::Topic),
            "difficulty" | "diff" => Some(Operator::Difficulty),
            "type" => Some(Operator::Type),
            "category" => Some(Operator::Category),
            "is" => Some(Operator::Is),
            "interval" => Some(Operator::Interval),
            "stability" => Some(Operator::Stability),
            _ => None,
        }
    }

    /// Tag namespaces consulted by attribute operators.
    fn namespaces(self) -> &'static [&'static str] {
        match self {
            Operator::Company => &["company"],
            Operator::Topic => &["topic"],
            Operator::Difficulty => &["difficulty", "diff"],
            Operator::Type => &["type"],
            Operator::Category
            | Operator::Is
            | Operator::Interval
            | Operator::Stability => &[],
        }
    }

    /// Does `item` satisfy every value given for this operator?
    fn matches(self, item: &Item, values: &[String], now: Timestamp) -> bool {
        match self {
            Operator::Company | Operator::Topic | Operator::Difficulty | Operator::Type => values
                .iter()
                .all(|value| has_attribute(item, self, value)),
            Operator::Category => item.category.as_deref().is_some_and(|category| {
                values
                    .iter()
                    .any(|value| category.to_lowercase() == *value)
            }),
            Operator::Is => values.iter().all(|value| match IsFlag::from_value(value) {
                Some(flag) => flag.matches(item.review.as_ref(), now),
                None => true,
            }),
            Operator::Interval => item.review.as_ref().is_some_and(|review| {
                values
                    .iter()
                    .all(|expr| compare(review.scheduled_days, expr))
            }),
            Operator::Stability => item.review.as_ref().is_some_and(|review| {
                values.iter().all(|expr| compare(review.stability, expr))
            }),
        }
    }
}

/// Values accepted by the `is:` operator. Unknown values are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsFlag {
    Due,
    Suspended,
}

impl IsFlag {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "due" => Some(IsFlag::Due),
            "suspended" => Some(IsFlag::Suspended),
            _ => None,
        }
    }

    fn matches(self, review: Option<&ReviewState>, now: Timestamp) -> bool {
        match self {
            IsFlag::Due => review.is_some_and(|r| r.is_due(now)),
            IsFlag::Suspended => review.is_some_and(ReviewState::is_suspended),
        }
    }
}

/// Filter and order `items` by `query`, evaluated at `now`.
pub fn apply<'a, M: MemoryModel>(
    scheduler: &Scheduler<M>,
    items: &'a [Item],
    query: &ParsedQuery,
    now: Timestamp,
) -> Vec<&'a Item> {
    let operators: Vec<(Operator, &[String])> = query
        .ops
        .iter()
        .filter_map(|(key, values)| Some((Operator::from_key(key)?, values.as_slice())))
        .collect();

    let mut selected: Vec<&Item> = items
        .iter()
        .filter(|item| query.tags.iter().all(|tag| matches_tag(item, tag)))
        .filter(|item| {
            operators
                .iter()
                .all(|(op, values)| op.matches(item, values, now))
        })
        .collect();

    tracing::trace!(
        total = items.len(),
        selected = selected.len(),
        "applied query filters"
    );

    match query.order {
        None => {}
        Some(Order::Field { field, direction }) => {
            selected.sort_by(|a, b| {
                let ordering = field_value(a, field).total_cmp(&field_value(b, field));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }
        Some(Order::Urgency) => {
            let mut keyed: Vec<(f64, &Item)> = selected
                .into_iter()
                .map(|item| (scheduler.retrievability_now(item.review.as_ref(), now), item))
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            selected = keyed.into_iter().map(|(_, item)| item).collect();
        }
    }

    selected
}

/// Loose match of a free-text tag against an item. `tag` is lowercase.
fn matches_tag(item: &Item, tag: &str) -> bool {
    if item.tags.iter().any(|t| t.to_lowercase() == tag) {
        return true;
    }
    if item
        .category
        .as_deref()
        .is_some_and(|c| c.to_lowercase() == tag)
    {
        return true;
    }

    let namespaced_values = item
        .tags
        .iter()
        .filter_map(|t| t.split_once(':').map(|(_, value)| value))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if namespaced_values.contains(tag) {
        return true;
    }

    item.title.to_lowercase().contains(tag)
}

fn has_attribute(item: &Item, op: Operator, value: &str) -> bool {
    let tagged = op.namespaces().iter().any(|ns| {
        item.namespaced_values(ns)
            .any(|v| v.to_lowercase() == value)
    });
    if tagged {
        return true;
    }
    op == Operator::Type
        && item
            .kind
            .as_deref()
            .is_some_and(|kind| kind.to_lowercase() == value)
}

fn field_value(item: &Item, field: OrderField) -> f64 {
    match field {
        OrderField::Score => item.score.unwrap_or(0.0),
        OrderField::UpdatedAt => item.updated_at.unwrap_or(0) as f64,
        OrderField::CreatedAt => item.created_at.unwrap_or(0) as f64,
    }
}
