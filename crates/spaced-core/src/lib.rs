//! spaced-core: review scheduling, query parsing and filtering.
//!
//! This crate defines the item and review-state model, the FSRS-backed
//! scheduler, and the query language used to select and order items. The
//! scheduler and query modules are pure; only [`deck`] and [`config`] touch
//! the filesystem.

pub mod compare;
pub mod config;
pub mod deck;
pub mod error;
pub mod filter;
pub mod fsrs;
pub mod model;
pub mod query;
pub mod scheduler;
pub mod stats;
pub mod traits;
