//! Scheduler error types.
//!
//! The scheduler only fails on caller contract violations or on a memory
//! model that stops producing numbers. Everything on the query side is total
//! and never returns these.

use thiserror::Error;

/// Errors that can occur when scheduling a review.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    /// The caller supplied a rating that is not one of Again/Hard/Good/Easy.
    #[error("invalid grade: {0}")]
    InvalidGrade(String),

    /// The memory model returned NaN or infinity for a state field.
    #[error("memory model produced a non-finite {field}")]
    NonFinite { field: &'static str },

    /// The scheduler configuration was rejected at construction time.
    #[error("invalid scheduler config: {0}")]
    InvalidConfig(String),
}

impl SchedulerError {
    /// Returns `true` if this error was caused by the caller's input rather
    /// than by the memory model itself.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            SchedulerError::InvalidGrade(_) | SchedulerError::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_are_classified() {
        assert!(SchedulerError::InvalidGrade("manual".into()).is_caller_error());
        assert!(SchedulerError::InvalidConfig("retention".into()).is_caller_error());
        assert!(!SchedulerError::NonFinite { field: "stability" }.is_caller_error());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = SchedulerError::NonFinite { field: "difficulty" };
        assert_eq!(err.to_string(), "memory model produced a non-finite difficulty");
    }
}
