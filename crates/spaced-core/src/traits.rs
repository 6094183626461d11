//! The memory model seam.
//!
//! The scheduler owns the state machine (learning steps, lapses, due dates);
//! the arithmetic that updates stability and difficulty lives behind
//! [`MemoryModel`] so a different published weight table can be swapped in.
//! [`crate::fsrs::Fsrs`] is the default implementation.

use crate::model::Grade;

/// Stability/difficulty update equations of a spaced-repetition model.
///
/// All stabilities and intervals are in days. Implementations must be pure.
pub trait MemoryModel: Send + Sync {
    /// Human-readable model name (e.g. "fsrs-6").
    fn name(&self) -> &str;

    /// Stability after the first review of a new item.
    fn init_stability(&self, grade: Grade) -> f64;

    /// Difficulty after the first review of a new item.
    fn init_difficulty(&self, grade: Grade) -> f64;

    /// Difficulty after a later review.
    fn next_difficulty(&self, difficulty: f64, grade: Grade) -> f64;

    /// Stability after a successful recall (Hard, Good or Easy).
    fn recall_stability(
        &self,
        difficulty: f64,
        stability: f64,
        retrievability: f64,
        grade: Grade,
    ) -> f64;

    /// Stability after forgetting (Again).
    fn forget_stability(&self, difficulty: f64, stability: f64, retrievability: f64) -> f64;

    /// Stability after a review on the same day as the previous one.
    fn short_term_stability(&self, stability: f64, grade: Grade) -> f64;

    /// Probability of recall `elapsed_days` after the last review.
    fn retrievability(&self, elapsed_days: f64, stability: f64) -> f64;

    /// Unrounded interval in days at which retrievability falls to
    /// `request_retention`.
    fn interval(&self, stability: f64, request_retention: f64) -> f64;

    /// Stability after a review, dispatching on the grade.
    fn next_stability(
        &self,
        difficulty: f64,
        stability: f64,
        retrievability: f64,
        grade: Grade,
    ) -> f64 {
        match grade {
            Grade::Again => self.forget_stability(difficulty, stability, retrievability),
            Grade::Hard | Grade::Good | Grade::Easy => {
                self.recall_stability(difficulty, stability, retrievability, grade)
            }
        }
    }
}
