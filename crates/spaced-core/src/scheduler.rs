//! Review scheduler.
//!
//! Bridges persisted [`ReviewState`] records and a [`MemoryModel`]. The
//! scheduler owns the lifecycle (New → Learning → Review, and
//! Review → Relearning → Review after a lapse) while the model supplies the
//! stability and difficulty arithmetic.
//!
//! Every operation is a pure function of its arguments and the immutable
//! [`SchedulerConfig`]; the caller always passes `now`.

use std::collections::BTreeMap;

use crate::config::{SchedulerConfig, Step};
use crate::error::SchedulerError;
use crate::fsrs::Fsrs;
use crate::model::{CardState, Grade, Rating, ReviewState, Timestamp, DAY_MS};
use crate::traits::MemoryModel;

/// Interval ranges and spread used when fuzzing is enabled.
const FUZZ_RANGES: [(f64, f64, f64); 3] = [
    (2.5, 7.0, 0.15),
    (7.0, 20.0, 0.1),
    (20.0, f64::INFINITY, 0.05),
];

/// Outcome of every grade for one review record.
pub type Preview = BTreeMap<Grade, ReviewState>;

/// Applies grades to review records.
#[derive(Debug, Clone)]
pub struct Scheduler<M = Fsrs> {
    config: SchedulerConfig,
    model: M,
}

impl Scheduler<Fsrs> {
    /// Build a scheduler backed by FSRS, using the configured weight
    /// override if there is one.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let model = match &config.weights {
            Some(weights) => Fsrs::new(weights)?,
            None => Fsrs::default(),
        };
        Self::with_model(config, model)
    }
}

impl Default for Scheduler<Fsrs> {
    fn default() -> Self {
        Self {
            config: SchedulerConfig::default(),
            model: Fsrs::default(),
        }
    }
}

impl<M: MemoryModel> Scheduler<M> {
    pub fn with_model(config: SchedulerConfig, model: M) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self { config, model })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// What each grade would produce, without committing anything.
    pub fn preview_all(
        &self,
        state: &ReviewState,
        now: Timestamp,
    ) -> Result<Preview, SchedulerError> {
        let mut preview = Preview::new();
        for grade in Grade::ALL {
            preview.insert(grade, self.next_state(state, grade, now)?);
        }
        tracing::debug!(state = %state.state, "previewed all grades");
        Ok(preview)
    }

    /// Commit `grade` at `now` and return the new record.
    pub fn review_once(
        &self,
        state: &ReviewState,
        grade: Grade,
        now: Timestamp,
    ) -> Result<ReviewState, SchedulerError> {
        let next = self.next_state(state, grade, now)?;
        tracing::debug!(
            from = %state.state,
            to = %next.state,
            %grade,
            scheduled_days = next.scheduled_days,
            "review committed"
        );
        Ok(next)
    }

    /// Commit a raw numeric rating (Again = 1 … Easy = 4). The reserved
    /// Manual rating and out-of-range codes fail with
    /// [`SchedulerError::InvalidGrade`].
    pub fn review_rating(
        &self,
        state: &ReviewState,
        rating: u8,
        now: Timestamp,
    ) -> Result<ReviewState, SchedulerError> {
        let grade = Rating::from_code(rating)?.into_grade()?;
        self.review_once(state, grade, now)
    }

    /// Probability that the item would be recalled at `now`.
    ///
    /// Items without review state, or never reviewed, report 1.0 so they are
    /// never treated as the most urgent. A non-finite model result fails with
    /// [`SchedulerError::NonFinite`].
    pub fn try_retrievability_now(
        &self,
        state: Option<&ReviewState>,
        now: Timestamp,
    ) -> Result<f64, SchedulerError> {
        let Some(state) = state else {
            return Ok(1.0);
        };
        let Some(last_review) = state.last_review else {
            return Ok(1.0);
        };
        if state.state == CardState::New {
            return Ok(1.0);
        }

        let r = self
            .model
            .retrievability(elapsed_days(last_review, now), state.stability);
        if !r.is_finite() {
            return Err(SchedulerError::NonFinite {
                field: "retrievability",
            });
        }
        Ok(r.clamp(0.0, 1.0))
    }

    /// Total form of [`Self::try_retrievability_now`] for filtering and
    /// sorting. A non-finite result is logged and reported as 1.0.
    pub fn retrievability_now(&self, state: Option<&ReviewState>, now: Timestamp) -> f64 {
        match self.try_retrievability_now(state, now) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    state = ?state.map(|s| s.state),
                    stability = ?state.map(|s| s.stability),
                    "{e}, treating as fully retained"
                );
                1.0
            }
        }
    }

    fn next_state(
        &self,
        state: &ReviewState,
        grade: Grade,
        now: Timestamp,
    ) -> Result<ReviewState, SchedulerError> {
        let elapsed = state
            .last_review
            .map(|last| elapsed_days(last, now))
            .unwrap_or(0.0);

        let mut next = state.clone();
        next.elapsed_days = elapsed;
        next.last_review = Some(now);
        next.reps = state.reps.saturating_add(1);

        match state.state {
            CardState::New => {
                next.difficulty = self.model.init_difficulty(grade);
                next.stability = self.model.init_stability(grade);
                next.learning_steps_index = 0;
                self.step(&mut next, CardState::Learning, 0, grade, now);
            }
            CardState::Learning | CardState::Relearning => {
                self.update_memory(state, &mut next, grade, elapsed);
                let index = state.learning_steps_index as usize;
                self.step(&mut next, state.state, index, grade, now);
            }
            CardState::Review => {
                self.update_memory(state, &mut next, grade, elapsed);
                if grade == Grade::Again {
                    next.lapses = state.lapses.saturating_add(1);
                    if self.config.relearning_steps.is_empty() {
                        self.graduate(&mut next, elapsed, now);
                    } else {
                        self.step(&mut next, CardState::Relearning, 0, grade, now);
                    }
                } else {
                    let days = self.review_interval(state, grade, elapsed);
                    self.schedule_review(&mut next, days, now);
                }
            }
        }

        check_finite(&next)?;
        Ok(next)
    }

    fn update_memory(
        &self,
        prev: &ReviewState,
        next: &mut ReviewState,
        grade: Grade,
        elapsed: f64,
    ) {
        next.difficulty = self.model.next_difficulty(prev.difficulty, grade);
        next.stability = self.stability_after(prev, grade, elapsed);
    }

    fn stability_after(&self, prev: &ReviewState, grade: Grade, elapsed: f64) -> f64 {
        if self.config.enable_short_term && elapsed < 1.0 {
            self.model.short_term_stability(prev.stability, grade)
        } else {
            let r = self.model.retrievability(elapsed, prev.stability);
            self.model
                .next_stability(prev.difficulty, prev.stability, r, grade)
        }
    }

    /// Move through learning or relearning steps. `index` is the step the
    /// item is currently on.
    fn step(
        &self,
        next: &mut ReviewState,
        stage: CardState,
        index: usize,
        grade: Grade,
        now: Timestamp,
    ) {
        let steps = self.steps_for(stage);
        let index = index.min(steps.len().saturating_sub(1));

        let delay_ms = match grade {
            Grade::Again => steps.first().map(|s| (0, s.millis())),
            Grade::Hard => steps.get(index).map(|current| {
                let delay = match (index, steps.get(1)) {
                    (0, Some(second)) => current.millis().saturating_add(second.millis()) / 2,
                    (0, None) => current.millis().saturating_mul(3) / 2,
                    _ => current.millis(),
                };
                (index, delay)
            }),
            Grade::Good => steps.get(index + 1).map(|s| (index + 1, s.millis())),
            Grade::Easy => None,
        };

        match delay_ms {
            Some((new_index, delay)) => {
                next.state = stage;
                next.learning_steps_index = new_index as u32;
                next.scheduled_days = delay as f64 / DAY_MS as f64;
                next.due = now.saturating_add(delay);
            }
            None => {
                let elapsed = next.elapsed_days;
                self.graduate(next, elapsed, now);
            }
        }
    }

    fn steps_for(&self, stage: CardState) -> &[Step] {
        match stage {
            CardState::Relearning => &self.config.relearning_steps,
            _ => &self.config.learning_steps,
        }
    }

    fn graduate(&self, next: &mut ReviewState, elapsed: f64, now: Timestamp) {
        let raw = self
            .model
            .interval(next.stability, self.config.request_retention);
        let days = self.fuzzed_interval(raw, elapsed, next);
        self.schedule_review(next, days, now);
    }

    fn schedule_review(&self, next: &mut ReviewState, days: f64, now: Timestamp) {
        next.state = CardState::Review;
        next.learning_steps_index = 0;
        next.scheduled_days = days;
        next.due = now.saturating_add((days * DAY_MS as f64) as i64);
    }

    /// Interval for a successful review, keeping hard ≤ good < easy.
    fn review_interval(&self, prev: &ReviewState, grade: Grade, elapsed: f64) -> f64 {
        let retention = self.config.request_retention;
        let raw = |g: Grade| {
            let s = self.stability_after(prev, g, elapsed);
            self.clamp_interval(self.model.interval(s, retention))
        };

        let hard = raw(Grade::Hard);
        let mut good = raw(Grade::Good);
        let hard = hard.min(good);
        good = good.max(hard + 1.0);
        let easy = raw(Grade::Easy).max(good + 1.0);

        let chosen = match grade {
            Grade::Hard => hard,
            Grade::Good => good,
            Grade::Easy => easy,
            Grade::Again => hard,
        };
        let seed_state = ReviewState {
            reps: prev.reps.saturating_add(1),
            ..prev.clone()
        };
        self.fuzzed_interval(chosen, elapsed, &seed_state)
            .min(f64::from(self.config.maximum_interval))
    }

    fn clamp_interval(&self, days: f64) -> f64 {
        days.round().clamp(1.0, f64::from(self.config.maximum_interval))
    }

    /// Round and clamp an interval, spreading it when fuzzing is enabled.
    /// The spread is seeded from the review itself so results stay
    /// reproducible.
    fn fuzzed_interval(&self, days: f64, elapsed: f64, state: &ReviewState) -> f64 {
        let max = f64::from(self.config.maximum_interval);
        let days = self.clamp_interval(days);
        if !self.config.enable_fuzz || days < 2.5 {
            return days;
        }

        let delta = 1.0
            + FUZZ_RANGES
                .iter()
                .map(|(start, end, factor)| factor * (days.min(*end) - start).max(0.0))
                .sum::<f64>();
        let mut low = (days - delta).round().max(2.0);
        let high = (days + delta).round().min(max);
        if days > elapsed {
            low = low.max(elapsed.floor() + 1.0);
        }
        let low = low.min(high);

        let fraction = fuzz_fraction(state);
        (fraction * (high - low + 1.0) + low).floor().clamp(low, high)
    }
}

fn elapsed_days(last_review: Timestamp, now: Timestamp) -> f64 {
    now.saturating_sub(last_review).max(0) as f64 / DAY_MS as f64
}

/// Deterministic value in [0, 1) derived from the review inputs.
fn fuzz_fraction(state: &ReviewState) -> f64 {
    let mut x = (state.last_review.unwrap_or(state.due) as u64)
        ^ (u64::from(state.reps) << 32)
        ^ state.difficulty.to_bits().rotate_left(17)
        ^ state.stability.to_bits();
    // splitmix64 finalizer
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^= x >> 31;
    (x >> 11) as f64 / (1u64 << 53) as f64
}

fn check_finite(state: &ReviewState) -> Result<(), SchedulerError> {
    for (field, value) in [
        ("stability", state.stability),
        ("difficulty", state.difficulty),
        ("elapsed_days", state.elapsed_days),
        ("scheduled_days", state.scheduled_days),
    ] {
        if !value.is_finite() {
            return Err(SchedulerError::NonFinite { field });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Timestamp = 1_700_000_000_000;
    const MINUTE: i64 = 60_000;

    fn scheduler() -> Scheduler {
        Scheduler::default()
    }

    /// Walk a new item through to Review with Good, Good.
    fn graduated(s: &Scheduler) -> ReviewState {
        let first = s.review_once(&ReviewState::new(NOW), Grade::Good, NOW).unwrap();
        let due = first.due;
        s.review_once(&first, Grade::Good, due).unwrap()
    }

    #[test]
    fn new_item_enters_learning_steps() {
        let s = scheduler();
        let state = ReviewState::new(NOW);

        let again = s.review_once(&state, Grade::Again, NOW).unwrap();
        assert_eq!(again.state, CardState::Learning);
        assert_eq!(again.learning_steps_index, 0);
        assert_eq!(again.due, NOW + MINUTE);

        let hard = s.review_once(&state, Grade::Hard, NOW).unwrap();
        assert_eq!(hard.state, CardState::Learning);
        assert_eq!(hard.due, NOW + 11 * MINUTE / 2);

        let good = s.review_once(&state, Grade::Good, NOW).unwrap();
        assert_eq!(good.state, CardState::Learning);
        assert_eq!(good.learning_steps_index, 1);
        assert_eq!(good.due, NOW + 10 * MINUTE);
        assert_eq!(good.reps, 1);
        assert_eq!(good.last_review, Some(NOW));
    }

    #[test]
    fn easy_fast_tracks_to_review() {
        let s = scheduler();
        let easy = s.review_once(&ReviewState::new(NOW), Grade::Easy, NOW).unwrap();
        assert_eq!(easy.state, CardState::Review);
        assert!(easy.scheduled_days >= 1.0);
        assert!(easy.due >= NOW + DAY_MS);
    }

    #[test]
    fn good_on_last_step_graduates() {
        let s = scheduler();
        let state = graduated(&s);
        assert_eq!(state.state, CardState::Review);
        assert_eq!(state.learning_steps_index, 0);
        assert_eq!(state.reps, 2);
        assert_eq!(state.lapses, 0);
        assert!(state.scheduled_days >= 1.0);
    }

    #[test]
    fn again_in_learning_restarts_steps() {
        let s = scheduler();
        let first = s.review_once(&ReviewState::new(NOW), Grade::Good, NOW).unwrap();
        let again = s.review_once(&first, Grade::Again, first.due).unwrap();
        assert_eq!(again.state, CardState::Learning);
        assert_eq!(again.learning_steps_index, 0);
        assert_eq!(again.lapses, 0);
    }

    #[test]
    fn forgetting_in_review_relearns() {
        let s = scheduler();
        let review = graduated(&s);
        let lapse = s.review_once(&review, Grade::Again, review.due).unwrap();
        assert_eq!(lapse.state, CardState::Relearning);
        assert_eq!(lapse.lapses, 1);
        assert_eq!(lapse.due, review.due + 10 * MINUTE);
        assert!(lapse.stability < review.stability);

        let back = s.review_once(&lapse, Grade::Good, lapse.due).unwrap();
        assert_eq!(back.state, CardState::Review);
        assert_eq!(back.lapses, 1);
    }

    #[test]
    fn review_intervals_are_ordered() {
        let s = scheduler();
        let review = graduated(&s);
        let preview = s.preview_all(&review, review.due).unwrap();
        let hard = preview[&Grade::Hard].scheduled_days;
        let good = preview[&Grade::Good].scheduled_days;
        let easy = preview[&Grade::Easy].scheduled_days;
        assert!(hard <= good, "{hard} <= {good}");
        assert!(good < easy, "{good} < {easy}");
        assert_eq!(preview[&Grade::Again].state, CardState::Relearning);
    }

    #[test]
    fn preview_does_not_mutate_and_matches_commit() {
        let s = scheduler();
        let state = ReviewState::new(NOW);
        let before = state.clone();
        let preview = s.preview_all(&state, NOW).unwrap();
        assert_eq!(state, before);
        assert_eq!(preview.len(), 4);
        for grade in Grade::ALL {
            assert_eq!(preview[&grade], s.review_once(&state, grade, NOW).unwrap());
        }
    }

    #[test]
    fn review_is_deterministic() {
        let s = Scheduler::new(SchedulerConfig {
            enable_fuzz: true,
            ..Default::default()
        })
        .unwrap();
        let review = graduated(&s);
        let later = review.due + 3 * DAY_MS;
        assert_eq!(
            s.review_once(&review, Grade::Good, later).unwrap(),
            s.review_once(&review, Grade::Good, later).unwrap()
        );
    }

    #[test]
    fn manual_rating_is_always_rejected() {
        let s = scheduler();
        let mut states = vec![ReviewState::new(NOW)];
        let learning = s.review_once(&states[0], Grade::Good, NOW).unwrap();
        let review = s.review_once(&learning, Grade::Good, learning.due).unwrap();
        let relearning = s.review_once(&review, Grade::Again, review.due).unwrap();
        states.extend([learning, review, relearning]);

        for state in &states {
            assert!(matches!(
                s.review_rating(state, 0, NOW),
                Err(SchedulerError::InvalidGrade(_))
            ));
            assert!(s.review_rating(state, 9, NOW).is_err());
            assert!(s.review_rating(state, 3, NOW).is_ok());
        }
    }

    #[test]
    fn retrievability_is_monotonic() {
        let s = scheduler();
        let review = graduated(&s);
        let last = review.last_review.unwrap();
        let mut previous = s.retrievability_now(Some(&review), last);
        assert_eq!(previous, 1.0);
        for day in 1..60 {
            let r = s.retrievability_now(Some(&review), last + day * DAY_MS);
            assert!(r <= previous);
            assert!((0.0..=1.0).contains(&r));
            previous = r;
        }
        assert!(previous < 1.0);
    }

    #[test]
    fn unreviewed_items_have_full_retrievability() {
        let s = scheduler();
        assert_eq!(s.retrievability_now(None, NOW), 1.0);
        assert_eq!(s.retrievability_now(Some(&ReviewState::new(0)), NOW), 1.0);
    }

    #[test]
    fn intervals_respect_maximum() {
        let s = Scheduler::new(SchedulerConfig {
            maximum_interval: 3,
            ..Default::default()
        })
        .unwrap();
        let mut state = graduated(&s);
        for _ in 0..10 {
            state = s.review_once(&state, Grade::Easy, state.due).unwrap();
            assert!(state.scheduled_days <= 3.0);
        }
    }

    #[test]
    fn empty_steps_graduate_immediately() {
        let s = Scheduler::new(SchedulerConfig {
            learning_steps: vec![],
            relearning_steps: vec![],
            ..Default::default()
        })
        .unwrap();
        let first = s.review_once(&ReviewState::new(NOW), Grade::Again, NOW).unwrap();
        assert_eq!(first.state, CardState::Review);

        let lapse = s.review_once(&first, Grade::Again, first.due).unwrap();
        assert_eq!(lapse.state, CardState::Review);
        assert_eq!(lapse.lapses, 1);
    }

    #[test]
    fn suspended_flag_survives_review() {
        let s = scheduler();
        let mut state = ReviewState::new(NOW);
        state.set_suspended(true);
        let next = s.review_once(&state, Grade::Good, NOW).unwrap();
        assert!(next.is_suspended());
    }

    #[test]
    fn fuzz_stays_near_the_interval() {
        let plain = scheduler();
        let fuzzy = Scheduler::new(SchedulerConfig {
            enable_fuzz: true,
            ..Default::default()
        })
        .unwrap();
        let mut state = graduated(&plain);
        for _ in 0..4 {
            state = plain.review_once(&state, Grade::Good, state.due).unwrap();
        }
        let at = state.due;
        let exact = plain.review_once(&state, Grade::Good, at).unwrap().scheduled_days;
        let spread = fuzzy.review_once(&state, Grade::Good, at).unwrap().scheduled_days;
        assert!((spread - exact).abs() <= exact * 0.25 + 1.0, "{spread} vs {exact}");
    }

    #[test]
    fn non_finite_input_is_surfaced() {
        let s = scheduler();
        let mut state = graduated(&s);
        state.stability = f64::NAN;
        state.difficulty = f64::NAN;
        assert!(matches!(
            s.review_once(&state, Grade::Good, state.due),
            Err(SchedulerError::NonFinite { .. })
        ));
    }

    #[test]
    fn non_finite_retrievability_is_reported() {
        let s = scheduler();
        let mut state = graduated(&s);
        state.stability = f64::NAN;
        assert!(matches!(
            s.try_retrievability_now(Some(&state), state.due),
            Err(SchedulerError::NonFinite {
                field: "retrievability"
            })
        ));
        assert_eq!(s.retrievability_now(Some(&state), state.due), 1.0);

        let healthy = graduated(&s);
        let r = s.try_retrievability_now(Some(&healthy), healthy.due).unwrap();
        assert_eq!(r, s.retrievability_now(Some(&healthy), healthy.due));
        assert_eq!(s.try_retrievability_now(None, NOW).unwrap(), 1.0);
    }

    #[test]
    fn extreme_timestamps_saturate() {
        let s = scheduler();
        let late = i64::MAX - 1_000;

        let learning = s.review_once(&ReviewState::new(0), Grade::Good, late).unwrap();
        assert_eq!(learning.state, CardState::Learning);
        assert_eq!(learning.due, i64::MAX);

        let review = s.review_once(&ReviewState::new(0), Grade::Easy, late).unwrap();
        assert_eq!(review.state, CardState::Review);
        assert_eq!(review.due, i64::MAX);

        let mut ancient = graduated(&s);
        ancient.last_review = Some(i64::MIN);
        let next = s.review_once(&ancient, Grade::Good, late).unwrap();
        assert!(next.elapsed_days.is_finite() && next.elapsed_days > 0.0);
        assert_eq!(next.due, i64::MAX);

        let mut future = graduated(&s);
        future.last_review = Some(i64::MAX);
        let r = s.retrievability_now(Some(&future), i64::MIN);
        assert_eq!(r, 1.0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SchedulerConfig {
            request_retention: 0.0,
            ..Default::default()
        };
        assert!(Scheduler::new(config).is_err());
    }
}
