//! FSRS-6 memory model.
//!
//! Implements the published Free Spaced Repetition Scheduler equations with
//! its 21-parameter default weight table. Retrievability follows the power
//! forgetting curve `R(t, S) = (1 + f * t / S)^-w20`, where `f` is chosen so
//! that `R(S, S) = 0.9`.

use crate::error::SchedulerError;
use crate::model::Grade;
use crate::traits::MemoryModel;

/// Default FSRS-6 weights.
pub const DEFAULT_WEIGHTS: [f64; 21] = [
    0.212, 1.2931, 2.3065, 8.2956, 6.4133, 0.8334, 3.0194, 0.001, 1.8722, 0.1666, 0.796, 1.4835,
    0.0614, 0.2629, 1.6483, 0.6014, 1.8729, 0.5425, 0.0912, 0.0658, 0.1542,
];

/// Smallest stability the model will return.
pub const MIN_STABILITY: f64 = 0.01;

const MIN_DIFFICULTY: f64 = 1.0;
const MAX_DIFFICULTY: f64 = 10.0;

/// FSRS-6 with a fixed weight table.
#[derive(Debug, Clone)]
pub struct Fsrs {
    w: [f64; 21],
    decay: f64,
    factor: f64,
}

impl Fsrs {
    /// Build a model from a weight table. Exactly 21 finite weights are
    /// required and the decay weight (w20) must be positive.
    pub fn new(weights: &[f64]) -> Result<Self, SchedulerError> {
        let w: [f64; 21] = weights.try_into().map_err(|_| {
            SchedulerError::InvalidConfig(format!(
                "expected 21 weights, got {}",
                weights.len()
            ))
        })?;

        if let Some(i) = w.iter().position(|v| !v.is_finite()) {
            return Err(SchedulerError::InvalidConfig(format!(
                "weight w{i} is not finite"
            )));
        }
        if w[20] <= 0.0 {
            return Err(SchedulerError::InvalidConfig(
                "decay weight w20 must be positive".into(),
            ));
        }

        let decay = -w[20];
        let factor = 0.9f64.powf(1.0 / decay) - 1.0;
        Ok(Self { w, decay, factor })
    }

    fn raw_init_difficulty(&self, grade: Grade) -> f64 {
        self.w[4] - (self.w[5] * (grade.value() - 1.0)).exp() + 1.0
    }
}

impl Default for Fsrs {
    fn default() -> Self {
        let decay = -DEFAULT_WEIGHTS[20];
        Self {
            w: DEFAULT_WEIGHTS,
            decay,
            factor: 0.9f64.powf(1.0 / decay) - 1.0,
        }
    }
}

fn clamp_difficulty(d: f64) -> f64 {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

impl MemoryModel for Fsrs {
    fn name(&self) -> &str {
        "fsrs-6"
    }

    fn init_stability(&self, grade: Grade) -> f64 {
        let index = usize::from(grade.to_rating() - 1);
        self.w[index].max(0.1)
    }

    fn init_difficulty(&self, grade: Grade) -> f64 {
        clamp_difficulty(self.raw_init_difficulty(grade))
    }

    fn next_difficulty(&self, difficulty: f64, grade: Grade) -> f64 {
        let delta = -self.w[6] * (grade.value() - 3.0);
        // Linear damping: changes shrink as difficulty approaches 10.
        let damped = difficulty + delta * (10.0 - difficulty) / 9.0;
        let target = self.raw_init_difficulty(Grade::Easy);
        clamp_difficulty(self.w[7] * target + (1.0 - self.w[7]) * damped)
    }

    fn recall_stability(
        &self,
        difficulty: f64,
        stability: f64,
        retrievability: f64,
        grade: Grade,
    ) -> f64 {
        let w = &self.w;
        let hard_penalty = if grade == Grade::Hard { w[15] } else { 1.0 };
        let easy_bonus = if grade == Grade::Easy { w[16] } else { 1.0 };
        let growth = w[8].exp()
            * (11.0 - difficulty)
            * stability.powf(-w[9])
            * ((1.0 - retrievability) * w[10]).exp_m1()
            * hard_penalty
            * easy_bonus;
        (stability * (1.0 + growth)).max(MIN_STABILITY)
    }

    fn forget_stability(&self, difficulty: f64, stability: f64, retrievability: f64) -> f64 {
        let w = &self.w;
        let long_term = w[11]
            * difficulty.powf(-w[12])
            * ((stability + 1.0).powf(w[13]) - 1.0)
            * ((1.0 - retrievability) * w[14]).exp();
        let short_term_cap = stability / (w[17] * w[18]).exp();
        long_term.min(short_term_cap).max(MIN_STABILITY)
    }

    fn short_term_stability(&self, stability: f64, grade: Grade) -> f64 {
        let w = &self.w;
        let mut increase = (w[17] * (grade.value() - 3.0 + w[18])).exp()
            * stability.max(MIN_STABILITY).powf(-w[19]);
        if matches!(grade, Grade::Good | Grade::Easy) {
            increase = increase.max(1.0);
        }
        (stability * increase).max(MIN_STABILITY)
    }

    fn retrievability(&self, elapsed_days: f64, stability: f64) -> f64 {
        let t = elapsed_days.max(0.0);
        (1.0 + self.factor * t / stability.max(MIN_STABILITY)).powf(self.decay)
    }

    fn interval(&self, stability: f64, request_retention: f64) -> f64 {
        stability / self.factor * (request_retention.powf(1.0 / self.decay) - 1.0)
    }
}
