//! Core data model types for spaced.
//!
//! Items, their per-item memory record, and the grades a user can give when
//! reviewing one. The review record serializes with the camelCase keys that
//! external storage expects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SchedulerError;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Lifecycle stage of a review record.
///
/// Persisted as an integer: New = 0, Learning = 1, Review = 2, Relearning = 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CardState {
    New,
    Learning,
    Review,
    Relearning,
}

impl CardState {
    pub const ALL: [CardState; 4] = [
        CardState::New,
        CardState::Learning,
        CardState::Review,
        CardState::Relearning,
    ];
}

impl From<CardState> for u8 {
    fn from(state: CardState) -> Self {
        match state {
            CardState::New => 0,
            CardState::Learning => 1,
            CardState::Review => 2,
            CardState::Relearning => 3,
        }
    }
}

impl TryFrom<u8> for CardState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CardState::New),
            1 => Ok(CardState::Learning),
            2 => Ok(CardState::Review),
            3 => Ok(CardState::Relearning),
            other => Err(format!("unknown card state: {other}")),
        }
    }
}

impl fmt::Display for CardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardState::New => write!(f, "new"),
            CardState::Learning => write!(f, "learning"),
            CardState::Review => write!(f, "review"),
            CardState::Relearning => write!(f, "relearning"),
        }
    }
}

/// Per-item memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    /// When the item is next eligible for review.
    pub due: Timestamp,
    /// Modeled memory half-life in days.
    #[serde(default)]
    pub stability: f64,
    /// Item difficulty, roughly 1 to 10.
    #[serde(default)]
    pub difficulty: f64,
    /// Days between the last two reviews.
    #[serde(default)]
    pub elapsed_days: f64,
    /// Interval scheduled by the last review, in days.
    #[serde(default)]
    pub scheduled_days: f64,
    /// Position within the learning or relearning steps.
    #[serde(default)]
    pub learning_steps_index: u32,
    /// Number of committed reviews.
    #[serde(default)]
    pub reps: u32,
    /// Number of times the item was forgotten while in review.
    #[serde(default)]
    pub lapses: u32,
    #[serde(default = "default_state")]
    pub state: CardState,
    /// Time of the previous review, absent for never-reviewed items.
    #[serde(default)]
    pub last_review: Option<Timestamp>,
    /// Excluded from due queues. Not part of the memory model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended: Option<bool>,
}

fn default_state() -> CardState {
    CardState::New
}

impl ReviewState {
    /// A fresh record for an item that just became reviewable.
    pub fn new(now: Timestamp) -> Self {
        Self {
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0.0,
            scheduled_days: 0.0,
            learning_steps_index: 0,
            reps: 0,
            lapses: 0,
            state: CardState::New,
            last_review: None,
            suspended: None,
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.unwrap_or(false)
    }

    /// Set or clear the suspended flag. Memory fields are left untouched.
    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = Some(suspended);
    }

    /// Due for review at `now`: not suspended and `due <= now`.
    pub fn is_due(&self, now: Timestamp) -> bool {
        !self.is_suspended() && self.due <= now
    }

    /// Describe every broken invariant of this record.
    pub fn violations(&self) -> Vec<String> {
        let mut found = Vec::new();

        for (name, value) in [
            ("stability", self.stability),
            ("difficulty", self.difficulty),
            ("elapsedDays", self.elapsed_days),
            ("scheduledDays", self.scheduled_days),
        ] {
            if !value.is_finite() {
                found.push(format!("{name} is not a finite number"));
            } else if value < 0.0 {
                found.push(format!("{name} is negative ({value})"));
            }
        }

        if self.state == CardState::New {
            if self.reps != 0 {
                found.push(format!("new item has {} reps", self.reps));
            }
            if self.last_review.is_some() {
                found.push("new item has a lastReview".to_string());
            }
        } else if self.last_review.is_none() {
            found.push(format!("{} item has no lastReview", self.state));
        }

        found
    }
}

/// A user's rating of a recall attempt.
///
/// Stable numeric encoding across boundaries: Again = 1, Hard = 2, Good = 3,
/// Easy = 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn to_rating(self) -> u8 {
        match self {
            Grade::Again => 1,
            Grade::Hard => 2,
            Grade::Good => 3,
            Grade::Easy => 4,
        }
    }

    /// Decode a numeric rating. The reserved Manual code and anything
    /// outside 1..=4 fail with [`SchedulerError::InvalidGrade`].
    pub fn from_rating(code: u8) -> Result<Self, SchedulerError> {
        Rating::from_code(code)?.into_grade()
    }

    /// Numeric value used by the memory model formulas.
    pub(crate) fn value(self) -> f64 {
        f64::from(self.to_rating())
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Again => write!(f, "again"),
            Grade::Hard => write!(f, "hard"),
            Grade::Good => write!(f, "good"),
            Grade::Easy => write!(f, "easy"),
        }
    }
}

impl FromStr for Grade {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if let Ok(code) = s.parse::<u8>() {
            return Grade::from_rating(code);
        }
        match s.as_str() {
            "again" => Ok(Grade::Again),
            "hard" => Ok(Grade::Hard),
            "good" => Ok(Grade::Good),
            "easy" => Ok(Grade::Easy),
            "manual" => Rating::Manual.into_grade(),
            other => Err(SchedulerError::InvalidGrade(format!("unknown grade: {other}"))),
        }
    }
}

/// Raw rating as understood by the memory model. Code 0 is Manual, an
/// administrative reschedule that is never a valid review grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rating {
    Manual,
    Graded(Grade),
}

impl Rating {
    pub(crate) fn from_code(code: u8) -> Result<Self, SchedulerError> {
        match code {
            0 => Ok(Rating::Manual),
            1 => Ok(Rating::Graded(Grade::Again)),
            2 => Ok(Rating::Graded(Grade::Hard)),
            3 => Ok(Rating::Graded(Grade::Good)),
            4 => Ok(Rating::Graded(Grade::Easy)),
            other => Err(SchedulerError::InvalidGrade(format!(
                "rating {other} is out of range 1..=4"
            ))),
        }
    }

    pub(crate) fn into_grade(self) -> Result<Grade, SchedulerError> {
        match self {
            Rating::Graded(grade) => Ok(grade),
            Rating::Manual => Err(SchedulerError::InvalidGrade(
                "manual rating cannot be used to review an item".into(),
            )),
        }
    }
}

/// A reviewable unit: a problem, note or article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier within a deck.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Free-form tags; `namespace:value` tags double as structured attributes.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Content kind, e.g. "problem", "note" or "article".
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    /// Memory record, absent until the item is made reviewable.
    #[serde(default)]
    pub review: Option<ReviewState>,
}

impl Item {
    /// A new reviewable item created at `now`.
    pub fn new(id: impl Into<String>, title: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: String::new(),
            tags: Vec::new(),
            category: None,
            kind: None,
            score: None,
            created_at: Some(now),
            updated_at: Some(now),
            review: Some(ReviewState::new(now)),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Values of every tag in `namespace`, e.g. `company` for `company:acme`.
    pub fn namespaced_values<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags.iter().filter_map(move |tag| {
            let (ns, value) = tag.split_once(':')?;
            ns.eq_ignore_ascii_case(namespace).then_some(value)
        })
    }
}
