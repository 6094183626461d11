//! Scheduler configuration and config file loading.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::fsrs::DEFAULT_WEIGHTS;

/// A learning or relearning step, written as `<n>s`, `<n>m`, `<n>h` or
/// `<n>d` (e.g. `"10m"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Step {
    millis: i64,
}

impl Step {
    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            millis: minutes.saturating_mul(60_000),
        }
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("step '{s}' is missing a unit (s, m, h or d)"))?;
        let (amount, unit) = s.split_at(split);
        let amount: i64 = amount
            .parse()
            .map_err(|_| format!("step '{s}' does not start with a whole number"))?;
        let unit_ms = match unit {
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            other => return Err(format!("unknown step unit '{other}' in '{s}'")),
        };
        if amount == 0 {
            return Err(format!("step '{s}' must be longer than zero"));
        }
        let millis = amount
            .checked_mul(unit_ms)
            .ok_or_else(|| format!("step '{s}' is too long"))?;
        Ok(Step { millis })
    }
}

impl TryFrom<String> for Step {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Step> for String {
    fn from(step: Step) -> Self {
        step.to_string()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.millis;
        if ms % 86_400_000 == 0 {
            write!(f, "{}d", ms / 86_400_000)
        } else if ms % 3_600_000 == 0 {
            write!(f, "{}h", ms / 3_600_000)
        } else if ms % 60_000 == 0 {
            write!(f, "{}m", ms / 60_000)
        } else {
            write!(f, "{}s", ms / 1_000)
        }
    }
}

/// Scheduling parameters shared by every review. Immutable once a
/// [`crate::scheduler::Scheduler`] has been built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Target probability of recall when an item comes due.
    #[serde(default = "default_retention")]
    pub request_retention: f64,
    /// Longest interval ever scheduled, in days.
    #[serde(default = "default_max_interval")]
    pub maximum_interval: u32,
    /// Spread review intervals slightly so items added together drift apart.
    #[serde(default)]
    pub enable_fuzz: bool,
    /// Use the short-term stability formula for same-day reviews.
    #[serde(default = "default_true")]
    pub enable_short_term: bool,
    #[serde(default = "default_learning_steps")]
    pub learning_steps: Vec<Step>,
    #[serde(default = "default_relearning_steps")]
    pub relearning_steps: Vec<Step>,
    /// Memory model weight override; the model's defaults when absent.
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

fn default_retention() -> f64 {
    0.9
}
fn default_max_interval() -> u32 {
    36_500
}
fn default_true() -> bool {
    true
}
fn default_learning_steps() -> Vec<Step> {
    vec![Step::from_minutes(1), Step::from_minutes(10)]
}
fn default_relearning_steps() -> Vec<Step> {
    vec![Step::from_minutes(10)]
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            request_retention: default_retention(),
            maximum_interval: default_max_interval(),
            enable_fuzz: false,
            enable_short_term: true,
            learning_steps: default_learning_steps(),
            relearning_steps: default_relearning_steps(),
            weights: None,
        }
    }
}

impl SchedulerConfig {
    /// Check ranges. Called by the scheduler constructor.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !(self.request_retention > 0.0 && self.request_retention < 1.0) {
            return Err(SchedulerError::InvalidConfig(format!(
                "request_retention must be between 0 and 1 (exclusive), got {}",
                self.request_retention
            )));
        }
        if self.maximum_interval == 0 {
            return Err(SchedulerError::InvalidConfig(
                "maximum_interval must be at least 1 day".into(),
            ));
        }
        if let Some(weights) = &self.weights {
            if weights.len() != DEFAULT_WEIGHTS.len() {
                return Err(SchedulerError::InvalidConfig(format!(
                    "expected {} weights, got {}",
                    DEFAULT_WEIGHTS.len(),
                    weights.len()
                )));
            }
        }
        Ok(())
    }
}

/// Top-level spaced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacedConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Deck used when a command is not given `--deck`.
    #[serde(default = "default_deck")]
    pub default_deck: PathBuf,
}

fn default_deck() -> PathBuf {
    PathBuf::from("decks/default.toml")
}

impl Default for SpacedConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            default_deck: default_deck(),
        }
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order when no path is given:
/// 1. `spaced.toml` in the current directory
/// 2. `~/.config/spaced/config.toml`
///
/// Environment variable overrides: `SPACED_RETENTION`, `SPACED_MAX_INTERVAL`,
/// `SPACED_FUZZ`, `SPACED_DECK`.
pub fn load_config_from(path: Option<&Path>) -> Result<SpacedConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("spaced.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => SpacedConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.scheduler.validate()?;

    Ok(config)
}

/// Parse a TOML config string (useful for testing).
pub fn parse_config_str(content: &str) -> Result<SpacedConfig> {
    Ok(toml::from_str(content)?)
}

fn apply_env_overrides(config: &mut SpacedConfig) -> Result<()> {
    if let Ok(value) = std::env::var("SPACED_RETENTION") {
        config.scheduler.request_retention = value
            .parse()
            .with_context(|| format!("SPACED_RETENTION is not a number: {value}"))?;
    }
    if let Ok(value) = std::env::var("SPACED_MAX_INTERVAL") {
        config.scheduler.maximum_interval = value
            .parse()
            .with_context(|| format!("SPACED_MAX_INTERVAL is not a whole number: {value}"))?;
    }
    if let Ok(value) = std::env::var("SPACED_FUZZ") {
        config.scheduler.enable_fuzz = matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    if let Ok(value) = std::env::var("SPACED_DECK") {
        config.default_deck = PathBuf::from(value);
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("spaced"))
}
