//! Subcommand implementations and the helpers they share.

pub mod add;
pub mod init;
pub mod preview;
pub mod query;
pub mod review;
pub mod stats;
pub mod suspend;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};

use spaced_core::config::{load_config_from, SpacedConfig};
use spaced_core::deck::{load_deck, Deck};
use spaced_core::error::SchedulerError;
use spaced_core::model::{Item, Timestamp};
use spaced_core::scheduler::Scheduler;

/// Resolved configuration plus the scheduler built from it.
pub struct Session {
    pub config: SpacedConfig,
    pub scheduler: Scheduler,
}

impl Session {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let scheduler = Scheduler::new(config.scheduler.clone())?;
        Ok(Self { config, scheduler })
    }

    /// The deck named on the command line, or the configured default.
    pub fn deck_path(&self, deck: Option<PathBuf>) -> PathBuf {
        deck.unwrap_or_else(|| self.config.default_deck.clone())
    }
}

/// Parse `--now`: RFC 3339 or milliseconds since the epoch. Absent means the
/// current time.
pub fn resolve_now(now: Option<&str>) -> Result<Timestamp> {
    let Some(raw) = now.map(str::trim) else {
        return Ok(Utc::now().timestamp_millis());
    };

    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms);
    }

    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid --now (expected RFC 3339 or epoch ms): {raw}"))?;
    Ok(parsed.timestamp_millis())
}

/// Render a millisecond timestamp for humans.
pub fn format_time(ms: Timestamp) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => ms.to_string(),
    }
}

/// Load a deck and look up one item in it.
pub fn load_item(path: &Path, id: &str) -> Result<(Deck, usize)> {
    let deck = load_deck(path)?;
    let index = deck
        .items
        .iter()
        .position(|item: &Item| item.id == id)
        .with_context(|| format!("no item '{id}' in {}", path.display()))?;
    Ok((deck, index))
}

/// Attach a pointer to `spaced validate` when scheduling failed because of
/// the stored record rather than the command-line input.
pub fn scheduling_error(item_id: &str, err: SchedulerError) -> anyhow::Error {
    if err.is_caller_error() {
        anyhow::Error::new(err)
    } else {
        anyhow::Error::new(err).context(format!(
            "cannot schedule '{item_id}'; its review state may be corrupt (run `spaced validate`)"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_accepts_millis_and_rfc3339() {
        assert_eq!(resolve_now(Some("86400000")).unwrap(), 86_400_000);
        assert_eq!(
            resolve_now(Some("1970-01-02T00:00:00Z")).unwrap(),
            86_400_000
        );
        assert_eq!(
            resolve_now(Some("1970-01-02T02:00:00+02:00")).unwrap(),
            86_400_000
        );
        assert!(resolve_now(Some("yesterday")).is_err());
        assert!(resolve_now(None).unwrap() > 0);
    }

    #[test]
    fn stored_record_faults_point_at_validate() {
        let fault = scheduling_error("two-sum", SchedulerError::NonFinite { field: "stability" });
        let message = format!("{fault:#}");
        assert!(message.contains("cannot schedule 'two-sum'"));
        assert!(message.contains("non-finite stability"));

        let input = scheduling_error("two-sum", SchedulerError::InvalidGrade("manual".into()));
        assert!(!format!("{input:#}").contains("spaced validate"));
    }

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(0), "1970-01-01 00:00");
    }
}
