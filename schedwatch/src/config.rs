// schedwatch/src/config.rs
//
// Analyzer thresholds and per-session analysis parameters.
//
// Thresholds default to the values the dashboard has always used and can be
// overridden from a TOML file (`--config`) and then from SCHEDWATCH_* env vars:
//
//   rush_hour_min_count       = 3     # instances per scheduled hour slot
//   risk_duration_minutes     = 51.0  # hourly job "close to 1 hour"
//   hourly_min_count          = 48    # runs in the candidate days
//   recent_window             = 30    # most recent runs inspected
//   required_occurrences      = 2     # runs ≥ risk_duration_minutes
//   lookback_days             = 7
//   candidate_days            = 2
//   activity_timeout_minutes  = 20.0
//   query_activity_type       = 300
//   script_activity_type      = 423

use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AnalysisError, IngestError};
use crate::instances::ActivityKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub rush_hour_min_count: usize,
    pub risk_duration_minutes: f64,
    pub hourly_min_count: usize,
    pub recent_window: usize,
    pub required_occurrences: usize,
    pub lookback_days: i64,
    pub candidate_days: usize,
    pub activity_timeout_minutes: f64,
    pub query_activity_type: i64,
    pub script_activity_type: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rush_hour_min_count: 3,
            risk_duration_minutes: 51.0,
            hourly_min_count: 48,
            recent_window: 30,
            required_occurrences: 2,
            lookback_days: 7,
            candidate_days: 2,
            activity_timeout_minutes: 20.0,
            query_activity_type: 300,
            script_activity_type: 423,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

impl Thresholds {
    /// Defaults, then the optional TOML file, then env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, IngestError> {
        let mut thresholds = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p).map_err(|source| IngestError::Io {
                    path: p.display().to_string(),
                    source,
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        thresholds.apply_env();
        debug!(?thresholds, "Thresholds resolved");
        Ok(thresholds)
    }

    pub fn from_toml(text: &str) -> Result<Self, IngestError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("SCHEDWATCH_RUSH_HOUR_MIN_COUNT") { self.rush_hour_min_count = v; }
        if let Some(v) = env_parse("SCHEDWATCH_RISK_DURATION_MINUTES") { self.risk_duration_minutes = v; }
        if let Some(v) = env_parse("SCHEDWATCH_HOURLY_MIN_COUNT") { self.hourly_min_count = v; }
        if let Some(v) = env_parse("SCHEDWATCH_RECENT_WINDOW") { self.recent_window = v; }
        if let Some(v) = env_parse("SCHEDWATCH_REQUIRED_OCCURRENCES") { self.required_occurrences = v; }
        if let Some(v) = env_parse("SCHEDWATCH_ACTIVITY_TIMEOUT_MINUTES") { self.activity_timeout_minutes = v; }
    }

    pub fn activity_type(&self, kind: ActivityKind) -> i64 {
        match kind {
            ActivityKind::Query => self.query_activity_type,
            ActivityKind::Script => self.script_activity_type,
        }
    }
}

// ── Date ranges ───────────────────────────────────────────────────────────────

/// Inclusive calendar-date range; a timestamp matches when its date is in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AnalysisError> {
        if start > end {
            return Err(AnalysisError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        let d = ts.date();
        d >= self.start && d <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// Caller selections for one analysis session. Everything optional falls back
/// to a value derived from the snapshot.
#[derive(Debug, Clone, Default)]
pub struct AnalysisParams {
    pub first: Option<DateRange>,
    pub second: Option<DateRange>,
    pub status_range: Option<DateRange>,
    pub selected_status: Option<String>,
    pub selected_automation: Option<String>,
    pub rush_hour_month: Option<NaiveDate>,
}
