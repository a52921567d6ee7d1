// schedwatch/src/instances.rs
//
// Shared record types and all derived table rows flowing through schedwatch.
// Input records are produced by `ingest`; every analyzer returns a Vec of one
// of the row types below, ready for direct display or JSON export.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Minutes between two timestamps, fractional to the second.
pub fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / 60.0
}

/// Arithmetic mean; None for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

// ── Input records ─────────────────────────────────────────────────────────────

/// One execution run of a scheduled automation.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationInstance {
    pub name: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub scheduled_time: Option<NaiveDateTime>,
    pub status: String,
    pub error: Option<String>,
    pub member_id: Option<String>, // business unit
    pub customer_key: Option<String>, // joins to ActivityInstance.customer_key
}

impl AutomationInstance {
    /// end − start in minutes. Negative when the log has end < start.
    pub fn duration(&self) -> Option<f64> {
        Some(minutes_between(self.start_time?, self.end_time?))
    }

    /// Actual start minus scheduled time, in minutes.
    pub fn delay(&self) -> Option<f64> {
        Some(minutes_between(self.scheduled_time?, self.start_time?))
    }

    /// `[start, end)` when both endpoints are known.
    pub fn interval(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.start_time?, self.end_time?))
    }

    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }
}

/// One sub-step (query, script, ...) inside an automation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityInstance {
    pub automation_name: String,
    pub activity_type: i64,
    pub activity_name: String,
    pub activity_start_time: Option<NaiveDateTime>,
    pub activity_end_time: Option<NaiveDateTime>,
    pub status: String,
    pub status_details: Option<String>,
    pub customer_key: Option<String>,
}

impl ActivityInstance {
    pub fn duration(&self) -> Option<f64> {
        Some(minutes_between(self.activity_start_time?, self.activity_end_time?))
    }
}

/// Activity categories screened for time-out risk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Query,
    Script,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Script => write!(f, "script"),
        }
    }
}

// ── Derived rows ──────────────────────────────────────────────────────────────

/// Longest overlap observed between two automations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapPair {
    pub automation_1: String,
    pub start_1: NaiveDateTime,
    pub end_1: NaiveDateTime,
    pub automation_2: String,
    pub start_2: NaiveDateTime,
    pub end_2: NaiveDateTime,
    pub overlap_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RushHour {
    pub hour_slot: NaiveDateTime,
    pub count: usize,
    pub names: Vec<String>,
}

/// Why a recurring automation was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RiskReason {
    AvgAboveThreshold { avg_minutes: f64, threshold: f64 },
    CountAboveThreshold { count: usize, threshold: f64 },
}

impl RiskReason {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AvgAboveThreshold { .. } => "avg_above_threshold",
            Self::CountAboveThreshold { .. } => "count_above_threshold",
        }
    }
}

impl std::fmt::Display for RiskReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AvgAboveThreshold { avg_minutes, threshold } => write!(
                f,
                "Avg duration {:.1} min is above {} min",
                avg_minutes, threshold
            ),
            Self::CountAboveThreshold { count, threshold } => write!(
                f,
                "There have been {} occurrences over {} min",
                count, threshold
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub name: String,
    #[serde(flatten)]
    pub reason: RiskReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayRow {
    pub name: String,
    pub avg_delay_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub name: String,
    pub member_id: Option<String>,
    pub avg_first: f64,
    pub avg_second: f64,
    pub increased: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRisk {
    pub kind: ActivityKind,
    pub activity_name: String,
    pub automation_name: Option<String>,
    pub member_id: Option<String>,
    pub avg_duration_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDetail {
    pub name: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub avg_duration_minutes: f64,
}

impl TrendPoint {
    pub fn label(&self) -> String {
        format!("{}/{}", self.week_start, self.week_end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub display_name: String,
    pub name: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub member_id: Option<String>,
    pub duration_minutes: f64,
}
