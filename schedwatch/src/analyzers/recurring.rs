// schedwatch/src/analyzers/recurring.rs
//
// Recurring-risk: hourly automations whose run time is creeping toward the
// 60-minute execution window.
//
// Stage 1 (cadence):
//   Take runs from the last `lookback_days` (relative to the latest start),
//   keep only the last `candidate_days` distinct calendar days in that slice,
//   count per automation. ≥ `hourly_min_count` → hourly candidate.
//
// Stage 2 (duration history), candidates only:
//   The `recent_window` newest runs across the whole snapshot.
//   avg_above_threshold    : mean duration  > risk_duration_minutes
//   count_above_threshold  : ≥ required_occurrences runs with
//                            duration ≥ risk_duration_minutes
//   The average check wins when both hold. Neither → not reported.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::config::Thresholds;
use crate::instances::{mean, RiskFinding, RiskReason};
use crate::state::InstanceStore;

/// Automations with an hourly cadence in the most recent candidate days,
/// in name order.
pub fn hourly_candidates(store: &InstanceStore, thresholds: &Thresholds) -> Vec<String> {
    let recent = store.started_within_days(thresholds.lookback_days);

    let days: BTreeSet<NaiveDate> = recent
        .iter()
        .filter_map(|r| r.start_time.map(|t| t.date()))
        .collect();
    let selected: BTreeSet<NaiveDate> = days
        .iter()
        .rev()
        .take(thresholds.candidate_days)
        .copied()
        .collect();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in &recent {
        if r.start_time.map_or(false, |t| selected.contains(&t.date())) {
            *counts.entry(r.name.as_str()).or_default() += 1;
        }
    }

    debug!("recurring: days={:?} per-automation counts={:?}", selected, counts);
    counts
        .into_iter()
        .filter(|(_, n)| *n >= thresholds.hourly_min_count)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Duration check over one candidate's newest runs.
pub fn evaluate(store: &InstanceStore, name: &str, thresholds: &Thresholds) -> Option<RiskReason> {
    let durations: Vec<f64> = store
        .latest_runs(name, thresholds.recent_window)
        .iter()
        .filter_map(|r| r.duration())
        .collect();

    let limit = thresholds.risk_duration_minutes;
    let over = durations.iter().filter(|&&d| d >= limit).count();

    match mean(&durations) {
        Some(avg) if avg > limit => Some(RiskReason::AvgAboveThreshold { avg_minutes: avg, threshold: limit }),
        _ if over >= thresholds.required_occurrences => {
            Some(RiskReason::CountAboveThreshold { count: over, threshold: limit })
        }
        _ => None,
    }
}

pub fn analyze(store: &InstanceStore, thresholds: &Thresholds) -> Vec<RiskFinding> {
    let candidates = hourly_candidates(store, thresholds);
    let findings: Vec<RiskFinding> = candidates
        .iter()
        .filter_map(|name| {
            evaluate(store, name, thresholds).map(|reason| RiskFinding { name: name.clone(), reason })
        })
        .collect();
    debug!("recurring: {} hourly candidates, {} at risk", candidates.len(), findings.len());
    findings
}
