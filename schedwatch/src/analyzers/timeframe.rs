// schedwatch/src/analyzers/timeframe.rs
//
// Performance comparison between two timeframes.
//
// Range 1 must end strictly before range 2 begins; anything else is rejected
// before any work is done. Runs are assigned by start date, averaged per
// automation (per automation + member id when several business units are in
// play), outer-joined with 0 for a side with no runs, and rows that are 0 on
// both sides dropped. `increased` marks rows whose second mean is higher.
// If either range holds no runs at all there is nothing to compare.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::DateRange;
use crate::error::AnalysisError;
use crate::instances::{mean, ComparisonRow};
use crate::state::InstanceStore;

type GroupKey = (String, Option<String>);

pub fn validate(first: &DateRange, second: &DateRange) -> Result<(), AnalysisError> {
    if first.end >= second.start {
        return Err(AnalysisError::TimeframeOrder {
            first_end: first.end,
            second_start: second.start,
        });
    }
    Ok(())
}

fn group_means(store: &InstanceStore, range: &DateRange, by_member: bool) -> BTreeMap<GroupKey, f64> {
    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    for run in store.automations() {
        let Some(start) = run.start_time else { continue };
        if !range.contains(start) {
            continue;
        }
        let member = if by_member { run.member_id.clone() } else { None };
        let durations = groups.entry((run.name.clone(), member)).or_default();
        if let Some(d) = run.duration() {
            durations.push(d);
        }
    }
    groups
        .into_iter()
        .map(|(key, ds)| (key, mean(&ds).unwrap_or(0.0)))
        .collect()
}

pub fn analyze(
    store: &InstanceStore,
    first: &DateRange,
    second: &DateRange,
    by_member: bool,
) -> Result<Vec<ComparisonRow>, AnalysisError> {
    if let Err(e) = validate(first, second) {
        warn!("timeframe: {}", e);
        return Err(e);
    }

    let mut before = group_means(store, first, by_member);
    let after = group_means(store, second, by_member);
    debug!("timeframe: {} groups in {}, {} groups in {}", before.len(), first, after.len(), second);
    if before.is_empty() || after.is_empty() {
        return Ok(Vec::new());
    }

    let mut joined: BTreeMap<GroupKey, (f64, f64)> = BTreeMap::new();
    for (key, avg) in after {
        let prior = before.remove(&key).unwrap_or(0.0);
        joined.insert(key, (prior, avg));
    }
    for (key, avg) in before {
        joined.insert(key, (avg, 0.0));
    }

    Ok(joined
        .into_iter()
        .filter(|(_, (a, b))| !(*a == 0.0 && *b == 0.0))
        .map(|((name, member_id), (avg_first, avg_second))| ComparisonRow {
            name,
            member_id,
            avg_first,
            avg_second,
            increased: avg_second > avg_first,
        })
        .collect())
}
