// schedwatch/src/analyzers/overlap.rs
//
// Schedule conflict detection: automation runs whose [start, end) windows
// intersect.
//
// Sweep line over runs sorted by start:
//   - active set holds runs whose end is still after the current start
//   - each new run is compared only against the active set
//   - touching endpoints (end == start) do not overlap
//   - runs sharing the exact same start are never compared (self-pairs and
//     duplicated export rows)
//
// Reduction: one row per unordered pair of automation *names*, keeping the
// instance pair with the longest overlap. Key = (min name, max name).
//
// Empty or inverted windows (end <= start) cannot intersect anything and are
// skipped. O(n log n + k) for k overlapping instance pairs.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::instances::{minutes_between, AutomationInstance, OverlapPair};
use crate::state::InstanceStore;

struct Span<'a> {
    name: &'a str,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// Overlap of two half-open windows in minutes, None when they do not intersect.
pub fn overlap_minutes(
    (s1, e1): (NaiveDateTime, NaiveDateTime),
    (s2, e2): (NaiveDateTime, NaiveDateTime),
) -> Option<f64> {
    if e1 > s2 && s1 < e2 {
        Some(minutes_between(s1.max(s2), e1.min(e2)))
    } else {
        None
    }
}

/// Orient a pair so the lexicographically smaller name comes first; same-name
/// pairs put the earlier run first.
fn canonical<'a>(a: &'a Span<'a>, b: &'a Span<'a>) -> (&'a Span<'a>, &'a Span<'a>) {
    if (a.name, a.start) <= (b.name, b.start) { (a, b) } else { (b, a) }
}

pub fn analyze(store: &InstanceStore) -> Vec<OverlapPair> {
    detect(store.automations())
}

pub fn detect(runs: &[AutomationInstance]) -> Vec<OverlapPair> {
    let mut spans: Vec<Span> = runs
        .iter()
        .filter_map(|r| {
            let (start, end) = r.interval()?;
            (end > start).then_some(Span { name: r.name.as_str(), start, end })
        })
        .collect();
    spans.sort_by_key(|s| (s.start, s.end));

    let mut best: BTreeMap<(&str, &str), OverlapPair> = BTreeMap::new();
    let mut active: Vec<usize> = Vec::new();
    let mut compared = 0usize;

    for (k, cur) in spans.iter().enumerate() {
        active.retain(|&a| spans[a].end > cur.start);

        for &a in &active {
            let prev = &spans[a];
            if prev.start == cur.start {
                continue;
            }
            compared += 1;
            let Some(minutes) = overlap_minutes((prev.start, prev.end), (cur.start, cur.end)) else {
                continue;
            };

            let (first, second) = canonical(prev, cur);
            let key = (first.name, second.name);
            let replace = best.get(&key).map_or(true, |p| minutes > p.overlap_minutes);
            if replace {
                best.insert(key, OverlapPair {
                    automation_1:    first.name.to_string(),
                    start_1:         first.start,
                    end_1:           first.end,
                    automation_2:    second.name.to_string(),
                    start_2:         second.start,
                    end_2:           second.end,
                    overlap_minutes: minutes,
                });
            }
        }
        active.push(k);
    }

    debug!("overlap: {} spans, {} active comparisons, {} name pairs", spans.len(), compared, best.len());
    best.into_values().collect()
}
