// schedwatch/src/analyzers/status.rs
//
// Status distribution within a date range, plus the runs behind one status.
// Counts are ordered most frequent first; when no status is chosen the most
// frequent one is detailed. Member ids are attached only when several business
// units are in the snapshot, error text only when detailing an error status.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::config::DateRange;
use crate::instances::{StatusCount, StatusDetail};
use crate::state::InstanceStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBreakdown {
    pub range: DateRange,
    pub counts: Vec<StatusCount>,
    pub selected: Option<String>,
    pub details: Vec<StatusDetail>,
}

/// Full span of start dates in the snapshot.
pub fn default_range(store: &InstanceStore) -> Option<DateRange> {
    let from = store.earliest_start()?.date();
    let to = store.latest_start()?.date();
    DateRange::new(from, to).ok()
}

pub fn analyze(store: &InstanceStore, range: DateRange, selected: Option<&str>) -> StatusBreakdown {
    let in_range: Vec<_> = store
        .automations()
        .iter()
        .filter(|r| r.start_time.map_or(false, |t| range.contains(t)))
        .collect();

    let mut tally: HashMap<&str, usize> = HashMap::new();
    for r in &in_range {
        *tally.entry(r.status.as_str()).or_default() += 1;
    }
    let mut counts: Vec<StatusCount> = tally
        .into_iter()
        .map(|(status, count)| StatusCount { status: status.to_string(), count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.status.cmp(&b.status)));

    let selected = selected
        .map(str::to_string)
        .or_else(|| counts.first().map(|c| c.status.clone()));

    let with_member = store.has_multiple_members();
    let details = match &selected {
        Some(status) => in_range
            .iter()
            .filter(|r| &r.status == status)
            .map(|r| StatusDetail {
                name: r.name.clone(),
                start_time: r.start_time,
                end_time: r.end_time,
                status: r.status.clone(),
                member_id: if with_member { r.member_id.clone() } else { None },
                error: if r.is_error() { r.error.clone() } else { None },
            })
            .collect(),
        None => Vec::new(),
    };

    debug!("status: {} runs in {}, {} statuses", in_range.len(), range, counts.len());
    StatusBreakdown { range, counts, selected, details }
}
