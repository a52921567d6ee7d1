// schedwatch/src/analyzers/timeline.rs
//
// Gantt rows for every run with both endpoints, ordered by start. The display
// label is prefixed with the member id once more than one business unit is
// present, so identically named automations from different units separate.

use crate::instances::TimelineRow;
use crate::state::InstanceStore;

pub fn analyze(store: &InstanceStore) -> Vec<TimelineRow> {
    let prefixed = store.has_multiple_members();
    let mut rows: Vec<TimelineRow> = store
        .automations()
        .iter()
        .filter_map(|r| {
            let (start_time, end_time) = r.interval()?;
            let display_name = match (&r.member_id, prefixed) {
                (Some(m), true) => format!("{} | {}", m, r.name),
                _ => r.name.clone(),
            };
            Some(TimelineRow {
                display_name,
                name: r.name.clone(),
                start_time,
                end_time,
                member_id: r.member_id.clone(),
                duration_minutes: r.duration()?,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.display_name.cmp(&b.display_name)));
    rows
}
