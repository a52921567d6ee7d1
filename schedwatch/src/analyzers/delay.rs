// schedwatch/src/analyzers/delay.rs
//
// Mean scheduling delay per automation: actual start − scheduled time, in
// minutes. Negative means the run started early. Runs without a scheduled
// time (or without a start) are left out of the mean, never counted as zero.

use std::collections::BTreeMap;

use tracing::debug;

use crate::instances::{mean, DelayRow};
use crate::state::InstanceStore;

pub fn analyze(store: &InstanceStore) -> Vec<DelayRow> {
    let mut per_name: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for run in store.automations() {
        if let Some(delay) = run.delay() {
            per_name.entry(run.name.as_str()).or_default().push(delay);
        }
    }

    let rows: Vec<DelayRow> = per_name
        .into_iter()
        .filter_map(|(name, delays)| {
            Some(DelayRow { name: name.to_string(), avg_delay_minutes: mean(&delays)? })
        })
        .collect();
    debug!("delay: {} automations with scheduled runs", rows.len());
    rows
}
