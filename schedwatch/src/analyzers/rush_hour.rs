// schedwatch/src/analyzers/rush_hour.rs
//
// Rush hours: scheduled-hour slots crowded with automations.
//
// Window = one full calendar month, by default the month before the latest
// scheduled time in the snapshot. Each scheduled time is truncated to HH:00;
// slots with at least `rush_hour_min_count` instances are reported, ordered by
// slot, with the automation names in table order.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, Timelike};
use tracing::debug;

use crate::config::Thresholds;
use crate::instances::RushHour;
use crate::state::InstanceStore;

/// First day of the month containing `d`.
fn month_start(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

/// `[first of month, first of next month)` for the month containing `day`.
pub fn month_window(day: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = month_start(day);
    let end = start.checked_add_months(Months::new(1))?;
    Some((start.and_hms_opt(0, 0, 0)?, end.and_hms_opt(0, 0, 0)?))
}

/// The full calendar month before the latest scheduled time.
pub fn previous_month_window(store: &InstanceStore) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let latest = store.latest_scheduled()?;
    let prev = month_start(latest.date()).checked_sub_months(Months::new(1))?;
    month_window(prev)
}

pub fn hour_slot(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date().and_hms_opt(ts.hour(), 0, 0).unwrap_or(ts)
}

pub fn analyze(
    store: &InstanceStore,
    month: Option<NaiveDate>,
    thresholds: &Thresholds,
) -> Vec<RushHour> {
    let window = match month {
        Some(day) => month_window(day),
        None => previous_month_window(store),
    };
    let Some((from, until)) = window else { return Vec::new() };

    let mut slots: BTreeMap<NaiveDateTime, Vec<String>> = BTreeMap::new();
    for run in store.automations() {
        let Some(sched) = run.scheduled_time else { continue };
        if sched < from || sched >= until {
            continue;
        }
        slots.entry(hour_slot(sched)).or_default().push(run.name.clone());
    }

    let n_slots = slots.len();
    let rush: Vec<RushHour> = slots
        .into_iter()
        .filter(|(_, names)| names.len() >= thresholds.rush_hour_min_count)
        .map(|(hour_slot, names)| RushHour { hour_slot, count: names.len(), names })
        .collect();

    debug!("rush_hour: window {}..{} {} slots, {} crowded", from, until, n_slots, rush.len());
    rush
}
