// schedwatch/src/analyzers/trend.rs
//
// Weekly mean duration for one automation (Monday–Sunday weeks).

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::instances::{mean, TrendPoint};
use crate::state::InstanceStore;

pub fn week_of(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

pub fn analyze(store: &InstanceStore, name: &str) -> Vec<TrendPoint> {
    let mut weeks: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for run in store.runs_of(name) {
        let (Some(start), Some(d)) = (run.start_time, run.duration()) else { continue };
        weeks.entry(week_of(start.date())).or_default().push(d);
    }

    let points: Vec<TrendPoint> = weeks
        .into_iter()
        .filter_map(|(week_start, ds)| {
            Some(TrendPoint {
                week_start,
                week_end: week_start + Duration::days(6),
                avg_duration_minutes: mean(&ds)?,
            })
        })
        .collect();
    debug!("trend[{}]: {} weeks", name, points.len());
    points
}
