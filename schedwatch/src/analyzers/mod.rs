pub mod activity_timeout;
pub mod delay;
pub mod overlap;
pub mod recurring;
pub mod rush_hour;
pub mod status;
pub mod timeframe;
pub mod timeline;
pub mod trend;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use crate::config::{AnalysisParams, DateRange, Thresholds};
use crate::instances::{
    ActivityKind, ActivityRisk, ComparisonRow, DelayRow, OverlapPair, RiskFinding, RushHour,
    TimelineRow, TrendPoint,
};
use crate::state::InstanceStore;
use status::StatusBreakdown;

/// Report sections, in dashboard order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Status,
    Trend,
    Compare,
    Risky,
    Delays,
    RushHours,
    Overlaps,
    Timeline,
    Activities,
}

impl Section {
    pub const ALL: [Section; 9] = [
        Section::Status,
        Section::Trend,
        Section::Compare,
        Section::Risky,
        Section::Delays,
        Section::RushHours,
        Section::Overlaps,
        Section::Timeline,
        Section::Activities,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub automation: String,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Comparison {
    Compared {
        first: DateRange,
        second: DateRange,
        rows: Vec<ComparisonRow>,
    },
    Rejected {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RushHours {
    pub window_start: Option<NaiveDateTime>,
    pub window_end: Option<NaiveDateTime>,
    pub slots: Vec<RushHour>,
}

/// Everything one analysis session produced. Sections that were not requested
/// stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub n_automations: usize,
    pub n_activities: usize,
    pub members: Vec<String>,
    pub status: Option<StatusBreakdown>,
    pub trend: Option<Trend>,
    pub comparison: Option<Comparison>,
    pub risky: Option<Vec<RiskFinding>>,
    pub delays: Option<Vec<DelayRow>>,
    pub rush_hours: Option<RushHours>,
    pub overlaps: Option<Vec<OverlapPair>>,
    pub timeline: Option<Vec<TimelineRow>>,
    pub query_risk: Option<Vec<ActivityRisk>>,
    pub script_risk: Option<Vec<ActivityRisk>>,
}

/// Default comparison: the first week of the month before the latest run
/// against the last seven days of the snapshot.
pub fn default_timeframes(store: &InstanceStore) -> Option<(DateRange, DateRange)> {
    let latest = store.latest_start()?.date();
    let month_start = NaiveDate::from_ymd_opt(latest.year(), latest.month(), 1)?;
    let prev = month_start.checked_sub_months(Months::new(1))?;
    let first = DateRange::new(prev, prev + Duration::days(6)).ok()?;
    let second = DateRange::new(latest - Duration::days(7), latest).ok()?;
    Some((first, second))
}

/// Run the requested analyzers over one snapshot.
pub fn run_all(
    store: &InstanceStore,
    params: &AnalysisParams,
    thresholds: &Thresholds,
    sections: &[Section],
) -> Report {
    let wants = |s: Section| sections.contains(&s);
    let mut report = Report {
        n_automations: store.automations().len(),
        n_activities: store.activities().len(),
        members: store.member_ids().into_iter().map(str::to_string).collect(),
        ..Report::default()
    };

    if wants(Section::Status) {
        let range = params.status_range.or_else(|| status::default_range(store));
        report.status = range.map(|r| status::analyze(store, r, params.selected_status.as_deref()));
    }

    if wants(Section::Trend) {
        let name = params
            .selected_automation
            .clone()
            .or_else(|| store.names().first().map(|n| n.to_string()));
        report.trend = name.map(|automation| Trend {
            points: trend::analyze(store, &automation),
            automation,
        });
    }

    if wants(Section::Compare) {
        let ranges = match (params.first, params.second) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => default_timeframes(store),
        };
        report.comparison = ranges.map(|(first, second)| {
            match timeframe::analyze(store, &first, &second, store.has_multiple_members()) {
                Ok(rows) => Comparison::Compared { first, second, rows },
                Err(e) => Comparison::Rejected { message: e.to_string() },
            }
        });
    }

    if wants(Section::Risky) {
        report.risky = Some(recurring::analyze(store, thresholds));
    }

    if wants(Section::Delays) {
        report.delays = Some(delay::analyze(store));
    }

    if wants(Section::RushHours) {
        let window = match params.rush_hour_month {
            Some(day) => rush_hour::month_window(day),
            None => rush_hour::previous_month_window(store),
        };
        report.rush_hours = Some(RushHours {
            window_start: window.map(|w| w.0),
            window_end: window.map(|w| w.1),
            slots: rush_hour::analyze(store, params.rush_hour_month, thresholds),
        });
    }

    if wants(Section::Overlaps) {
        report.overlaps = Some(overlap::analyze(store));
    }

    if wants(Section::Timeline) {
        report.timeline = Some(timeline::analyze(store));
    }

    if wants(Section::Activities) {
        report.query_risk = Some(activity_timeout::analyze(store, ActivityKind::Query, thresholds));
        report.script_risk = Some(activity_timeout::analyze(store, ActivityKind::Script, thresholds));
    }

    info!(
        "Analysis done: risky={} delayed={} rush_hours={} overlaps={} slow_queries={} slow_scripts={}",
        report.risky.as_ref().map_or(0, Vec::len),
        report.delays.as_ref().map_or(0, Vec::len),
        report.rush_hours.as_ref().map_or(0, |r| r.slots.len()),
        report.overlaps.as_ref().map_or(0, Vec::len),
        report.query_risk.as_ref().map_or(0, Vec::len),
        report.script_risk.as_ref().map_or(0, Vec::len),
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::run;

    #[test]
    fn default_timeframes_are_ordered() {
        let store = InstanceStore::new(vec![run("A", "2024-03-03 10:00", "2024-03-03 10:05")], vec![]);
        let (first, second) = default_timeframes(&store).unwrap();
        assert_eq!(first.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(first.end, NaiveDate::from_ymd_opt(2024, 2, 7).unwrap());
        assert_eq!(second.start, NaiveDate::from_ymd_opt(2024, 2, 25).unwrap());
        assert!(timeframe::validate(&first, &second).is_ok());
    }

    #[test]
    fn only_requested_sections_are_filled() {
        let store = InstanceStore::new(
            vec![
                run("A", "2024-03-03 10:00", "2024-03-03 10:05"),
                run("B", "2024-03-03 10:03", "2024-03-03 10:10"),
            ],
            vec![],
        );
        let report = run_all(&store, &AnalysisParams::default(), &Thresholds::default(), &[Section::Overlaps]);
        assert_eq!(report.overlaps.as_ref().map(Vec::len), Some(1));
        assert!(report.status.is_none());
        assert!(report.delays.is_none());
        assert_eq!(report.n_automations, 2);
    }

    #[test]
    fn invalid_timeframes_reported_not_computed() {
        let store = InstanceStore::new(vec![run("A", "2024-01-03 10:00", "2024-01-03 10:05")], vec![]);
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let params = AnalysisParams {
            first: Some(DateRange::new(d(1), d(7)).unwrap()),
            second: Some(DateRange::new(d(1), d(5)).unwrap()),
            ..AnalysisParams::default()
        };
        let report = run_all(&store, &params, &Thresholds::default(), &[Section::Compare]);
        match report.comparison {
            Some(Comparison::Rejected { message }) => assert!(message.contains("must be earlier")),
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
