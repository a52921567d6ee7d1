// schedwatch/src/state/store.rs
//
// Immutable instance snapshot shared by every analyzer.
//
// Design:
//   - Two flat tables (automation runs, activity steps) loaded once per session
//   - No interior mutability: narrowing (business-unit selection) builds a new
//     snapshot instead of filtering in place
//   - Lookup helpers return borrowed views; analyzers never clone whole tables

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{NaiveDateTime, TimeDelta};
use tracing::{info, warn};

use crate::instances::{ActivityInstance, AutomationInstance};

#[derive(Debug, Clone, Default)]
pub struct InstanceStore {
    automations: Vec<AutomationInstance>,
    activities: Vec<ActivityInstance>,
}

impl InstanceStore {
    pub fn new(automations: Vec<AutomationInstance>, activities: Vec<ActivityInstance>) -> Self {
        info!(
            "Snapshot: {} automation instances, {} activity instances",
            automations.len(),
            activities.len()
        );
        Self { automations, activities }
    }

    pub fn automations(&self) -> &[AutomationInstance] {
        &self.automations
    }

    pub fn activities(&self) -> &[ActivityInstance] {
        &self.activities
    }

    // ── Business units ────────────────────────────────────────────────────────

    pub fn member_ids(&self) -> BTreeSet<&str> {
        self.automations
            .iter()
            .filter_map(|a| a.member_id.as_deref())
            .collect()
    }

    pub fn has_multiple_members(&self) -> bool {
        self.member_ids().len() > 1
    }

    /// Snapshot restricted to the given member ids. Activities are kept in
    /// full; they are joined back through customer keys later.
    /// An empty selection keeps the whole dataset.
    pub fn select_members(&self, ids: &[String]) -> InstanceStore {
        if ids.is_empty() {
            warn!("No business unit selected, using the full dataset");
            return self.clone();
        }
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let automations: Vec<AutomationInstance> = self
            .automations
            .iter()
            .filter(|a| a.member_id.as_deref().map_or(false, |m| wanted.contains(m)))
            .cloned()
            .collect();
        info!(
            "Business units {:?}: kept {} of {} automation instances",
            ids,
            automations.len(),
            self.automations.len()
        );
        Self { automations, activities: self.activities.clone() }
    }

    // ── Time bounds ───────────────────────────────────────────────────────────

    pub fn earliest_start(&self) -> Option<NaiveDateTime> {
        self.automations.iter().filter_map(|a| a.start_time).min()
    }

    pub fn latest_start(&self) -> Option<NaiveDateTime> {
        self.automations.iter().filter_map(|a| a.start_time).max()
    }

    pub fn latest_scheduled(&self) -> Option<NaiveDateTime> {
        self.automations.iter().filter_map(|a| a.scheduled_time).max()
    }

    /// Runs whose start falls at or after `latest_start − days`. Empty when
    /// `days` does not fit a calendar offset.
    pub fn started_within_days(&self, days: i64) -> Vec<&AutomationInstance> {
        let Some(latest) = self.latest_start() else { return Vec::new() };
        let Some(cutoff) = TimeDelta::try_days(days).and_then(|d| latest.checked_sub_signed(d)) else {
            warn!("Lookback of {} days is out of range", days);
            return Vec::new();
        };
        self.automations
            .iter()
            .filter(|a| a.start_time.map_or(false, |t| t >= cutoff))
            .collect()
    }

    // ── Lookups ───────────────────────────────────────────────────────────────

    /// Distinct automation names in first-seen order.
    pub fn names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.automations
            .iter()
            .map(|a| a.name.as_str())
            .filter(|n| seen.insert(*n))
            .collect()
    }

    pub fn runs_of<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a AutomationInstance> + 'a {
        let name = name.to_owned();
        self.automations.iter().filter(move |a| a.name == name)
    }

    /// The `n` most recent runs of `name`, newest first. Runs without a start
    /// time sort last, as they would in an unsorted export.
    pub fn latest_runs(&self, name: &str, n: usize) -> Vec<&AutomationInstance> {
        let mut runs: Vec<&AutomationInstance> = self.runs_of(name).collect();
        runs.sort_by(|a, b| match (a.start_time, b.start_time) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        runs.truncate(n);
        runs
    }

    /// Automation runs indexed by customer key, in table order.
    pub fn by_customer_key(&self) -> HashMap<&str, Vec<&AutomationInstance>> {
        let mut index: HashMap<&str, Vec<&AutomationInstance>> = HashMap::new();
        for a in &self.automations {
            if let Some(key) = a.customer_key.as_deref() {
                index.entry(key).or_default().push(a);
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{at, run};

    #[test]
    fn select_members_filters_and_empty_keeps_all() {
        let store = InstanceStore::new(
            vec![
                run("A", "2024-03-01 10:00", "2024-03-01 10:05").member("100"),
                run("B", "2024-03-01 11:00", "2024-03-01 11:05").member("200"),
                run("C", "2024-03-01 12:00", "2024-03-01 12:05"),
            ],
            vec![],
        );
        assert!(store.has_multiple_members());

        let only = store.select_members(&["200".to_string()]);
        assert_eq!(only.automations().len(), 1);
        assert_eq!(only.automations()[0].name, "B");
        assert!(!only.has_multiple_members());

        assert_eq!(store.select_members(&[]).automations().len(), 3);
    }

    #[test]
    fn latest_runs_newest_first_missing_last() {
        let mut blank = run("A", "2024-03-01 09:00", "2024-03-01 09:05");
        blank.start_time = None;
        let store = InstanceStore::new(
            vec![
                run("A", "2024-03-01 10:00", "2024-03-01 10:05"),
                blank,
                run("A", "2024-03-01 12:00", "2024-03-01 12:05"),
                run("B", "2024-03-01 13:00", "2024-03-01 13:05"),
            ],
            vec![],
        );
        let latest = store.latest_runs("A", 2);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].start_time, Some(at("2024-03-01 12:00")));
        assert_eq!(latest[1].start_time, Some(at("2024-03-01 10:00")));
        assert_eq!(store.latest_runs("A", 10).last().unwrap().start_time, None);
    }

    #[test]
    fn started_within_days_is_relative_to_latest_start() {
        let store = InstanceStore::new(
            vec![
                run("A", "2024-03-01 10:00", "2024-03-01 10:05"),
                run("A", "2024-03-03 10:00", "2024-03-03 10:05"),
                run("A", "2024-03-10 10:00", "2024-03-10 10:05"),
            ],
            vec![],
        );
        let recent = store.started_within_days(7);
        assert_eq!(recent.len(), 2);
        assert_eq!(store.names(), vec!["A"]);
    }

    #[test]
    fn huge_lookback_yields_nothing() {
        let store = InstanceStore::new(vec![run("A", "2024-03-01 10:00", "2024-03-01 10:05")], vec![]);
        assert!(store.started_within_days(i64::MAX).is_empty());
        assert!(store.started_within_days(1_000_000_000).is_empty());
    }

    #[test]
    fn latest_runs_with_temporary_name() {
        let store = InstanceStore::new(
            vec![
                run("Sync", "2024-03-01 10:00", "2024-03-01 10:05"),
                run("Sync", "2024-03-01 11:00", "2024-03-01 11:05"),
            ],
            vec![],
        );
        let latest = store.latest_runs(&String::from("Sync"), 1);
        assert_eq!(latest[0].start_time, Some(at("2024-03-01 11:00")));
        assert_eq!(store.runs_of("Sync").count(), 2);
    }
}
