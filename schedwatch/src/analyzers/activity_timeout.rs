// schedwatch/src/analyzers/activity_timeout.rs
//
// Activities at risk of time-out.
//
// For one activity type (query or script): mean duration per
// (activity name, customer key), keep means strictly above
// `activity_timeout_minutes`, then left-join to automation runs on the
// customer key to recover automation name + member id. A group whose key
// matches no automation is still reported with empty automation fields.
// Rows repeat once per matching run, so the result is de-duplicated on
// (activity name, automation name, member id), first row wins.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::config::Thresholds;
use crate::instances::{mean, ActivityKind, ActivityRisk};
use crate::state::InstanceStore;

pub fn analyze(store: &InstanceStore, kind: ActivityKind, thresholds: &Thresholds) -> Vec<ActivityRisk> {
    let code = thresholds.activity_type(kind);

    let mut groups: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    for act in store.activities().iter().filter(|a| a.activity_type == code) {
        // ungroupable without a key
        let Some(key) = act.customer_key.as_deref() else { continue };
        let durations = groups.entry((act.activity_name.as_str(), key)).or_default();
        if let Some(d) = act.duration() {
            durations.push(d);
        }
    }

    let slow: Vec<(&str, &str, f64)> = groups
        .into_iter()
        .filter_map(|((name, key), ds)| {
            let avg = mean(&ds)?;
            (avg > thresholds.activity_timeout_minutes).then_some((name, key, avg))
        })
        .collect();

    let index = store.by_customer_key();
    let mut seen: HashSet<(String, Option<String>, Option<String>)> = HashSet::new();
    let mut rows = Vec::new();

    for (activity_name, key, avg) in &slow {
        let joined: Vec<(Option<String>, Option<String>)> = match index.get(key) {
            Some(runs) => runs.iter().map(|r| (Some(r.name.clone()), r.member_id.clone())).collect(),
            None => vec![(None, None)],
        };
        for (automation_name, member_id) in joined {
            let dedup = (activity_name.to_string(), automation_name.clone(), member_id.clone());
            if !seen.insert(dedup) {
                continue;
            }
            rows.push(ActivityRisk {
                kind,
                activity_name: activity_name.to_string(),
                automation_name,
                member_id,
                avg_duration_minutes: *avg,
            });
        }
    }

    debug!("activity_timeout[{}]: {} slow groups, {} rows", kind, slow.len(), rows.len());
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{activity, run};

    fn automations() -> Vec<crate::instances::AutomationInstance> {
        vec![
            run("Daily Load", "2024-07-01 02:00", "2024-07-01 03:00").member("10").key("K1"),
            run("Daily Load", "2024-07-02 02:00", "2024-07-02 03:00").member("10").key("K1"),
            run("Weekly Purge", "2024-07-01 04:00", "2024-07-01 05:00").member("20").key("K2"),
        ]
    }

    #[test]
    fn threshold_is_strict() {
        let store = InstanceStore::new(
            automations(),
            vec![
                activity("Exactly20", 300, "K1", "2024-07-01 02:00", 20 * 60),
                activity("Just Over", 300, "K1", "2024-07-01 02:20", 1206),
            ],
        );
        let rows = analyze(&store, ActivityKind::Query, &Thresholds::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].activity_name, "Just Over");
        assert!((rows[0].avg_duration_minutes - 20.1).abs() < 1e-9);
    }

    #[test]
    fn join_dedupes_repeated_runs() {
        let store = InstanceStore::new(
            automations(),
            vec![
                activity("Big Query", 300, "K1", "2024-07-01 02:00", 30 * 60),
                activity("Big Query", 300, "K1", "2024-07-02 02:00", 40 * 60),
            ],
        );
        let rows = analyze(&store, ActivityKind::Query, &Thresholds::default());
        assert_eq!(
            rows,
            vec![ActivityRisk {
                kind: ActivityKind::Query,
                activity_name: "Big Query".into(),
                automation_name: Some("Daily Load".into()),
                member_id: Some("10".into()),
                avg_duration_minutes: 35.0,
            }]
        );
    }

    #[test]
    fn unmatched_key_keeps_row_with_empty_automation() {
        let store = InstanceStore::new(
            automations(),
            vec![activity("Orphan Script", 423, "K9", "2024-07-01 02:00", 25 * 60)],
        );
        let rows = analyze(&store, ActivityKind::Script, &Thresholds::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].automation_name, None);
        assert_eq!(rows[0].member_id, None);
        assert!(analyze(&store, ActivityKind::Query, &Thresholds::default()).is_empty());
    }

    #[test]
    fn other_activity_types_ignored() {
        let store = InstanceStore::new(
            automations(),
            vec![
                activity("Transfer", 73, "K2", "2024-07-01 04:00", 50 * 60),
                activity("Script A", 423, "K2", "2024-07-01 04:00", 21 * 60),
            ],
        );
        let rows = analyze(&store, ActivityKind::Script, &Thresholds::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].automation_name.as_deref(), Some("Weekly Purge"));
    }
}
