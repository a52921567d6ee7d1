// Full pipeline: files on disk → snapshot → report.

use std::io::Write;

use chrono::NaiveDate;
use schedwatch::analyzers::Comparison;
use schedwatch::{ingest, report, run_all, AnalysisParams, DateRange, Section, Thresholds};

const AUTOMATIONS_CSV: &str = "\
AutomationName,AutomationInstanceStartTime_UTC,AutomationInstanceEndTime_UTC,AutomationInstanceScheduledTime_UTC,AutomationInstanceStatus,AutomationInstanceActivityErrorDetails,MemberID,AutomationCustomerKey
Export,3/4/2024 10:00:00 AM,3/4/2024 10:05:00 AM,3/4/2024 10:00:00 AM,Complete,,500,K-EXP
Import,3/4/2024 10:03:00 AM,3/4/2024 10:10:00 AM,3/4/2024 10:00:00 AM,Complete,,500,K-IMP
Cleanup,3/4/2024 10:10:00 AM,3/4/2024 10:20:00 AM,3/4/2024 10:00:00 AM,Error,Timeout,500,K-CLN
Export,3/11/2024 10:00:00 AM,3/11/2024 10:15:00 AM,3/11/2024 9:58:00 AM,Complete,,500,K-EXP
Import,4/2/2024 10:00:00 AM,4/2/2024 10:05:00 AM,,Complete,,500,K-IMP
";

const ACTIVITIES_JSONL: &str = r#"{"automation_name":"Export","activity_type":300,"activity_name":"Extract Orders","activity_start_time":"2024-03-04T10:00:00","activity_end_time":"2024-03-04T10:25:00","customer_key":"K-EXP"}
{"automation_name":"Import","activity_type":423,"activity_name":"Fix Encoding","activity_start_time":"2024-03-04T10:03:00","activity_end_time":"2024-03-04T10:20:00","customer_key":"K-IMP"}
{"automation_name":"Ghost","activity_type":423,"activity_name":"Legacy Script","activity_start_time":"2024-03-04T10:03:00","activity_end_time":"2024-03-04T11:03:00","customer_key":"K-GONE"}
"#;

fn write_temp(suffix: &str, body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f
}

#[tokio::test]
async fn report_from_csv_and_jsonl() {
    let autos = write_temp(".csv", AUTOMATIONS_CSV);
    let acts = write_temp(".jsonl", ACTIVITIES_JSONL);
    let store = ingest::load_store(autos.path(), Some(acts.path())).await.unwrap();
    assert_eq!(store.automations().len(), 5);
    assert_eq!(store.activities().len(), 3);

    let report = run_all(&store, &AnalysisParams::default(), &Thresholds::default(), &Section::ALL);

    // Export [10:00,10:05) vs Import [10:03,10:10) → 2 minutes; Cleanup only touches Import.
    let overlaps = report.overlaps.as_ref().unwrap();
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].automation_1, "Export");
    assert_eq!(overlaps[0].automation_2, "Import");
    assert_eq!(overlaps[0].overlap_minutes, 2.0);

    // Latest scheduled time is in March, so February is scanned: nothing there.
    let rush = report.rush_hours.as_ref().unwrap();
    assert!(rush.slots.is_empty());

    // Import's April run is unscheduled and excluded from its mean.
    let delays = report.delays.as_ref().unwrap();
    let import = delays.iter().find(|d| d.name == "Import").unwrap();
    assert_eq!(import.avg_delay_minutes, 3.0);
    let export = delays.iter().find(|d| d.name == "Export").unwrap();
    assert_eq!(export.avg_delay_minutes, 1.0);

    let queries = report.query_risk.as_ref().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].automation_name.as_deref(), Some("Export"));
    assert_eq!(queries[0].member_id.as_deref(), Some("500"));

    let scripts = report.script_risk.as_ref().unwrap();
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].activity_name, "Legacy Script");
    assert_eq!(scripts[0].automation_name, None);

    assert!(report.risky.as_ref().unwrap().is_empty());

    let md = report::to_markdown(&report);
    assert!(md.contains("| Export | 2024-03-04 10:00 | 2024-03-04 10:05 | Import |"));
    assert!(md.contains("2.0 min"));
}

#[tokio::test]
async fn rush_hour_month_override_and_comparison() {
    let autos = write_temp(".csv", AUTOMATIONS_CSV);
    let store = ingest::load_store(autos.path(), None).await.unwrap();
    let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();

    let params = AnalysisParams {
        rush_hour_month: Some(d(3, 1)),
        first: Some(DateRange::new(d(3, 1), d(3, 7)).unwrap()),
        second: Some(DateRange::new(d(3, 8), d(3, 14)).unwrap()),
        ..AnalysisParams::default()
    };
    let report = run_all(&store, &params, &Thresholds::default(), &[Section::RushHours, Section::Compare]);

    let rush = report.rush_hours.unwrap();
    assert_eq!(rush.slots.len(), 1);
    assert_eq!(rush.slots[0].count, 3);
    assert_eq!(rush.slots[0].names, vec!["Export", "Import", "Cleanup"]);

    match report.comparison.unwrap() {
        Comparison::Compared { rows, .. } => {
            let export = rows.iter().find(|r| r.name == "Export").unwrap();
            assert_eq!(export.avg_first, 5.0);
            assert_eq!(export.avg_second, 15.0);
            assert!(export.increased);
            let cleanup = rows.iter().find(|r| r.name == "Cleanup").unwrap();
            assert_eq!(cleanup.avg_second, 0.0);
            assert!(!cleanup.increased);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let err = ingest::load_store(std::path::Path::new("/nonexistent/runs.csv"), None).await.unwrap_err();
    assert!(err.to_string().contains("/nonexistent/runs.csv"));
}
