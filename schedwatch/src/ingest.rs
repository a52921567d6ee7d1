// schedwatch/src/ingest.rs
//
// Loads automation and activity tables from disk.
//
// Formats (chosen by extension):
//   .csv      : header row; dashboard export column names
//               (AutomationName, AutomationInstanceStartTime_UTC, ...)
//   otherwise : JSON Lines, one object per line, snake_case field names
//
// Either naming is accepted in either format. Timestamps that do not parse
// become None; rows missing a required field are skipped with a warning.
// Member ids and customer keys are kept verbatim as text.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::instances::{ActivityInstance, AutomationInstance};
use crate::state::InstanceStore;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p", // export format
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Lenient timestamp parse; None for blanks and anything unrecognised.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let parsed = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok());
    if parsed.is_none() {
        debug!("Unparseable timestamp {:?}", s);
    }
    parsed
}

// ── Column names: (jsonl, csv export) ─────────────────────────────────────────

const A_NAME: [&str; 2] = ["name", "AutomationName"];
const A_START: [&str; 2] = ["start_time", "AutomationInstanceStartTime_UTC"];
const A_END: [&str; 2] = ["end_time", "AutomationInstanceEndTime_UTC"];
const A_SCHEDULED: [&str; 2] = ["scheduled_time", "AutomationInstanceScheduledTime_UTC"];
const A_STATUS: [&str; 2] = ["status", "AutomationInstanceStatus"];
const A_ERROR: [&str; 2] = ["error", "AutomationInstanceActivityErrorDetails"];
const A_MEMBER: [&str; 2] = ["member_id", "MemberID"];
const A_KEY: [&str; 2] = ["customer_key", "AutomationCustomerKey"];

const X_AUTOMATION: [&str; 2] = ["automation_name", "AutomationName"];
const X_TYPE: [&str; 2] = ["activity_type", "ActivityType"];
const X_NAME: [&str; 2] = ["activity_name", "ActivityName"];
const X_START: [&str; 2] = ["activity_start_time", "ActivityInstanceStartTime_UTC"];
const X_END: [&str; 2] = ["activity_end_time", "ActivityInstanceEndTime_UTC"];
const X_STATUS: [&str; 2] = ["status", "ActivityInstanceStatus"];
const X_DETAILS: [&str; 2] = ["status_details", "ActivityInstanceStatusDetails"];
const X_KEY: [&str; 2] = ["customer_key", "AutomationCustomerKey"];

/// One input row, format-independent: column name → non-blank text.
type Row = HashMap<String, String>;

fn get(row: &Row, names: [&str; 2]) -> Option<String> {
    names.iter().find_map(|n| row.get(*n).cloned())
}

fn get_ts(row: &Row, names: [&str; 2]) -> Option<NaiveDateTime> {
    get(row, names).and_then(|s| parse_timestamp(&s))
}

fn automation_from(row: &Row) -> Option<AutomationInstance> {
    Some(AutomationInstance {
        name: get(row, A_NAME)?,
        start_time: get_ts(row, A_START),
        end_time: get_ts(row, A_END),
        scheduled_time: get_ts(row, A_SCHEDULED),
        status: get(row, A_STATUS).unwrap_or_default(),
        error: get(row, A_ERROR),
        member_id: get(row, A_MEMBER),
        customer_key: get(row, A_KEY),
    })
}

fn activity_from(row: &Row) -> Option<ActivityInstance> {
    let activity_type = get(row, X_TYPE)?.trim().parse::<f64>().ok()? as i64;
    Some(ActivityInstance {
        automation_name: get(row, X_AUTOMATION).unwrap_or_default(),
        activity_type,
        activity_name: get(row, X_NAME)?,
        activity_start_time: get_ts(row, X_START),
        activity_end_time: get_ts(row, X_END),
        status: get(row, X_STATUS).unwrap_or_default(),
        status_details: get(row, X_DETAILS),
        customer_key: get(row, X_KEY),
    })
}

// ── Row readers ───────────────────────────────────────────────────────────────

fn json_text(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub fn jsonl_rows(text: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() { continue; }
        match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(line) {
            Ok(obj) => rows.push(
                obj.iter()
                    .filter_map(|(k, v)| json_text(v).map(|t| (k.clone(), t)))
                    .collect(),
            ),
            Err(e) => warn!("Parse error on line {}: {}", i + 1, e),
        }
    }
    rows
}

pub fn csv_rows(text: &str) -> Result<Vec<Row>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("CSV record {} skipped: {}", i + 1, e);
                continue;
            }
        };
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .filter(|(_, v)| !v.is_empty())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"))
}

async fn read_rows(path: &Path) -> Result<Vec<Row>, IngestError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if is_csv(path) { csv_rows(&text) } else { Ok(jsonl_rows(&text)) }
}

fn convert<T>(rows: Vec<Row>, what: &str, f: impl Fn(&Row) -> Option<T>) -> Vec<T> {
    let total = rows.len();
    let out: Vec<T> = rows.iter().filter_map(|r| f(r)).collect();
    if out.len() < total {
        warn!("Skipped {} {} rows missing required fields", total - out.len(), what);
    }
    out
}

// ── Public loaders ────────────────────────────────────────────────────────────

pub async fn load_automations(path: &Path) -> Result<Vec<AutomationInstance>, IngestError> {
    let rows = convert(read_rows(path).await?, "automation", automation_from);
    info!("Loaded {} automation instances from {}", rows.len(), path.display());
    Ok(rows)
}

pub async fn load_activities(path: &Path) -> Result<Vec<ActivityInstance>, IngestError> {
    let rows = convert(read_rows(path).await?, "activity", activity_from);
    info!("Loaded {} activity instances from {}", rows.len(), path.display());
    Ok(rows)
}

/// Build a snapshot from an automation table and an optional activity table.
pub async fn load_store(automations: &Path, activities: Option<&Path>) -> Result<InstanceStore, IngestError> {
    let autos = load_automations(automations).await?;
    let acts = match activities {
        Some(p) => load_activities(p).await?,
        None => Vec::new(),
    };
    Ok(InstanceStore::new(autos, acts))
}
