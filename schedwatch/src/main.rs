// schedwatch/src/main.rs
//
// schedwatch: risk report for scheduled automation run logs
//
// Loads the automation table (and optionally the activity table), narrows to
// the selected business units, runs the requested sections and prints a
// markdown report (or JSON with --json).
//
// Usage:
//   schedwatch --automations automation_data.csv --activities automation_activity_data.csv
//   schedwatch --automations runs.jsonl --section overlaps --section rush-hours
//   schedwatch --automations runs.csv --section compare \
//       --first-start 2024-01-01 --first-end 2024-01-07 \
//       --second-start 2024-02-01 --second-end 2024-02-07 --json

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use schedwatch::{ingest, report, run_all, AnalysisParams, DateRange, Section, Thresholds};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "schedwatch",
    about   = "Overlap, rush-hour, recurring-risk and delay report for automation runs",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    #[arg(long, default_value = "automation_data.csv",
          help = "Automation instance table (.csv export or JSONL)")]
    automations: PathBuf,

    #[arg(long, help = "Activity instance table (.csv export or JSONL)")]
    activities: Option<PathBuf>,

    #[arg(long, help = "TOML file overriding analyzer thresholds")]
    config: Option<PathBuf>,

    #[arg(long = "member", help = "Business unit (MemberID) to include; repeatable")]
    members: Vec<String>,

    #[arg(long = "section", value_enum, help = "Report section; repeatable, default all")]
    sections: Vec<Section>,

    #[arg(long, help = "Emit JSON instead of markdown")]
    json: bool,

    #[arg(long, help = "Status section start date (YYYY-MM-DD)")]
    from: Option<NaiveDate>,

    #[arg(long, help = "Status section end date (YYYY-MM-DD)")]
    to: Option<NaiveDate>,

    #[arg(long, help = "Status to list in detail")]
    status: Option<String>,

    #[arg(long, help = "Automation for the weekly performance trend")]
    automation: Option<String>,

    #[arg(long)]
    first_start: Option<NaiveDate>,
    #[arg(long)]
    first_end: Option<NaiveDate>,
    #[arg(long)]
    second_start: Option<NaiveDate>,
    #[arg(long)]
    second_end: Option<NaiveDate>,

    #[arg(long, help = "Any date inside the month to scan for rush hours")]
    month: Option<NaiveDate>,
}

fn range(label: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Option<DateRange>> {
    match (start, end) {
        (Some(s), Some(e)) => Ok(Some(DateRange::new(s, e).with_context(|| format!("{} range", label))?)),
        (None, None) => Ok(None),
        _ => {
            warn!("{} range needs both a start and an end; using the default", label);
            Ok(None)
        }
    }
}

impl Cli {
    fn params(&self) -> Result<AnalysisParams> {
        Ok(AnalysisParams {
            first:               range("first timeframe", self.first_start, self.first_end)?,
            second:              range("second timeframe", self.second_start, self.second_end)?,
            status_range:        range("status", self.from, self.to)?,
            selected_status:     self.status.clone(),
            selected_automation: self.automation.clone(),
            rush_hour_month:     self.month,
        })
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("schedwatch=info".parse()?))
        .with_writer(std::io::stderr)
        .compact().init();

    let cli        = Cli::parse();
    let thresholds = Thresholds::load(cli.config.as_deref())?;
    let params     = cli.params()?;

    let store = ingest::load_store(&cli.automations, cli.activities.as_deref())
        .await
        .with_context(|| format!("loading {}", cli.automations.display()))?;

    let store = if store.member_ids().len() > 1 && !cli.members.is_empty() {
        store.select_members(&cli.members)
    } else {
        store
    };

    let sections: Vec<Section> = if cli.sections.is_empty() {
        Section::ALL.to_vec()
    } else {
        cli.sections.clone()
    };
    info!("Running sections {:?}", sections);

    let report = run_all(&store, &params, &thresholds, &sections);

    if cli.json {
        println!("{}", report::to_json(&report));
    } else {
        print!("{}", report::to_markdown(&report));
    }
    Ok(())
}
