// schedwatch/src/report.rs
//
// Markdown and JSON rendering for an analysis Report.
// Sections that were not requested are omitted; requested sections with no
// rows print an explicit "nothing found" line.

use std::fmt::Write as _;

use chrono::NaiveDateTime;

use crate::analyzers::{Comparison, Report};
use crate::instances::ActivityRisk;

const TS: &str = "%Y-%m-%d %H:%M";

fn ts(t: Option<NaiveDateTime>) -> String {
    t.map(|t| t.format(TS).to_string()).unwrap_or_else(|| "-".into())
}

fn opt(s: &Option<String>) -> String {
    s.as_deref().map_or_else(|| "-".to_string(), cell)
}

/// Table cell text; a bare `|` would split the row.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

fn activity_table(out: &mut String, title: &str, none: &str, rows: &[ActivityRisk]) {
    let _ = writeln!(out, "### {}\n", title);
    if rows.is_empty() {
        let _ = writeln!(out, "{}\n", none);
        return;
    }
    let _ = writeln!(out, "| Activity Name | Automation Name | MemberID | Avg Duration (minutes) |");
    let _ = writeln!(out, "|---------------|-----------------|----------|------------------------|");
    for r in rows {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.1} |",
            cell(&r.activity_name),
            opt(&r.automation_name),
            opt(&r.member_id),
            r.avg_duration_minutes
        );
    }
    out.push('\n');
}

/// Render the report as markdown.
pub fn to_markdown(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Automation Risk Report\n");
    let _ = writeln!(
        out,
        "**Automation instances**: {}  **Activity instances**: {}  **Business units**: {}\n",
        report.n_automations,
        report.n_activities,
        if report.members.is_empty() { "-".to_string() } else { report.members.join(", ") }
    );

    if let Some(s) = &report.status {
        let _ = writeln!(out, "## Automation Status ({})\n", s.range);
        if s.counts.is_empty() {
            let _ = writeln!(out, "No automations ran in this timeframe.\n");
        } else {
            let _ = writeln!(out, "| Status | Count |");
            let _ = writeln!(out, "|--------|-------|");
            for c in &s.counts {
                let _ = writeln!(out, "| {} | {} |", cell(&c.status), c.count);
            }
            out.push('\n');
        }
        if let Some(selected) = &s.selected {
            let _ = writeln!(out, "### Automations with Status: {}\n", cell(selected));
            let _ = writeln!(out, "| Name | Start | End | Status | MemberID | Error |");
            let _ = writeln!(out, "|------|-------|-----|--------|----------|-------|");
            for d in &s.details {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} | {} |",
                    cell(&d.name), ts(d.start_time), ts(d.end_time), cell(&d.status), opt(&d.member_id), opt(&d.error)
                );
            }
            out.push('\n');
        }
    }

    if let Some(t) = &report.trend {
        let _ = writeln!(out, "## Performance Trend: {}\n", cell(&t.automation));
        if t.points.is_empty() {
            let _ = writeln!(out, "No completed runs for this automation.\n");
        } else {
            let _ = writeln!(out, "| Week | Avg Duration (min) |");
            let _ = writeln!(out, "|------|--------------------|");
            for p in &t.points {
                let _ = writeln!(out, "| {} | {:.1} |", p.label(), p.avg_duration_minutes);
            }
            out.push('\n');
        }
    }

    if let Some(c) = &report.comparison {
        let _ = writeln!(out, "## Individual Automation Comparison\n");
        match c {
            Comparison::Rejected { message } => {
                let _ = writeln!(out, "**Error**: {}\n", message);
            }
            Comparison::Compared { rows, .. } if rows.is_empty() => {
                let _ = writeln!(out, "No data available for selected timeframes.\n");
            }
            Comparison::Compared { first, second, rows } => {
                let _ = writeln!(out, "First: {}  Second: {}\n", first, second);
                let _ = writeln!(out, "| Name | MemberID | Avg Duration (First) | Avg Duration (Second) | Increased |");
                let _ = writeln!(out, "|------|----------|----------------------|-----------------------|-----------|");
                for r in rows {
                    let _ = writeln!(
                        out,
                        "| {} | {} | {:.1} | {:.1} | {} |",
                        cell(&r.name),
                        opt(&r.member_id),
                        r.avg_first,
                        r.avg_second,
                        if r.increased { "▲" } else { "" }
                    );
                }
                out.push('\n');
            }
        }
    }

    if let Some(risky) = &report.risky {
        let _ = writeln!(out, "## Risky Hourly Automations (~1 Hour)\n");
        if risky.is_empty() {
            let _ = writeln!(out, "No automation found for this criteria.\n");
        } else {
            let _ = writeln!(out, "| Automation Name | Reason |");
            let _ = writeln!(out, "|-----------------|--------|");
            for f in risky {
                let _ = writeln!(out, "| {} | {} |", cell(&f.name), f.reason);
            }
            out.push('\n');
        }
    }

    if let Some(delays) = &report.delays {
        let _ = writeln!(out, "## Delayed Automations (Avg Delay)\n");
        if delays.is_empty() {
            let _ = writeln!(out, "No scheduled runs to measure.\n");
        } else {
            let _ = writeln!(out, "| Automation Name | Avg Delay (minutes) |");
            let _ = writeln!(out, "|-----------------|---------------------|");
            for d in delays {
                let _ = writeln!(out, "| {} | {:.2} |", cell(&d.name), d.avg_delay_minutes);
            }
            out.push('\n');
        }
    }

    if let Some(rush) = &report.rush_hours {
        match (rush.window_start, rush.window_end) {
            (Some(from), Some(until)) => {
                let last = until - chrono::Duration::days(1);
                let _ = writeln!(out, "## Rush Hours ({} - {})\n", from.format("%B %d, %Y"), last.format("%B %d, %Y"));
            }
            _ => {
                let _ = writeln!(out, "## Rush Hours\n");
            }
        }
        if rush.slots.is_empty() {
            let _ = writeln!(out, "No crowded hour slots.\n");
        } else {
            let _ = writeln!(out, "| Hour Slot | Automation_Count | Automation_Names |");
            let _ = writeln!(out, "|-----------|------------------|------------------|");
            for s in &rush.slots {
                let _ = writeln!(out, "| {} | {} | {} |", s.hour_slot.format(TS), s.count, s.names.iter().map(|n| cell(n)).collect::<Vec<_>>().join(", "));
            }
            out.push('\n');
        }
    }

    if let Some(overlaps) = &report.overlaps {
        let _ = writeln!(out, "## Overlapping Automations\n");
        if overlaps.is_empty() {
            let _ = writeln!(out, "No overlapping automations detected.\n");
        } else {
            let _ = writeln!(out, "| Automation_1 | Automation 1 Start | Automation 1 End | Automation_2 | Automation 2 Start | Automation 2 End | Overlap_Minutes |");
            let _ = writeln!(out, "|--------------|--------------------|------------------|--------------|--------------------|------------------|-----------------|");
            for p in overlaps {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} | {} | {:.1} min |",
                    cell(&p.automation_1),
                    p.start_1.format(TS),
                    p.end_1.format(TS),
                    cell(&p.automation_2),
                    p.start_2.format(TS),
                    p.end_2.format(TS),
                    p.overlap_minutes
                );
            }
            out.push('\n');
        }
    }

    if let Some(timeline) = &report.timeline {
        let _ = writeln!(out, "## Full Automation Timeline\n");
        let _ = writeln!(out, "| Automation Name | Start | End | Duration (min) |");
        let _ = writeln!(out, "|-----------------|-------|-----|----------------|");
        for r in timeline {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {:.1} |",
                cell(&r.display_name),
                r.start_time.format(TS),
                r.end_time.format(TS),
                r.duration_minutes
            );
        }
        out.push('\n');
    }

    if let Some(q) = &report.query_risk {
        activity_table(&mut out, "Queries at Risk of Time-out", "No risky queries found.", q);
    }
    if let Some(s) = &report.script_risk {
        activity_table(&mut out, "Scripts at Risk of Time-out", "No risky scripts found.", s);
    }

    out
}

/// Serialize the report to JSON for downstream consumption.
pub fn to_json(report: &Report) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
}
