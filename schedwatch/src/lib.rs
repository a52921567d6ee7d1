// schedwatch/src/lib.rs
//
// Operational risk analytics for scheduled automation run logs.
//
// Pipeline:
//   ingest     : JSONL / CSV export → typed records
//   state      : immutable InstanceStore snapshot (optionally narrowed to
//                selected business units)
//   analyzers  : pure functions snapshot → derived tables:
//                overlap, rush_hour, recurring, delay, timeframe,
//                activity_timeout, status, trend, timeline
//   report     : markdown / JSON rendering

pub mod analyzers;
pub mod config;
pub mod error;
pub mod ingest;
pub mod instances;
pub mod report;
pub mod state;

#[cfg(test)]
mod testutil;

pub use analyzers::{run_all, Report, Section};
pub use config::{AnalysisParams, DateRange, Thresholds};
pub use error::{AnalysisError, IngestError};
pub use state::InstanceStore;
