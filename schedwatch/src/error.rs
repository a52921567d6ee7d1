// schedwatch/src/error.rs

use chrono::NaiveDate;
use thiserror::Error;

/// Invalid caller-supplied analysis parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error(
        "The first timeframe must be earlier than the second timeframe \
         (first ends {first_end}, second starts {second_start}). Please adjust your selection."
    )]
    TimeframeOrder {
        first_end: NaiveDate,
        second_start: NaiveDate,
    },

    #[error("date range is inverted: {start} is after {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Failures while loading input tables or configuration from disk.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}
