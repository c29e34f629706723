//! Domain error types.
//!
//! Row-level ingestion problems are not errors: they are counted in
//! [`ReadStats`](crate::domain::series_reader::ReadStats) and the row is dropped.

/// Top-level error type for regime_engine.
#[derive(Debug, thiserror::Error)]
pub enum RegimeError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("day series {source_name} is empty")]
    EmptySource { source_name: String },

    #[error("day series {source_name} has no usable rows ({skipped} skipped)")]
    NoUsableRows { source_name: String, skipped: usize },

    #[error("failed to read day series {source_name}: {reason}")]
    SeriesRead { source_name: String, reason: String },

    #[error("regime ledger {path}: {reason}")]
    Ledger { path: String, reason: String },

    #[error("regime requested for {date} after {last} was already served")]
    OutOfOrderDay {
        date: chrono::NaiveDate,
        last: chrono::NaiveDate,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RegimeError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        RegimeError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&RegimeError> for std::process::ExitCode {
    fn from(err: &RegimeError) -> Self {
        let code: u8 = match err {
            RegimeError::Io(_) => 1,
            RegimeError::ConfigParse { .. }
            | RegimeError::ConfigMissing { .. }
            | RegimeError::ConfigInvalid { .. } => 2,
            RegimeError::EmptySource { .. }
            | RegimeError::NoUsableRows { .. }
            | RegimeError::SeriesRead { .. } => 3,
            RegimeError::Ledger { .. } => 4,
            RegimeError::OutOfOrderDay { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
