//! Domain error types.

/// Top-level error type for rotator.
#[derive(Debug, thiserror::Error)]
pub enum RotatorError {
    #[error("{series} series is empty or invalid: expected a date column and a close/price/rate column")]
    EmptySeries { series: String },

    #[error("insufficient data after alignment and filtering: have {rows} rows, need {minimum}")]
    InsufficientData { rows: usize, minimum: usize },

    #[error("degenerate metric input: {reason}")]
    DegenerateMetric { reason: String },

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

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RotatorError> for std::process::ExitCode {
    fn from(err: &RotatorError) -> Self {
        let code: u8 = match err {
            RotatorError::Io(_) => 1,
            RotatorError::ConfigParse { .. }
            | RotatorError::ConfigMissing { .. }
            | RotatorError::ConfigInvalid { .. } => 2,
            RotatorError::DataSource { .. } | RotatorError::Report { .. } => 3,
            RotatorError::EmptySeries { .. } | RotatorError::InsufficientData { .. } => 5,
            RotatorError::DegenerateMetric { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
