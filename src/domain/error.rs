//! Domain error types.

/// Top-level error type for rsitrader.
#[derive(Debug, thiserror::Error)]
pub enum RsitraderError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("no data for {symbol} ({interval})")]
    NoData { symbol: String, interval: String },

    #[error("data source error: {reason}")]
    Data { reason: String },

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

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RsitraderError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        RsitraderError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl From<&RsitraderError> for std::process::ExitCode {
    fn from(err: &RsitraderError) -> Self {
        let code: u8 = match err {
            RsitraderError::Io(_) => 1,
            RsitraderError::ConfigParse { .. }
            | RsitraderError::ConfigMissing { .. }
            | RsitraderError::ConfigInvalid { .. } => 2,
            RsitraderError::Data { .. } => 3,
            RsitraderError::InvalidInput { .. } => 4,
            RsitraderError::NoData { .. } => 5,
            RsitraderError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
