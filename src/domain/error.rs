//! Domain error types.
//!
//! Variants are grouped by how an orchestration loop must react to them, see
//! [`TraderError::class`]. Metric divisions never fail: degenerate ratios are
//! reported as `f64::INFINITY` instead of an error.

/// How the live loop treats a failed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient venue or network failure. Back off and retry.
    Retryable,
    /// Bad or missing data for this cycle. Skip it, back off, carry on.
    SkipCycle,
    /// Cannot continue. Only raised at startup.
    Fatal,
}

/// Top-level error type for crosstrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("connectivity error: {reason}")]
    Connectivity { reason: String },

    #[error("order rejected: {reason}")]
    Order { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

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

    #[error("unexpected error: {reason}")]
    Unexpected { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    pub fn data(reason: impl Into<String>) -> Self {
        TraderError::Data {
            reason: reason.into(),
        }
    }

    pub fn connectivity(reason: impl Into<String>) -> Self {
        TraderError::Connectivity {
            reason: reason.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            TraderError::Connectivity { .. }
            | TraderError::Order { .. }
            | TraderError::Unexpected { .. }
            | TraderError::Io(_) => ErrorClass::Retryable,
            TraderError::Data { .. } | TraderError::InsufficientData { .. } => {
                ErrorClass::SkipCycle
            }
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => ErrorClass::Fatal,
        }
    }
}

impl From<csv::Error> for TraderError {
    fn from(err: csv::Error) -> Self {
        TraderError::data(format!("CSV error: {err}"))
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) | TraderError::Unexpected { .. } => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::Data { .. } | TraderError::InsufficientData { .. } => 5,
            TraderError::Connectivity { .. } | TraderError::Order { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
