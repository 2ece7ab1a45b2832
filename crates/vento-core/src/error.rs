use std::fmt;
use std::path::PathBuf;

/// Which stage of validation rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed weights, criteria, methods or selection parameters.
    Config,
    /// Input grids that cannot be combined or carry too little data.
    Data,
    /// Numeric states no degenerate-case branch covers.
    Compute,
    /// Failures reading or decoding files.
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Compute => write!(f, "compute"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VentoError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to load configuration from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("invalid data for criterion '{criterion}': {reason}")]
    Data { criterion: String, reason: String },

    #[error("grid for criterion '{criterion}' is not aligned with '{reference}': {reason}")]
    Misaligned {
        criterion: String,
        reference: String,
        reason: String,
    },

    #[error("numeric failure in criterion '{criterion}': {reason}")]
    Compute { criterion: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VentoError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            VentoError::Config(_) | VentoError::ConfigLoad { .. } => ErrorCategory::Config,
            VentoError::InvalidGrid(_)
            | VentoError::Data { .. }
            | VentoError::Misaligned { .. } => ErrorCategory::Data,
            VentoError::Compute { .. } => ErrorCategory::Compute,
            VentoError::Io(_) | VentoError::Json(_) => ErrorCategory::Io,
        }
    }

    pub(crate) fn data(criterion: &str, reason: impl Into<String>) -> Self {
        VentoError::Data {
            criterion: criterion.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn compute(criterion: &str, reason: impl Into<String>) -> Self {
        VentoError::Compute {
            criterion: criterion.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            VentoError::Config("x".into()).category(),
            ErrorCategory::Config
        );
        assert_eq!(
            VentoError::data("wind", "no valid cells").category(),
            ErrorCategory::Data
        );
        assert_eq!(
            VentoError::compute("wind", "NaN").category(),
            ErrorCategory::Compute
        );
    }

    #[test]
    fn test_message_names_criterion() {
        let err = VentoError::data("slope", "all cells are invalid");
        let msg = err.to_string();
        assert!(msg.contains("slope"));
        assert!(msg.contains("all cells are invalid"));
    }
}
