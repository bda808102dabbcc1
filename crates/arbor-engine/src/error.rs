use crate::location::Path;

/// Errors raised by the editing engine.
///
/// Hitting the start or end of the document, or a match predicate that finds
/// nothing, is never an error: those operations are no-ops. Errors are reserved
/// for locations that do not resolve and for trees that normalization cannot
/// repair.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid location {location}: {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("Structural invariant violated at [{path}]: {reason}")]
    StructuralInvariantViolation { path: Path, reason: String },

    #[error("Invalid property `{key}`: {reason}")]
    InvalidProperty { key: String, reason: String },

    #[error("Document error: {0}")]
    Document(String),
}

impl EngineError {
    pub(crate) fn invalid_location(location: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        EngineError::InvalidLocation {
            location: location.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invariant(path: &Path, reason: impl Into<String>) -> Self {
        EngineError::StructuralInvariantViolation {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Document(err.to_string())
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
