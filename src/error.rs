// ⚠️ Engine Errors - one taxonomy for every store, ledger and ranking call
//
// Expected absence is NOT an error: `remove` returns a bool, an empty
// ledger sums/averages to 0. Only real failures end up here.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Lookup by key or id found no match
    #[error("not found: {reason}")]
    NotFound { reason: String },

    /// min/max over an empty ledger
    #[error("empty input: {operation} needs at least one value")]
    EmptyInput { operation: &'static str },

    /// Rejected before any mutation happened
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Grade operation on a line-item store, or the other way around
    #[error("flavor mismatch: {operation} requires a {expected} store")]
    FlavorMismatch {
        operation: &'static str,
        expected: &'static str,
    },
}

impl EngineError {
    pub fn not_found(reason: impl Into<String>) -> Self {
        EngineError::NotFound {
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EngineError::not_found("entity 7").to_string(),
            "not found: entity 7"
        );
        assert_eq!(
            EngineError::EmptyInput { operation: "max" }.to_string(),
            "empty input: max needs at least one value"
        );
        assert_eq!(
            EngineError::FlavorMismatch {
                operation: "add_line",
                expected: "line-item",
            }
            .to_string(),
            "flavor mismatch: add_line requires a line-item store"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(EngineError::not_found("x").is_not_found());
        assert!(!EngineError::invalid("x").is_not_found());
    }
}
