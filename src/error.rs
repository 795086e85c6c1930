//! Error types for Guardrail Core.
//!
//! Defines a unified error type for all evaluation operations. Pattern-match
//! and resolver failures are recoverable (routed to the fallback handler at
//! the tier boundary); repository failures surface as error-flavored
//! validation results rather than panics.

use thiserror::Error;

/// Unified error type for Guardrail Core operations.
#[derive(Debug, Error)]
pub enum GuardrailError {
    #[error("Pattern match failed for rule '{rule_id}': {reason}")]
    PatternMatch { rule_id: String, reason: String },

    #[error("Enforcement resolver failed for rule '{rule_id}': {reason}")]
    Resolver { rule_id: String, reason: String },

    #[error("Rule repository unavailable: {0}")]
    Repository(String),

    #[error("Invalid rule definition: {0}")]
    InvalidRule(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GuardrailError {
    /// Pattern-match failure for a specific rule.
    pub fn pattern_match(rule_id: impl Into<String>, reason: impl Into<String>) -> Self {
        GuardrailError::PatternMatch {
            rule_id: rule_id.into(),
            reason: reason.into(),
        }
    }

    /// Resolver failure for a specific rule.
    pub fn resolver(rule_id: impl Into<String>, reason: impl Into<String>) -> Self {
        GuardrailError::Resolver {
            rule_id: rule_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is recoverable at the tier-evaluator boundary.
    ///
    /// Recoverable errors are routed to the fallback enforcement path and
    /// never abort the enclosing tier loop.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GuardrailError::PatternMatch { .. } | GuardrailError::Resolver { .. }
        )
    }
}

/// Result type alias for Guardrail operations.
pub type GuardrailResult<T> = Result<T, GuardrailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(GuardrailError::pattern_match("r1", "timed out").is_recoverable());
        assert!(GuardrailError::resolver("r1", "boom").is_recoverable());
        assert!(!GuardrailError::Repository("down".to_string()).is_recoverable());
        assert!(!GuardrailError::InvalidRule("bad tier".to_string()).is_recoverable());
        assert!(!GuardrailError::Config("missing key".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = GuardrailError::pattern_match("rule-7", "regex engine panicked");
        assert!(err.to_string().contains("rule-7"));
        assert!(err.to_string().contains("regex engine panicked"));
    }
}
