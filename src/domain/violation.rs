//! Violation and suggestion types produced by enforcement resolvers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Severity, Tier};

/// Action taken in response to a rule match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTaken {
    None,
    Warning,
    Suggestion,
    Block,
    Escalate,
}

impl std::fmt::Display for ActionTaken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionTaken::None => write!(f, "none"),
            ActionTaken::Warning => write!(f, "warning"),
            ActionTaken::Suggestion => write!(f, "suggestion"),
            ActionTaken::Block => write!(f, "block"),
            ActionTaken::Escalate => write!(f, "escalate"),
        }
    }
}

/// How a violation was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    KeywordMatch,
    RegexMatch,
    /// Manufactured by the fallback path or a request-level error.
    SystemError,
}

/// Record produced when a rule matches content.
///
/// Created by an enforcement resolver and owned thereafter by the
/// aggregating [`ValidationResult`](crate::domain::ValidationResult).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub rule_name: String,
    pub rule_tier: Tier,
    pub rule_severity: Severity,
    pub kind: ViolationKind,

    pub matched_content: Option<String>,
    #[serde(default)]
    pub matched_patterns: Vec<String>,
    pub confidence: f64,

    pub action_taken: ActionTaken,
    pub blocked: bool,
    pub user_override_allowed: bool,

    pub explanation: String,
    pub detected_at: DateTime<Utc>,
}

impl Violation {
    pub fn is_critical(&self) -> bool {
        self.rule_severity == Severity::Critical
    }

    /// Safety violations and escalations always require review upstream.
    pub fn requires_escalation(&self) -> bool {
        self.is_critical()
            || self.action_taken == ActionTaken::Escalate
            || self.rule_tier == Tier::Safety
    }
}

/// Non-blocking improvement suggestion, produced by adaptive enforcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub source_rule: String,
    pub title: String,
    pub description: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(tier: Tier, severity: Severity, action: ActionTaken) -> Violation {
        Violation {
            rule_id: "r1".to_string(),
            rule_name: "Test".to_string(),
            rule_tier: tier,
            rule_severity: severity,
            kind: ViolationKind::KeywordMatch,
            matched_content: Some("bad".to_string()),
            matched_patterns: vec!["bad".to_string()],
            confidence: 0.8,
            action_taken: action,
            blocked: action == ActionTaken::Block,
            user_override_allowed: false,
            explanation: "test".to_string(),
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn test_critical_detection() {
        let v = make_violation(Tier::Operational, Severity::Critical, ActionTaken::Block);
        assert!(v.is_critical());
        let w = make_violation(Tier::Operational, Severity::Medium, ActionTaken::Warning);
        assert!(!w.is_critical());
    }

    #[test]
    fn test_safety_tier_requires_escalation() {
        let v = make_violation(Tier::Safety, Severity::Low, ActionTaken::Warning);
        assert!(v.requires_escalation());
        let w = make_violation(Tier::Preference, Severity::Low, ActionTaken::Suggestion);
        assert!(!w.requires_escalation());
    }
}
