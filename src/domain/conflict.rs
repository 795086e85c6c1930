//! Conflict types - detected incompatibilities between rules and their
//! resolutions.
//!
//! Conflicts are transient: created during a single evaluation when two
//! matching rules produce incompatible outcomes, resolved in the same pass,
//! and not persisted beyond the result that carries them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Rule, Tier};

/// Kind of detected conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    KeywordOverlap,
    PriorityGap,
    SemanticContradiction,
}

/// Severity of a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Strategy used to pick a winner from a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Tier weight plus inverted priority; ties favor the first rule.
    PriorityBased,
    /// Weighted context-tag matching; ties favor the second rule.
    ContextAware,
    /// Stored per-user preference scores; may decline to decide.
    UserPreference,
    /// Last resort: escalates to human review instead of guessing.
    Fallback,
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionStrategy::PriorityBased => write!(f, "priority_based"),
            ResolutionStrategy::ContextAware => write!(f, "context_aware"),
            ResolutionStrategy::UserPreference => write!(f, "user_preference"),
            ResolutionStrategy::Fallback => write!(f, "fallback"),
        }
    }
}

/// Lightweight reference to a rule involved in a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRef {
    pub id: String,
    pub name: String,
    pub tier: Tier,
}

impl From<&Rule> for RuleRef {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            tier: rule.tier,
        }
    }
}

/// Outcome of resolving a conflict.
///
/// `winning_rule` is `None` when no strategy could decide and the conflict
/// was escalated for human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub winning_rule: Option<String>,
    pub strategy: ResolutionStrategy,
    pub reason: String,
}

impl Resolution {
    pub fn winner(
        rule_id: impl Into<String>,
        strategy: ResolutionStrategy,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            winning_rule: Some(rule_id.into()),
            strategy,
            reason: reason.into(),
        }
    }

    pub fn escalate(reason: impl Into<String>) -> Self {
        Self {
            winning_rule: None,
            strategy: ResolutionStrategy::Fallback,
            reason: reason.into(),
        }
    }

    pub fn is_escalated(&self) -> bool {
        self.winning_rule.is_none()
    }
}

/// A detected incompatibility between two rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub id: Uuid,
    pub rule_a: RuleRef,
    pub rule_b: RuleRef,
    pub kind: ConflictKind,
    pub severity: ConflictSeverity,
    pub reason: String,
    pub detected_at: DateTime<Utc>,
    pub resolution: Option<Resolution>,
}

impl Conflict {
    pub fn new(
        rule_a: &Rule,
        rule_b: &Rule,
        kind: ConflictKind,
        severity: ConflictSeverity,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            rule_a: rule_a.into(),
            rule_b: rule_b.into(),
            kind,
            severity,
            reason: reason.into(),
            detected_at: Utc::now(),
            resolution: None,
        }
    }

    pub fn involves_safety_tier(&self) -> bool {
        self.rule_a.tier == Tier::Safety || self.rule_b.tier == Tier::Safety
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EnforcementLevel;

    #[test]
    fn test_resolution_escalation() {
        let res = Resolution::escalate("no strategy could decide");
        assert!(res.is_escalated());
        assert_eq!(res.strategy, ResolutionStrategy::Fallback);

        let win = Resolution::winner("r1", ResolutionStrategy::PriorityBased, "higher tier");
        assert!(!win.is_escalated());
        assert_eq!(win.winning_rule.as_deref(), Some("r1"));
    }

    #[test]
    fn test_conflict_safety_involvement() {
        let a = Rule::new("a", "A", "x", Tier::Safety, EnforcementLevel::Strict);
        let b = Rule::new("b", "B", "y", Tier::Preference, EnforcementLevel::Adaptive);
        let conflict = Conflict::new(
            &a,
            &b,
            ConflictKind::KeywordOverlap,
            ConflictSeverity::Medium,
            "overlap",
        );
        assert!(conflict.involves_safety_tier());
    }
}
