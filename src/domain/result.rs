//! Evaluation requests and aggregate verdicts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    ActionTaken, Conflict, EvaluationContext, Severity, Suggestion, Tier, Violation,
};

/// Request to evaluate a piece of content against the rule set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub content: String,
    pub context: Option<EvaluationContext>,
    /// Restrict evaluation to one tier.
    pub tier_filter: Option<Tier>,
    /// Restrict evaluation to specific rules.
    pub rule_id_filter: Option<Vec<String>>,
    /// Skip lower tiers once a Safety violation blocks the request.
    pub early_termination: bool,
    /// Request-level cap on each rule's match/resolve budget.
    pub timeout_ms: u64,
}

impl EvaluateRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            context: None,
            tier_filter: None,
            rule_id_filter: None,
            early_termination: true,
            timeout_ms: 1000,
        }
    }

    pub fn with_context(mut self, context: EvaluationContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_tier_filter(mut self, tier: Tier) -> Self {
        self.tier_filter = Some(tier);
        self
    }

    pub fn with_rule_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_id_filter = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_early_termination(mut self, enabled: bool) -> Self {
        self.early_termination = enabled;
        self
    }
}

/// Output of a single tier's evaluation, merged into the aggregate result.
#[derive(Debug, Clone)]
pub struct PartialResult {
    pub tier: Tier,
    pub valid: bool,
    pub score: f64,
    pub confidence: f64,
    pub violations: Vec<Violation>,
    pub suggestions: Vec<Suggestion>,
    pub rules_evaluated: usize,
}

impl PartialResult {
    pub fn clean(tier: Tier, confidence: f64) -> Self {
        Self {
            tier,
            valid: true,
            score: 1.0,
            confidence,
            violations: Vec::new(),
            suggestions: Vec::new(),
            rules_evaluated: 0,
        }
    }
}

/// Aggregate verdict for one evaluation request.
///
/// Immutable snapshot once cached; a cached instance is returned as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub request_id: String,
    pub valid: bool,
    /// 0-1, monotonically non-increasing as violations merge in.
    pub score: f64,
    pub confidence: f64,

    pub violations: Vec<Violation>,
    pub suggestions: Vec<Suggestion>,
    pub conflicts: Vec<Conflict>,
    /// Set when a conflict could not be decided by any strategy.
    pub requires_human_review: bool,

    pub total_rules_evaluated: usize,
    /// Rules evaluated per tier, keyed by tier name.
    pub rules_by_tier: BTreeMap<String, usize>,

    pub processing_time_ms: u64,
    pub content_hash: String,
    pub evaluated_at: DateTime<Utc>,
}

impl ValidationResult {
    /// Fresh result before any tier has merged in.
    pub fn new(content_hash: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            valid: true,
            score: 1.0,
            confidence: 1.0,
            violations: Vec::new(),
            suggestions: Vec::new(),
            conflicts: Vec::new(),
            requires_human_review: false,
            total_rules_evaluated: 0,
            rules_by_tier: BTreeMap::new(),
            processing_time_ms: 0,
            content_hash: content_hash.into(),
            evaluated_at: Utc::now(),
        }
    }

    /// Error-flavored result: invalid, blocked, a single system violation.
    /// Used when the repository is unavailable or a batch item fails.
    pub fn error(content_hash: impl Into<String>, explanation: impl Into<String>) -> Self {
        let mut result = Self::new(content_hash);
        result.valid = false;
        result.score = 0.0;
        result.confidence = 0.0;
        result.violations.push(Violation {
            rule_id: "system_error".to_string(),
            rule_name: "System Error".to_string(),
            rule_tier: Tier::Safety,
            rule_severity: Severity::Critical,
            kind: crate::domain::ViolationKind::SystemError,
            matched_content: None,
            matched_patterns: Vec::new(),
            confidence: 1.0,
            action_taken: ActionTaken::Block,
            blocked: true,
            user_override_allowed: false,
            explanation: explanation.into(),
            detected_at: Utc::now(),
        });
        result
    }

    /// Merge a tier's partial result into the aggregate.
    ///
    /// Violations and suggestions concatenate, `valid` ANDs, `score` takes
    /// the minimum, `confidence` takes a running average.
    pub fn merge_tier(&mut self, partial: PartialResult) {
        self.valid = self.valid && partial.valid;
        self.score = self.score.min(partial.score);
        self.confidence = (self.confidence + partial.confidence) / 2.0;
        self.violations.extend(partial.violations);
        self.suggestions.extend(partial.suggestions);
        self.total_rules_evaluated += partial.rules_evaluated;
        self.rules_by_tier
            .insert(partial.tier.to_string(), partial.rules_evaluated);
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn is_blocked(&self) -> bool {
        self.violations.iter().any(|v| v.blocked)
    }

    /// Violations with critical severity.
    pub fn critical_violations(&self) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.is_critical()).collect()
    }

    /// Violations that resulted in a warning.
    pub fn warnings(&self) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.action_taken == ActionTaken::Warning)
            .collect()
    }
}
