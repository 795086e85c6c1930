//! Enforcement resolvers - convert a rule match into a concrete outcome.
//!
//! A rule's enforcement level deterministically fixes its resolver: Strict
//! blocks, Advisory warns with override, Adaptive suggests (skipping
//! privileged roles), Fallback acts only on resolver failure. Fallback-level
//! rules produce nothing on a direct match.

use chrono::Utc;

use crate::domain::{
    ActionTaken, EnforcementLevel, EvaluationContext, Rule, Severity, Suggestion, Tier, Violation,
    ViolationKind,
};
use crate::error::{GuardrailError, GuardrailResult};
use crate::matcher::MatchEvidence;

/// Outcome of resolving a rule match.
#[derive(Debug, Clone)]
pub enum EnforcementOutcome {
    /// No record produced (adaptive skip, fallback-level rule, fail-open).
    Skip,
    /// A violation, possibly blocking.
    Violation(Violation),
    /// A non-blocking improvement suggestion.
    Suggestion(Suggestion),
}

impl EnforcementOutcome {
    pub fn is_skip(&self) -> bool {
        matches!(self, EnforcementOutcome::Skip)
    }
}

/// Trait for enforcement resolver implementations.
pub trait EnforcementResolver: Send + Sync {
    /// Convert a match into an outcome. Errors are routed to the fallback
    /// handler by the tier evaluator.
    fn resolve(
        &self,
        rule: &Rule,
        evidence: &MatchEvidence,
        context: &EvaluationContext,
    ) -> GuardrailResult<EnforcementOutcome>;
}

/// Strict enforcement: always blocks, never overridable.
///
/// Confidence is fixed high rather than taken from the matcher; a strict
/// rule's verdict is non-negotiable by definition.
pub struct StrictResolver;

impl EnforcementResolver for StrictResolver {
    fn resolve(
        &self,
        rule: &Rule,
        evidence: &MatchEvidence,
        _context: &EvaluationContext,
    ) -> GuardrailResult<EnforcementOutcome> {
        tracing::warn!(rule_id = %rule.id, matched = %evidence.matched_content, "Strict enforcement blocked content");
        Ok(EnforcementOutcome::Violation(Violation {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            rule_tier: rule.tier,
            rule_severity: Severity::Critical,
            kind: evidence.kind,
            matched_content: Some(evidence.matched_content.clone()),
            matched_patterns: evidence.matched_patterns.clone(),
            confidence: 0.95,
            action_taken: ActionTaken::Block,
            blocked: true,
            user_override_allowed: false,
            explanation: format!("Strict enforcement: {}", rule.description),
            detected_at: Utc::now(),
        }))
    }
}

/// Advisory enforcement: warns, user may override.
pub struct AdvisoryResolver;

impl EnforcementResolver for AdvisoryResolver {
    fn resolve(
        &self,
        rule: &Rule,
        evidence: &MatchEvidence,
        _context: &EvaluationContext,
    ) -> GuardrailResult<EnforcementOutcome> {
        tracing::info!(rule_id = %rule.id, "Advisory warning issued");
        Ok(EnforcementOutcome::Violation(Violation {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            rule_tier: rule.tier,
            rule_severity: Severity::Medium,
            kind: evidence.kind,
            matched_content: Some(evidence.matched_content.clone()),
            matched_patterns: evidence.matched_patterns.clone(),
            confidence: 0.8,
            action_taken: ActionTaken::Warning,
            blocked: false,
            user_override_allowed: true,
            explanation: format!("Advisory: {}. User can override.", rule.description),
            detected_at: Utc::now(),
        }))
    }
}

/// Adaptive enforcement: context-aware, non-blocking suggestions.
///
/// Privileged ("admin") contexts bypass adaptive rules entirely.
pub struct AdaptiveResolver;

impl EnforcementResolver for AdaptiveResolver {
    fn resolve(
        &self,
        rule: &Rule,
        evidence: &MatchEvidence,
        context: &EvaluationContext,
    ) -> GuardrailResult<EnforcementOutcome> {
        if context.is_privileged() {
            tracing::debug!(rule_id = %rule.id, "Skipping adaptive rule for privileged role");
            return Ok(EnforcementOutcome::Skip);
        }

        tracing::info!(rule_id = %rule.id, "Adaptive suggestion produced");
        Ok(EnforcementOutcome::Suggestion(Suggestion {
            source_rule: rule.id.clone(),
            title: format!("Suggestion: {}", rule.name),
            description: rule.description.clone(),
            confidence: 0.7,
            created_at: Utc::now(),
        }))
    }
}

/// No-op resolver for rules declared at the fallback enforcement level.
/// Such rules act only through failure handling, never on a direct match.
pub struct NullResolver;

impl EnforcementResolver for NullResolver {
    fn resolve(
        &self,
        _rule: &Rule,
        _evidence: &MatchEvidence,
        _context: &EvaluationContext,
    ) -> GuardrailResult<EnforcementOutcome> {
        Ok(EnforcementOutcome::Skip)
    }
}

/// The resolver fixed by a rule's enforcement level.
pub fn resolver_for(level: EnforcementLevel) -> &'static dyn EnforcementResolver {
    match level {
        EnforcementLevel::Strict => &StrictResolver,
        EnforcementLevel::Advisory => &AdvisoryResolver,
        EnforcementLevel::Adaptive => &AdaptiveResolver,
        EnforcementLevel::Fallback => &NullResolver,
    }
}

/// Fallback handler: invoked when matching or resolving failed.
///
/// Safety-tier failures fail closed with a conservative warning so they never
/// silently disappear; other tiers fail open.
pub struct FallbackHandler;

impl FallbackHandler {
    pub fn handle_failure(&self, rule: &Rule, error: &GuardrailError) -> EnforcementOutcome {
        tracing::error!(rule_id = %rule.id, error = %error, "Rule enforcement failed, applying fallback");

        if rule.tier != Tier::Safety {
            return EnforcementOutcome::Skip;
        }

        EnforcementOutcome::Violation(Violation {
            rule_id: format!("fallback_{}", rule.id),
            rule_name: format!("Fallback: {}", rule.name),
            rule_tier: rule.tier,
            rule_severity: Severity::High,
            kind: ViolationKind::SystemError,
            matched_content: None,
            matched_patterns: Vec::new(),
            confidence: 0.5,
            action_taken: ActionTaken::Warning,
            blocked: false,
            user_override_allowed: true,
            explanation: format!("Rule enforcement failed. Error: {}", error),
            detected_at: Utc::now(),
        })
    }
}
