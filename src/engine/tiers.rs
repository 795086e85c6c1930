//! Tier evaluator - applies one tier's rules to content.
//!
//! One evaluator instance exists per tier. Enforcement is per-rule (a
//! Preference-tier rule may still be Strict); the tier only contributes its
//! position in the fixed evaluation order and its nominal confidence. A
//! failing rule never aborts the tier: match and resolve errors are routed
//! to the fallback handler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::domain::{EvaluationContext, PartialResult, Rule, Tier, Violation};
use crate::engine::enforcement::{resolver_for, EnforcementOutcome, FallbackHandler};
use crate::error::GuardrailError;
use crate::matcher::PatternMatcher;

/// Evaluates the subset of applicable rules belonging to one tier.
pub struct TierEvaluator {
    tier: Tier,
    /// Baseline confidence contributed when merging this tier's result.
    nominal_confidence: f64,
    fallback: FallbackHandler,
    evaluations: AtomicU64,
}

impl TierEvaluator {
    pub fn new(tier: Tier) -> Self {
        let nominal_confidence = match tier {
            Tier::Safety => 1.0,
            Tier::Operational => 0.9,
            Tier::Preference => 0.8,
        };
        Self {
            tier,
            nominal_confidence,
            fallback: FallbackHandler,
            evaluations: AtomicU64::new(0),
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// How many times this tier has been evaluated.
    pub fn evaluation_count(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Evaluate content against this tier's rules.
    ///
    /// `rules` must already be filtered to this tier. Returns the partial
    /// result plus the rules that actually matched, which the orchestrator
    /// feeds into conflict detection.
    pub async fn evaluate(
        &self,
        matcher: &dyn PatternMatcher,
        content: &str,
        context: &EvaluationContext,
        rules: &[Rule],
        request_timeout: Duration,
    ) -> (PartialResult, Vec<Rule>) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        let mut partial = PartialResult::clean(self.tier, self.nominal_confidence);
        let mut matched_rules = Vec::new();

        for rule in rules {
            debug_assert_eq!(rule.tier, self.tier);
            partial.rules_evaluated += 1;

            if !rule.is_applicable_to(context) {
                continue;
            }

            let budget = Duration::from_millis(rule.timeout_ms).min(request_timeout);
            let outcome = match tokio::time::timeout(budget, matcher.matches(rule, content)).await {
                Err(_) => {
                    let err = GuardrailError::pattern_match(
                        &rule.id,
                        format!("timed out after {:?}", budget),
                    );
                    self.fallback.handle_failure(rule, &err)
                }
                Ok(Err(err)) => self.fallback.handle_failure(rule, &err),
                Ok(Ok(None)) => continue,
                Ok(Ok(Some(evidence))) => {
                    matched_rules.push(rule.clone());
                    match resolver_for(rule.enforcement_level).resolve(rule, &evidence, context) {
                        Ok(outcome) => outcome,
                        Err(err) => self.fallback.handle_failure(rule, &err),
                    }
                }
            };

            match outcome {
                EnforcementOutcome::Skip => {}
                EnforcementOutcome::Violation(violation) => {
                    partial.violations.push(self.clamp_override(violation));
                }
                EnforcementOutcome::Suggestion(suggestion) => {
                    partial.suggestions.push(suggestion);
                }
            }
        }

        partial.valid = !partial.violations.iter().any(|v| v.blocked);
        partial.score = tier_score(&partial.violations);

        tracing::debug!(
            tier = %self.tier,
            rules = partial.rules_evaluated,
            violations = partial.violations.len(),
            suggestions = partial.suggestions.len(),
            valid = partial.valid,
            "Tier evaluation complete"
        );

        (partial, matched_rules)
    }

    /// Safety-tier violations can never be user-overridden, regardless of
    /// what the rule (or the fallback path) declared.
    fn clamp_override(&self, mut violation: Violation) -> Violation {
        if self.tier == Tier::Safety {
            violation.user_override_allowed = false;
        }
        violation
    }
}

/// Tier score: 1.0 minus the severity penalty of each violation, floored at 0.
fn tier_score(violations: &[Violation]) -> f64 {
    let penalty: f64 = violations.iter().map(|v| v.rule_severity.penalty()).sum();
    (1.0 - penalty).max(0.0)
}
