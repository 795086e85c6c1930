//! Conflict resolvers - pick a winner between two conflicting rules.
//!
//! Strategies deliberately differ in their tie-breaks: priority-based favors
//! the first rule on a tie, context-aware favors the second. Each strategy
//! documents its own direction; they are not interchangeable.

use std::collections::HashMap;

use dashmap::DashMap;

use crate::config::{ContextWeights, TierWeights};
use crate::domain::{EvaluationContext, Resolution, ResolutionStrategy, Rule};

/// Trait for conflict resolver implementations.
///
/// Returning `None` means the strategy declined to decide; the orchestrator
/// must then consult the fallback resolver.
pub trait ConflictResolver: Send + Sync {
    fn resolve(
        &self,
        rule_a: &Rule,
        rule_b: &Rule,
        context: &EvaluationContext,
    ) -> Option<Resolution>;
}

/// Resolves by tier weight plus inverted priority.
///
/// Score = tier_weight + (1000 - priority); higher wins. Ties go to the
/// first rule - an explicit, documented tie-break, not an error.
pub struct PriorityBasedResolver {
    tier_weights: TierWeights,
}

impl PriorityBasedResolver {
    pub fn new(tier_weights: TierWeights) -> Self {
        Self { tier_weights }
    }

    fn score(&self, rule: &Rule) -> i64 {
        self.tier_weights.weight(rule.tier) as i64 + (1000 - rule.priority as i64)
    }
}

impl ConflictResolver for PriorityBasedResolver {
    fn resolve(
        &self,
        rule_a: &Rule,
        rule_b: &Rule,
        _context: &EvaluationContext,
    ) -> Option<Resolution> {
        let score_a = self.score(rule_a);
        let score_b = self.score(rule_b);

        let winner = if score_a >= score_b { rule_a } else { rule_b };
        Some(Resolution::winner(
            &winner.id,
            ResolutionStrategy::PriorityBased,
            format!(
                "Higher priority: {} tier with priority {}",
                winner.tier, winner.priority
            ),
        ))
    }
}

/// Resolves by weighted matches between rule tags and context fields.
///
/// `domain:` tags score the domain weight, `role:` tags the role weight;
/// higher total wins. Ties go to the second rule, intentionally opposite to
/// the priority-based tie-break.
pub struct ContextAwareResolver {
    context_weights: ContextWeights,
}

impl ContextAwareResolver {
    pub fn new(context_weights: ContextWeights) -> Self {
        Self { context_weights }
    }

    fn score(&self, rule: &Rule, context: &EvaluationContext) -> u32 {
        let mut score = 0;
        for tag in &rule.tags {
            if let Some(domain) = tag.strip_prefix("domain:") {
                if context.domain.as_deref() == Some(domain) {
                    score += self.context_weights.domain;
                }
            } else if let Some(role) = tag.strip_prefix("role:") {
                if context.user_role.as_deref() == Some(role) {
                    score += self.context_weights.role;
                }
            }
        }
        score
    }
}

impl ConflictResolver for ContextAwareResolver {
    fn resolve(
        &self,
        rule_a: &Rule,
        rule_b: &Rule,
        context: &EvaluationContext,
    ) -> Option<Resolution> {
        let score_a = self.score(rule_a, context);
        let score_b = self.score(rule_b, context);

        let winner = if score_a > score_b { rule_a } else { rule_b };
        Some(Resolution::winner(
            &winner.id,
            ResolutionStrategy::ContextAware,
            "Better context match".to_string(),
        ))
    }
}

/// Resolves by stored per-user, per-rule preference scores.
///
/// Declines to decide when neither rule has a recorded preference (or the
/// context carries no user), rather than picking arbitrarily.
#[derive(Default)]
pub struct UserPreferenceResolver {
    /// user id -> (rule id -> preference score)
    preferences: DashMap<String, HashMap<String, f64>>,
}

impl UserPreferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user's preference score for a rule.
    pub fn set_preference(
        &self,
        user_id: impl Into<String>,
        rule_id: impl Into<String>,
        score: f64,
    ) {
        let user_id = user_id.into();
        let rule_id = rule_id.into();
        tracing::info!(user_id = %user_id, rule_id = %rule_id, score, "User preference recorded");
        self.preferences
            .entry(user_id)
            .or_default()
            .insert(rule_id, score);
    }
}

impl ConflictResolver for UserPreferenceResolver {
    fn resolve(
        &self,
        rule_a: &Rule,
        rule_b: &Rule,
        context: &EvaluationContext,
    ) -> Option<Resolution> {
        let user_id = context.user_id.as_deref()?;
        let prefs = self.preferences.get(user_id)?;

        let score_a = prefs.get(&rule_a.id).copied().unwrap_or(0.0);
        let score_b = prefs.get(&rule_b.id).copied().unwrap_or(0.0);

        if score_a == 0.0 && score_b == 0.0 {
            return None;
        }

        let winner = if score_a > score_b { rule_a } else { rule_b };
        Some(Resolution::winner(
            &winner.id,
            ResolutionStrategy::UserPreference,
            "Based on user preference settings".to_string(),
        ))
    }
}

/// Strategy of last resort: never picks a side, escalates for human review.
pub struct FallbackResolver;

impl ConflictResolver for FallbackResolver {
    fn resolve(
        &self,
        rule_a: &Rule,
        rule_b: &Rule,
        _context: &EvaluationContext,
    ) -> Option<Resolution> {
        tracing::info!(rule_a = %rule_a.id, rule_b = %rule_b.id, "Applying fallback resolution");
        Some(Resolution::escalate(format!(
            "No strategy could decide between '{}' and '{}'; escalated for human review",
            rule_a.id, rule_b.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnforcementLevel, Tier};

    fn make_rule(id: &str, tier: Tier, priority: u32) -> Rule {
        Rule::new(id, id, "test", tier, EnforcementLevel::Advisory).with_priority(priority)
    }

    #[test]
    fn test_priority_based_safety_beats_preference() {
        let resolver = PriorityBasedResolver::new(TierWeights::default());
        let a = make_rule("a", Tier::Safety, 10);
        let b = make_rule("b", Tier::Preference, 900);

        let resolution = resolver
            .resolve(&a, &b, &EvaluationContext::default())
            .unwrap();
        assert_eq!(resolution.winning_rule.as_deref(), Some("a"));
        assert_eq!(resolution.strategy, ResolutionStrategy::PriorityBased);
    }

    #[test]
    fn test_priority_based_tie_favors_first_rule() {
        let resolver = PriorityBasedResolver::new(TierWeights::default());
        let a = make_rule("a", Tier::Operational, 100);
        let b = make_rule("b", Tier::Operational, 100);

        let resolution = resolver
            .resolve(&a, &b, &EvaluationContext::default())
            .unwrap();
        assert_eq!(resolution.winning_rule.as_deref(), Some("a"));
    }

    #[test]
    fn test_priority_based_is_deterministic() {
        let resolver = PriorityBasedResolver::new(TierWeights::default());
        let a = make_rule("a", Tier::Safety, 10);
        let b = make_rule("b", Tier::Preference, 900);

        for _ in 0..10 {
            let resolution = resolver
                .resolve(&a, &b, &EvaluationContext::default())
                .unwrap();
            assert_eq!(resolution.winning_rule.as_deref(), Some("a"));
        }
    }

    #[test]
    fn test_context_aware_prefers_matching_tags() {
        let resolver = ContextAwareResolver::new(ContextWeights::default());
        let a = make_rule("a", Tier::Operational, 100).with_tags(["domain:finance"]);
        let b = make_rule("b", Tier::Operational, 100).with_tags(["domain:health"]);

        let finance_ctx = EvaluationContext::new().with_domain("finance");
        let resolution = resolver.resolve(&a, &b, &finance_ctx).unwrap();
        assert_eq!(resolution.winning_rule.as_deref(), Some("a"));
    }

    #[test]
    fn test_context_aware_role_outweighs_domain() {
        let resolver = ContextAwareResolver::new(ContextWeights::default());
        let a = make_rule("a", Tier::Operational, 100).with_tags(["domain:finance"]);
        let b = make_rule("b", Tier::Operational, 100).with_tags(["role:auditor"]);

        let ctx = EvaluationContext::new()
            .with_domain("finance")
            .with_role("auditor");
        // role weight 10 > domain weight 8
        let resolution = resolver.resolve(&a, &b, &ctx).unwrap();
        assert_eq!(resolution.winning_rule.as_deref(), Some("b"));
    }

    #[test]
    fn test_context_aware_tie_favors_second_rule() {
        let resolver = ContextAwareResolver::new(ContextWeights::default());
        let a = make_rule("a", Tier::Operational, 100);
        let b = make_rule("b", Tier::Operational, 100);

        let resolution = resolver
            .resolve(&a, &b, &EvaluationContext::default())
            .unwrap();
        assert_eq!(resolution.winning_rule.as_deref(), Some("b"));
    }

    #[test]
    fn test_user_preference_no_decision_without_scores() {
        let resolver = UserPreferenceResolver::new();
        let a = make_rule("a", Tier::Preference, 100);
        let b = make_rule("b", Tier::Preference, 100);

        let ctx = EvaluationContext::new().with_user("u1");
        assert!(resolver.resolve(&a, &b, &ctx).is_none());

        // No user in context also declines.
        assert!(resolver
            .resolve(&a, &b, &EvaluationContext::default())
            .is_none());
    }

    #[test]
    fn test_user_preference_picks_scored_rule() {
        let resolver = UserPreferenceResolver::new();
        resolver.set_preference("u1", "b", 0.9);

        let a = make_rule("a", Tier::Preference, 100);
        let b = make_rule("b", Tier::Preference, 100);
        let ctx = EvaluationContext::new().with_user("u1");

        let resolution = resolver.resolve(&a, &b, &ctx).unwrap();
        assert_eq!(resolution.winning_rule.as_deref(), Some("b"));
        assert_eq!(resolution.strategy, ResolutionStrategy::UserPreference);
    }

    #[test]
    fn test_fallback_always_escalates() {
        let a = make_rule("a", Tier::Safety, 10);
        let b = make_rule("b", Tier::Safety, 20);

        let resolution = FallbackResolver
            .resolve(&a, &b, &EvaluationContext::default())
            .unwrap();
        assert!(resolution.is_escalated());
        assert_eq!(resolution.strategy, ResolutionStrategy::Fallback);
    }
}
