//! Evaluation orchestrator - ties tiers, conflicts, cache and stats together.
//!
//! Tiers always run in the fixed order Safety, Operational, Preference. A
//! blocking Safety violation short-circuits the lower tiers when the request
//! allows early termination. Conflict detection runs per tier over the rules
//! that actually matched; cross-tier disagreements are already settled by the
//! tier order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::GuardrailConfig;
use crate::domain::{
    Conflict, EvaluateRequest, EvaluationContext, ResolutionStrategy, Rule, Tier, ValidationResult,
};
use crate::engine::cache::ResultCache;
use crate::engine::conflict::{
    detect_conflicts, ConflictDetector, KeywordOverlapDetector, PriorityGapDetector,
    SemanticContradictionDetector,
};
use crate::engine::resolution::{
    ConflictResolver, ContextAwareResolver, FallbackResolver, PriorityBasedResolver,
    UserPreferenceResolver,
};
use crate::engine::stats::{EngineStats, StatsSnapshot};
use crate::engine::tiers::TierEvaluator;
use crate::matcher::PatternMatcher;
use crate::repository::RuleRepository;

/// Front door of the evaluation engine.
pub struct EvaluationOrchestrator {
    repository: Arc<dyn RuleRepository>,
    matcher: Arc<dyn PatternMatcher>,
    tiers: [TierEvaluator; 3],
    detectors: Vec<Box<dyn ConflictDetector>>,
    strategy: ResolutionStrategy,
    priority_resolver: PriorityBasedResolver,
    context_resolver: ContextAwareResolver,
    preference_resolver: UserPreferenceResolver,
    fallback_resolver: FallbackResolver,
    cache: ResultCache,
    stats: EngineStats,
    max_parallel: usize,
}

impl EvaluationOrchestrator {
    pub fn new(
        repository: Arc<dyn RuleRepository>,
        matcher: Arc<dyn PatternMatcher>,
        config: GuardrailConfig,
    ) -> Self {
        let detectors: Vec<Box<dyn ConflictDetector>> = vec![
            Box::new(KeywordOverlapDetector::new(
                config.conflict.keyword_overlap_severity,
            )),
            Box::new(PriorityGapDetector::new(
                config.conflict.priority_gap_threshold,
            )),
            Box::new(SemanticContradictionDetector::new()),
        ];

        Self {
            repository,
            matcher,
            tiers: Tier::ORDER.map(TierEvaluator::new),
            detectors,
            strategy: config.conflict.strategy,
            priority_resolver: PriorityBasedResolver::new(config.weights.tier),
            context_resolver: ContextAwareResolver::new(config.weights.context),
            preference_resolver: UserPreferenceResolver::new(),
            fallback_resolver: FallbackResolver,
            cache: ResultCache::new(config.cache.ttl_seconds, config.cache.capacity),
            stats: EngineStats::new(),
            max_parallel: config.batch.max_parallel,
        }
    }

    /// Evaluate one request.
    ///
    /// Never fails outward: infrastructure errors become an invalid, blocked
    /// result carrying a single system violation.
    pub async fn evaluate(&self, request: &EvaluateRequest) -> ValidationResult {
        let started = Instant::now();
        let content_hash = ResultCache::content_hash(&request.content);
        let cache_key = ResultCache::key(&request.content, request.context.as_ref());

        if let Some(cached) = self.cache.get(&cache_key) {
            tracing::debug!(content_hash = %content_hash, "Cache hit");
            self.stats.record_cache_hit();
            return cached;
        }

        let context = request.context.clone().unwrap_or_default();
        let rules = match self.fetch_rules(request) {
            Ok(rules) => rules,
            Err(err) => {
                tracing::error!(error = %err, "Rule repository unavailable");
                self.stats
                    .record_failure(started.elapsed().as_micros() as u64);
                let mut result = ValidationResult::error(
                    content_hash,
                    format!("Rule repository unavailable: {}", err),
                );
                result.processing_time_ms = started.elapsed().as_millis() as u64;
                return result;
            }
        };

        let mut result = ValidationResult::new(content_hash);

        if rules.is_empty() {
            tracing::debug!("No applicable rules; content passes");
            result.processing_time_ms = started.elapsed().as_millis() as u64;
            self.stats
                .record_success(0, 0, started.elapsed().as_micros() as u64);
            return result;
        }

        // The shortest-lived rule involved bounds how long the verdict may
        // be cached.
        let result_ttl = rules
            .iter()
            .map(|r| r.cache_ttl_seconds)
            .min()
            .unwrap_or(self.cache.default_ttl())
            .min(self.cache.default_ttl());

        let mut by_tier: HashMap<Tier, Vec<Rule>> = HashMap::new();
        for rule in rules {
            by_tier.entry(rule.tier).or_default().push(rule);
        }

        let request_timeout = Duration::from_millis(request.timeout_ms);
        for evaluator in &self.tiers {
            let tier = evaluator.tier();
            if request.tier_filter.is_some_and(|filter| filter != tier) {
                continue;
            }
            let tier_rules = match by_tier.get(&tier) {
                Some(rules) => rules,
                None => continue,
            };

            let (partial, matched) = evaluator
                .evaluate(
                    self.matcher.as_ref(),
                    &request.content,
                    &context,
                    tier_rules,
                    request_timeout,
                )
                .await;
            result.merge_tier(partial);

            if matched.len() > 1 {
                self.run_conflict_pass(&mut result, &matched, &context);
            }

            if tier == Tier::Safety && request.early_termination && result.is_blocked() {
                tracing::info!("Safety violation blocked content; skipping lower tiers");
                break;
            }
        }

        result.processing_time_ms = started.elapsed().as_millis() as u64;
        let blocks = result.violations.iter().filter(|v| v.blocked).count() as u64;
        self.stats.record_success(
            result.violations.len() as u64,
            blocks,
            started.elapsed().as_micros() as u64,
        );

        self.cache.insert_with_ttl(cache_key, result.clone(), result_ttl);
        result
    }

    /// Evaluate a batch concurrently, bounded by `max_parallel` (defaulting
    /// to the configured limit). Results come back in input order; one item's
    /// failure never affects its neighbors.
    pub async fn evaluate_batch(
        self: &Arc<Self>,
        requests: Vec<EvaluateRequest>,
        max_parallel: Option<usize>,
    ) -> Vec<ValidationResult> {
        let limit = max_parallel.unwrap_or(self.max_parallel).max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let hashes: Vec<String> = requests
            .iter()
            .map(|r| ResultCache::content_hash(&r.content))
            .collect();

        let mut join_set = JoinSet::new();
        for (idx, request) in requests.into_iter().enumerate() {
            let orchestrator = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            let hash = hashes[idx].clone();
            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            idx,
                            ValidationResult::error(hash, "Batch concurrency limiter closed"),
                        )
                    }
                };
                (idx, orchestrator.evaluate(&request).await)
            });
        }

        let mut slots: Vec<Option<ValidationResult>> = hashes.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(err) => tracing::error!(error = %err, "Batch evaluation task failed"),
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| {
                    ValidationResult::error(hashes[idx].clone(), "Batch evaluation task failed")
                })
            })
            .collect()
    }

    /// Record a user's preference score, consulted by the user-preference
    /// resolution strategy.
    pub fn set_user_preference(
        &self,
        user_id: impl Into<String>,
        rule_id: impl Into<String>,
        score: f64,
    ) {
        self.preference_resolver
            .set_preference(user_id, rule_id, score);
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn fetch_rules(&self, request: &EvaluateRequest) -> crate::error::GuardrailResult<Vec<Rule>> {
        if let Some(ids) = &request.rule_id_filter {
            return self.repository.rules_by_ids(ids);
        }
        if let Some(tier) = request.tier_filter {
            return self.repository.rules_by_tier(tier);
        }
        self.repository.applicable_rules(request.context.as_ref())
    }

    /// Detect conflicts among the rules that matched within one tier and
    /// resolve each. An escalated resolution flags the whole result for
    /// human review.
    fn run_conflict_pass(
        &self,
        result: &mut ValidationResult,
        matched: &[Rule],
        context: &EvaluationContext,
    ) {
        let refs: Vec<&Rule> = matched.iter().collect();
        let mut conflicts = detect_conflicts(&self.detectors, &refs);

        for conflict in &mut conflicts {
            let resolution = self.resolve_conflict(conflict, matched, context);
            if resolution.is_escalated() {
                result.requires_human_review = true;
            }
            conflict.resolution = Some(resolution);
        }

        result.conflicts.extend(conflicts);
    }

    fn resolve_conflict(
        &self,
        conflict: &Conflict,
        matched: &[Rule],
        context: &EvaluationContext,
    ) -> crate::domain::Resolution {
        let rule_a = matched.iter().find(|r| r.id == conflict.rule_a.id);
        let rule_b = matched.iter().find(|r| r.id == conflict.rule_b.id);
        let (rule_a, rule_b) = match (rule_a, rule_b) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return crate::domain::Resolution::escalate(
                    "Conflicting rules no longer available for resolution".to_string(),
                )
            }
        };

        let primary: &dyn ConflictResolver = match self.strategy {
            ResolutionStrategy::PriorityBased => &self.priority_resolver,
            ResolutionStrategy::ContextAware => &self.context_resolver,
            ResolutionStrategy::UserPreference => &self.preference_resolver,
            ResolutionStrategy::Fallback => &self.fallback_resolver,
        };

        primary
            .resolve(rule_a, rule_b, context)
            .or_else(|| self.fallback_resolver.resolve(rule_a, rule_b, context))
            .unwrap_or_else(|| {
                crate::domain::Resolution::escalate(format!(
                    "No strategy could decide between '{}' and '{}'",
                    rule_a.id, rule_b.id
                ))
            })
    }
}
