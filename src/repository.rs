//! Rule repository collaborator interface.
//!
//! The engine consumes rules through this trait; loading, parsing and
//! persistence live elsewhere. Every query is fallible so an unavailable
//! store surfaces as [`GuardrailError::Repository`] and becomes an
//! error-flavored result rather than a crash.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{EvaluationContext, Rule, Tier};
use crate::error::{GuardrailError, GuardrailResult};

/// Read-only rule queries consumed by the evaluation engine.
pub trait RuleRepository: Send + Sync {
    /// All active rules in one tier.
    fn rules_by_tier(&self, tier: Tier) -> GuardrailResult<Vec<Rule>>;

    /// Active rules matching the given ids; unknown ids are skipped.
    fn rules_by_ids(&self, ids: &[String]) -> GuardrailResult<Vec<Rule>>;

    /// Active rules applicable to the context (or all active rules when no
    /// context is given).
    fn applicable_rules(&self, context: Option<&EvaluationContext>) -> GuardrailResult<Vec<Rule>>;

    /// A single rule by id.
    fn rule(&self, id: &str) -> GuardrailResult<Option<Rule>>;
}

/// In-memory rule repository.
///
/// Rules are validated on insert and read-only afterwards. Intended for
/// embedding and tests; persistent stores implement [`RuleRepository`]
/// themselves.
#[derive(Default)]
pub struct InMemoryRuleRepository {
    rules: RwLock<HashMap<String, Rule>>,
}

impl InMemoryRuleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from a rule list, validating each rule.
    pub fn with_rules(rules: Vec<Rule>) -> GuardrailResult<Self> {
        let repo = Self::new();
        for rule in rules {
            repo.insert(rule)?;
        }
        Ok(repo)
    }

    /// Insert a rule, rejecting structurally invalid definitions.
    pub fn insert(&self, rule: Rule) -> GuardrailResult<()> {
        rule.validate()?;
        let mut rules = self
            .rules
            .write()
            .map_err(|_| GuardrailError::Repository("rule store lock poisoned".to_string()))?;
        tracing::debug!(rule_id = %rule.id, tier = %rule.tier, "Rule registered");
        rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> GuardrailResult<std::sync::RwLockReadGuard<'_, HashMap<String, Rule>>> {
        self.rules
            .read()
            .map_err(|_| GuardrailError::Repository("rule store lock poisoned".to_string()))
    }
}

impl RuleRepository for InMemoryRuleRepository {
    fn rules_by_tier(&self, tier: Tier) -> GuardrailResult<Vec<Rule>> {
        let rules = self.read()?;
        Ok(rules
            .values()
            .filter(|r| r.is_active() && r.tier == tier)
            .cloned()
            .collect())
    }

    fn rules_by_ids(&self, ids: &[String]) -> GuardrailResult<Vec<Rule>> {
        let rules = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| rules.get(id))
            .filter(|r| r.is_active())
            .cloned()
            .collect())
    }

    fn applicable_rules(&self, context: Option<&EvaluationContext>) -> GuardrailResult<Vec<Rule>> {
        let rules = self.read()?;
        Ok(rules
            .values()
            .filter(|r| r.is_active())
            .filter(|r| context.map_or(true, |ctx| r.is_applicable_to(ctx)))
            .cloned()
            .collect())
    }

    fn rule(&self, id: &str) -> GuardrailResult<Option<Rule>> {
        let rules = self.read()?;
        Ok(rules.get(id).cloned())
    }
}
