//! Rule domain types.
//!
//! Rules are immutable once loaded; any tuning produces a new version rather
//! than an in-place edit visible to concurrent readers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::EvaluationContext;
use crate::error::{GuardrailError, GuardrailResult};

/// Rule tier in the three-tier architecture.
///
/// Tiers are fixed priority buckets, always evaluated Safety first,
/// Preference last. The order is not configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Tier 1: non-negotiable rules.
    Safety,
    /// Tier 2: high-priority organizational rules.
    Operational,
    /// Tier 3: user-customizable rules.
    Preference,
}

impl Tier {
    /// Fixed evaluation order. Never reordered by configuration.
    pub const ORDER: [Tier; 3] = [Tier::Safety, Tier::Operational, Tier::Preference];
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Safety => write!(f, "safety"),
            Tier::Operational => write!(f, "operational"),
            Tier::Preference => write!(f, "preference"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = GuardrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "safety" => Ok(Tier::Safety),
            "operational" => Ok(Tier::Operational),
            "preference" => Ok(Tier::Preference),
            _ => Err(GuardrailError::InvalidRule(format!("Unknown tier: {}", s))),
        }
    }
}

/// Per-rule enforcement policy.
///
/// The enforcement level deterministically fixes the resolver family:
/// Strict blocks, Advisory warns with override, Adaptive suggests (and skips
/// privileged roles), Fallback acts only when another resolver fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementLevel {
    /// Automatic blocking, no override.
    Strict,
    /// Warning with override option.
    Advisory,
    /// Context-aware, non-blocking suggestion.
    Adaptive,
    /// Default when other methods fail.
    Fallback,
}

impl std::fmt::Display for EnforcementLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnforcementLevel::Strict => write!(f, "strict"),
            EnforcementLevel::Advisory => write!(f, "advisory"),
            EnforcementLevel::Adaptive => write!(f, "adaptive"),
            EnforcementLevel::Fallback => write!(f, "fallback"),
        }
    }
}

impl std::str::FromStr for EnforcementLevel {
    type Err = GuardrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(EnforcementLevel::Strict),
            "advisory" => Ok(EnforcementLevel::Advisory),
            "adaptive" => Ok(EnforcementLevel::Adaptive),
            "fallback" => Ok(EnforcementLevel::Fallback),
            _ => Err(GuardrailError::InvalidRule(format!(
                "Unknown enforcement level: {}",
                s
            ))),
        }
    }
}

/// Severity of a rule violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Score penalty applied when a violation of this severity merges into a
    /// result. Scores are monotonically non-increasing under merge.
    pub fn penalty(&self) -> f64 {
        match self {
            Severity::Low => 0.1,
            Severity::Medium => 0.3,
            Severity::High => 0.5,
            Severity::Critical => 1.0,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = GuardrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(GuardrailError::InvalidRule(format!(
                "Unknown severity: {}",
                s
            ))),
        }
    }
}

/// Lifecycle status of a rule. Only active rules are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Active,
    Inactive,
    Deprecated,
    Testing,
}

/// Pattern definition for rule matching.
///
/// Owned by exactly one rule. The matcher treats keywords as case-insensitive
/// substrings and regexes as full regex syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub regexes: Vec<String>,
    /// Minimum matcher confidence for a hit to count.
    #[serde(default = "Pattern::default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Hint for external matcher implementations about the action a match
    /// suggests. The built-in resolvers derive the action from the rule's
    /// enforcement level and ignore this field.
    #[serde(default = "Pattern::default_action_hint")]
    pub action_hint: String,
}

impl Pattern {
    fn default_confidence_threshold() -> f64 {
        0.7
    }

    fn default_action_hint() -> String {
        "warn".to_string()
    }

    /// Keyword-only pattern with default threshold.
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            regexes: Vec::new(),
            confidence_threshold: Self::default_confidence_threshold(),
            action_hint: Self::default_action_hint(),
        }
    }

    /// Regex-only pattern with default threshold.
    pub fn regexes<I, S>(regexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: Vec::new(),
            regexes: regexes.into_iter().map(Into::into).collect(),
            confidence_threshold: Self::default_confidence_threshold(),
            action_hint: Self::default_action_hint(),
        }
    }
}

/// Core rule definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tier: Tier,
    pub severity: Severity,
    pub status: RuleStatus,

    /// Patterns the matcher evaluates against content.
    #[serde(default)]
    pub patterns: Vec<Pattern>,

    pub enforcement_level: EnforcementLevel,
    /// Whether a match blocks the request outright.
    pub auto_block: bool,
    /// Whether users may override a resulting violation. Ignored (forced to
    /// false) for Safety-tier rules at evaluation time.
    pub user_override: bool,

    /// Priority within the tier, 1-1000. Lower values are more urgent when
    /// converted into a resolution score.
    pub priority: u32,
    /// Budget for a single match/resolve step.
    pub timeout_ms: u64,
    /// How long a verdict involving this rule may be cached. The shortest
    /// TTL among the rules in an evaluation bounds the result's lifetime,
    /// capped by the cache-wide default.
    pub cache_ttl_seconds: u64,

    /// Tags drive context applicability (`domain:`/`role:` prefixes).
    #[serde(default)]
    pub tags: Vec<String>,

    pub version: String,
    pub created_at: DateTime<Utc>,
}

impl Rule {
    /// Create an active rule with default priority, severity and budgets.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        tier: Tier,
        enforcement_level: EnforcementLevel,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tier,
            severity: Severity::Medium,
            status: RuleStatus::Active,
            patterns: Vec::new(),
            enforcement_level,
            auto_block: enforcement_level == EnforcementLevel::Strict,
            user_override: enforcement_level != EnforcementLevel::Strict,
            priority: 100,
            timeout_ms: 1000,
            cache_ttl_seconds: 300,
            tags: Vec::new(),
            version: "1.0.0".to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn with_patterns(mut self, patterns: Vec<Pattern>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, status: RuleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_cache_ttl_seconds(mut self, cache_ttl_seconds: u64) -> Self {
        self.cache_ttl_seconds = cache_ttl_seconds;
        self
    }

    /// Validate structural constraints before the rule enters a repository.
    pub fn validate(&self) -> GuardrailResult<()> {
        if self.id.trim().is_empty() {
            return Err(GuardrailError::InvalidRule(
                "Rule ID cannot be empty".to_string(),
            ));
        }
        if !(1..=1000).contains(&self.priority) {
            return Err(GuardrailError::InvalidRule(format!(
                "Rule '{}' priority {} out of range 1-1000",
                self.id, self.priority
            )));
        }
        if self.timeout_ms == 0 {
            return Err(GuardrailError::InvalidRule(format!(
                "Rule '{}' timeout must be non-zero",
                self.id
            )));
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }

    /// Whether this rule applies to the given context.
    ///
    /// A rule with `domain:`/`role:` tags applies only when the context's
    /// matching field equals one of the tagged values. A rule with no tags of
    /// a kind places no constraint of that kind.
    pub fn is_applicable_to(&self, context: &EvaluationContext) -> bool {
        if let Some(domain) = &context.domain {
            let domain_tags: Vec<&str> = self
                .tags
                .iter()
                .filter_map(|t| t.strip_prefix("domain:"))
                .collect();
            if !domain_tags.is_empty() && !domain_tags.contains(&domain.as_str()) {
                return false;
            }
        }

        if let Some(role) = &context.user_role {
            let role_tags: Vec<&str> = self
                .tags
                .iter()
                .filter_map(|t| t.strip_prefix("role:"))
                .collect();
            if !role_tags.is_empty() && !role_tags.contains(&role.as_str()) {
                return false;
            }
        }

        true
    }

    /// All keywords across this rule's patterns, lowercased.
    pub fn all_keywords(&self) -> Vec<String> {
        self.patterns
            .iter()
            .flat_map(|p| p.keywords.iter())
            .map(|k| k.to_lowercase())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parse_roundtrip() {
        assert_eq!("safety".parse::<Tier>().unwrap(), Tier::Safety);
        assert_eq!("OPERATIONAL".parse::<Tier>().unwrap(), Tier::Operational);
        assert!("sandbox".parse::<Tier>().is_err());
    }

    #[test]
    fn test_enforcement_level_parse_rejects_unknown() {
        assert_eq!(
            "strict".parse::<EnforcementLevel>().unwrap(),
            EnforcementLevel::Strict
        );
        assert!("lenient".parse::<EnforcementLevel>().is_err());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Critical.penalty() > Severity::Low.penalty());
    }

    #[test]
    fn test_rule_validation() {
        let rule = Rule::new(
            "r1",
            "Test",
            "test rule",
            Tier::Safety,
            EnforcementLevel::Strict,
        );
        assert!(rule.validate().is_ok());

        let empty_id = Rule::new("  ", "Test", "x", Tier::Safety, EnforcementLevel::Strict);
        assert!(empty_id.validate().is_err());

        let bad_priority = Rule::new("r2", "Test", "x", Tier::Safety, EnforcementLevel::Strict)
            .with_priority(1001);
        assert!(bad_priority.validate().is_err());
    }

    #[test]
    fn test_context_applicability_by_domain_tag() {
        let rule = Rule::new(
            "r1",
            "Finance only",
            "finance rule",
            Tier::Operational,
            EnforcementLevel::Advisory,
        )
        .with_tags(["domain:finance"]);

        let finance = EvaluationContext {
            domain: Some("finance".to_string()),
            ..Default::default()
        };
        let health = EvaluationContext {
            domain: Some("health".to_string()),
            ..Default::default()
        };
        let untagged = EvaluationContext::default();

        assert!(rule.is_applicable_to(&finance));
        assert!(!rule.is_applicable_to(&health));
        // No domain in the context means no constraint to violate.
        assert!(rule.is_applicable_to(&untagged));
    }

    #[test]
    fn test_context_applicability_by_role_tag() {
        let rule = Rule::new(
            "r1",
            "Reviewers",
            "reviewer rule",
            Tier::Preference,
            EnforcementLevel::Adaptive,
        )
        .with_tags(["role:reviewer"]);

        let reviewer = EvaluationContext {
            user_role: Some("reviewer".to_string()),
            ..Default::default()
        };
        let author = EvaluationContext {
            user_role: Some("author".to_string()),
            ..Default::default()
        };

        assert!(rule.is_applicable_to(&reviewer));
        assert!(!rule.is_applicable_to(&author));
    }

    #[test]
    fn test_strict_rule_defaults() {
        let rule = Rule::new("r1", "Block", "x", Tier::Safety, EnforcementLevel::Strict);
        assert!(rule.auto_block);
        assert!(!rule.user_override);
    }
}
