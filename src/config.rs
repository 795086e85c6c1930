//! Configuration module for Guardrail Core.
//!
//! Loads configuration from YAML files and environment variables. The lookup
//! tables that drive conflict resolution (tier weights, context weights) live
//! here and are injected into the orchestrator at construction; there is no
//! implicit global state.

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;

use crate::domain::{ConflictSeverity, ResolutionStrategy};
use crate::error::{GuardrailError, GuardrailResult};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardrailConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub conflict: ConflictConfig,
    #[serde(default)]
    pub weights: WeightsConfig,
}

/// Result cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Entries older than this are never served.
    pub ttl_seconds: u64,
    /// Bound on entry count; oldest entries evicted beyond it.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            capacity: 1000,
        }
    }
}

/// Batch evaluation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Maximum evaluations in flight for one batch.
    pub max_parallel: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_parallel: 10 }
    }
}

/// Conflict detection and resolution configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConflictConfig {
    /// Primary resolution strategy; the fallback resolver is always tried
    /// when this one declines to decide.
    pub strategy: ResolutionStrategy,
    /// Severity reported by the keyword-overlap detector, applied uniformly
    /// even when both rules sit in the Safety tier. Overridable pending
    /// product guidance on tier-aware escalation.
    pub keyword_overlap_severity: ConflictSeverity,
    /// Same-tier priority difference above which a gap conflict is reported.
    /// The comparison is strict: a gap of exactly this value is no conflict.
    pub priority_gap_threshold: u32,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            strategy: ResolutionStrategy::PriorityBased,
            keyword_overlap_severity: ConflictSeverity::Medium,
            priority_gap_threshold: 50,
        }
    }
}

/// Scoring weights for conflict resolution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeightsConfig {
    #[serde(default)]
    pub tier: TierWeights,
    #[serde(default)]
    pub context: ContextWeights,
}

/// Tier weights for priority-based resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct TierWeights {
    pub safety: u32,
    pub operational: u32,
    pub preference: u32,
}

impl TierWeights {
    pub fn weight(&self, tier: crate::domain::Tier) -> u32 {
        match tier {
            crate::domain::Tier::Safety => self.safety,
            crate::domain::Tier::Operational => self.operational,
            crate::domain::Tier::Preference => self.preference,
        }
    }
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            safety: 1000,
            operational: 500,
            preference: 100,
        }
    }
}

/// Tag-match weights for context-aware resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct ContextWeights {
    pub domain: u32,
    pub role: u32,
}

impl Default for ContextWeights {
    fn default() -> Self {
        Self { domain: 8, role: 10 }
    }
}

impl GuardrailConfig {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (GUARDRAIL_*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> GuardrailResult<Self> {
        let config = ConfigLoader::builder()
            // Start with default config
            .add_source(File::with_name("config/default").required(false))
            // Layer on local overrides
            .add_source(File::with_name("config/local").required(false))
            // Layer on environment variables with GUARDRAIL_ prefix
            .add_source(
                Environment::with_prefix("GUARDRAIL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| GuardrailError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| GuardrailError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tier;

    #[test]
    fn test_default_config() {
        let config = GuardrailConfig::default();
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.cache.capacity, 1000);
        assert_eq!(config.batch.max_parallel, 10);
        assert_eq!(config.conflict.priority_gap_threshold, 50);
        assert_eq!(config.conflict.strategy, ResolutionStrategy::PriorityBased);
    }

    #[test]
    fn test_load_without_files_falls_back_to_defaults() {
        // No config files present; every section has serde defaults.
        let config = GuardrailConfig::load().unwrap();
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.batch.max_parallel, 10);
    }

    #[test]
    fn test_tier_weights() {
        let weights = TierWeights::default();
        assert_eq!(weights.weight(Tier::Safety), 1000);
        assert_eq!(weights.weight(Tier::Operational), 500);
        assert_eq!(weights.weight(Tier::Preference), 100);
    }
}
