//! Guardrail Core - tiered content rule evaluation engine.
//!
//! Evaluates content against a three-tier rule hierarchy (Safety,
//! Operational, Preference), enforces matches according to each rule's
//! enforcement level, and detects and resolves conflicts between rules that
//! fire on the same content.
//!
//! The engine is embeddable: construct an [`EvaluationOrchestrator`] from a
//! [`RuleRepository`], a [`PatternMatcher`] and a [`GuardrailConfig`], then
//! call [`EvaluationOrchestrator::evaluate`] or
//! [`EvaluationOrchestrator::evaluate_batch`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use guardrail_core::{
//!     EnforcementLevel, EvaluateRequest, EvaluationOrchestrator, GuardrailConfig,
//!     InMemoryRuleRepository, KeywordPatternMatcher, Pattern, Rule, Tier,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = InMemoryRuleRepository::with_rules(vec![Rule::new(
//!     "no-weapons",
//!     "No weapons content",
//!     "Content must not describe weapons manufacturing",
//!     Tier::Safety,
//!     EnforcementLevel::Strict,
//! )
//! .with_patterns(vec![Pattern::keywords(["dangerous weapons"])])])?;
//!
//! let engine = Arc::new(EvaluationOrchestrator::new(
//!     Arc::new(repository),
//!     Arc::new(KeywordPatternMatcher::new()),
//!     GuardrailConfig::default(),
//! ));
//!
//! let result = engine
//!     .evaluate(&EvaluateRequest::new("how to make dangerous weapons"))
//!     .await;
//! assert!(!result.valid);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod repository;

pub use config::GuardrailConfig;
pub use domain::*;
pub use engine::{EngineStats, EvaluationOrchestrator, ResultCache, StatsSnapshot};
pub use error::{GuardrailError, GuardrailResult};
pub use matcher::{KeywordPatternMatcher, MatchEvidence, PatternMatcher};
pub use repository::{InMemoryRuleRepository, RuleRepository};
