//! Evaluation engine for Guardrail Core.
//!
//! This module contains the tiered evaluation pipeline:
//! - Tier Evaluators: Apply Safety, Operational and Preference rules in order
//! - Enforcement Resolvers: Turn a rule match into a block, warning or suggestion
//! - Conflict Detectors: Find incompatibilities between matched rules
//! - Conflict Resolvers: Pick a winner or escalate to human review
//! - Result Cache and Stats: Memoization and counters
//! - Evaluation Orchestrator: Ties all stages together

mod cache;
mod conflict;
mod enforcement;
mod orchestrator;
mod resolution;
mod stats;
mod tiers;

pub use cache::*;
pub use conflict::*;
pub use enforcement::*;
pub use orchestrator::*;
pub use resolution::*;
pub use stats::*;
pub use tiers::*;
