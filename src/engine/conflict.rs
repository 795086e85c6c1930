//! Conflict detectors - pairwise incompatibility checks between rules.
//!
//! Detection is pure and order-independent: `detect(a, b)` equals
//! `detect(b, a)` up to swapped references. A full scan over a candidate set
//! is pairwise O(n²) and only runs when more than one rule matched the same
//! content within a tier; cross-tier disagreements are settled by tier order,
//! not by this subsystem.

use std::collections::HashSet;

use crate::domain::{Conflict, ConflictKind, ConflictSeverity, Rule};

/// Trait for conflict detector implementations.
pub trait ConflictDetector: Send + Sync {
    fn detect(&self, rule_a: &Rule, rule_b: &Rule) -> Option<Conflict>;
}

/// Conflict when two rules' keyword sets intersect.
pub struct KeywordOverlapDetector {
    /// Reported severity for every overlap, even between two Safety-tier
    /// rules; overridable pending product guidance on tier-aware escalation.
    severity: ConflictSeverity,
}

impl KeywordOverlapDetector {
    pub fn new(severity: ConflictSeverity) -> Self {
        Self { severity }
    }
}

impl ConflictDetector for KeywordOverlapDetector {
    fn detect(&self, rule_a: &Rule, rule_b: &Rule) -> Option<Conflict> {
        let keywords_a: HashSet<String> = rule_a.all_keywords().into_iter().collect();
        let keywords_b: HashSet<String> = rule_b.all_keywords().into_iter().collect();

        let mut shared: Vec<&String> = keywords_a.intersection(&keywords_b).collect();
        if shared.is_empty() {
            return None;
        }
        shared.sort();

        Some(Conflict::new(
            rule_a,
            rule_b,
            ConflictKind::KeywordOverlap,
            self.severity,
            format!(
                "Rules have overlapping keywords: {}",
                shared
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ))
    }
}

/// Conflict when two same-tier rules sit more than `gap_threshold` priority
/// points apart. A gap of exactly the threshold is not a conflict.
pub struct PriorityGapDetector {
    gap_threshold: u32,
}

impl PriorityGapDetector {
    pub fn new(gap_threshold: u32) -> Self {
        Self { gap_threshold }
    }
}

impl ConflictDetector for PriorityGapDetector {
    fn detect(&self, rule_a: &Rule, rule_b: &Rule) -> Option<Conflict> {
        if rule_a.tier != rule_b.tier {
            return None;
        }

        let gap = rule_a.priority.abs_diff(rule_b.priority);
        if gap <= self.gap_threshold {
            return None;
        }

        Some(Conflict::new(
            rule_a,
            rule_b,
            ConflictKind::PriorityGap,
            ConflictSeverity::Low,
            format!(
                "Large priority gap: {} vs {}",
                rule_a.priority, rule_b.priority
            ),
        ))
    }
}

/// Conflict when one rule's description carries the positive term of an
/// antonym pair and the other carries the negative term.
pub struct SemanticContradictionDetector {
    antonym_pairs: Vec<(&'static str, &'static str)>,
}

impl Default for SemanticContradictionDetector {
    fn default() -> Self {
        Self {
            antonym_pairs: vec![
                ("allow", "deny"),
                ("enable", "disable"),
                ("require", "forbid"),
                ("must", "must not"),
            ],
        }
    }
}

impl SemanticContradictionDetector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConflictDetector for SemanticContradictionDetector {
    fn detect(&self, rule_a: &Rule, rule_b: &Rule) -> Option<Conflict> {
        let desc_a = rule_a.description.to_lowercase();
        let desc_b = rule_b.description.to_lowercase();

        for (positive, negative) in &self.antonym_pairs {
            let forward = desc_a.contains(positive) && desc_b.contains(negative);
            let reverse = desc_b.contains(positive) && desc_a.contains(negative);
            if forward || reverse {
                return Some(Conflict::new(
                    rule_a,
                    rule_b,
                    ConflictKind::SemanticContradiction,
                    ConflictSeverity::High,
                    format!("Contradictory terms: {} vs {}", positive, negative),
                ));
            }
        }

        None
    }
}

/// Run every detector over every unordered pair of rules.
pub fn detect_conflicts(detectors: &[Box<dyn ConflictDetector>], rules: &[&Rule]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for (i, rule_a) in rules.iter().enumerate() {
        for rule_b in rules.iter().skip(i + 1) {
            for detector in detectors {
                if let Some(conflict) = detector.detect(rule_a, rule_b) {
                    tracing::debug!(
                        rule_a = %conflict.rule_a.id,
                        rule_b = %conflict.rule_b.id,
                        kind = ?conflict.kind,
                        "Conflict detected"
                    );
                    conflicts.push(conflict);
                }
            }
        }
    }

    conflicts
}
