//! Pattern matcher - the pluggable matching primitive.
//!
//! Matching is an external capability as far as the engine is concerned:
//! implementations can range from keyword scanning to ML classifiers. The
//! trait returns a boxed future so the orchestrator can bound each call with
//! the rule's timeout budget.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::domain::{Rule, ViolationKind};
use crate::error::{GuardrailError, GuardrailResult};

/// Boxed future type for trait methods that must be awaitable and dyn-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Evidence that a rule's pattern matched the content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEvidence {
    /// The fragment that matched.
    pub matched_content: String,
    /// All patterns that hit.
    pub matched_patterns: Vec<String>,
    pub kind: ViolationKind,
    pub confidence: f64,
}

/// Trait for pattern matcher implementations.
pub trait PatternMatcher: Send + Sync {
    /// Evaluate a rule's patterns against content.
    ///
    /// Returns `Ok(None)` when nothing matched, `Err` when matching itself
    /// failed (which the tier evaluator routes to the fallback path).
    fn matches<'a>(
        &'a self,
        rule: &'a Rule,
        content: &'a str,
    ) -> BoxFuture<'a, GuardrailResult<Option<MatchEvidence>>>;
}

/// Keyword and regex matcher.
///
/// Keywords are case-insensitive substring checks (confidence 0.8); regexes
/// run the full `regex` syntax (confidence 0.9). A hit below the pattern's
/// configured confidence threshold is discarded.
#[derive(Debug, Default)]
pub struct KeywordPatternMatcher;

const KEYWORD_CONFIDENCE: f64 = 0.8;
const REGEX_CONFIDENCE: f64 = 0.9;

impl KeywordPatternMatcher {
    pub fn new() -> Self {
        Self
    }

    fn match_sync(&self, rule: &Rule, content: &str) -> GuardrailResult<Option<MatchEvidence>> {
        let content_lower = content.to_lowercase();

        for pattern in &rule.patterns {
            for keyword in &pattern.keywords {
                if KEYWORD_CONFIDENCE < pattern.confidence_threshold {
                    continue;
                }
                if content_lower.contains(&keyword.to_lowercase()) {
                    return Ok(Some(MatchEvidence {
                        matched_content: keyword.clone(),
                        matched_patterns: vec![keyword.clone()],
                        kind: ViolationKind::KeywordMatch,
                        confidence: KEYWORD_CONFIDENCE,
                    }));
                }
            }

            for source in &pattern.regexes {
                if REGEX_CONFIDENCE < pattern.confidence_threshold {
                    continue;
                }
                let regex = regex::Regex::new(source).map_err(|e| {
                    GuardrailError::pattern_match(&rule.id, format!("invalid regex: {}", e))
                })?;
                if let Some(found) = regex.find(content) {
                    return Ok(Some(MatchEvidence {
                        matched_content: found.as_str().to_string(),
                        matched_patterns: vec![source.clone()],
                        kind: ViolationKind::RegexMatch,
                        confidence: REGEX_CONFIDENCE,
                    }));
                }
            }
        }

        Ok(None)
    }
}

impl PatternMatcher for KeywordPatternMatcher {
    fn matches<'a>(
        &'a self,
        rule: &'a Rule,
        content: &'a str,
    ) -> BoxFuture<'a, GuardrailResult<Option<MatchEvidence>>> {
        Box::pin(async move { self.match_sync(rule, content) })
    }
}
