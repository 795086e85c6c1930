//! Evaluation context - situational input supplied by the caller.
//!
//! The context is read-only; the core never mutates it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Situational context for an evaluation request.
///
/// `tags` uses an ordered map so the context serializes deterministically,
/// which the result cache relies on for stable keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    pub user_id: Option<String>,
    pub domain: Option<String>,
    pub user_role: Option<String>,
    pub content_type: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.user_role = Some(role.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Whether the acting role is privileged. Adaptive enforcement skips
    /// privileged contexts entirely.
    pub fn is_privileged(&self) -> bool {
        self.user_role.as_deref() == Some("admin")
    }
}
