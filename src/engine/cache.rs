//! Result cache - memoizes verdicts for identical content+context.
//!
//! Keys combine a truncated SHA-256 of the content with a fingerprint of the
//! effective context. Eviction policy: entries past their TTL (the cache
//! default, or a shorter per-entry lifetime) are never served and are removed
//! on read; when the size bound is exceeded the oldest entries by creation
//! time are evicted first until the cache fits.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::domain::{EvaluationContext, ValidationResult};

/// One cached verdict snapshot.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: ValidationResult,
    pub created_at: DateTime<Utc>,
    /// Lifetime of this entry. Usually the cache default, shortened when a
    /// short-lived rule participated in the verdict.
    pub ttl_seconds: u64,
}

/// Bounded TTL cache of validation results.
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl_seconds: u64,
    capacity: usize,
}

impl ResultCache {
    pub fn new(default_ttl_seconds: u64, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl_seconds,
            capacity: capacity.max(1),
        }
    }

    /// The TTL applied when no entry-specific lifetime is given.
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl_seconds
    }

    /// Truncated content hash, also stored on the result itself.
    pub fn content_hash(content: &str) -> String {
        let digest = Sha256::digest(content.as_bytes());
        hex::encode(digest)[..16].to_string()
    }

    /// Cache key for a content + context combination.
    ///
    /// The context serializes deterministically (ordered tag map), so equal
    /// contexts always produce equal keys.
    pub fn key(content: &str, context: Option<&EvaluationContext>) -> String {
        let context_part = match context {
            Some(ctx) => {
                let serialized = serde_json::to_string(ctx).unwrap_or_default();
                let digest = Sha256::digest(serialized.as_bytes());
                hex::encode(digest)[..16].to_string()
            }
            None => "no_context".to_string(),
        };
        format!("{}:{}", Self::content_hash(content), context_part)
    }

    /// Fetch a cached result. Never returns an entry past its TTL; expired
    /// entries are dropped on the spot.
    pub fn get(&self, key: &str) -> Option<ValidationResult> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                let age = Utc::now() - entry.created_at;
                if age < Duration::seconds(entry.ttl_seconds as i64) {
                    return Some(entry.result.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            self.entries.remove(key);
            tracing::debug!(key, "Expired cache entry removed");
        }
        None
    }

    /// Store a result snapshot with the default TTL, evicting oldest entries
    /// beyond capacity.
    pub fn insert(&self, key: String, result: ValidationResult) {
        self.insert_with_ttl(key, result, self.default_ttl_seconds);
    }

    /// Store a result snapshot with an explicit lifetime.
    pub fn insert_with_ttl(&self, key: String, result: ValidationResult, ttl_seconds: u64) {
        self.entries.insert(
            key,
            CacheEntry {
                result,
                created_at: Utc::now(),
                ttl_seconds,
            },
        );

        if self.entries.len() > self.capacity {
            self.evict_oldest(self.entries.len() - self.capacity);
        }
    }

    fn evict_oldest(&self, count: usize) {
        let mut by_age: Vec<(String, DateTime<Utc>)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().created_at))
            .collect();
        by_age.sort_by_key(|(_, created_at)| *created_at);

        for (key, _) in by_age.into_iter().take(count) {
            self.entries.remove(&key);
        }
        tracing::debug!(evicted = count, remaining = self.entries.len(), "Cache eviction");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
        tracing::info!("Evaluation cache cleared");
    }

    /// Backdate an entry's creation time. Test hook for TTL behavior.
    #[cfg(test)]
    fn backdate(&self, key: &str, seconds: i64) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.created_at = Utc::now() - Duration::seconds(seconds);
        }
    }
}
