use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::RuleSet;

/// Failure reported by a [`RuleSetStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rule set store unavailable: {0}")]
    Unavailable(String),

    #[error("rule set store error: {0}")]
    Other(String),
}

/// Where compiled rule sets are kept between uploads and evaluations.
#[async_trait]
pub trait RuleSetStore: Send + Sync {
    /// All rule sets stored for `class_name`, in upload order. Empty when none.
    async fn load(&self, class_name: &str) -> Result<Vec<Arc<RuleSet>>, StoreError>;

    /// Store `rule_set` under its class key, replacing one with the same id.
    async fn save(&self, rule_set: Arc<RuleSet>) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: RuleSetStore + ?Sized> RuleSetStore for Arc<T> {
    async fn load(&self, class_name: &str) -> Result<Vec<Arc<RuleSet>>, StoreError> {
        (**self).load(class_name).await
    }

    async fn save(&self, rule_set: Arc<RuleSet>) -> Result<(), StoreError> {
        (**self).save(rule_set).await
    }
}

/// Process-local store keyed by [`Metadata::class_key`](crate::Metadata::class_key).
#[derive(Debug, Default)]
pub struct InMemoryRuleSetStore {
    inner: RwLock<HashMap<String, Vec<Arc<RuleSet>>>>,
}

impl InMemoryRuleSetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored rule sets across all classes.
    pub async fn len(&self) -> usize {
        self.inner.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RuleSetStore for InMemoryRuleSetStore {
    async fn load(&self, class_name: &str) -> Result<Vec<Arc<RuleSet>>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.get(class_name).cloned().unwrap_or_default())
    }

    async fn save(&self, rule_set: Arc<RuleSet>) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let bucket = guard
            .entry(rule_set.metadata().class_key().to_owned())
            .or_default();
        match bucket.iter_mut().find(|stored| stored.id() == rule_set.id()) {
            Some(slot) => *slot = rule_set,
            None => bucket.push(rule_set),
        }
        Ok(())
    }
}
