//! LLM Response Cache
//!
//! Identical field prompts produce identical classification requests; the
//! cache answers repeats without another inference. Availability is always
//! asked of the wrapped provider.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use sha2::{Sha256, Digest};
use async_trait::async_trait;
use crate::agent::{Availability, LLMProvider};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    model: String,
    prompt_hash: [u8; 32],
    system_hash: [u8; 32],
}

impl CacheKey {
    fn new(model: &str, prompt: &str, system: Option<&str>) -> Self {
        Self {
            model: model.to_string(),
            prompt_hash: LLMCache::hash(prompt),
            system_hash: LLMCache::hash(system.unwrap_or("")),
        }
    }
}

pub const DEFAULT_CACHE_CAPACITY: usize = 512;

#[derive(Default)]
struct Entries {
    responses: HashMap<CacheKey, String>,
    /// Insertion order, oldest first.
    order: VecDeque<CacheKey>,
}

/// Bounded response store; the oldest entry is evicted once full.
pub struct LLMCache {
    entries: Arc<RwLock<Entries>>,
    capacity: usize,
}

impl LLMCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn hash(text: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.finalize().into()
    }

    pub async fn get(&self, model: &str, prompt: &str, system: Option<&str>) -> Option<String> {
        let entries = self.entries.read().await;
        entries.responses.get(&CacheKey::new(model, prompt, system)).cloned()
    }

    pub async fn set(&self, model: &str, prompt: &str, system: Option<&str>, response: String) {
        let key = CacheKey::new(model, prompt, system);
        let mut entries = self.entries.write().await;
        if entries.responses.insert(key.clone(), response).is_some() {
            return;
        }
        entries.order.push_back(key);
        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.responses.remove(&oldest);
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.responses.len()
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.responses.clear();
        entries.order.clear();
    }
}

impl Default for LLMCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider that wraps another provider with a cache
pub struct CachedProvider {
    inner: Arc<dyn LLMProvider>,
    cache: Arc<LLMCache>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn LLMProvider>, cache: Arc<LLMCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl LLMProvider for CachedProvider {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> anyhow::Result<String> {
        if let Some(cached) = self.cache.get(model, &prompt, system.as_deref()).await {
            tracing::debug!(target: "contextual::brain", "LLM Cache Hit for model {}", model);
            return Ok(cached);
        }

        let response = self.inner.generate(model, prompt.clone(), system.clone()).await?;
        self.cache.set(model, &prompt, system.as_deref(), response.clone()).await;
        Ok(response)
    }

    async fn availability(&self, model: &str) -> Availability {
        self.inner.availability(model).await
    }
}
