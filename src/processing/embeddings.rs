//! Embedding providers: the capability trait, a caching layer and the Model2Vec backend

use crate::catalog::skill::normalize;
use crate::error::{Result, SkillGapError};
use anyhow::Context;
use async_trait::async_trait;
use log::{debug, info};
use model2vec_rs::model::StaticModel;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Maps a skill name to a fixed-length vector.
///
/// Implementations report network, timeout and model failures as
/// `SkillGapError::ProviderUnavailable`; callers do not retry.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of every vector this provider returns
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text).await
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub cache_size: usize,
    pub hits: usize,
    pub misses: usize,
    pub model_name: String,
}

/// Memoizes another provider by normalized text.
///
/// The cache lock is never held while the inner provider is awaited, so two
/// concurrent misses on the same text may both reach the provider.
pub struct CachedEmbedder<E> {
    inner: E,
    cache: Mutex<HashMap<String, Vec<f32>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            cache_size: self.cache.lock().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            model_name: self.inner.model_name().to_string(),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}

#[async_trait]
impl<E: Embedder> Embedder for CachedEmbedder<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = normalize(text);
        let cached = self.cache.lock().get(&key).cloned();
        if let Some(cached) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let embedding = self.inner.embed(&key).await?;
        self.cache.lock().insert(key, embedding.clone());
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Local static-embedding model loaded from disk or the Hugging Face hub
pub struct Model2VecEmbedder {
    model: Arc<StaticModel>,
    dimension: usize,
    model_name: String,
}

impl Model2VecEmbedder {
    pub fn load(model: &str) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model: {}", model);

        let static_model = StaticModel::from_pretrained(model, None, None, None)
            .with_context(|| format!("Failed to load model {}", model))?;

        let dimension = static_model.encode_single("dimension probe").len();
        if dimension == 0 {
            return Err(SkillGapError::ProviderUnavailable(format!(
                "Model {} produced empty embeddings",
                model
            )));
        }

        info!(
            "Model loaded in {:.2?} ({} dimensions)",
            start_time.elapsed(),
            dimension
        );

        Ok(Self {
            model: Arc::new(static_model),
            dimension,
            model_name: model.to_string(),
        })
    }
}

#[async_trait]
impl Embedder for Model2VecEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();
        let start_time = Instant::now();

        // inference is CPU-bound
        let embedding = tokio::task::spawn_blocking(move || model.encode_single(&text))
            .await
            .map_err(|e| SkillGapError::ProviderUnavailable(format!("Embedding task failed: {}", e)))?;

        debug!("Embedded text in {:.2?}", start_time.elapsed());
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Calculate cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(SkillGapError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm_a * norm_b))
    }
}
