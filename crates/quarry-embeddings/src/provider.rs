//! Model backend seam and the fastembed implementation.
//!
//! The engine only ever sees `ModelLoader` and `TextEncoder`, so tests can
//! inject counting or failing loaders without touching model assets.
//! `FastembedLoader` downloads (or reuses) model files under the configured
//! cache directory and wraps the session in a mutex, since fastembed
//! inference needs exclusive access.

use std::fs;
use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use quarry_core::config::ModelConfig;
use quarry_core::constants::EMBEDDING_DIMENSIONS;
use quarry_core::errors::{QuarryError, QuarryResult};
use tracing::info;

/// A loaded model that maps text to a fixed-width vector.
pub trait TextEncoder: Send + Sync {
    /// Encode one text into a normalized embedding.
    fn encode(&self, text: &str) -> QuarryResult<Vec<f32>>;

    /// Width of the vectors this encoder produces.
    fn dimensions(&self) -> usize;
}

/// Loads a model from its configuration. Blocking; the engine runs it on a
/// blocking thread.
pub trait ModelLoader: Send + Sync {
    fn load(&self, config: &ModelConfig) -> QuarryResult<Arc<dyn TextEncoder>>;
}

/// Production loader: fastembed over a local model cache directory.
pub struct FastembedLoader;

impl ModelLoader for FastembedLoader {
    fn load(&self, config: &ModelConfig) -> QuarryResult<Arc<dyn TextEncoder>> {
        let model = resolve_model(&config.name)?;

        fs::create_dir_all(&config.cache_dir).map_err(|e| QuarryError::ModelLoadFailed {
            reason: format!(
                "unable to create model cache dir {}: {e}",
                config.cache_dir.display()
            ),
        })?;

        let options = InitOptions::new(model)
            .with_cache_dir(config.cache_dir.clone())
            .with_show_download_progress(false);

        let session = TextEmbedding::try_new(options).map_err(|e| QuarryError::ModelLoadFailed {
            reason: format!("fastembed init failed for {}: {e}", config.name),
        })?;

        info!(model = %config.name, cache_dir = %config.cache_dir.display(), "embedding model loaded");

        Ok(Arc::new(FastembedEncoder {
            session: Mutex::new(session),
        }))
    }
}

/// Map a configured model name onto fastembed's catalog. Only 768-wide
/// models are accepted; the backend's vector index is built for that width.
fn resolve_model(name: &str) -> QuarryResult<EmbeddingModel> {
    match name {
        "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => {
            Ok(EmbeddingModel::NomicEmbedTextV15)
        }
        "nomic-embed-text-v1" | "nomic-ai/nomic-embed-text-v1" => {
            Ok(EmbeddingModel::NomicEmbedTextV1)
        }
        "bge-base-en-v1.5" | "BAAI/bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "multilingual-e5-base" | "intfloat/multilingual-e5-base" => {
            Ok(EmbeddingModel::MultilingualE5Base)
        }
        other => Err(QuarryError::ModelLoadFailed {
            reason: format!(
                "unsupported model {other:?}; expected one of nomic-embed-text-v1.5, \
                 nomic-embed-text-v1, bge-base-en-v1.5, multilingual-e5-base"
            ),
        }),
    }
}

struct FastembedEncoder {
    session: Mutex<TextEmbedding>,
}

impl TextEncoder for FastembedEncoder {
    fn encode(&self, text: &str) -> QuarryResult<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| QuarryError::InferenceFailed {
                reason: "fastembed session lock poisoned".to_string(),
            })?;

        let embeddings = session
            .embed(vec![text], None)
            .map_err(|e| QuarryError::InferenceFailed {
                reason: format!("fastembed embed failed: {e}"),
            })?;

        let mut embedding =
            embeddings
                .into_iter()
                .next()
                .ok_or_else(|| QuarryError::InferenceFailed {
                    reason: "fastembed returned no embedding".to_string(),
                })?;

        if embedding.len() != EMBEDDING_DIMENSIONS {
            return Err(QuarryError::InferenceFailed {
                reason: format!(
                    "dimension mismatch: expected {EMBEDDING_DIMENSIONS}, got {}",
                    embedding.len()
                ),
            });
        }

        normalize_in_place(&mut embedding);
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }
}

fn normalize_in_place(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in embedding.iter_mut() {
            *v /= norm;
        }
    }
}
