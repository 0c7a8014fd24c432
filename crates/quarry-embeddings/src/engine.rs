//! Lazy, concurrency-safe embedding engine.
//!
//! The model is loaded on the first `embed` call. The load lives in the
//! state machine as a shared future, so callers that arrive while a load is
//! in flight attach to it instead of starting a second one — a bare
//! "if not loaded, load" flag would race and trigger duplicate downloads.
//! A failed load resets the state so a later call may retry; every waiter
//! of the failed attempt observes the same error.

use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use quarry_core::config::QuarryConfig;
use quarry_core::constants::EMBEDDING_DIMENSIONS;
use quarry_core::errors::{QuarryError, QuarryResult};
use tracing::debug;

use crate::provider::{FastembedLoader, ModelLoader, TextEncoder};

/// Shared handle to an in-flight model load. The error side is the load
/// failure reason; `Shared` requires a cloneable output.
type SharedLoad = Shared<BoxFuture<'static, Result<Arc<dyn TextEncoder>, String>>>;

enum ModelState {
    /// No model loaded, no load in flight.
    Uninitialized,
    /// A load is in flight; late callers clone the future and await it.
    /// The attempt id keeps a stale waiter from resetting a newer attempt.
    Loading { attempt: u64, load: SharedLoad },
    /// Model handle cached for the process lifetime.
    Ready(Arc<dyn TextEncoder>),
}

/// Process-wide embedding engine. Cheap to share via `Arc`; all methods
/// take `&self`.
pub struct EmbeddingEngine {
    config: Arc<QuarryConfig>,
    loader: Arc<dyn ModelLoader>,
    state: Mutex<ModelState>,
    next_attempt: AtomicU64,
}

impl EmbeddingEngine {
    /// Engine with the production fastembed loader.
    pub fn new(config: Arc<QuarryConfig>) -> Self {
        Self::with_loader(config, Arc::new(FastembedLoader))
    }

    /// Engine with an injected loader. Used by tests and by embedders that
    /// bring their own model backend.
    pub fn with_loader(config: Arc<QuarryConfig>, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            config,
            loader,
            state: Mutex::new(ModelState::Uninitialized),
            next_attempt: AtomicU64::new(0),
        }
    }

    /// Embed text into a 768-wide L2-normalized vector, loading the model
    /// first if needed.
    ///
    /// # Errors
    /// `ModelLoadFailed` when the (possibly shared) load fails,
    /// `InferenceFailed` when encoding fails.
    pub async fn embed(&self, text: &str) -> QuarryResult<Vec<f32>> {
        let encoder = self.encoder().await?;
        let text = text.to_string();
        tokio::task::spawn_blocking(move || encoder.encode(&text))
            .await
            .map_err(|e| QuarryError::InferenceFailed {
                reason: format!("inference task panicked: {e}"),
            })?
    }

    /// Width of the vectors this engine produces.
    pub fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }

    /// Heuristic presence check: the configured model cache directory
    /// exists and is non-empty. Says nothing about completeness or
    /// validity of the assets.
    pub fn is_model_cached(&self) -> bool {
        fs::read_dir(&self.config.model.cache_dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    /// Resolve the ready encoder, joining or starting a load as needed.
    async fn encoder(&self) -> QuarryResult<Arc<dyn TextEncoder>> {
        let (attempt, load) = {
            let mut state = self.lock_state()?;
            match &*state {
                ModelState::Ready(encoder) => return Ok(encoder.clone()),
                ModelState::Loading { attempt, load } => {
                    debug!("attaching to in-flight model load");
                    (*attempt, load.clone())
                }
                ModelState::Uninitialized => {
                    let attempt = self.next_attempt.fetch_add(1, Ordering::Relaxed);
                    let load = self.start_load();
                    *state = ModelState::Loading {
                        attempt,
                        load: load.clone(),
                    };
                    (attempt, load)
                }
            }
        };

        // Await outside the lock; co-waiters poll the same shared future.
        match load.await {
            Ok(encoder) => {
                let mut state = self.lock_state()?;
                if !matches!(&*state, ModelState::Ready(_)) {
                    *state = ModelState::Ready(encoder.clone());
                }
                Ok(encoder)
            }
            Err(reason) => {
                let mut state = self.lock_state()?;
                // Reset only our own failed attempt; a retry may already
                // have a newer load in flight.
                if matches!(&*state, ModelState::Loading { attempt: a, .. } if *a == attempt) {
                    *state = ModelState::Uninitialized;
                }
                Err(QuarryError::ModelLoadFailed { reason })
            }
        }
    }

    fn start_load(&self) -> SharedLoad {
        let loader = self.loader.clone();
        let model = self.config.model.clone();
        async move {
            let joined = tokio::task::spawn_blocking(move || loader.load(&model)).await;
            match joined {
                Ok(Ok(encoder)) => Ok(encoder),
                Ok(Err(QuarryError::ModelLoadFailed { reason })) => Err(reason),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("model load task panicked: {e}")),
            }
        }
        .boxed()
        .shared()
    }

    fn lock_state(&self) -> QuarryResult<MutexGuard<'_, ModelState>> {
        self.state.lock().map_err(|_| QuarryError::ModelLoadFailed {
            reason: "engine state lock poisoned".to_string(),
        })
    }
}
