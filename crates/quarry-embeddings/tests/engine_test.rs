//! Concurrency tests for the embedding engine.
//!
//! The properties under test:
//! - N concurrent first callers trigger exactly one model load.
//! - A failed load rejects every co-waiter with the same condition and
//!   resets the engine so a later call retries.
//! - Once loaded, the handle is reused for the process lifetime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quarry_core::config::QuarryConfig;
use quarry_core::errors::{QuarryError, QuarryResult};
use quarry_embeddings::{EmbeddingEngine, ModelLoader, TextEncoder};
use tokio::sync::Barrier;

struct StubEncoder;

impl TextEncoder for StubEncoder {
    fn encode(&self, text: &str) -> QuarryResult<Vec<f32>> {
        // Deterministic, text-dependent, correct width.
        let seed = text.len() as f32 + 1.0;
        Ok((0..768).map(|i| seed / (i as f32 + seed)).collect())
    }

    fn dimensions(&self) -> usize {
        768
    }
}

/// Loader that counts invocations, optionally failing the first N of them.
/// The sleep widens the race window so concurrent callers overlap the load.
struct CountingLoader {
    loads: AtomicUsize,
    failures_remaining: AtomicUsize,
    delay: Duration,
}

impl CountingLoader {
    fn new(failures: usize, delay: Duration) -> Self {
        Self {
            loads: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(failures),
            delay,
        }
    }

    fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelLoader for CountingLoader {
    fn load(
        &self,
        _config: &quarry_core::config::ModelConfig,
    ) -> QuarryResult<Arc<dyn TextEncoder>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(QuarryError::ModelLoadFailed {
                reason: "induced load failure".to_string(),
            });
        }
        Ok(Arc::new(StubEncoder))
    }
}

fn engine_with(loader: Arc<CountingLoader>) -> Arc<EmbeddingEngine> {
    let config = Arc::new(QuarryConfig::default());
    Arc::new(EmbeddingEngine::with_loader(config, loader))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_callers_share_one_load() {
    let loader = Arc::new(CountingLoader::new(0, Duration::from_millis(150)));
    let engine = engine_with(loader.clone());

    let callers = 16;
    let barrier = Arc::new(Barrier::new(callers));
    let mut tasks = Vec::new();
    for i in 0..callers {
        let engine = engine.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            engine.embed(&format!("query {i}")).await
        }));
    }

    for task in tasks {
        let vector = task.await.unwrap().unwrap();
        assert_eq!(vector.len(), 768);
    }
    assert_eq!(loader.load_count(), 1, "exactly one load despite {callers} callers");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_load_rejects_all_waiters_then_allows_retry() {
    let loader = Arc::new(CountingLoader::new(1, Duration::from_millis(200)));
    let engine = engine_with(loader.clone());

    let callers = 8;
    let barrier = Arc::new(Barrier::new(callers));
    let mut tasks = Vec::new();
    for _ in 0..callers {
        let engine = engine.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            engine.embed("first wave").await
        }));
    }

    for task in tasks {
        let err = task.await.unwrap().unwrap_err();
        match err {
            QuarryError::ModelLoadFailed { reason } => {
                assert!(reason.contains("induced load failure"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(loader.load_count(), 1, "the failed wave shares one attempt");

    // State reset to uninitialized: the next call starts a fresh load,
    // which now succeeds.
    let vector = engine.embed("second wave").await.unwrap();
    assert_eq!(vector.len(), 768);
    assert_eq!(loader.load_count(), 2);
}

#[tokio::test]
async fn ready_handle_is_reused_without_reloading() {
    let loader = Arc::new(CountingLoader::new(0, Duration::from_millis(1)));
    let engine = engine_with(loader.clone());

    let first = engine.embed("warm up").await.unwrap();
    for _ in 0..5 {
        let again = engine.embed("warm up").await.unwrap();
        assert_eq!(again, first, "stub encoder is deterministic per input");
    }
    assert_eq!(loader.load_count(), 1);
}

#[tokio::test]
async fn is_model_cached_reports_nonempty_cache_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = QuarryConfig::default();
    config.model.cache_dir = dir.path().join("models");
    let engine = EmbeddingEngine::with_loader(
        Arc::new(config),
        Arc::new(CountingLoader::new(0, Duration::from_millis(1))),
    );

    // Missing directory.
    assert!(!engine.is_model_cached());

    // Present but empty.
    std::fs::create_dir_all(dir.path().join("models")).unwrap();
    assert!(!engine.is_model_cached());

    // Any file makes it count as cached.
    std::fs::write(dir.path().join("models/model.onnx"), b"weights").unwrap();
    assert!(engine.is_model_cached());
}
