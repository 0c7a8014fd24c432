//! On-disk result cache: one JSON document, content-addressed entries.
//!
//! Entries are keyed by a blake3 fingerprint of the query plus the typed
//! options struct. The struct's fixed field order makes the serialization
//! canonical, so semantically equal options always hit the same entry.
//! Expiry is TTL-based; the size bound evicts the oldest entries by write
//! timestamp. A corrupt or version-mismatched document is treated as empty
//! and never surfaced to the caller — the cache is best-effort and must not
//! block a search.
//!
//! All read-modify-write cycles are serialized behind one async mutex, so
//! concurrent tasks in this process cannot clobber each other's writes.
//! Concurrent writers from other processes can still race; that is a known
//! limitation of the single-document format.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use quarry_core::config::QuarryConfig;
use quarry_core::constants::{CACHE_SCHEMA_VERSION, MAX_CACHE_ENTRIES};
use quarry_core::errors::{QuarryError, QuarryResult};
use quarry_core::models::{SearchOptions, SearchResponse};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// One cached search response. Owned by the cache; callers get clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    query: String,
    options: SearchOptions,
    response: SearchResponse,
    /// Write time, epoch milliseconds.
    timestamp: i64,
}

/// The whole persisted document.
#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

impl CacheDocument {
    fn empty() -> Self {
        Self {
            version: CACHE_SCHEMA_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// Read-only snapshot of cache state.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub path: PathBuf,
    pub enabled: bool,
}

/// TTL-bounded, size-bounded store of search responses.
pub struct ResultCache {
    config: Arc<QuarryConfig>,
    /// Serializes document read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl ResultCache {
    pub fn new(config: Arc<QuarryConfig>) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    /// Deterministic fingerprint of a `(query, options)` pair.
    pub fn fingerprint(query: &str, options: &SearchOptions) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(query.as_bytes());
        // Separator keeps (query, options) pairs from aliasing each other.
        hasher.update(b"\x1f");
        hasher.update(&serde_json::to_vec(options).unwrap_or_default());
        hasher.finalize().to_hex().to_string()
    }

    /// Look up a cached response. `None` when caching is disabled, the
    /// entry is absent, or the entry has outlived the configured TTL.
    /// An expired entry is purged and the document rewritten in place.
    pub async fn get(&self, query: &str, options: &SearchOptions) -> Option<SearchResponse> {
        if !self.config.cache.enabled {
            return None;
        }

        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await;
        let key = Self::fingerprint(query, options);

        let expired = match document.entries.get(&key) {
            None => return None,
            Some(entry) => now_millis() - entry.timestamp > self.config.ttl_millis(),
        };

        if expired {
            debug!(query, "cache entry expired, purging");
            document.entries.remove(&key);
            if let Err(e) = self.write_document(&document).await {
                warn!("failed to rewrite cache after purge: {e}");
            }
            return None;
        }

        debug!(query, "cache hit");
        document.entries.get(&key).map(|e| e.response.clone())
    }

    /// Insert or overwrite an entry, then enforce the size bound and
    /// persist the document. No-op when caching is disabled.
    pub async fn put(
        &self,
        query: &str,
        options: &SearchOptions,
        response: SearchResponse,
    ) -> QuarryResult<()> {
        if !self.config.cache.enabled {
            return Ok(());
        }

        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await;
        let key = Self::fingerprint(query, options);
        document.entries.insert(
            key,
            CacheEntry {
                query: query.to_string(),
                options: options.clone(),
                response,
                timestamp: now_millis(),
            },
        );

        if document.entries.len() > MAX_CACHE_ENTRIES {
            evict_oldest(&mut document.entries);
        }

        self.write_document(&document).await
    }

    /// Replace the on-disk document with an empty one. Honored even when
    /// caching is disabled.
    pub async fn clear(&self) -> QuarryResult<()> {
        let _guard = self.lock.lock().await;
        self.write_document(&CacheDocument::empty()).await
    }

    /// Entry count, configured path, and enabled flag. No mutation.
    pub async fn stats(&self) -> CacheStats {
        let _guard = self.lock.lock().await;
        let document = self.read_document().await;
        CacheStats {
            entries: document.entries.len(),
            path: self.config.cache.path.clone(),
            enabled: self.config.cache.enabled,
        }
    }

    /// Load the document, treating every failure mode — missing file,
    /// unreadable file, malformed JSON, version mismatch — as empty.
    async fn read_document(&self) -> CacheDocument {
        let bytes = match tokio::fs::read(&self.config.cache.path).await {
            Ok(bytes) => bytes,
            Err(_) => return CacheDocument::empty(),
        };
        let document: CacheDocument = match serde_json::from_slice(&bytes) {
            Ok(document) => document,
            Err(e) => {
                warn!("cache document corrupt, starting empty: {e}");
                return CacheDocument::empty();
            }
        };
        if document.version != CACHE_SCHEMA_VERSION {
            warn!(
                found = document.version,
                expected = CACHE_SCHEMA_VERSION,
                "cache document version mismatch, starting empty"
            );
            return CacheDocument::empty();
        }
        document
    }

    async fn write_document(&self, document: &CacheDocument) -> QuarryResult<()> {
        let path = &self.config.cache.path;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| QuarryError::CacheIo {
                    path: path.display().to_string(),
                    reason: format!("create parent dirs: {e}"),
                })?;
        }
        let bytes = serde_json::to_vec_pretty(document).map_err(|e| QuarryError::CacheIo {
            path: path.display().to_string(),
            reason: format!("serialize document: {e}"),
        })?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| QuarryError::CacheIo {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }
}

/// Keep the `MAX_CACHE_ENTRIES` newest entries by write timestamp.
/// Recency of insertion wins; reads do not refresh an entry.
fn evict_oldest(entries: &mut HashMap<String, CacheEntry>) {
    let mut ordered: Vec<(String, CacheEntry)> = entries.drain().collect();
    ordered.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
    ordered.truncate(MAX_CACHE_ENTRIES);
    entries.extend(ordered);
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
