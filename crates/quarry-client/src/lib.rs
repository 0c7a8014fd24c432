//! # quarry-client
//!
//! Hybrid semantic + keyword search against a remote retrieval backend.
//!
//! [`RetrievalClient`] orchestrates the calls: server-side keyword
//! extraction and local embedding run concurrently, then both feed the
//! backend's `/search` endpoint. [`ResultCache`] sits in front as an
//! optional memoization layer — a single JSON document on disk, keyed by a
//! `(query, options)` fingerprint, TTL-expired and bounded to 100 entries.
//!
//! ```no_run
//! use std::sync::Arc;
//! use quarry_core::{QuarryConfig, SearchOptions};
//! use quarry_client::{ResultCache, RetrievalClient};
//!
//! # async fn run() -> quarry_core::QuarryResult<()> {
//! let config = Arc::new(QuarryConfig::load("quarry.toml".as_ref())?);
//! let client = RetrievalClient::new(config.clone())?;
//! let cache = ResultCache::new(config);
//!
//! let options = SearchOptions { limit: Some(5), ..Default::default() };
//! let response = client.search_with_cache(&cache, "install guide", &options).await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;

pub use cache::{CacheStats, ResultCache};
pub use client::RetrievalClient;
