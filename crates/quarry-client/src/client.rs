//! Retrieval client: health, keyword extraction, and hybrid search.
//!
//! `search` runs keyword extraction and embedding computation concurrently
//! and joins both before submitting the raw search — there is no degraded
//! mode, either both succeed or the call fails. Every request carries the
//! configured timeout, enforced by cancellation inside reqwest; a tripped
//! timeout surfaces as `Timeout`, distinct from a backend-reported error.

use std::sync::Arc;
use std::time::Duration;

use quarry_core::config::QuarryConfig;
use quarry_core::errors::{QuarryError, QuarryResult};
use quarry_core::models::{
    HealthResponse, KeywordRequest, KeywordResponse, SearchOptions, SearchRequest, SearchResponse,
};
use quarry_embeddings::EmbeddingEngine;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::ResultCache;

/// Client for the remote retrieval backend.
pub struct RetrievalClient {
    config: Arc<QuarryConfig>,
    http: reqwest::Client,
    engine: Arc<EmbeddingEngine>,
}

impl RetrievalClient {
    /// Client with its own embedding engine (production fastembed loader).
    pub fn new(config: Arc<QuarryConfig>) -> QuarryResult<Self> {
        let engine = Arc::new(EmbeddingEngine::new(config.clone()));
        Self::with_engine(config, engine)
    }

    /// Client over an existing engine. Lets several clients share one
    /// loaded model, and lets tests inject a stub loader.
    pub fn with_engine(
        config: Arc<QuarryConfig>,
        engine: Arc<EmbeddingEngine>,
    ) -> QuarryResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.api.timeout_ms))
            .build()
            .map_err(|e| QuarryError::RequestFailed {
                endpoint: "client".to_string(),
                reason: format!("http client construction failed: {e}"),
            })?;
        Ok(Self {
            config,
            http,
            engine,
        })
    }

    /// The embedding engine backing this client.
    pub fn engine(&self) -> &Arc<EmbeddingEngine> {
        &self.engine
    }

    /// Backend health and index stats.
    pub async fn health(&self) -> QuarryResult<HealthResponse> {
        let response = self
            .http
            .get(self.endpoint_url("health"))
            .send()
            .await
            .map_err(|e| self.transport_error("health", e))?;
        self.read_json("health", response).await
    }

    /// Server-side keyword extraction for a query string.
    pub async fn extract_keywords(
        &self,
        text: &str,
        limit: Option<usize>,
    ) -> QuarryResult<KeywordResponse> {
        let body = KeywordRequest {
            text: text.to_string(),
            limit,
        };
        let response = self
            .http
            .post(self.endpoint_url("keywords"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error("keywords", e))?;
        self.read_json("keywords", response).await
    }

    /// Hybrid search: extract keywords and embed the query concurrently,
    /// then submit both to the backend. Either failure fails the call.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> QuarryResult<SearchResponse> {
        let (keywords, embedding) =
            tokio::try_join!(self.extract_keywords(query, None), self.engine.embed(query))?;
        debug!(query, keywords = %keywords.keywords, "hybrid inputs ready");
        self.search_raw(embedding, &keywords.keywords, options).await
    }

    /// Submit a search with an already-computed embedding and keyword
    /// string. The limit falls back to the configured default; filters are
    /// attached only when the caller supplied at least one restriction.
    pub async fn search_raw(
        &self,
        embedding: Vec<f32>,
        keywords: &str,
        options: &SearchOptions,
    ) -> QuarryResult<SearchResponse> {
        let body = SearchRequest {
            embedding,
            keywords: keywords.to_string(),
            limit: options.limit.unwrap_or(self.config.defaults.limit),
            filters: options.filters(),
        };
        let response = self
            .http
            .post(self.endpoint_url("search"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error("search", e))?;
        self.read_json("search", response).await
    }

    /// Cache-fronted search: return a fresh cached response when present,
    /// otherwise search and write the result back. A cache write failure is
    /// logged and swallowed — caching is best-effort and must not fail a
    /// search that succeeded.
    pub async fn search_with_cache(
        &self,
        cache: &ResultCache,
        query: &str,
        options: &SearchOptions,
    ) -> QuarryResult<SearchResponse> {
        if let Some(hit) = cache.get(query, options).await {
            return Ok(hit);
        }
        let response = self.search(query, options).await?;
        if let Err(e) = cache.put(query, options, response.clone()).await {
            warn!("cache write after search failed: {e}");
        }
        Ok(response)
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.config.api.url.trim_end_matches('/'))
    }

    /// Map a reqwest transport error, keeping timeouts distinguishable
    /// from backend-reported failures.
    fn transport_error(&self, endpoint: &str, err: reqwest::Error) -> QuarryError {
        if err.is_timeout() {
            QuarryError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms: self.config.api.timeout_ms,
            }
        } else {
            QuarryError::RequestFailed {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Shared response handling: non-2xx carries status and body text back
    /// to the caller, success parses the JSON payload.
    async fn read_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> QuarryResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuarryError::RemoteCallFailed {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| self.transport_error(endpoint, e))
    }
}
