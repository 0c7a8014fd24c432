//! Wire models exchanged with the retrieval backend, plus the caller-facing
//! search options.
//!
//! Request types serialize exactly what the backend expects: optional fields
//! are skipped when absent rather than sent as null. Response types tolerate
//! missing optional fields so older backends keep working.

use serde::{Deserialize, Serialize};

/// Caller-supplied options for a search call.
///
/// Also the `options` half of the result-cache fingerprint, so any field
/// change produces a distinct cache entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Result limit; falls back to the configured default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Restrict results to these chunk types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_types: Option<Vec<String>>,
    /// Restrict results to these repositories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repos: Option<Vec<String>>,
}

impl SearchOptions {
    /// Build the wire-level filters object. `None` when the caller supplied
    /// neither restriction, so an empty filters object is never sent.
    pub fn filters(&self) -> Option<SearchFilters> {
        if self.chunk_types.is_none() && self.repos.is_none() {
            return None;
        }
        Some(SearchFilters {
            chunk_types: self.chunk_types.clone(),
            repos: self.repos.clone(),
        })
    }
}

/// Optional restrictions attached to a search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repos: Option<Vec<String>>,
}

/// Body of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Locally computed query embedding.
    pub embedding: Vec<f32>,
    /// Server-extracted keyword string.
    pub keywords: String,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
}

/// One ranked hit from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub score: f32,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_type: Option<String>,
}

/// Body of a successful `POST /search` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_time_ms: Option<f64>,
}

/// Body of `POST /keywords`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Body of a successful `POST /keywords` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResponse {
    /// Space-separated keyword string, ready to submit to `/search`.
    pub keywords: String,
}

/// Body of a successful `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
