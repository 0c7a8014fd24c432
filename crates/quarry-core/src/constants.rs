//! Workspace-wide constants.

/// Width of the embedding vectors produced by the engine. All supported
/// models are 768-dimensional; the backend's vector index is built for
/// this width.
pub const EMBEDDING_DIMENSIONS: usize = 768;

/// Schema version of the on-disk result-cache document. A document with a
/// different version is discarded wholesale on load.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Maximum number of cached search responses kept on disk. When an insert
/// pushes the count past this bound, the oldest entries (by write
/// timestamp) are evicted down to the bound.
pub const MAX_CACHE_ENTRIES: usize = 100;

/// Default embedding model name.
pub const DEFAULT_MODEL_NAME: &str = "nomic-embed-text-v1.5";

/// Default directory for downloaded model assets.
pub const DEFAULT_MODEL_CACHE_DIR: &str = "~/.quarry/models";

/// Default path of the result-cache document.
pub const DEFAULT_CACHE_PATH: &str = "~/.quarry/search-cache.json";

/// Default result-cache TTL in hours.
pub const DEFAULT_CACHE_TTL_HOURS: f64 = 24.0;

/// Default base URL of the retrieval backend.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8700";

/// Default per-request timeout in milliseconds.
pub const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;

/// Default number of results requested when the caller does not set one.
pub const DEFAULT_RESULT_LIMIT: usize = 10;
