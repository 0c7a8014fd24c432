//! # quarry-core
//!
//! Foundation crate for the quarry hybrid-search client.
//! Defines configuration, constants, errors, and the wire models exchanged
//! with the retrieval backend. Every other crate in the workspace depends
//! on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;

// Re-export the most commonly used types at the crate root.
pub use config::QuarryConfig;
pub use errors::{QuarryError, QuarryResult};
pub use models::{
    HealthResponse, KeywordRequest, KeywordResponse, SearchFilters, SearchOptions, SearchRequest,
    SearchResponse, SearchResult,
};
