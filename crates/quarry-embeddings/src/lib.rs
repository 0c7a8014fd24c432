//! # quarry-embeddings
//!
//! Local text embedding for the quarry search client.
//!
//! [`EmbeddingEngine`] turns text into fixed-width normalized vectors,
//! loading the underlying model lazily on first use. Concurrent first
//! callers share a single in-flight load; a failed load resets the engine
//! so a later call can retry. The actual model backend sits behind the
//! [`ModelLoader`] / [`TextEncoder`] seam, with a fastembed implementation
//! as the production loader.

pub mod engine;
pub mod provider;

pub use engine::EmbeddingEngine;
pub use provider::{FastembedLoader, ModelLoader, TextEncoder};
