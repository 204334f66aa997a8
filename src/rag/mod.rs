//! RAG (Retrieval-Augmented Generation) question answering with grouped sources.
//!
//! Provides the engine that ties retrieval, completion and source aggregation together.

pub mod context;
mod response;

pub use context::context_texts;
pub use response::{QaEngine, QaResponse, DEFAULT_TOP_K, MAX_TOP_K};
