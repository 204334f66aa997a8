//! Retrieval of relevant chunks for a question.
//!
//! Provides a trait-based interface so the engine can run against Pinecone
//! in production and stubs in tests.

#[cfg(test)]
pub(crate) mod memory;
mod pinecone;

pub use pinecone::{PineconeIndex, PineconeMatch, PineconeRetriever};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One chunk returned by the index, with its source metadata.
///
/// Missing metadata fields are empty strings. Deserialization goes through
/// [`RetrievedDocument::from_metadata`], so `null` or non-string values in a
/// JSON body are treated as missing instead of rejecting the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievedDocument {
    pub title: String,
    pub short_description: String,
    /// Deep link to the specific moment.
    pub child_url: String,
    /// Link to the start of the source.
    pub parent_url: String,
    /// `YYYY-MM-DD HH:MM:SS` as supplied by the source; may be malformed.
    pub timestamp: String,
    /// Chunk body used as completion context.
    pub text: String,
    /// Similarity reported by the index (higher is better).
    pub score: f32,
}

impl<'de> Deserialize<'de> for RetrievedDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        let score = fields.get("score").and_then(Value::as_f64).unwrap_or_default() as f32;
        Ok(Self::from_metadata(&fields, score))
    }
}

impl RetrievedDocument {
    /// Build a document from an index metadata map.
    ///
    /// Accepts snake_case and camelCase keys. Non-string values count as missing.
    pub fn from_metadata(metadata: &Map<String, Value>, score: f32) -> Self {
        let field = |keys: &[&str]| -> String {
            keys.iter()
                .find_map(|k| metadata.get(*k).and_then(Value::as_str))
                .unwrap_or_default()
                .to_string()
        };

        Self {
            title: field(&["title"]),
            short_description: field(&["short_description", "shortDescription", "short_desc"]),
            child_url: field(&["child_url", "childUrl"]),
            parent_url: field(&["parent_url", "parentUrl"]),
            timestamp: field(&["timestamp"]),
            text: field(&["text", "page_content"]),
            score,
        }
    }
}

/// Trait for retrieval backends.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fetch the `top_k` chunks most relevant to `query`, best first.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDocument>>;
}
