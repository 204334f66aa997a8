//! In-memory retrieval doubles for tests.
//!
//! Brute-force cosine search over a handful of chunks, embedded with a
//! keyword-count embedder so similarity is predictable.

use super::{RetrievedDocument, Retriever};
use crate::embedding::Embedder;
use crate::error::{MortError, Result};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Brute-force cosine search over documents held in memory.
pub(crate) struct MemoryRetriever {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<(Vec<f32>, RetrievedDocument)>>,
}

impl MemoryRetriever {
    pub(crate) fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Embed the documents' text and add them to the index.
    pub(crate) async fn index(&self, docs: Vec<RetrievedDocument>) -> Result<usize> {
        let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let mut entries = self
            .entries
            .write()
            .map_err(|_| MortError::Retrieval("index lock poisoned".to_string()))?;
        let count = docs.len();
        entries.extend(embeddings.into_iter().zip(docs));
        Ok(count)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Retriever for MemoryRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDocument>> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| MortError::Retrieval(format!("Failed to embed query: {}", e)))?;

        let entries = self
            .entries
            .read()
            .map_err(|_| MortError::Retrieval("index lock poisoned".to_string()))?;

        let mut results: Vec<RetrievedDocument> = entries
            .iter()
            .map(|(embedding, doc)| RetrievedDocument {
                score: cosine_similarity(&query_embedding, embedding),
                ..doc.clone()
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        Ok(results)
    }
}

/// Embeds text as keyword counts.
pub(crate) struct KeywordEmbedder {
    pub keywords: Vec<&'static str>,
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(self
            .keywords
            .iter()
            .map(|k| lower.matches(k).count() as f32)
            .collect())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(title: &str, text: &str) -> RetrievedDocument {
        RetrievedDocument {
            title: title.to_string(),
            short_description: format!("{} overview", title),
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_memory_retriever_ranks_by_similarity() {
        let embedder = Arc::new(KeywordEmbedder {
            keywords: vec!["rate", "fee", "escrow"],
        });
        let retriever = MemoryRetriever::new(embedder);

        retriever
            .index(vec![
                chunk("Fees", "Closing fee and origination fee"),
                chunk("Rates", "Fixed rate versus adjustable rate"),
                chunk("Escrow", "How escrow accounts work"),
            ])
            .await
            .unwrap();
        assert_eq!(retriever.len(), 3);

        let results = retriever.retrieve("what rate can I get", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rates");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_empty_retriever_returns_nothing() {
        let retriever = MemoryRetriever::new(Arc::new(KeywordEmbedder {
            keywords: vec!["rate"],
        }));
        assert_eq!(retriever.len(), 0);
        assert!(retriever.retrieve("rate", 10).await.unwrap().is_empty());
    }
}
