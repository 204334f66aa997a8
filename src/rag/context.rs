//! Context building for completion prompts.

use crate::retrieval::RetrievedDocument;

/// Chunk texts to hand to the completion, in retrieval order.
///
/// Chunks without text are skipped; they still count as sources.
pub fn context_texts(documents: &[RetrievedDocument]) -> Vec<String> {
    documents
        .iter()
        .filter(|d| !d.text.trim().is_empty())
        .map(|d| d.text.clone())
        .collect()
}
