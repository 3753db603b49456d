use async_trait::async_trait;
use cn_core::{EmbeddingModel, Result};
use crate::DEFAULT_DIMENSIONS;

/// Deterministic embedding built from text length and character
/// frequencies. Useful offline and in tests; carries no semantics.
#[derive(Debug)]
pub struct DummyModel {
    dimensions: usize,
}

impl DummyModel {
    pub fn new(dimensions: Option<usize>) -> Self {
        Self {
            dimensions: dimensions.unwrap_or(DEFAULT_DIMENSIONS).max(2),
        }
    }
}

#[async_trait]
impl EmbeddingModel for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0; self.dimensions];
        let text_len = text.chars().count();
        if text_len == 0 {
            return Ok(embedding);
        }

        // Slot 0 holds the length, the rest character frequencies
        embedding[0] = text_len as f32 / 1000.0;
        let buckets = self.dimensions - 1;
        for c in text.chars() {
            embedding[1 + (c as usize % buckets)] += 1.0;
        }
        for value in embedding.iter_mut().skip(1) {
            *value /= text_len as f32;
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_model() {
        let model = DummyModel::new(None);
        let embedding = model.generate_embeddings("Test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
        assert!(embedding[0] > 0.0);

        let again = model.generate_embeddings("Test text").await.unwrap();
        assert_eq!(embedding, again);

        let other = model.generate_embeddings("Other text").await.unwrap();
        assert_ne!(embedding, other);
    }

    #[tokio::test]
    async fn test_empty_text() {
        let model = DummyModel::new(Some(8));
        let embedding = model.generate_embeddings("").await.unwrap();
        assert_eq!(embedding, vec![0.0; 8]);
    }
}
