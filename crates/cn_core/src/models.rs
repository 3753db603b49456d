use async_trait::async_trait;
use std::fmt;
use crate::Result;

#[async_trait]
pub trait EmbeddingModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Length of every vector this model produces
    fn dimensions(&self) -> usize;

    /// Generate embeddings for a piece of text
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>>;
}
