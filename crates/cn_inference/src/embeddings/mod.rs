use std::sync::Arc;
use cn_core::{Article, EmbeddingModel, Error, Result};

/// Turns articles into vectors with a shared model.
#[derive(Debug, Clone)]
pub struct EmbeddingGenerator {
    model: Arc<dyn EmbeddingModel>,
}

impl EmbeddingGenerator {
    pub fn new(model: Arc<dyn EmbeddingModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Embeds the headline and body joined by a single space.
    pub async fn generate_article_embedding(&self, article: &Article) -> Result<Vec<f32>> {
        self.generate_text_embedding(&article.embedding_text()).await
    }

    pub async fn generate_text_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.model.generate_embeddings(text).await?;
        if embedding.is_empty() {
            return Err(Error::Embedding(format!("{} returned an empty vector", self.model.name())));
        }
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingModel {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EmbeddingModel for RecordingModel {
        fn name(&self) -> &str {
            "recording"
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
            self.seen.lock().unwrap().push(text.to_string());
            if text.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![1.0, 0.0])
        }
    }

    fn article() -> Article {
        Article {
            id: 1,
            headline: "Ransomware hits hospital".to_string(),
            author: "Test Author".to_string(),
            full_text: "Systems were encrypted overnight.".to_string(),
            url: "http://example.com".to_string(),
            image_url: String::new(),
            date: "Jan 01, 2025".to_string(),
        }
    }

    #[tokio::test]
    async fn test_article_embedding_uses_headline_and_body() {
        let model = Arc::new(RecordingModel::default());
        let generator = EmbeddingGenerator::new(model.clone());

        let embedding = generator.generate_article_embedding(&article()).await.unwrap();
        assert_eq!(embedding, vec![1.0, 0.0]);
        assert_eq!(
            model.seen.lock().unwrap().as_slice(),
            ["Ransomware hits hospital Systems were encrypted overnight."]
        );
    }

    #[tokio::test]
    async fn test_empty_vector_is_error() {
        let generator = EmbeddingGenerator::new(Arc::new(RecordingModel::default()));
        assert!(matches!(
            generator.generate_text_embedding("").await,
            Err(Error::Embedding(_))
        ));
    }
}
