use cn_core::{EmbeddingModel, Error, Result};
use std::sync::Arc;
use crate::Config;

pub mod dummy;
pub mod http;

#[cfg(feature = "local")]
pub mod minilm;

pub use dummy::DummyModel;
pub use http::HttpEmbeddingModel;

#[cfg(feature = "local")]
pub use minilm::MiniLmModel;

/// Build the embedding model named by `kind` (`http`, `dummy` or `local`).
pub async fn create_model(kind: &str, config: Config) -> Result<Arc<dyn EmbeddingModel>> {
    match kind {
        "http" => Ok(Arc::new(HttpEmbeddingModel::new(config)?)),
        "dummy" => Ok(Arc::new(DummyModel::new(config.dimensions))),
        #[cfg(feature = "local")]
        "local" => Ok(Arc::new(MiniLmModel::load(config.model_name).await?)),
        other => Err(Error::Config(format!("Unsupported embedding model: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_dummy_model() {
        let model = create_model("dummy", Config::default()).await.unwrap();
        assert_eq!(model.name(), "dummy");
        assert_eq!(model.dimensions(), crate::DEFAULT_DIMENSIONS);
    }

    #[tokio::test]
    async fn test_unknown_model() {
        assert!(create_model("word2vec", Config::default()).await.is_err());
    }
}
