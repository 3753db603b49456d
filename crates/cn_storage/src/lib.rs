use async_trait::async_trait;
use cn_core::{ArticleStore, Error, Result, VectorIndex};
use std::sync::Arc;
use tracing::{error, info};

pub mod backends;

pub use backends::*;

/// A backend that can be built from the process environment.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn from_env() -> Result<Self> where Self: Sized;
}

async fn connect<T: StorageBackend>() -> Result<T> {
    let backend = T::from_env().await.map_err(|e| {
        error!("{}: {}", T::get_error_message(), e);
        e
    })?;
    info!("🏦 Connected {}", std::any::type_name::<T>().rsplit("::").next().unwrap_or("backend"));
    Ok(backend)
}

/// Build the article store named by `kind` (`memory` or `sqlite`).
pub async fn create_article_store(kind: &str) -> Result<Arc<dyn ArticleStore>> {
    match kind {
        "memory" => Ok(Arc::new(connect::<MemoryArticleStore>().await?)),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(connect::<SQLiteStore>().await?)),
        other => Err(Error::Config(format!("Unsupported article store: {}", other))),
    }
}

/// Build the vector index named by `kind` (`pinecone`, `qdrant` or `memory`).
pub async fn create_vector_index(kind: &str) -> Result<Arc<dyn VectorIndex>> {
    match kind {
        "pinecone" => Ok(Arc::new(connect::<PineconeIndex>().await?)),
        #[cfg(feature = "qdrant")]
        "qdrant" => Ok(Arc::new(connect::<QdrantIndex>().await?)),
        "memory" => Ok(Arc::new(connect::<MemoryIndex>().await?)),
        other => Err(Error::Config(format!("Unsupported vector index: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_backends() {
        let store = create_article_store("memory").await.unwrap();
        assert!(store.existing_urls().await.unwrap().is_empty());
        let index = create_vector_index("memory").await.unwrap();
        assert_eq!(index.name(), "memory");
    }

    #[tokio::test]
    async fn test_unknown_backend_is_config_error() {
        assert!(matches!(create_article_store("mongo").await, Err(Error::Config(_))));
        assert!(matches!(create_vector_index("faiss").await, Err(Error::Config(_))));
    }
}
