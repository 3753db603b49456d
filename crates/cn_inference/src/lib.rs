use std::env;
use std::fmt;

pub mod embeddings;
pub mod models;

pub use embeddings::EmbeddingGenerator;
pub use models::create_model;

pub const DEFAULT_DIMENSIONS: usize = 384;

#[derive(Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
    /// Requested vector length; models fall back to their native size
    pub dimensions: Option<usize>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> cn_core::Result<Self> {
        let dimensions = match env::var("EMBEDDING_DIMENSIONS") {
            Ok(raw) => Some(raw.trim().parse().map_err(|_| {
                cn_core::Error::Config(format!("EMBEDDING_DIMENSIONS is not a number: {}", raw))
            })?),
            Err(_) => None,
        };
        Ok(Self {
            api_key: env::var("EMBEDDING_API_KEY")
                .or_else(|_| env::var("OPENAI_API_KEY"))
                .ok()
                .filter(|k| !k.is_empty()),
            model_name: env::var("EMBEDDING_MODEL_NAME").ok(),
            base_url: env::var("EMBEDDING_BASE_URL").ok(),
            dimensions,
        })
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::models::create_model;
    pub use super::EmbeddingGenerator;
    pub use cn_core::{Article, EmbeddingModel, Error, Result};
}
