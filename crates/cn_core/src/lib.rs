pub mod error;
pub mod models;
pub mod source;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::EmbeddingModel;
pub use source::NewsSource;
pub use storage::{ArticleStore, VectorIndex};
pub use types::{Article, ArticleMetadata, IndexRecord, NewsCategory, StoredArticle};
