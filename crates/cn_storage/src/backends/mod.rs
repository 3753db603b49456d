pub mod memory;
pub mod pinecone;

#[cfg(feature = "qdrant")]
pub mod qdrant;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{MemoryArticleStore, MemoryIndex};
pub use pinecone::{PineconeConfig, PineconeIndex};

#[cfg(feature = "qdrant")]
pub use qdrant::{QdrantConfig, QdrantIndex};

#[cfg(feature = "sqlite")]
pub use sqlite::SQLiteStore;
