use async_trait::async_trait;
use cn_core::{Error, IndexRecord, Result, VectorIndex};
use qdrant_client::{
    Qdrant,
    qdrant::{
        CreateCollection, Distance, PointStruct, UpsertPoints, Value, VectorParams, Vectors,
        VectorsConfig, vectors_config::Config,
    },
};
use std::collections::{HashMap, HashSet};
use std::env;
use tokio::sync::Mutex;
use tracing::info;
use crate::StorageBackend;

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
    pub vector_size: u64,
}

impl QdrantConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("QDRANT_HOST").unwrap_or_else(|_| "localhost".to_string());
        let vector_size = match env::var("EMBEDDING_DIMENSIONS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("EMBEDDING_DIMENSIONS is not a number: {}", raw)))?,
            Err(_) => 384,
        };
        Ok(Self {
            url: format!("http://{}:6334", host),
            collection: env::var("QDRANT_COLLECTION").unwrap_or_else(|_| "cybernews-index".to_string()),
            vector_size,
        })
    }

    /// Qdrant has no namespaces; each one gets its own collection.
    fn collection_for(&self, namespace: &str) -> String {
        format!("{}-{}", self.collection, namespace)
    }
}

pub struct QdrantIndex {
    client: Qdrant,
    config: QdrantConfig,
    known_collections: Mutex<HashSet<String>>,
}

impl QdrantIndex {
    pub async fn connect(config: QdrantConfig) -> Result<Self> {
        let client = Qdrant::from_url(&config.url)
            .build()
            .map_err(|e| Error::External(e.into()))?;
        let collections = client
            .list_collections()
            .await
            .map_err(|e| Error::External(e.into()))?;
        let known_collections = collections.collections.into_iter().map(|c| c.name).collect();
        Ok(Self {
            client,
            config,
            known_collections: Mutex::new(known_collections),
        })
    }

    async fn ensure_collection(&self, name: &str) -> Result<()> {
        let mut known = self.known_collections.lock().await;
        if known.contains(name) {
            return Ok(());
        }

        let vector_config = VectorsConfig {
            config: Some(Config::Params(VectorParams {
                size: self.config.vector_size,
                distance: Distance::Cosine.into(),
                ..Default::default()
            })),
        };

        self.client
            .create_collection(CreateCollection {
                collection_name: name.to_string(),
                vectors_config: Some(vector_config),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::External(e.into()))?;
        info!("Created Qdrant collection {}", name);
        known.insert(name.to_string());
        Ok(())
    }
}

fn to_point(record: IndexRecord) -> Result<PointStruct> {
    let id: u64 = record
        .id
        .parse()
        .map_err(|_| Error::Index(format!("Qdrant point ids must be numeric, got {}", record.id)))?;

    let metadata = record.metadata;
    let mut payload: HashMap<String, Value> = HashMap::new();
    payload.insert("headlines".to_string(), metadata.headlines.into());
    payload.insert("author".to_string(), metadata.author.into());
    payload.insert("fullNews".to_string(), metadata.full_news.into());
    payload.insert("newsURL".to_string(), metadata.news_url.into());
    payload.insert("newsImgURL".to_string(), metadata.news_img_url.into());
    payload.insert("newsDate".to_string(), metadata.news_date.into());

    Ok(PointStruct {
        id: Some(id.into()),
        vectors: Some(Vectors::from(record.values)),
        payload,
    })
}

#[async_trait]
impl StorageBackend for QdrantIndex {
    fn get_error_message() -> &'static str {
        "Qdrant should be running on http://QDRANT_HOST:6334"
    }

    async fn from_env() -> Result<Self> {
        Self::connect(QdrantConfig::from_env()?).await
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn upsert(&self, namespace: &str, records: Vec<IndexRecord>) -> Result<()> {
        let collection_name = self.config.collection_for(namespace);
        self.ensure_collection(&collection_name).await?;

        let points = records.into_iter().map(to_point).collect::<Result<Vec<_>>>()?;
        self.client
            .upsert_points(UpsertPoints {
                collection_name,
                points,
                ..Default::default()
            })
            .await
            .map_err(|e| Error::External(e.into()))?;
        Ok(())
    }
}
