use async_trait::async_trait;
use cn_core::{ArticleMetadata, Error, IndexRecord, Result, VectorIndex};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use crate::StorageBackend;

const API_VERSION: &str = "2024-07";
const MAX_BATCH: usize = 100;

#[derive(Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub index_name: String,
    /// Data-plane host; resolved through the control plane when absent
    pub index_host: Option<String>,
    pub control_url: String,
}

impl fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &"<redacted>")
            .field("index_name", &self.index_name)
            .field("index_host", &self.index_host)
            .field("control_url", &self.control_url)
            .finish()
    }
}

impl PineconeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            index_name: "cybernews-index".to_string(),
            index_host: None,
            control_url: "https://api.pinecone.io".to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("PINECONE_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::missing_env("PINECONE_API_KEY"))?;
        let mut config = Self::new(api_key);
        if let Ok(name) = env::var("PINECONE_INDEX_NAME") {
            config.index_name = name;
        }
        config.index_host = env::var("PINECONE_INDEX_HOST").ok().filter(|h| !h.is_empty());
        if let Ok(url) = env::var("PINECONE_CONTROL_URL") {
            config.control_url = url;
        }
        Ok(config)
    }
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
    namespace: &'a str,
}

#[derive(Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a ArticleMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: u64,
}

pub struct PineconeIndex {
    client: Client,
    config: PineconeConfig,
    host: String,
}

impl fmt::Debug for PineconeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeIndex")
            .field("client", &"<reqwest::Client>")
            .field("config", &self.config)
            .field("host", &self.host)
            .finish()
    }
}

impl PineconeIndex {
    pub async fn connect(config: PineconeConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let host = match &config.index_host {
            Some(host) => normalize_host(host),
            None => Self::describe_host(&client, &config).await?,
        };
        debug!("Pinecone index {} served from {}", config.index_name, host);
        Ok(Self { client, config, host })
    }

    async fn describe_host(client: &Client, config: &PineconeConfig) -> Result<String> {
        let response = client
            .get(format!("{}/indexes/{}", config.control_url.trim_end_matches('/'), config.index_name))
            .header("Api-Key", &config.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Index(format!(
                "Failed to describe index {}: {} {}",
                config.index_name, status, body
            )));
        }
        let description: IndexDescription = response.json().await?;
        Ok(normalize_host(&description.host))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    async fn upsert_batch(&self, namespace: &str, records: &[IndexRecord]) -> Result<u64> {
        let request = UpsertRequest {
            vectors: records
                .iter()
                .map(|r| PineconeVector {
                    id: &r.id,
                    values: &r.values,
                    metadata: &r.metadata,
                })
                .collect(),
            namespace,
        };

        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.host))
            .header("Api-Key", &self.config.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Index(format!("Pinecone upsert failed: {} {}", status, body)));
        }

        Ok(response.json::<UpsertResponse>().await?.upserted_count)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[async_trait]
impl StorageBackend for PineconeIndex {
    fn get_error_message() -> &'static str {
        "Pinecone needs PINECONE_API_KEY and a reachable index (PINECONE_INDEX_NAME / PINECONE_INDEX_HOST)"
    }

    async fn from_env() -> Result<Self> {
        Self::connect(PineconeConfig::from_env()?).await
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        "pinecone"
    }

    async fn upsert(&self, namespace: &str, records: Vec<IndexRecord>) -> Result<()> {
        for batch in records.chunks(MAX_BATCH) {
            let count = self.upsert_batch(namespace, batch).await?;
            debug!("Pinecone upserted {} vectors into {}", count, namespace);
        }
        Ok(())
    }
}
