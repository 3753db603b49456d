use async_trait::async_trait;
use cn_core::{EmbeddingModel, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use crate::Config;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";
const NATIVE_DIMENSIONS: usize = 1536;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for any OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbeddingModel {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    requested_dimensions: Option<usize>,
}

impl fmt::Debug for HttpEmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEmbeddingModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl HttpEmbeddingModel {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            api_key: config.api_key,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config.model_name.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            requested_dimensions: config.dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingModel for HttpEmbeddingModel {
    fn name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.requested_dimensions.unwrap_or(NATIVE_DIMENSIONS)
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            input: text,
            model: &self.model,
            dimensions: self.requested_dimensions,
        };

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!("{} returned {}: {}", self.model, status, body)));
        }

        let embedding = response
            .json::<EmbeddingResponse>()
            .await?
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Embedding(format!("{} returned no embedding", self.model)))?;

        if let Some(expected) = self.requested_dimensions {
            if embedding.len() != expected {
                return Err(Error::Embedding(format!(
                    "{} returned {} dimensions, expected {}",
                    self.model,
                    embedding.len(),
                    expected
                )));
            }
        }
        debug!("Embedded {} chars with {}", text.len(), self.model);
        Ok(embedding)
    }
}
