use anyhow::Result as AnyResult;
use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use cn_core::{EmbeddingModel, Error, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
const MAX_TOKENS: usize = 256;

struct ModelState {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Sentence embeddings computed locally with candle.
pub struct MiniLmModel {
    model_id: String,
    state: Arc<Mutex<ModelState>>,
    dimensions: usize,
}

impl fmt::Debug for MiniLmModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiniLmModel")
            .field("model_id", &self.model_id)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl MiniLmModel {
    /// Download (or reuse the hub cache for) the weights and load them on CPU.
    pub async fn load(model_id: Option<String>) -> Result<Self> {
        let model_id = model_id.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let id = model_id.clone();
        let state = tokio::task::spawn_blocking(move || load_state(&id))
            .await
            .map_err(|e| Error::External(e.into()))??;
        let dimensions = embed(&state, "dimension probe").map_err(Error::External)?.len();
        info!("🧠 Loaded {} ({} dimensions)", model_id, dimensions);
        Ok(Self {
            model_id,
            state: Arc::new(Mutex::new(state)),
            dimensions,
        })
    }
}

fn load_state(model_id: &str) -> Result<ModelState> {
    let repo = Api::new()
        .map_err(|e| Error::External(e.into()))?
        .repo(Repo::new(model_id.to_string(), RepoType::Model));
    let fetch = |file: &str| repo.get(file).map_err(|e| Error::External(e.into()));
    let config_path = fetch("config.json")?;
    let tokenizer_path = fetch("tokenizer.json")?;
    let weights_path = fetch("model.safetensors")?;

    let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(config_path)?)?;
    let mut tokenizer = Tokenizer::from_file(tokenizer_path)
        .map_err(|e| Error::Embedding(format!("Failed to load tokenizer: {}", e)))?;
    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: MAX_TOKENS,
            ..Default::default()
        }))
        .map_err(|e| Error::Embedding(format!("Failed to configure tokenizer: {}", e)))?;

    let device = Device::Cpu;
    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
            .map_err(|e| Error::External(e.into()))?
    };
    let model = BertModel::load(vb, &config).map_err(|e| Error::External(e.into()))?;

    Ok(ModelState {
        model,
        tokenizer,
        device,
    })
}

/// Mean-pooled, L2-normalised sentence embedding.
fn embed(state: &ModelState, text: &str) -> AnyResult<Vec<f32>> {
    let encoding = state.tokenizer.encode(text, true).map_err(anyhow::Error::msg)?;
    let input_ids = Tensor::new(encoding.get_ids(), &state.device)?.unsqueeze(0)?;
    let token_type_ids = input_ids.zeros_like()?;
    let attention_mask = Tensor::new(encoding.get_attention_mask(), &state.device)?.unsqueeze(0)?;

    let output = state.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
    let (_batch, n_tokens, _hidden) = output.dims3()?;
    let pooled = (output.sum(1)? / (n_tokens as f64))?;
    let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
    let normalized = pooled.broadcast_div(&norm)?;
    Ok(normalized.squeeze(0)?.to_vec1::<f32>()?)
}

#[async_trait]
impl EmbeddingModel for MiniLmModel {
    fn name(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let state = self.state.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let state = state
                .lock()
                .map_err(|_| Error::Embedding("model state poisoned".to_string()))?;
            embed(&state, &text).map_err(Error::External)
        })
        .await
        .map_err(|e| Error::External(e.into()))?
    }
}
