// Local sentence embeddings through ONNX Runtime.
//
// Each text is tokenized with the model's HuggingFace tokenizer, run through
// the BERT encoder, and mean-pooled over the attention mask, the pooling the
// sentence-transformers were trained with. No network access at inference
// time; model files come from `download-model`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::model::EmbeddingModel;
use super::traits::EmbeddingProvider;

/// BERT position limit. Longer inputs are truncated.
const MAX_TOKENS: usize = 512;

/// Sentence embedder backed by a local ONNX model.
///
/// Arc<Mutex<Session>> because Session::run takes &mut self and inference is
/// offloaded to spawn_blocking, which needs 'static handles.
pub struct OnnxEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model: EmbeddingModel,
    pad_id: u32,
}

impl OnnxEmbedder {
    /// Load the model and tokenizer from `model_dir`.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in the directory.
    /// Call `download_model()` first if they don't exist.
    pub fn load(model: EmbeddingModel, model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            anyhow::bail!(
                "Embedding model not found: {}\nRun `examsim download-model --model {}` to download it.",
                model_path.display(),
                model.id()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Embedding tokenizer not found: {}\nRun `examsim download-model --model {}` to download it.",
                tokenizer_path.display(),
                model.id()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| {
                format!(
                    "Failed to load embedding model from {}",
                    model_path.display()
                )
            })?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;

        // BERT vocabularies use [PAD]=0, XLM-R vocabularies use <pad>=1
        let pad_id = tokenizer
            .token_to_id("[PAD]")
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .unwrap_or(0);

        debug!(
            model = model.id(),
            pad_id,
            "Loaded sentence embedding model from {}",
            model_dir.display()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model,
            pad_id,
        })
    }

    /// One forward pass over `texts`, results in input order. Runs on the
    /// blocking pool.
    async fn infer(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let texts = texts.to_vec();
        let dim = self.model.dimension();
        let pad_id = self.pad_id;

        tokio::task::spawn_blocking(move || embed_sync(&session, &tokenizer, &texts, dim, pad_id))
            .await
            .context("spawn_blocking panicked")?
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let mut results = self.infer(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding model returned no vector"))
    }

    fn dimension(&self) -> usize {
        self.model.dimension()
    }

    fn model_id(&self) -> &str {
        self.model.id()
    }
}

/// Synchronous embedding: runs tokenization, inference, and mean pooling.
/// Called from spawn_blocking to avoid blocking the async runtime.
fn embed_sync(
    session: &Arc<Mutex<Session>>,
    tokenizer: &Arc<Tokenizer>,
    texts: &[String],
    dim: usize,
    pad_id: u32,
) -> Result<Vec<Vec<f64>>> {
    let encodings: Vec<_> = texts
        .iter()
        .map(|t| {
            tokenizer
                .encode(t.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
        })
        .collect::<Result<Vec<_>>>()?;

    let batch_size = encodings.len();
    let max_len = encodings
        .iter()
        .map(|e| e.get_ids().len().min(MAX_TOKENS))
        .max()
        .unwrap_or(0);

    if max_len == 0 {
        anyhow::bail!("Tokenizer produced no tokens");
    }

    // BERT inputs, right-padded to max_len:
    //   input_ids: token IDs
    //   attention_mask: 1 for real tokens, 0 for padding
    //   token_type_ids: all zeros for single-sentence input
    let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
    let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
    let mut token_type_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

    for enc in &encodings {
        let seq_len = enc.get_ids().len().min(MAX_TOKENS);
        let ids = &enc.get_ids()[..seq_len];
        let mask = &enc.get_attention_mask()[..seq_len];

        input_ids_flat.extend(ids.iter().map(|&id| id as i64));
        attention_mask_flat.extend(mask.iter().map(|&m| m as i64));
        token_type_ids_flat.extend(std::iter::repeat_n(0i64, seq_len));

        let pad_len = max_len - seq_len;
        input_ids_flat.extend(std::iter::repeat_n(pad_id as i64, pad_len));
        attention_mask_flat.extend(std::iter::repeat_n(0i64, pad_len));
        token_type_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
    }

    let shape = [batch_size as i64, max_len as i64];

    let input_ids_tensor =
        Tensor::from_array((shape, input_ids_flat)).context("Failed to create input_ids tensor")?;
    let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat.clone()))
        .context("Failed to create attention_mask tensor")?;
    let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids_flat))
        .context("Failed to create token_type_ids tensor")?;

    // Output is last_hidden_state: [batch, seq_len, dim]
    let hidden_states = {
        let mut session = session
            .lock()
            .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

        let outputs = session
            .run(ort::inputs! {
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            })
            .context("Embedding ONNX inference failed")?;

        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract embedding output tensor")?;

        data.to_vec()
    };

    if hidden_states.len() != batch_size * max_len * dim {
        anyhow::bail!(
            "Embedding output has {} values, expected {} ({}x{}x{}); wrong model for this id?",
            hidden_states.len(),
            batch_size * max_len * dim,
            batch_size,
            max_len,
            dim
        );
    }

    Ok(mean_pool(&hidden_states, &attention_mask_flat, batch_size, max_len, dim))
}

/// Average token embeddings weighted by the attention mask.
fn mean_pool(
    hidden_states: &[f32],
    attention_mask: &[i64],
    batch_size: usize,
    max_len: usize,
    dim: usize,
) -> Vec<Vec<f64>> {
    let mut embeddings = Vec::with_capacity(batch_size);

    for i in 0..batch_size {
        let mut sum = vec![0.0_f64; dim];
        let mut mask_sum = 0.0_f64;

        for j in 0..max_len {
            let mask_val = attention_mask[i * max_len + j] as f64;
            if mask_val > 0.0 {
                mask_sum += mask_val;
                let offset = (i * max_len + j) * dim;
                for (k, acc) in sum.iter_mut().enumerate() {
                    *acc += hidden_states[offset + k] as f64 * mask_val;
                }
            }
        }

        if mask_sum > 0.0 {
            for val in &mut sum {
                *val /= mask_sum;
            }
        }

        embeddings.push(sum);
    }

    debug!(batch_size, dim, "Computed sentence embeddings");

    embeddings
}
