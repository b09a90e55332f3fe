use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cleaning::segment::DEFAULT_MAX_SEGMENT_LENGTH;
use crate::cleaning::CleaningOptions;
use crate::embedding::download;
use crate::embedding::EmbeddingModel;
use crate::similarity::engine::{FusionConfig, DEFAULT_COSINE_WEIGHT, DEFAULT_THRESHOLD};

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy. Every value has a default,
/// and command-line flags override whatever was loaded here.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Sentence-embedding model (EXAMSIM_MODEL, default sentence-bert)
    pub model: EmbeddingModel,
    /// Root directory holding one subdirectory per model (EXAMSIM_MODEL_DIR)
    pub model_root: PathBuf,
    /// Segment length limit in characters (EXAMSIM_MAX_SEGMENT_LENGTH)
    pub max_segment_length: usize,
    /// Share of cosine in the fused score (EXAMSIM_COSINE_WEIGHT)
    pub cosine_weight: f64,
    /// Minimum fused score for a reported pair (EXAMSIM_THRESHOLD)
    pub threshold: f64,
    /// Only compare questions of the same type (EXAMSIM_TYPE_SENSITIVE)
    pub type_sensitive: bool,
    /// Drop repeated questions within a paper (EXAMSIM_DEDUPLICATE)
    pub deduplicate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: EmbeddingModel::default(),
            model_root: download::default_model_root(),
            max_segment_length: DEFAULT_MAX_SEGMENT_LENGTH,
            cosine_weight: DEFAULT_COSINE_WEIGHT,
            threshold: DEFAULT_THRESHOLD,
            type_sensitive: true,
            deduplicate: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset or empty variables keep their defaults; malformed ones are an
    /// error naming the variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(id) = var("EXAMSIM_MODEL") {
            config.model = EmbeddingModel::from_id(&id).context("EXAMSIM_MODEL")?;
        }
        if let Some(dir) = var("EXAMSIM_MODEL_DIR") {
            config.model_root = PathBuf::from(dir);
        }
        if let Some(v) = var("EXAMSIM_MAX_SEGMENT_LENGTH") {
            config.max_segment_length = v.trim().parse().with_context(|| {
                format!("EXAMSIM_MAX_SEGMENT_LENGTH must be a positive integer, got `{v}`")
            })?;
        }
        if let Some(v) = var("EXAMSIM_COSINE_WEIGHT") {
            config.cosine_weight = v.trim().parse().with_context(|| {
                format!("EXAMSIM_COSINE_WEIGHT must be a number, got `{v}`")
            })?;
        }
        if let Some(v) = var("EXAMSIM_THRESHOLD") {
            config.threshold = v
                .trim()
                .parse()
                .with_context(|| format!("EXAMSIM_THRESHOLD must be a number, got `{v}`"))?;
        }
        if let Some(v) = var("EXAMSIM_TYPE_SENSITIVE") {
            config.type_sensitive = parse_bool("EXAMSIM_TYPE_SENSITIVE", &v)?;
        }
        if let Some(v) = var("EXAMSIM_DEDUPLICATE") {
            config.deduplicate = parse_bool("EXAMSIM_DEDUPLICATE", &v)?;
        }

        Ok(config)
    }

    /// Check every value before any processing starts.
    pub fn validate(&self) -> Result<()> {
        if self.max_segment_length == 0 {
            anyhow::bail!("max segment length must be at least 1");
        }
        self.fusion_config().validate()?;
        Ok(())
    }

    pub fn cleaning_options(&self) -> CleaningOptions {
        CleaningOptions {
            max_segment_length: self.max_segment_length,
            deduplicate: self.deduplicate,
        }
    }

    pub fn fusion_config(&self) -> FusionConfig {
        FusionConfig {
            cosine_weight: self.cosine_weight,
            threshold: self.threshold,
            type_sensitive: self.type_sensitive,
            deduplicate: self.deduplicate,
        }
    }

    /// Directory holding the selected model's files.
    pub fn model_dir(&self) -> PathBuf {
        download::model_dir(&self.model_root, self.model)
    }

    /// Check that the selected model has been downloaded.
    /// Call this before building the ONNX embedder.
    pub fn require_model(&self) -> Result<()> {
        if !download::model_files_present(&self.model_root, self.model) {
            anyhow::bail!(
                "Model files for `{}` not found in {}\n\
                 Run `examsim download-model --model {}` to download them.",
                self.model,
                self.model_dir().display(),
                self.model
            );
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{key} must be true or false, got `{value}`"),
    }
}
