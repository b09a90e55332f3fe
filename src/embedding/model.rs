// Known sentence-embedding models and where to get them.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A sentence-transformer that can back the ONNX embedder.
///
/// All of these are BERT-family encoders exported to ONNX, mean-pooled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingModel {
    /// paraphrase-multilingual-MiniLM-L12-v2, handles Chinese and English.
    #[default]
    SentenceBert,
    /// bert-base-chinese, the plain BERT encoder, mean-pooled.
    Bert,
    /// bge-small-zh-v1.5, Chinese.
    Bge,
}

impl EmbeddingModel {
    pub const ALL: [EmbeddingModel; 3] = [
        EmbeddingModel::SentenceBert,
        EmbeddingModel::Bert,
        EmbeddingModel::Bge,
    ];

    /// Identifier used in configuration and recorded in vectorized papers.
    pub fn id(&self) -> &'static str {
        match self {
            EmbeddingModel::SentenceBert => "sentence-bert",
            EmbeddingModel::Bert => "bert",
            EmbeddingModel::Bge => "bge",
        }
    }

    /// Output dimension of the pooled embedding.
    pub fn dimension(&self) -> usize {
        match self {
            EmbeddingModel::SentenceBert => 384,
            EmbeddingModel::Bert => 768,
            EmbeddingModel::Bge => 512,
        }
    }

    /// Directory name under the model root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            EmbeddingModel::SentenceBert => "paraphrase-multilingual-MiniLM-L12-v2",
            EmbeddingModel::Bert => "bert-base-chinese",
            EmbeddingModel::Bge => "bge-small-zh-v1.5",
        }
    }

    /// HuggingFace base URL the model files are downloaded from.
    pub fn hf_url(&self) -> &'static str {
        match self {
            EmbeddingModel::SentenceBert => {
                "https://huggingface.co/sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2/resolve/main"
            }
            EmbeddingModel::Bert => "https://huggingface.co/Xenova/bert-base-chinese/resolve/main",
            EmbeddingModel::Bge => "https://huggingface.co/Xenova/bge-small-zh-v1.5/resolve/main",
        }
    }

    /// Look up a model by identifier.
    pub fn from_id(id: &str) -> Result<Self, Error> {
        let wanted = id.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.id() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|m| m.id()).collect();
                Error::Configuration(format!(
                    "unknown embedding model `{id}` (known: {})",
                    known.join(", ")
                ))
            })
    }
}

impl FromStr for EmbeddingModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
