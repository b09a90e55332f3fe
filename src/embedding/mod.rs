// Embedding stage: text to vectors.
//
// traits:    the provider capability every stage codes against
// model:     known sentence-transformer ids, dimensions, download URLs
// onnx:      local ONNX Runtime provider
// download:  fetches model files into the data directory
// aggregate: segment embeddings to one vector per question

pub mod aggregate;
pub mod download;
pub mod model;
pub mod onnx;
pub mod traits;

pub use aggregate::{mean_vector, VectorAggregator};
pub use model::EmbeddingModel;
pub use onnx::OnnxEmbedder;
pub use traits::EmbeddingProvider;
