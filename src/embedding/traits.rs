// Embedding provider trait, the swap-ready abstraction.
//
// The rest of the pipeline only knows "text in, fixed-length vector out".
// The default implementation runs a sentence-transformer locally through
// ONNX Runtime; tests plug in small deterministic fakes.

use anyhow::Result;
use async_trait::async_trait;

/// Turns text into a vector of `dimension()` components.
///
/// Implementations must be deterministic per text. A failure is reported
/// as an `Err`, never as an empty or short vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;

    /// Declared output dimension.
    fn dimension(&self) -> usize;

    /// Identifier recorded in vectorized papers.
    fn model_id(&self) -> &str;
}
