// Similarity stage: fused cosine/euclidean scoring between two papers.

pub mod engine;
pub mod matrix;

pub use engine::{compare, overall_similarity, FusionConfig};
pub use matrix::{cosine_similarity, euclidean, fused_similarity};
