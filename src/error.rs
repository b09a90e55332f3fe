// Library error type.
//
// Only failures that stop a run live here. Recoverable problems (a segment
// that failed to embed, a side with no usable vectors, a skipped duplicate)
// are reported through the Reporter and never surface as errors.

use thiserror::Error;

/// Fatal errors raised by the cleaning, vectorizing, and comparison stages.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A question record is missing a required field.
    #[error("question record #{index} is missing required field `{field}`")]
    InputFormat { index: usize, field: &'static str },

    /// A configuration value is out of range or unknown.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Two vectors in the same comparison have different lengths.
    #[error("vector dimension mismatch for question {question_id}: expected {expected}, found {found}")]
    DimensionMismatch {
        question_id: String,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
