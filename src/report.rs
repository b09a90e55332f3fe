// Reporter: injectable sink for recoverable problems found during a run.
//
// Every stage takes a `&dyn Reporter` instead of logging through globals.
// The CLI uses TracingReporter; tests use RecordingReporter to assert on
// exactly which warnings a stage produced.

use std::fmt;
use std::sync::Mutex;

use tracing::{info, warn};

/// A recoverable problem. None of these stop the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A question was dropped because an earlier one had the same fingerprint.
    DuplicateSkipped {
        paper_id: String,
        question_id: String,
        fingerprint: String,
    },
    /// One segment of a question could not be embedded and was left out of
    /// the mean.
    SegmentEmbeddingFailed {
        question_id: String,
        segment_index: usize,
        reason: String,
    },
    /// Every segment of a question failed; the question has no vector.
    VectorUnavailable { question_id: String },
    /// A question without segments failed to embed and got a zero vector.
    ZeroVectorSubstituted { question_id: String, reason: String },
    /// One side of a comparison had no question with a vector.
    EmptyComparisonSide { paper_id: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DuplicateSkipped {
                paper_id,
                question_id,
                fingerprint,
            } => write!(
                f,
                "skipped duplicate question {question_id} in {paper_id} (fingerprint {})",
                fingerprint.chars().take(12).collect::<String>()
            ),
            Warning::SegmentEmbeddingFailed {
                question_id,
                segment_index,
                reason,
            } => write!(
                f,
                "segment {segment_index} of question {question_id} failed to embed: {reason}"
            ),
            Warning::VectorUnavailable { question_id } => {
                write!(f, "question {question_id} has no vector: every segment failed")
            }
            Warning::ZeroVectorSubstituted {
                question_id,
                reason,
            } => write!(
                f,
                "question {question_id} failed to embed, using a zero vector: {reason}"
            ),
            Warning::EmptyComparisonSide { paper_id } => {
                write!(f, "paper {paper_id} has no vectorized questions to compare")
            }
        }
    }
}

/// Sink for stage progress and recoverable warnings.
pub trait Reporter: Send + Sync {
    /// A recoverable problem worth surfacing to the user.
    fn warn(&self, warning: Warning);

    /// Stage progress. Ignored by default.
    fn progress(&self, _message: &str) {}
}

/// Forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn warn(&self, warning: Warning) {
        warn!("{warning}");
    }

    fn progress(&self, message: &str) {
        info!("{message}");
    }
}

/// Keeps every warning in memory, in the order they were reported.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    warnings: Mutex<Vec<Warning>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the warnings seen so far.
    pub fn warnings(&self) -> Vec<Warning> {
        match self.warnings.lock() {
            Ok(w) => w.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Reporter for RecordingReporter {
    fn warn(&self, warning: Warning) {
        match self.warnings.lock() {
            Ok(mut w) => w.push(warning),
            Err(poisoned) => poisoned.into_inner().push(warning),
        }
    }
}
