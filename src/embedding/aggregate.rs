// Per-question vectors from per-segment embeddings.
//
// Each segment's core content is embedded separately and the results are
// averaged component-wise. Failures are local: a bad segment is left out of
// the mean, a question whose every segment failed keeps no vector.

use tracing::{debug, info};

use super::traits::EmbeddingProvider;
use crate::cleaning::content::CoreContentExtractor;
use crate::models::{Paper, Question, VectorizedPaper};
use crate::report::{Reporter, Warning};

/// Drives an [`EmbeddingProvider`] over the questions of a paper.
pub struct VectorAggregator<'a> {
    provider: &'a dyn EmbeddingProvider,
    extractor: &'a dyn CoreContentExtractor,
}

impl<'a> VectorAggregator<'a> {
    pub fn new(
        provider: &'a dyn EmbeddingProvider,
        extractor: &'a dyn CoreContentExtractor,
    ) -> Self {
        Self {
            provider,
            extractor,
        }
    }

    /// Embed the core content of `text`, treating a wrong-length vector as
    /// a failure.
    async fn embed_checked(&self, text: &str) -> anyhow::Result<Vec<f64>> {
        let core = self.extractor.extract(text);
        let vector = self.provider.embed(&core).await?;
        let expected = self.provider.dimension();
        if vector.len() != expected {
            anyhow::bail!(
                "provider returned {} components, expected {}",
                vector.len(),
                expected
            );
        }
        Ok(vector)
    }

    /// The vector for one question, or `None` when every segment failed.
    pub async fn question_vector(
        &self,
        question: &Question,
        reporter: &dyn Reporter,
    ) -> Option<Vec<f64>> {
        if question.segments.is_empty() {
            return match self.embed_checked(&question.text).await {
                Ok(vector) => Some(vector),
                Err(e) => {
                    reporter.warn(Warning::ZeroVectorSubstituted {
                        question_id: question.id.clone(),
                        reason: format!("{e:#}"),
                    });
                    Some(vec![0.0; self.provider.dimension()])
                }
            };
        }

        let mut embedded = Vec::with_capacity(question.segments.len());
        for (segment_index, segment) in question.segments.iter().enumerate() {
            match self.embed_checked(segment).await {
                Ok(vector) => embedded.push(vector),
                Err(e) => reporter.warn(Warning::SegmentEmbeddingFailed {
                    question_id: question.id.clone(),
                    segment_index,
                    reason: format!("{e:#}"),
                }),
            }
        }

        let vector = mean_vector(&embedded);
        if vector.is_none() {
            reporter.warn(Warning::VectorUnavailable {
                question_id: question.id.clone(),
            });
        }
        debug!(
            question_id = %question.id,
            segments = question.segments.len(),
            embedded = embedded.len(),
            "Aggregated question vector"
        );
        vector
    }

    /// Attach a vector to every question of `paper`.
    pub async fn vectorize_paper(&self, paper: Paper, reporter: &dyn Reporter) -> VectorizedPaper {
        reporter.progress(&format!(
            "Vectorizing paper {} ({} questions) with {}",
            paper.paper_id,
            paper.questions.len(),
            self.provider.model_id()
        ));

        let mut questions = paper.questions;
        for question in &mut questions {
            let vector = self.question_vector(question, reporter).await;
            question.vector = vector;
        }

        let vectorized = VectorizedPaper {
            paper_id: paper.paper_id,
            model: self.provider.model_id().to_string(),
            questions,
        };

        info!(
            paper_id = %vectorized.paper_id,
            model = %vectorized.model,
            questions = vectorized.questions.len(),
            with_vector = vectorized.vector_count(),
            "Vectorized paper"
        );

        vectorized
    }
}

/// Component-wise arithmetic mean of equal-length vectors.
///
/// Each component is summed in sorted order and divided once, so the result
/// does not depend on the order of `vectors`. `None` for an empty input.
pub fn mean_vector(vectors: &[Vec<f64>]) -> Option<Vec<f64>> {
    let first = vectors.first()?;
    let count = vectors.len() as f64;
    let mut column = Vec::with_capacity(vectors.len());

    let mean = (0..first.len())
        .map(|k| {
            column.clear();
            column.extend(vectors.iter().map(|v| v[k]));
            column.sort_by(f64::total_cmp);
            column.iter().sum::<f64>() / count
        })
        .collect();

    Some(mean)
}
