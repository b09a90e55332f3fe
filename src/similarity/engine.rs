// Pairwise comparison of two vectorized papers.
//
// Every question with a vector on side A is scored against every question
// with a vector on side B. Exam papers hold tens to low hundreds of
// questions, so the dense O(n·m·D) loop is the whole algorithm.

use std::cmp::Ordering;

use tracing::info;

use super::matrix::Matrix;
use crate::error::{Error, Result};
use crate::models::{ComparisonResult, Question, QuestionSummary, SimilarityPair, VectorizedPaper};
use crate::report::{Reporter, Warning};

pub const DEFAULT_COSINE_WEIGHT: f64 = 0.6;
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// How fused similarity is computed and which pairs are reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionConfig {
    /// Share of cosine similarity in the fused score; the rest is
    /// `1/(1+euclidean)`.
    pub cosine_weight: f64,
    /// Minimum fused score for a pair to be reported (inclusive).
    pub threshold: f64,
    /// Only pair questions that declare the same type.
    pub type_sensitive: bool,
    /// Echoed into the result; deduplication itself happens while cleaning.
    pub deduplicate: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            cosine_weight: DEFAULT_COSINE_WEIGHT,
            threshold: DEFAULT_THRESHOLD,
            type_sensitive: true,
            deduplicate: true,
        }
    }
}

impl FusionConfig {
    /// Reject weights and thresholds outside [0, 1], NaN included.
    pub fn validate(&self) -> Result<()> {
        check_unit("cosine weight", self.cosine_weight)?;
        check_unit("similarity threshold", self.threshold)
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "{name} must be between 0 and 1, got {value}"
        )))
    }
}

/// Questions on one side that carry a vector, in paper order.
fn with_vectors(paper: &VectorizedPaper) -> Vec<(&Question, &[f64])> {
    paper
        .questions
        .iter()
        .filter_map(|q| q.vector.as_deref().map(|v| (q, v)))
        .collect()
}

/// Compare two vectorized papers.
///
/// Questions without a vector are ignored. When either side has none left
/// the result has no pairs but still reports both counts. Pairs are sorted
/// by similarity, highest first; equal scores keep row-major order.
pub fn compare(
    paper_a: &VectorizedPaper,
    paper_b: &VectorizedPaper,
    config: &FusionConfig,
    reporter: &dyn Reporter,
) -> Result<ComparisonResult> {
    config.validate()?;

    let side_a = with_vectors(paper_a);
    let side_b = with_vectors(paper_b);

    let mut result = ComparisonResult {
        paper_a: paper_a.paper_id.clone(),
        paper_b: paper_b.paper_id.clone(),
        method: "fused".to_string(),
        threshold: config.threshold,
        type_sensitive: config.type_sensitive,
        fusion_weight: config.cosine_weight,
        total_questions_a: side_a.len(),
        total_questions_b: side_b.len(),
        total_pairs: 0,
        deduplicate: config.deduplicate,
        overall_similarity: 0.0,
        similar_pairs: Vec::new(),
    };

    if side_a.is_empty() || side_b.is_empty() {
        for (paper, side) in [(paper_a, &side_a), (paper_b, &side_b)] {
            if side.is_empty() {
                reporter.warn(Warning::EmptyComparisonSide {
                    paper_id: paper.paper_id.clone(),
                });
            }
        }
        return Ok(result);
    }

    let dim = side_a[0].1.len();
    let matrix_a = Matrix::from_rows(side_a.iter().map(|(q, v)| (q.id.as_str(), *v)), dim)?;
    let matrix_b = Matrix::from_rows(side_b.iter().map(|(q, v)| (q.id.as_str(), *v)), dim)?;

    let mut hits = Vec::new();
    for (i, (qa, _)) in side_a.iter().enumerate() {
        for (j, (qb, _)) in side_b.iter().enumerate() {
            if config.type_sensitive && qa.kind != qb.kind {
                continue;
            }
            let score = matrix_a.fused(i, &matrix_b, j, config.cosine_weight);
            // threshold applies to the raw score, only the reported one is clamped
            if score >= config.threshold {
                hits.push((score.clamp(0.0, 1.0), i, j));
            }
        }
    }

    // sort_by is stable: ties stay in (i, j) order
    hits.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    result.similar_pairs = hits
        .into_iter()
        .map(|(similarity, i, j)| SimilarityPair {
            paper_a: QuestionSummary::from(side_a[i].0),
            paper_b: QuestionSummary::from(side_b[j].0),
            similarity,
        })
        .collect();
    result.total_pairs = result.similar_pairs.len();
    result.overall_similarity = overall_similarity(
        &result.similar_pairs,
        result.total_questions_a.max(result.total_questions_b),
    );

    info!(
        paper_a = %result.paper_a,
        paper_b = %result.paper_b,
        questions_a = result.total_questions_a,
        questions_b = result.total_questions_b,
        pairs = result.total_pairs,
        dim,
        "Compared papers"
    );

    Ok(result)
}

/// Heuristic whole-paper score in [0, 1].
///
/// Mean pair similarity scaled by the share of `total_questions` that found
/// a pair. 0 when there are no pairs or no questions.
pub fn overall_similarity(pairs: &[SimilarityPair], total_questions: usize) -> f64 {
    if pairs.is_empty() || total_questions == 0 {
        return 0.0;
    }
    let sum: f64 = pairs.iter().map(|p| p.similarity).sum();
    let coverage = pairs.len() as f64 / total_questions as f64;
    (sum * coverage / pairs.len() as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;

    fn q(id: &str, kind: &str, vector: Option<Vec<f64>>) -> Question {
        Question {
            id: id.to_string(),
            kind: kind.to_string(),
            raw_text: String::new(),
            text: format!("question {id}"),
            segments: Vec::new(),
            fingerprint: String::new(),
            score: None,
            vector,
        }
    }

    fn paper(id: &str, questions: Vec<Question>) -> VectorizedPaper {
        VectorizedPaper {
            paper_id: id.to_string(),
            model: "test".to_string(),
            questions,
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = FusionConfig::default();
        assert_eq!(config.cosine_weight, 0.6);
        assert_eq!(config.threshold, 0.7);
        assert!(config.type_sensitive);
        assert!(config.deduplicate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_out_of_range_and_nan() {
        for (w, t) in [(1.5, 0.5), (-0.1, 0.5), (0.5, f64::NAN), (0.5, 2.0)] {
            let config = FusionConfig {
                cosine_weight: w,
                threshold: t,
                ..FusionConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(Error::Configuration(_))),
                "w={w} t={t} should be rejected"
            );
        }
    }

    #[test]
    fn test_pairs_sorted_descending() {
        let a = paper("a", vec![q("1", "MC", Some(vec![1.0, 0.0]))]);
        let b = paper(
            "b",
            vec![
                q("x", "MC", Some(vec![1.0, 1.0])),
                q("y", "MC", Some(vec![1.0, 0.0])),
            ],
        );
        let config = FusionConfig {
            threshold: 0.0,
            ..FusionConfig::default()
        };

        let result = compare(&a, &b, &config, &RecordingReporter::new()).unwrap();

        let ids: Vec<&str> = result
            .similar_pairs
            .iter()
            .map(|p| p.paper_b.id.as_str())
            .collect();
        assert_eq!(ids, vec!["y", "x"]);
        assert_eq!(result.total_pairs, 2);
    }

    #[test]
    fn test_negative_fused_score_dropped_at_zero_threshold() {
        let a = paper("a", vec![q("1", "MC", Some(vec![1.0, 0.0]))]);
        let b = paper(
            "b",
            vec![
                q("x", "MC", Some(vec![-1.0, 0.0])),
                q("y", "MC", Some(vec![0.0, 1.0])),
            ],
        );
        let config = FusionConfig {
            cosine_weight: 1.0,
            threshold: 0.0,
            ..FusionConfig::default()
        };

        let result = compare(&a, &b, &config, &RecordingReporter::new()).unwrap();

        // y sits exactly at 0 and is kept, x is at -1
        assert_eq!(result.total_pairs, 1);
        assert_eq!(result.similar_pairs[0].paper_b.id, "y");
        assert_eq!(result.similar_pairs[0].similarity, 0.0);
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        let v = Some(vec![0.3, 0.4]);
        let a = paper("a", vec![q("1", "MC", v.clone()), q("2", "MC", v.clone())]);
        let b = paper("b", vec![q("x", "MC", v.clone()), q("y", "MC", v)]);

        let result = compare(&a, &b, &FusionConfig::default(), &RecordingReporter::new()).unwrap();

        let order: Vec<(&str, &str)> = result
            .similar_pairs
            .iter()
            .map(|p| (p.paper_a.id.as_str(), p.paper_b.id.as_str()))
            .collect();
        assert_eq!(order, vec![("1", "x"), ("1", "y"), ("2", "x"), ("2", "y")]);
    }

    #[test]
    fn test_questions_without_vector_are_not_counted() {
        let a = paper(
            "a",
            vec![q("1", "MC", Some(vec![1.0])), q("2", "MC", None)],
        );
        let b = paper("b", vec![q("x", "MC", Some(vec![1.0]))]);

        let result = compare(&a, &b, &FusionConfig::default(), &RecordingReporter::new()).unwrap();

        assert_eq!(result.total_questions_a, 1);
        assert_eq!(result.total_questions_b, 1);
        assert_eq!(result.total_pairs, 1);
    }

    #[test]
    fn test_empty_side_gives_zero_pairs_and_warning() {
        let a = paper("a", vec![q("1", "MC", None)]);
        let b = paper("b", vec![q("x", "MC", Some(vec![1.0]))]);
        let reporter = RecordingReporter::new();

        let result = compare(&a, &b, &FusionConfig::default(), &reporter).unwrap();

        assert_eq!(result.total_pairs, 0);
        assert_eq!(result.total_questions_a, 0);
        assert_eq!(result.total_questions_b, 1);
        assert_eq!(result.overall_similarity, 0.0);
        assert!(matches!(
            reporter.warnings().as_slice(),
            [Warning::EmptyComparisonSide { paper_id }] if paper_id == "a"
        ));
    }

    #[test]
    fn test_dimension_mismatch_is_fatal() {
        let a = paper("a", vec![q("1", "MC", Some(vec![1.0, 0.0]))]);
        let b = paper("b", vec![q("x", "MC", Some(vec![1.0, 0.0, 0.0]))]);

        let err = compare(&a, &b, &FusionConfig::default(), &RecordingReporter::new()).unwrap_err();

        assert_eq!(
            err,
            Error::DimensionMismatch {
                question_id: "x".into(),
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_invalid_config_fails_before_comparing() {
        let a = paper("a", vec![q("1", "MC", Some(vec![1.0]))]);
        let config = FusionConfig {
            threshold: 1.2,
            ..FusionConfig::default()
        };
        assert!(matches!(
            compare(&a, &a, &config, &RecordingReporter::new()),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_overall_similarity() {
        let pair = |s: f64| SimilarityPair {
            paper_a: QuestionSummary::from(&q("1", "MC", None)),
            paper_b: QuestionSummary::from(&q("x", "MC", None)),
            similarity: s,
        };
        assert_eq!(overall_similarity(&[], 4), 0.0);
        assert_eq!(overall_similarity(&[pair(0.9)], 0), 0.0);
        // mean 0.75 over 2 of 4 questions
        let overall = overall_similarity(&[pair(1.0), pair(0.5)], 4);
        assert!((overall - 0.375).abs() < 1e-12, "got {overall}");
        // more pairs than questions is capped
        let capped = overall_similarity(&[pair(1.0), pair(1.0), pair(1.0)], 1);
        assert_eq!(capped, 1.0);
    }
}
