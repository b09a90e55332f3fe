// Data model shared by every stage of the pipeline.
//
// The serialized field names are the interchange format between stages:
// a cleaned paper is what `vectorize` reads, a vectorized paper is what
// `compare` reads.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Question type used when a record does not declare one.
pub const UNKNOWN_TYPE: &str = "unknown";

/// A raw question as it arrives from an exported paper.
///
/// Ids may be strings or numbers in the source files, so they are kept as
/// raw JSON values until validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, rename = "richTextContent", alias = "text")]
    pub rich_text: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl QuestionRecord {
    /// Convenience constructor, mostly for tests and in-memory callers.
    pub fn new(id: &str, kind: &str, rich_text: &str) -> Self {
        Self {
            id: Some(serde_json::Value::String(id.to_string())),
            kind: Some(kind.to_string()),
            rich_text: Some(rich_text.to_string()),
            score: None,
        }
    }

    /// The record id as a string. Numbers are rendered without quotes.
    ///
    /// `index` is the record's position in its paper and is only used for
    /// the error message.
    pub fn id_string(&self, index: usize) -> Result<String> {
        let missing = Error::InputFormat { index, field: "id" };
        match &self.id {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            _ => Err(missing),
        }
    }

    /// The rich-text body. Missing text is an input error; empty text is not.
    pub fn text(&self, index: usize) -> Result<&str> {
        self.rich_text.as_deref().ok_or(Error::InputFormat {
            index,
            field: "richTextContent",
        })
    }

    pub fn kind_or_unknown(&self) -> String {
        self.kind
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(UNKNOWN_TYPE)
            .to_string()
    }
}

/// A cleaned, segmented, fingerprinted question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Original markup, kept in memory for diagnostics only.
    #[serde(skip)]
    pub raw_text: String,
    /// Sanitized text (whitelisted markup, math spans intact).
    pub text: String,
    pub segments: Vec<String>,
    /// Lowercase hex SHA-256 of `paper_id::core_content`.
    pub fingerprint: String,
    #[serde(default)]
    pub score: Option<f64>,
    /// Per-question embedding. Absent until vectorization, and stays absent
    /// when every segment failed to embed.
    #[serde(default)]
    pub vector: Option<Vec<f64>>,
}

/// A cleaned paper: questions in input order, duplicates removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub paper_id: String,
    pub questions: Vec<Question>,
}

/// A paper whose questions carry vectors, tagged with the model that made them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizedPaper {
    pub paper_id: String,
    pub model: String,
    pub questions: Vec<Question>,
}

impl VectorizedPaper {
    /// Number of questions that ended up with a usable vector.
    pub fn vector_count(&self) -> usize {
        self.questions.iter().filter(|q| q.vector.is_some()).count()
    }
}

/// The per-side view of a question inside a similar pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl From<&Question> for QuestionSummary {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            kind: q.kind.clone(),
            text: q.text.clone(),
        }
    }
}

/// Two questions, one from each paper, with their fused similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityPair {
    pub paper_a: QuestionSummary,
    pub paper_b: QuestionSummary,
    pub similarity: f64,
}

/// Full output of a paper comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub paper_a: String,
    pub paper_b: String,
    /// Always "fused".
    pub method: String,
    pub threshold: f64,
    pub type_sensitive: bool,
    pub fusion_weight: f64,
    /// Questions on side A that had a vector.
    pub total_questions_a: usize,
    /// Questions on side B that had a vector.
    pub total_questions_b: usize,
    pub total_pairs: usize,
    pub deduplicate: bool,
    /// Optional heuristic aggregate, see `similarity::overall_similarity`.
    pub overall_similarity: f64,
    pub similar_pairs: Vec<SimilarityPair>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_parses_numeric_id_and_text_alias() {
        let rec: QuestionRecord =
            serde_json::from_str(r#"{"id": 7, "type": "MC", "text": "Q?"}"#).unwrap();
        assert_eq!(rec.id_string(0).unwrap(), "7");
        assert_eq!(rec.text(0).unwrap(), "Q?");
        assert_eq!(rec.kind_or_unknown(), "MC");
    }

    #[test]
    fn test_record_missing_id_is_input_error() {
        let rec: QuestionRecord = serde_json::from_str(r#"{"richTextContent": "Q?"}"#).unwrap();
        assert_eq!(
            rec.id_string(3),
            Err(Error::InputFormat { index: 3, field: "id" })
        );
    }

    #[test]
    fn test_record_missing_text_is_input_error() {
        let rec: QuestionRecord = serde_json::from_str(r#"{"id": "1"}"#).unwrap();
        assert!(matches!(
            rec.text(0),
            Err(Error::InputFormat { field: "richTextContent", .. })
        ));
    }

    #[test]
    fn test_missing_type_defaults_to_unknown() {
        let rec: QuestionRecord = serde_json::from_str(r#"{"id": "1", "text": "x"}"#).unwrap();
        assert_eq!(rec.kind_or_unknown(), UNKNOWN_TYPE);
    }

    #[test]
    fn test_question_serializes_type_field_and_skips_raw_text() {
        let q = Question {
            id: "1".into(),
            kind: "MC".into(),
            raw_text: "<p>raw</p>".into(),
            text: "<p>raw</p>".into(),
            segments: vec!["<p>raw</p>".into()],
            fingerprint: "ab".into(),
            score: None,
            vector: None,
        };
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], "MC");
        assert!(json.get("raw_text").is_none());
        assert!(json["vector"].is_null());
    }
}
