// Cleaning stage: raw question records to a deduplicated, segmented paper.
//
// sanitize: markup whitelist with math protection
// segment:  bounded-length segments for the embedding model
// content:  numbering/score/markup-free text for fingerprints and embeddings
// dedup:    content-addressed fingerprints, first occurrence wins

pub mod content;
pub mod dedup;
pub mod sanitize;
pub mod segment;

use tracing::info;

use self::content::{CoreContentExtractor, MarkupCoreExtractor};
use self::dedup::Deduplicator;
use self::segment::Segmenter;
use crate::error::Result;
use crate::models::{Paper, Question, QuestionRecord};
use crate::report::Reporter;

/// Knobs for the cleaning stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleaningOptions {
    pub max_segment_length: usize,
    pub deduplicate: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            max_segment_length: segment::DEFAULT_MAX_SEGMENT_LENGTH,
            deduplicate: true,
        }
    }
}

/// Turns question records into a cleaned [`Paper`].
pub struct PaperCleaner {
    segmenter: Segmenter,
    deduplicate: bool,
    extractor: Box<dyn CoreContentExtractor>,
}

impl PaperCleaner {
    /// Cleaner with the default core-content extractor.
    pub fn new(options: CleaningOptions) -> Result<Self> {
        Self::with_extractor(options, Box::new(MarkupCoreExtractor))
    }

    pub fn with_extractor(
        options: CleaningOptions,
        extractor: Box<dyn CoreContentExtractor>,
    ) -> Result<Self> {
        Ok(Self {
            segmenter: Segmenter::new(options.max_segment_length)?,
            deduplicate: options.deduplicate,
            extractor,
        })
    }

    pub fn extractor(&self) -> &dyn CoreContentExtractor {
        self.extractor.as_ref()
    }

    /// Clean one question record. `index` is its position in the paper.
    pub fn clean_record(&self, index: usize, record: &QuestionRecord) -> Result<Question> {
        let id = record.id_string(index)?;
        let raw_text = record.text(index)?;

        let text = sanitize::clean_markup(raw_text);
        let segments = self.segmenter.segments(&text).collect();

        Ok(Question {
            id,
            kind: record.kind_or_unknown(),
            raw_text: raw_text.to_string(),
            text,
            segments,
            fingerprint: String::new(),
            score: record.score,
            vector: None,
        })
    }

    /// Clean every record of a paper, then fingerprint and deduplicate.
    ///
    /// All records are validated before any of them is processed, so a
    /// malformed record fails the paper without partial output.
    pub fn clean_paper(
        &self,
        paper_id: &str,
        records: &[QuestionRecord],
        reporter: &dyn Reporter,
    ) -> Result<Paper> {
        for (index, record) in records.iter().enumerate() {
            record.id_string(index)?;
            record.text(index)?;
        }

        reporter.progress(&format!(
            "Cleaning paper {paper_id} ({} questions)",
            records.len()
        ));

        let questions = records
            .iter()
            .enumerate()
            .map(|(index, record)| self.clean_record(index, record))
            .collect::<Result<Vec<_>>>()?;

        let total = questions.len();
        let questions = Deduplicator::new(self.extractor.as_ref(), self.deduplicate).apply(
            paper_id,
            questions,
            reporter,
        );

        info!(
            paper_id,
            total,
            kept = questions.len(),
            deduplicate = self.deduplicate,
            "Cleaned paper"
        );

        Ok(Paper {
            paper_id: paper_id.to_string(),
            questions,
        })
    }
}
