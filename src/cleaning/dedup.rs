// Content-addressed fingerprints and within-paper deduplication.
//
// The fingerprint hashes the paper id together with the core content, so the
// same question appearing in two different papers gets two different
// fingerprints. Cross-paper reuse is the similarity engine's job; this stage
// only removes repeats inside one paper.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use super::content::CoreContentExtractor;
use crate::models::Question;
use crate::report::{Reporter, Warning};

/// SHA-256 hex digest of `paper_id::core_content` (core content trimmed).
///
/// Total over any input.
pub fn fingerprint(paper_id: &str, core_content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(paper_id.as_bytes());
    hasher.update(b"::");
    hasher.update(core_content.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Attaches fingerprints and, when enabled, drops repeated questions.
pub struct Deduplicator<'a> {
    extractor: &'a dyn CoreContentExtractor,
    deduplicate: bool,
}

impl<'a> Deduplicator<'a> {
    pub fn new(extractor: &'a dyn CoreContentExtractor, deduplicate: bool) -> Self {
        Self {
            extractor,
            deduplicate,
        }
    }

    /// Fingerprint of a question's cleaned text within `paper_id`.
    pub fn fingerprint_of(&self, paper_id: &str, cleaned_text: &str) -> String {
        fingerprint(paper_id, &self.extractor.extract(cleaned_text))
    }

    /// Fingerprint every question and keep the first of each fingerprint.
    ///
    /// The seen set lives only for this call. With deduplication off every
    /// question is kept and the fingerprints are informational.
    pub fn apply(
        &self,
        paper_id: &str,
        questions: Vec<Question>,
        reporter: &dyn Reporter,
    ) -> Vec<Question> {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(questions.len());

        for mut question in questions {
            question.fingerprint = self.fingerprint_of(paper_id, &question.text);

            if self.deduplicate && !seen.insert(question.fingerprint.clone()) {
                reporter.warn(Warning::DuplicateSkipped {
                    paper_id: paper_id.to_string(),
                    question_id: question.id.clone(),
                    fingerprint: question.fingerprint.clone(),
                });
                continue;
            }
            kept.push(question);
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::content::MarkupCoreExtractor;
    use crate::report::RecordingReporter;

    fn question(id: &str, text: &str) -> Question {
        Question {
            id: id.to_string(),
            kind: "MC".to_string(),
            raw_text: text.to_string(),
            text: text.to_string(),
            segments: vec![text.to_string()],
            fingerprint: String::new(),
            score: None,
            vector: None,
        }
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = fingerprint("paper", "content");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_hashes_id_separator_and_trimmed_core() {
        let expected = hex::encode(Sha256::digest(b"paper-7::Solve for x"));
        assert_eq!(fingerprint("paper-7", "  Solve for x \n"), expected);
    }

    #[test]
    fn test_fingerprint_depends_on_paper_id() {
        assert_ne!(fingerprint("a.json", "same"), fingerprint("b.json", "same"));
        assert_eq!(fingerprint("a.json", "same"), fingerprint("a.json", " same "));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let extractor = MarkupCoreExtractor;
        let dedup = Deduplicator::new(&extractor, true);
        let reporter = RecordingReporter::new();

        let kept = dedup.apply(
            "p1",
            vec![
                question("1", "<p>1. What is 2+2?</p>"),
                question("2", "Other question"),
                question("3", "<b>(4)</b> What is 2+2?"),
            ],
            &reporter,
        );

        let ids: Vec<&str> = kept.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        let warnings = reporter.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            Warning::DuplicateSkipped { question_id, .. } if question_id == "3"
        ));
    }

    #[test]
    fn test_dedup_disabled_keeps_all_with_shared_fingerprint() {
        let extractor = MarkupCoreExtractor;
        let dedup = Deduplicator::new(&extractor, false);
        let reporter = RecordingReporter::new();

        let kept = dedup.apply(
            "p1",
            vec![question("1", "Same text"), question("2", "Same text")],
            &reporter,
        );

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].fingerprint, kept[1].fingerprint);
        assert!(!kept[0].fingerprint.is_empty());
        assert!(reporter.warnings().is_empty());
    }
}
