// Bounded-length segmentation of cleaned question text.
//
// Embedding models have an input window, so long questions (reading passages,
// multi-part problems) are cut into segments. Cuts prefer sentence-ending
// punctuation, but only once a segment is long enough to be worth embedding
// on its own; anything still too long is packed word by word.

use crate::error::{Error, Result};

/// Default segment bound, in characters.
pub const DEFAULT_MAX_SEGMENT_LENGTH: usize = 500;

/// Characters after which a segment may be cut.
const SENTENCE_TERMINALS: [char; 7] = ['。', '？', '！', '；', '?', '!', ';'];

/// A punctuation cut only happens once the segment holds this fraction of
/// `max_length`, so short sentences get grouped instead of emitted one by one.
const MIN_CUT_RATIO: f64 = 0.3;

/// Splits text into segments of at most `max_length` characters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segmenter {
    max_length: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_SEGMENT_LENGTH,
        }
    }
}

impl Segmenter {
    pub fn new(max_length: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(Error::Configuration(
                "max_segment_length must be at least 1".to_string(),
            ));
        }
        Ok(Self { max_length })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Lazily yield the segments of `text`, in order.
    ///
    /// Paragraphs are split on line breaks and empty ones are skipped. A
    /// segment only exceeds `max_length` when it is a single token with no
    /// whitespace to cut at.
    pub fn segments<'a>(&self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        let max_length = self.max_length;
        text.split('\n')
            .map(str::trim)
            .filter(|para| !para.is_empty())
            .flat_map(move |para| split_paragraph(para, max_length))
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_paragraph(para: &str, max_length: usize) -> Vec<String> {
    if char_len(para) <= max_length {
        return vec![para.to_string()];
    }

    split_on_punctuation(para, max_length)
        .into_iter()
        .flat_map(|chunk| {
            if char_len(&chunk) <= max_length {
                vec![chunk]
            } else {
                pack_words(&chunk, max_length)
            }
        })
        .collect()
}

fn split_on_punctuation(para: &str, max_length: usize) -> Vec<String> {
    let min_cut = max_length as f64 * MIN_CUT_RATIO;
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for ch in para.chars() {
        current.push(ch);
        current_len += 1;
        if SENTENCE_TERMINALS.contains(&ch) && current_len as f64 >= min_cut {
            push_trimmed(&mut chunks, &current);
            current.clear();
            current_len = 0;
        }
    }
    push_trimmed(&mut chunks, &current);

    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, segment: &str) {
    let trimmed = segment.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Greedy word packing. Joined fragments never exceed `max_length`; a single
/// word longer than that is emitted alone.
fn pack_words(chunk: &str, max_length: usize) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in chunk.split_whitespace() {
        let word_len = char_len(word);
        if current_len + word_len + 1 > max_length && !current.is_empty() {
            fragments.push(current.join(" "));
            current.clear();
            current_len = 0;
        }
        current.push(word);
        current_len += word_len + 1;
    }
    if !current.is_empty() {
        fragments.push(current.join(" "));
    }

    fragments
}

/// Segment `text` with the given bound.
pub fn segment_text(text: &str, max_length: usize) -> Result<Vec<String>> {
    Ok(Segmenter::new(max_length)?.segments(text).collect())
}
