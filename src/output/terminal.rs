// Colored terminal output for cleaned papers and comparison results.
//
// main.rs delegates all display here. Question text is shown as visible text
// (markup removed), cut to a fixed width.

use colored::Colorize;

use super::truncate_chars;
use crate::cleaning::content::visible_text;
use crate::models::{ComparisonResult, Paper, VectorizedPaper};
use crate::report::Warning;

/// Width of the question text columns in the pair table.
const TEXT_WIDTH: usize = 36;

/// Display a cleaned paper's question count and fingerprints.
pub fn display_paper_summary(paper: &Paper) {
    println!(
        "\n{}",
        format!(
            "=== {} ({} questions after cleaning) ===",
            paper.paper_id,
            paper.questions.len()
        )
        .bold()
    );
    for q in &paper.questions {
        println!(
            "  {:<8} {:<10} {:>3} seg  {}  {}",
            q.id,
            q.kind,
            q.segments.len(),
            q.fingerprint.chars().take(12).collect::<String>().dimmed(),
            truncate_chars(&visible_text(&q.text), TEXT_WIDTH),
        );
    }
}

/// Display how many questions of a vectorized paper got a vector.
pub fn display_vectorized_summary(paper: &VectorizedPaper) {
    let with_vector = paper.vector_count();
    let missing = paper.questions.len() - with_vector;
    println!(
        "  {}: {}/{} questions vectorized with {}",
        paper.paper_id.bold(),
        with_vector,
        paper.questions.len(),
        paper.model
    );
    if missing > 0 {
        println!(
            "  {} {} questions have no vector and will be skipped",
            "!".yellow(),
            missing
        );
    }
}

/// Display the ranked pair table and a summary of a comparison.
///
/// At most `limit` pairs are listed; the summary always counts all of them.
pub fn display_comparison(result: &ComparisonResult, limit: usize) {
    println!(
        "\n{}",
        format!("=== {} vs {} ===", result.paper_a, result.paper_b).bold()
    );
    println!(
        "  {}",
        format!(
            "threshold {:.2}  cosine weight {:.2}  type-sensitive {}  dedup {}",
            result.threshold, result.fusion_weight, result.type_sensitive, result.deduplicate
        )
        .dimmed()
    );
    println!();

    if result.similar_pairs.is_empty() {
        println!("  No question pairs at or above the threshold.");
    } else {
        println!(
            "  {:>4}  {:>6}  {:<8} {:<w$}  {:<8} {:<w$}",
            "Rank".dimmed(),
            "Sim".dimmed(),
            "A".dimmed(),
            "Question A".dimmed(),
            "B".dimmed(),
            "Question B".dimmed(),
            w = TEXT_WIDTH + 3,
        );
        println!("  {}", "-".repeat(2 * TEXT_WIDTH + 40).dimmed());

        for (i, pair) in result.similar_pairs.iter().take(limit).enumerate() {
            println!(
                "  {:>4}. {}  {:<8} {:<w$}  {:<8} {:<w$}",
                i + 1,
                colorize_similarity(pair.similarity),
                pair.paper_a.id,
                truncate_chars(&visible_text(&pair.paper_a.text), TEXT_WIDTH),
                pair.paper_b.id,
                truncate_chars(&visible_text(&pair.paper_b.text), TEXT_WIDTH),
                w = TEXT_WIDTH + 3,
            );
        }

        if result.similar_pairs.len() > limit {
            println!(
                "  {}",
                format!("... {} more pairs", result.similar_pairs.len() - limit).dimmed()
            );
        }
    }

    println!();
    println!(
        "  Questions compared: {} vs {}",
        result.total_questions_a, result.total_questions_b
    );
    println!("  Similar pairs: {}", result.total_pairs);
    println!(
        "  Overall similarity: {}",
        colorize_similarity(result.overall_similarity)
    );
}

/// Display a one-line tally of the warnings a run produced.
///
/// The warnings themselves were already logged as they happened.
pub fn display_warning_summary(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    let duplicates = warnings
        .iter()
        .filter(|w| matches!(w, Warning::DuplicateSkipped { .. }))
        .count();
    println!(
        "\n  {} {} warnings during this run ({} duplicate questions skipped)",
        "!".yellow(),
        warnings.len(),
        duplicates
    );
}

/// Color a similarity score by how suspicious it is.
pub fn colorize_similarity(score: f64) -> String {
    let text = format!("{score:.4}");
    if score >= 0.9 {
        text.red().bold().to_string()
    } else if score >= 0.8 {
        text.bright_red().to_string()
    } else if score >= 0.7 {
        text.yellow().to_string()
    } else {
        text.normal().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_similarity_keeps_four_decimals() {
        colored::control::set_override(false);
        assert_eq!(colorize_similarity(0.95), "0.9500");
        assert_eq!(colorize_similarity(0.1234567), "0.1235");
    }
}
