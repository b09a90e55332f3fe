// Similarity engine tests: metric properties, thresholds, type handling and
// side-swap symmetry of whole-paper comparisons.

use examsim::error::Error;
use examsim::models::{Question, VectorizedPaper};
use examsim::report::{RecordingReporter, Warning};
use examsim::similarity::{compare, cosine_similarity, fused_similarity, FusionConfig};

fn question(id: &str, kind: &str, vector: Option<Vec<f64>>) -> Question {
    Question {
        id: id.to_string(),
        kind: kind.to_string(),
        raw_text: String::new(),
        text: format!("<p>Question {id}</p>"),
        segments: vec![format!("<p>Question {id}</p>")],
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

fn config(threshold: f64, type_sensitive: bool) -> FusionConfig {
    FusionConfig {
        threshold,
        type_sensitive,
        ..FusionConfig::default()
    }
}

// ============================================================
// Metrics
// ============================================================

#[test]
fn zero_vector_has_zero_cosine_and_finite_fused_score() {
    let zero = [0.0, 0.0, 0.0];
    let other = [0.2, -0.4, 0.1];
    assert_eq!(cosine_similarity(&zero, &other), 0.0);
    let fused = fused_similarity(&zero, &other, 0.6);
    assert!(fused.is_finite());
    assert!((0.0..=1.0).contains(&fused));
}

#[test]
fn fused_score_stays_in_unit_interval() {
    let vectors = [
        vec![1.0, 0.0],
        vec![-1.0, 0.0],
        vec![0.0, 0.0],
        vec![3.0, 4.0],
        vec![-0.5, 0.25],
    ];
    for a in &vectors {
        for b in &vectors {
            for w in [0.0, 0.3, 0.6, 1.0] {
                let s = fused_similarity(a, b, w);
                assert!((0.0..=1.0).contains(&s), "{a:?} vs {b:?} at w={w}: {s}");
            }
        }
    }
}

#[test]
fn weight_zero_is_pure_distance_similarity() {
    // distance 5
    let s = fused_similarity(&[0.0, 0.0], &[3.0, 4.0], 0.0);
    assert!((s - 1.0 / 6.0).abs() < 1e-12, "got {s}");
}

// ============================================================
// Comparison
// ============================================================

#[test]
fn threshold_is_inclusive() {
    let va = vec![1.0, 0.0];
    let vb = vec![1.0, 1.0];
    let exact = fused_similarity(&va, &vb, 0.6);

    let a = paper("a", vec![question("1", "MC", Some(va))]);
    let b = paper("b", vec![question("x", "MC", Some(vb))]);

    let at = compare(&a, &b, &config(exact, true), &RecordingReporter::new()).unwrap();
    assert_eq!(at.total_pairs, 1);
    assert_eq!(at.similar_pairs[0].similarity, exact);

    let above = (exact + 1e-9).min(1.0);
    let over = compare(&a, &b, &config(above, true), &RecordingReporter::new()).unwrap();
    assert_eq!(over.total_pairs, 0);
}

#[test]
fn type_sensitive_skips_cross_type_pairs() {
    let v = Some(vec![0.6, 0.8]);
    let a = paper("a", vec![question("1", "MC", v.clone())]);
    let b = paper(
        "b",
        vec![question("x", "FILL", v.clone()), question("y", "MC", v)],
    );

    let sensitive = compare(&a, &b, &config(0.5, true), &RecordingReporter::new()).unwrap();
    assert_eq!(sensitive.total_pairs, 1);
    assert_eq!(sensitive.similar_pairs[0].paper_b.id, "y");

    let insensitive = compare(&a, &b, &config(0.5, false), &RecordingReporter::new()).unwrap();
    assert_eq!(insensitive.total_pairs, 2);
}

#[test]
fn swapping_sides_mirrors_the_pairs() {
    let a = paper(
        "a",
        vec![
            question("1", "MC", Some(vec![0.9, 0.1, 0.3])),
            question("2", "MC", Some(vec![0.1, 0.8, 0.2])),
            question("3", "TF", Some(vec![0.5, 0.5, 0.5])),
        ],
    );
    let b = paper(
        "b",
        vec![
            question("x", "MC", Some(vec![0.8, 0.2, 0.3])),
            question("y", "TF", Some(vec![0.4, 0.6, 0.5])),
            question("z", "MC", Some(vec![0.0, 1.0, 0.1])),
        ],
    );
    let cfg = config(0.0, true);

    let ab = compare(&a, &b, &cfg, &RecordingReporter::new()).unwrap();
    let ba = compare(&b, &a, &cfg, &RecordingReporter::new()).unwrap();

    let mut forward: Vec<(String, String, f64)> = ab
        .similar_pairs
        .iter()
        .map(|p| (p.paper_a.id.clone(), p.paper_b.id.clone(), p.similarity))
        .collect();
    let mut mirrored: Vec<(String, String, f64)> = ba
        .similar_pairs
        .iter()
        .map(|p| (p.paper_b.id.clone(), p.paper_a.id.clone(), p.similarity))
        .collect();
    forward.sort_by(|l, r| (&l.0, &l.1).cmp(&(&r.0, &r.1)));
    mirrored.sort_by(|l, r| (&l.0, &l.1).cmp(&(&r.0, &r.1)));

    assert_eq!(forward, mirrored);
    assert_eq!(ab.total_questions_a, ba.total_questions_b);
    assert_eq!(ab.overall_similarity, ba.overall_similarity);
}

#[test]
fn result_is_sorted_descending() {
    let a = paper(
        "a",
        vec![
            question("1", "MC", Some(vec![1.0, 0.0])),
            question("2", "MC", Some(vec![0.0, 1.0])),
        ],
    );
    let b = paper(
        "b",
        vec![
            question("x", "MC", Some(vec![0.7, 0.7])),
            question("y", "MC", Some(vec![0.0, 1.0])),
        ],
    );

    let result = compare(&a, &b, &config(0.0, true), &RecordingReporter::new()).unwrap();

    let scores: Vec<f64> = result.similar_pairs.iter().map(|p| p.similarity).collect();
    assert_eq!(scores.len(), 4);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
    assert_eq!(result.similar_pairs[0].paper_a.id, "2");
    assert_eq!(result.similar_pairs[0].paper_b.id, "y");
}

#[test]
fn both_sides_empty_warns_twice() {
    let a = paper("a", vec![question("1", "MC", None)]);
    let b = paper("b", Vec::new());
    let reporter = RecordingReporter::new();

    let result = compare(&a, &b, &FusionConfig::default(), &reporter).unwrap();

    assert_eq!(result.total_pairs, 0);
    assert!(result.similar_pairs.is_empty());
    assert_eq!(result.method, "fused");
    let warnings = reporter.warnings();
    assert_eq!(warnings.len(), 2);
    assert!(warnings
        .iter()
        .all(|w| matches!(w, Warning::EmptyComparisonSide { .. })));
}

#[test]
fn mixed_dimensions_within_one_side_fail() {
    let a = paper(
        "a",
        vec![
            question("1", "MC", Some(vec![1.0, 0.0])),
            question("2", "MC", Some(vec![1.0])),
        ],
    );
    let b = paper("b", vec![question("x", "MC", Some(vec![1.0, 0.0]))]);

    let err = compare(&a, &b, &FusionConfig::default(), &RecordingReporter::new()).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { ref question_id, .. } if question_id == "2"));
}

#[test]
fn result_serializes_with_expected_keys() {
    let v = Some(vec![1.0, 0.0]);
    let a = paper("a.json", vec![question("1", "MC", v.clone())]);
    let b = paper("b.json", vec![question("x", "MC", v)]);

    let result = compare(&a, &b, &FusionConfig::default(), &RecordingReporter::new()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    for key in [
        "paper_a",
        "paper_b",
        "method",
        "threshold",
        "type_sensitive",
        "fusion_weight",
        "total_questions_a",
        "total_questions_b",
        "total_pairs",
        "deduplicate",
        "overall_similarity",
        "similar_pairs",
    ] {
        assert!(json.get(key).is_some(), "missing key {key}");
    }
    let pair = &json["similar_pairs"][0];
    assert_eq!(pair["paper_a"]["id"], "1");
    assert_eq!(pair["paper_a"]["type"], "MC");
    assert_eq!(pair["paper_b"]["text"], "<p>Question x</p>");
}
