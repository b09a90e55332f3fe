// Dense row-major vector matrices and the pairwise metrics over them.
//
// Norms are computed once per row. Distances are direct pairwise differences
// rather than the |a|²+|b|²-2a·b expansion, which loses precision for nearly
// identical vectors and can go slightly negative.

use crate::error::{Error, Result};

/// n rows of dimension `dim`, stored contiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    norms: Vec<f64>,
    dim: usize,
}

impl Matrix {
    /// Build a matrix from `(id, vector)` rows, all of length `dim`.
    ///
    /// The id is only used to name the offending row in a
    /// [`Error::DimensionMismatch`].
    pub fn from_rows<'a, I>(rows: I, dim: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a [f64])>,
    {
        let mut data = Vec::new();
        let mut norms = Vec::new();

        for (id, vector) in rows {
            if vector.len() != dim {
                return Err(Error::DimensionMismatch {
                    question_id: id.to_string(),
                    expected: dim,
                    found: vector.len(),
                });
            }
            data.extend_from_slice(vector);
            norms.push(norm(vector));
        }

        Ok(Self { data, norms, dim })
    }

    pub fn rows(&self) -> usize {
        self.norms.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Cosine similarity between row `i` of `self` and row `j` of `other`.
    pub fn cosine(&self, i: usize, other: &Matrix, j: usize) -> f64 {
        cosine_with_norms(self.row(i), self.norms[i], other.row(j), other.norms[j])
    }

    /// Euclidean distance between row `i` of `self` and row `j` of `other`.
    pub fn euclidean(&self, i: usize, other: &Matrix, j: usize) -> f64 {
        euclidean(self.row(i), other.row(j))
    }

    /// Fused score between row `i` of `self` and row `j` of `other`, before
    /// clamping. Negative when the cosine term outweighs the distance term.
    pub fn fused(&self, i: usize, other: &Matrix, j: usize, cosine_weight: f64) -> f64 {
        weighted(
            self.cosine(i, other, j),
            self.euclidean(i, other, j),
            cosine_weight,
        )
    }
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine_with_norms(a: &[f64], norm_a: f64, b: &[f64], norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

fn weighted(cosine: f64, distance: f64, cosine_weight: f64) -> f64 {
    let closeness = 1.0 / (1.0 + distance);
    cosine_weight * cosine + (1.0 - cosine_weight) * closeness
}

/// Cosine similarity in [-1, 1]. A zero vector on either side gives 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    cosine_with_norms(a, norm(a), b, norm(b))
}

/// Euclidean distance over paired components.
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// `w·cosine + (1-w)·1/(1+distance)`, clamped to [0, 1].
pub fn fused_similarity(a: &[f64], b: &[f64], cosine_weight: f64) -> f64 {
    weighted(cosine_similarity(a, b), euclidean(a, b), cosine_weight).clamp(0.0, 1.0)
}
