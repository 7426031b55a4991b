use thiserror::Error;

/// Inputs for which cosine similarity is undefined
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimilarityError {
    #[error("cannot compare empty vectors")]
    Empty,

    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("zero-norm vector")]
    ZeroNorm,

    #[error("vector contains non-finite values")]
    NonFinite,
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction. Empty,
/// mismatched or zero-norm inputs are errors rather than a silent 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.is_empty() || b.is_empty() {
        return Err(SimilarityError::Empty);
    }
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    // Accumulate in f64; text embeddings have ~1.5k dimensions
    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0_f64, 0.0_f64, 0.0_f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (dot + x * y, na + x * x, nb + y * y)
        },
    );

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(SimilarityError::ZeroNorm);
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !score.is_finite() {
        return Err(SimilarityError::NonFinite);
    }
    Ok(score.clamp(-1.0, 1.0) as f32)
}
