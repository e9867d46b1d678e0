//! Pure vector routines used for similarity scoring.
//!
//! All functions operate on `f32` slices and report length disagreements
//! as [`Error::DimensionMismatch`] instead of silently truncating. Sums
//! are accumulated in `f64` so large finite components do not overflow.

use crate::error::{Error, Result};

/// Sum of elementwise products of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(dot_f64(a, b) as f32)
}

/// Euclidean length of a vector.
pub fn magnitude(a: &[f32]) -> f32 {
    magnitude_f64(a) as f32
}

fn dot_f64(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

fn magnitude_f64(a: &[f32]) -> f64 {
    a.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]` (up to rounding):
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// # Errors
///
/// - [`Error::DimensionMismatch`] when the lengths differ.
/// - [`Error::UndefinedSimilarity`] when either vector has zero magnitude
///   (this includes two empty vectors).
///
/// # Formula
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let denom = magnitude_f64(a) * magnitude_f64(b);
    if denom == 0.0 {
        return Err(Error::UndefinedSimilarity);
    }

    let sim = (dot_f64(a, b) / denom) as f32;
    if !sim.is_finite() {
        return Err(Error::UndefinedSimilarity);
    }
    Ok(sim)
}

/// Position of the first NaN or infinite component, if any.
pub(crate) fn first_non_finite(v: &[f32]) -> Option<usize> {
    v.iter().position(|x| !x.is_finite())
}
