//! Vector primitives and the subspace projector.
//!
//! - Euclidean norm, dot product, cosine similarity without allocating
//! - `normalize`: unit-length copy with an explicit zero-norm check
//! - `project_onto_subspace`: Σ_i (v · c_i) c_i over an ordered basis
//!
//! The projector assumes (and does not re-validate) that the basis is
//! orthonormal; PCA components satisfy this by construction, so
//! orthonormality is the estimator's responsibility, not the projector's.

use crate::error::{DebiasError, Result};
use crate::subspace::Subspace;

/// Computes the Euclidean norm (L2) without allocating.
#[inline]
pub fn norm(a: &[f64]) -> f64 {
    a.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// Dot product of two equal-length slices.
///
/// # Panics
///
/// Panics if the lengths differ.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "Dimension mismatch");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Returns a unit-length copy of `a`.
///
/// # Errors
///
/// `NumericalInstability` if `a` has zero or non-finite norm; callers that
/// reach this point would otherwise emit NaN into an output vocabulary.
#[inline]
pub fn normalize(a: &[f64]) -> Result<Vec<f64>> {
    let n = norm(a);
    if n <= 0.0 || !n.is_finite() {
        return Err(DebiasError::unstable(format!(
            "cannot normalize vector with norm {}",
            n
        )));
    }
    Ok(a.iter().map(|x| x / n).collect())
}

/// Cosine similarity, guarding against zero vectors.
///
/// Returns 0.0 if either vector has zero norm.
///
/// # Panics
///
/// Panics if the lengths differ.
#[inline]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let denom = norm(a) * norm(b);
    if denom > 0.0 {
        dot(a, b) / denom
    } else {
        0.0
    }
}

/// Orthogonal projection of `vector` onto `subspace`: Σ_i (v · c_i) c_i.
///
/// An empty subspace yields the zero vector. No side effects; the inputs
/// are never mutated.
///
/// # Examples
///
/// ```
/// use debias::operators::project_onto_subspace;
/// use debias::subspace::Subspace;
///
/// let axis = Subspace::new(vec![vec![1.0, 0.0]], 2).unwrap();
/// let p = project_onto_subspace(&[0.5, 0.5], &axis);
/// assert_eq!(p, vec![0.5, 0.0]);
/// ```
///
/// # Panics
///
/// Panics if `vector` and the subspace components have different lengths.
pub fn project_onto_subspace(vector: &[f64], subspace: &Subspace) -> Vec<f64> {
    let mut v_b = vec![0.0; vector.len()];
    for component in subspace.components() {
        let coeff = dot(vector, component);
        for (out, c) in v_b.iter_mut().zip(component.iter()) {
            *out += coeff * c;
        }
    }
    v_b
}

/// Component of `vector` orthogonal to `subspace`: `v − project(v)`.
#[inline]
pub fn reject_from_subspace(vector: &[f64], subspace: &Subspace) -> Vec<f64> {
    let v_b = project_onto_subspace(vector, subspace);
    vector.iter().zip(v_b.iter()).map(|(v, b)| v - b).collect()
}
