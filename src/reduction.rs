//! PCA and SVD primitives over smartcore's dense matrices.
//!
//! ## Algorithm Overview
//!
//! `principal_components` implements standard PCA for the subspace
//! estimator:
//!
//! 1. Center the stacked rows by the global column mean
//! 2. Form the `D×D` scatter matrix `Xᶜᵗ·Xᶜ` (eigenvectors are invariant
//!    to the `1/(n−1)` scaling, so it is skipped)
//! 3. Symmetric eigendecomposition, components sorted by descending
//!    eigenvalue (descending explained variance)
//! 4. Deterministic sign convention: each component is flipped so its
//!    largest-magnitude entry is positive
//!
//! The scatter-matrix route keeps a single code path for both the common
//! case (few stacked difference rows, large `D`) and the tall case, and
//! symmetric EVD is well-conditioned for the near-rank-deficient matrices
//! produced by small defining-set collections.
//!
//! `left_singular_factors` wraps smartcore's SVD for the soft debiaser,
//! decomposing whichever orientation is taller and translating back, since
//! the backend expects `nrows ≥ ncols`.

use log::{debug, trace};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linalg::traits::evd::EVDDecomposable;
use smartcore::linalg::traits::svd::SVDDecomposable;

use crate::error::{DebiasError, Result};

/// Top-`n_components` principal components of the row matrix `rows`
/// (shape `n×dim`), each returned as a unit-norm `dim`-length vector,
/// ordered by descending explained variance.
///
/// # Errors
///
/// - `Configuration` if `n_components` is 0, exceeds `dim`, or exceeds
///   `rows.len() − 1` (more components than the centered data can rank).
/// - `Decomposition` if the eigensolver fails.
pub fn principal_components(rows: &[Vec<f64>], n_components: usize, dim: usize) -> Result<Vec<Vec<f64>>> {
    if n_components == 0 || n_components > dim {
        return Err(DebiasError::config(format!(
            "n_components={} outside valid range 1..={}",
            n_components, dim
        )));
    }
    if rows.len() < 2 {
        return Err(DebiasError::config(format!(
            "PCA needs at least 2 rows, got {}",
            rows.len()
        )));
    }
    if n_components > rows.len() - 1 {
        return Err(DebiasError::config(format!(
            "n_components={} exceeds available rank {} ({} stacked rows)",
            n_components,
            rows.len() - 1,
            rows.len()
        )));
    }
    debug!(
        "PCA over {}x{} matrix, retaining {} components",
        rows.len(),
        dim,
        n_components
    );

    // Center by the global column mean
    let n = rows.len();
    let mut mean = vec![0.0; dim];
    for row in rows {
        assert_eq!(row.len(), dim, "Dimension mismatch in PCA input");
        for (m, x) in mean.iter_mut().zip(row.iter()) {
            *m += x;
        }
    }
    for m in mean.iter_mut() {
        *m /= n as f64;
    }
    let centered: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| row.iter().zip(mean.iter()).map(|(x, m)| x - m).collect())
        .collect();

    // D×D scatter matrix
    let mut scatter = vec![vec![0.0; dim]; dim];
    for row in &centered {
        for i in 0..dim {
            let ri = row[i];
            if ri == 0.0 {
                continue;
            }
            for j in 0..dim {
                scatter[i][j] += ri * row[j];
            }
        }
    }

    let scatter_dm = DenseMatrix::from_2d_vec(&scatter)
        .map_err(|e| DebiasError::Decomposition(e.to_string()))?;
    let evd = scatter_dm
        .evd(true)
        .map_err(|e| DebiasError::Decomposition(e.to_string()))?;

    // Order eigenpairs by descending eigenvalue
    let mut order: Vec<usize> = (0..dim).collect();
    order.sort_by(|&a, &b| {
        evd.d[b]
            .partial_cmp(&evd.d[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    trace!(
        "eigenvalues (descending): {:?}",
        order.iter().take(n_components).map(|&i| evd.d[i]).collect::<Vec<_>>()
    );

    let mut components = Vec::with_capacity(n_components);
    for &col in order.iter().take(n_components) {
        let mut component: Vec<f64> = (0..dim).map(|row| *evd.V.get((row, col))).collect();

        let norm = component.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm <= 0.0 || !norm.is_finite() {
            return Err(DebiasError::unstable(format!(
                "degenerate eigenvector at column {}",
                col
            )));
        }
        for x in component.iter_mut() {
            *x /= norm;
        }

        // Sign convention: largest-magnitude entry positive
        let max_idx = component
            .iter()
            .enumerate()
            .max_by(|a, b| {
                a.1.abs()
                    .partial_cmp(&b.1.abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        if component[max_idx] < 0.0 {
            for x in component.iter_mut() {
                *x = -*x;
            }
        }

        components.push(component);
    }

    Ok(components)
}

/// Left singular factors `(U, s)` of a `D×n` matrix given as `D` rows of
/// length `n`: `U` has `r = min(D, n)` columns of length `D`, `s` holds the
/// corresponding singular values. Used by the soft debiaser to precompute
/// `t1 = S·Uᵗ` and `t2 = U·S` once instead of re-forming the Gram matrix
/// every epoch.
///
/// # Errors
///
/// `Decomposition` if the backend SVD fails to converge.
pub fn left_singular_factors(rows: &[Vec<f64>]) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    let d = rows.len();
    let n = rows.first().map(Vec::len).unwrap_or(0);
    if d == 0 || n == 0 {
        return Err(DebiasError::config("SVD input matrix is empty".to_string()));
    }
    debug!("SVD of {}x{} embedding matrix", d, n);

    if d >= n {
        // Tall already: left factors come straight out
        let m = DenseMatrix::from_2d_vec(&rows.to_vec())
            .map_err(|e| DebiasError::Decomposition(e.to_string()))?;
        let svd = m
            .svd()
            .map_err(|e| DebiasError::Decomposition(e.to_string()))?;
        let r = svd.s.len();
        let u: Vec<Vec<f64>> = (0..d)
            .map(|i| (0..r).map(|j| *svd.U.get((i, j))).collect())
            .collect();
        Ok((u, svd.s))
    } else {
        // Wide: decompose the transpose; W = V'·S·U'ᵗ, so the left factors
        // of W are the right factors of Wᵗ
        let transposed: Vec<Vec<f64>> = (0..n)
            .map(|j| (0..d).map(|i| rows[i][j]).collect())
            .collect();
        let m = DenseMatrix::from_2d_vec(&transposed)
            .map_err(|e| DebiasError::Decomposition(e.to_string()))?;
        let svd = m
            .svd()
            .map_err(|e| DebiasError::Decomposition(e.to_string()))?;
        let r = svd.s.len();
        let u: Vec<Vec<f64>> = (0..d)
            .map(|i| (0..r).map(|j| *svd.V.get((i, j))).collect())
            .collect();
        Ok((u, svd.s))
    }
}
