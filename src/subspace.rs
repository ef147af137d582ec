//! Bias subspace: type and estimator.
//!
//! ## Algorithm Overview
//!
//! `identify_bias_subspace` extracts a low-dimensional direction of
//! contrast from a collection of labeled defining sets (e.g.
//! `{he, she}`, `{man, woman}`):
//!
//! 1. For each defining set, gather member vectors present in the
//!    vocabulary (absent words are skipped, counted, and logged)
//! 2. Compute the per-set mean and subtract it from each member
//! 3. Stack all centered differences across sets into one matrix
//! 4. PCA; keep the top `subspace_dim` components by explained variance
//!
//! Per-set centering before concatenation is what makes the subspace
//! capture the within-set contrast (maleness vs femaleness) rather than
//! absolute word semantics; pooling several pairs makes the axis robust to
//! any single idiosyncratic pair.
//!
//! A defining set with fewer than two present members contributes a
//! degenerate all-zero row; it is kept (rank reduction accepted) but
//! logged, since `subspace_dim` must stay below the stacked row count.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::core::Vocabulary;
use crate::error::{DebiasError, Result};
use crate::reduction::principal_components;

/// Labeled defining sets: set label → ordered member words.
pub type DefiningSets = BTreeMap<String, Vec<String>>;

/// Ordered orthonormal basis of the bias subspace.
///
/// Components are PCA outputs and are orthonormal by construction; the
/// projector assumes but does not re-check this.
///
/// # Examples
///
/// ```
/// use debias::subspace::Subspace;
///
/// let s = Subspace::new(vec![vec![1.0, 0.0], vec![0.0, 1.0]], 2).unwrap();
/// assert_eq!(s.len(), 2);
/// assert_eq!(s.embedding_dim(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Subspace {
    components: Vec<Vec<f64>>,
    dim: usize,
}

impl Subspace {
    /// Wraps `components` (each of length `dim`) as a subspace basis.
    ///
    /// # Errors
    ///
    /// `Configuration` if there are no components, if `k > dim`, or if any
    /// component has the wrong length.
    pub fn new(components: Vec<Vec<f64>>, dim: usize) -> Result<Self> {
        if components.is_empty() {
            return Err(DebiasError::config("subspace needs at least one component"));
        }
        if components.len() > dim {
            return Err(DebiasError::config(format!(
                "subspace rank {} exceeds embedding dimension {}",
                components.len(),
                dim
            )));
        }
        for (i, c) in components.iter().enumerate() {
            if c.len() != dim {
                return Err(DebiasError::config(format!(
                    "component {} has length {}, expected {}",
                    i,
                    c.len(),
                    dim
                )));
            }
        }
        Ok(Self { components, dim })
    }

    /// Number of basis components `k`.
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True if the basis is empty (never constructible via `new`; used by
    /// tests exercising the projector's degenerate contract).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Embedding dimension `D` of every component.
    #[inline]
    pub fn embedding_dim(&self) -> usize {
        self.dim
    }

    /// Ordered components, highest explained variance first.
    #[inline]
    pub fn components(&self) -> &[Vec<f64>] {
        &self.components
    }

    /// Degenerate empty basis of dimension `dim`; projecting onto it
    /// yields the zero vector.
    #[inline]
    pub fn empty(dim: usize) -> Self {
        Self {
            components: Vec::new(),
            dim,
        }
    }
}

/// Estimates the bias subspace from `def_sets` over `vocab`, returning the
/// top `subspace_dim` principal components of the stacked per-set centered
/// differences.
///
/// Words absent from `vocab` are skipped without error; the skip count is
/// logged at warn level.
///
/// # Errors
///
/// - `Configuration` if `def_sets` contributes fewer than two stacked
///   rows, or if `subspace_dim` is 0, exceeds the embedding dimension, or
///   exceeds `stacked_rows − 1`.
/// - `Decomposition` if the PCA backend fails.
pub fn identify_bias_subspace(
    vocab: &Vocabulary,
    def_sets: &DefiningSets,
    subspace_dim: usize,
) -> Result<Subspace> {
    let dim = vocab.dim();
    info!(
        "Identifying bias subspace: {} defining sets, subspace_dim={}, D={}",
        def_sets.len(),
        subspace_dim,
        dim
    );

    let mut stacked: Vec<Vec<f64>> = Vec::new();
    let mut missing = 0usize;

    for (label, members) in def_sets {
        let present: Vec<&[f64]> = members
            .iter()
            .filter_map(|w| {
                let v = vocab.get(w);
                if v.is_none() {
                    missing += 1;
                }
                v
            })
            .collect();

        if present.is_empty() {
            debug!("defining set '{}' has no present members, skipping", label);
            continue;
        }
        if present.len() < 2 {
            debug!(
                "defining set '{}' has a single present member; contributes a zero row",
                label
            );
        }

        let mut mean = vec![0.0; dim];
        for v in &present {
            for (m, x) in mean.iter_mut().zip(v.iter()) {
                *m += x;
            }
        }
        for m in mean.iter_mut() {
            *m /= present.len() as f64;
        }

        for v in &present {
            stacked.push(v.iter().zip(mean.iter()).map(|(x, m)| x - m).collect());
        }
    }

    if missing > 0 {
        warn!("{} defining-set words were absent from the vocabulary", missing);
    }
    debug!("stacked {} centered difference rows", stacked.len());

    let components = principal_components(&stacked, subspace_dim, dim)?;
    Subspace::new(components, dim)
}
