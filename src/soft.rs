//! Soft debiasing: a learned global linear transform.
//!
//! ## Algorithm Overview
//!
//! Learns one `D×D` matrix `T` applied to every embedding, minimizing
//!
//! ```text
//! loss = ‖Wᵗ·(TᵗT − I)·W‖₂ + l · ‖Nᵗ·TᵗT·B‖₂
//! ```
//!
//! where `W` holds all embeddings as columns, `N` the target ("neutral")
//! embeddings, and `B` the bias-subspace basis. The first term penalizes
//! distortion of the pairwise inner-product structure among all words; the
//! second penalizes residual alignment of neutral words with the bias
//! subspace; `l` trades them off.
//!
//! Optimization is plain gradient descent (no momentum) over a seeded
//! random initialization of `T`, with a fixed small learning rate and a
//! small epoch budget. Gradients come from candle's reverse-mode autodiff;
//! the update step follows the hand-rolled optimizer pattern of tracking a
//! `Var` and stepping it from `loss.backward()` gradients.
//!
//! ## SVD acceleration
//!
//! Re-forming `TW` against the full vocabulary every epoch is the
//! expensive part. With the one-time thin SVD `W = U·S·Vᵗ` and the
//! precomputed factors `t1 = S·Uᵗ`, `t2 = U·S`, the first term rewrites as
//! `‖t1·(TᵗT − I)·t2‖₂`, which is algebraically equal (V has orthonormal
//! columns, and the Frobenius norm is invariant under them) but works in
//! `r×r` instead of `n×n`. Both paths sit behind `use_svd_acceleration`;
//! tests verify the terms agree at a fixed `T`.
//!
//! ## Stopping
//!
//! `epochs` is an upper bound, not an exact count: a relative loss-plateau
//! check (`convergence_tol`) can stop the loop early. Set it to 0.0 to
//! always run the full budget.

use candle_core::{DType, Device, Tensor, Var};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::core::Vocabulary;
use crate::error::{DebiasError, Result};
use crate::operators::normalize;
use crate::reduction::left_singular_factors;
use crate::subspace::Subspace;

/// Hyperparameters of the soft debiaser.
///
/// Defaults: `l = 0.2`, learning rate `1e-6`, 10 epochs, SVD acceleration
/// on. The random initialization of `T` is seeded explicitly so runs are
/// reproducible.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SoftDebiasParams {
    /// Weight `l` of the bias-removal term against geometry preservation.
    pub bias_weight: f64,
    /// Gradient-descent step size.
    pub learning_rate: f64,
    /// Epoch budget (upper bound on descent steps).
    pub epochs: usize,
    /// Seed for the random initialization of the transform.
    pub seed: u64,
    /// Use the SVD-reparameterized geometry term instead of the direct
    /// Gram form. Same minimization target, cheaper gradient evaluation.
    pub use_svd_acceleration: bool,
    /// Relative loss-plateau threshold for early stopping; 0.0 disables
    /// the check and always runs the full epoch budget.
    pub convergence_tol: f64,
}

impl Default for SoftDebiasParams {
    fn default() -> Self {
        Self {
            bias_weight: 0.2,
            learning_rate: 1e-6,
            epochs: 10,
            seed: 42,
            use_svd_acceleration: true,
            convergence_tol: 0.0,
        }
    }
}

/// Frobenius norm of a matrix tensor as a scalar tensor.
fn frobenius(t: &Tensor) -> candle_core::Result<Tensor> {
    t.sqr()?.sum_all()?.sqrt()
}

/// Direct geometry term `‖(TW)ᵗ(TW) − WᵗW‖₂`; `wtw` is precomputed once.
pub(crate) fn gram_term_direct(
    t: &Tensor,
    w: &Tensor,
    wtw: &Tensor,
) -> candle_core::Result<Tensor> {
    let tw = t.matmul(w)?;
    let gram = tw.t()?.matmul(&tw)?;
    frobenius(&gram.sub(wtw)?)
}

/// SVD-reparameterized geometry term `‖t1·(TᵗT − I)·t2‖₂`.
pub(crate) fn gram_term_svd(
    t: &Tensor,
    t1: &Tensor,
    t2: &Tensor,
    eye: &Tensor,
) -> candle_core::Result<Tensor> {
    let ttt = t.t()?.matmul(t)?;
    let inner = ttt.sub(eye)?;
    frobenius(&t1.matmul(&inner)?.matmul(t2)?)
}

/// Bias-alignment term `‖Nᵗ·TᵗT·B‖₂`.
pub(crate) fn bias_term(t: &Tensor, n: &Tensor, b: &Tensor) -> candle_core::Result<Tensor> {
    let ttt = t.t()?.matmul(t)?;
    frobenius(&n.t()?.matmul(&ttt)?.matmul(b)?)
}

/// Column-major assembly of `vocab` as `D` rows of `n` word columns, in
/// the vocabulary's sorted word order.
fn vocab_rows(vocab: &Vocabulary) -> Vec<Vec<f64>> {
    let dim = vocab.dim();
    let mut rows = vec![vec![0.0; vocab.len()]; dim];
    for (j, (_, vector)) in vocab.iter().enumerate() {
        for (i, &x) in vector.iter().enumerate() {
            rows[i][j] = x;
        }
    }
    rows
}

fn to_tensor(rows: &[Vec<f64>], device: &Device) -> Result<Tensor> {
    let nrows = rows.len();
    let ncols = rows.first().map(Vec::len).unwrap_or(0);
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(Tensor::from_vec(flat, (nrows, ncols), device)?)
}

/// Precomputes the SVD factors `t1 = S·Uᵗ` (r×D) and `t2 = U·S` (D×r)
/// from the `D×n` embedding rows.
pub(crate) fn svd_factors(rows: &[Vec<f64>], device: &Device) -> Result<(Tensor, Tensor)> {
    let (u, s) = left_singular_factors(rows)?;
    let d = u.len();
    let r = s.len();

    let mut t1 = vec![vec![0.0; d]; r];
    let mut t2 = vec![vec![0.0; r]; d];
    for i in 0..d {
        for (a, &sv) in s.iter().enumerate() {
            t1[a][i] = sv * u[i][a];
            t2[i][a] = u[i][a] * sv;
        }
    }
    Ok((to_tensor(&t1, device)?, to_tensor(&t2, device)?))
}

/// Learns the soft-debias transform and returns an entirely new
/// vocabulary: every word is transformed by `T` and renormalized to unit
/// length, replacing its original vector.
///
/// # Errors
///
/// - `Configuration` for an empty vocabulary, mismatched subspace
///   dimensionality, no present neutral words, a zero epoch budget, or a
///   non-positive learning rate.
/// - `NumericalInstability` if the loss diverges to a non-finite value or
///   a transformed vector collapses to zero norm.
pub fn equalize_and_soften(
    vocab: &Vocabulary,
    neutral_words: &[String],
    subspace: &Subspace,
    params: &SoftDebiasParams,
) -> Result<Vocabulary> {
    let dim = vocab.dim();
    if vocab.is_empty() {
        return Err(DebiasError::config("cannot soft-debias an empty vocabulary"));
    }
    if subspace.embedding_dim() != dim || subspace.is_empty() {
        return Err(DebiasError::config(format!(
            "subspace (k={}, D={}) does not fit vocabulary dimension {}",
            subspace.len(),
            subspace.embedding_dim(),
            dim
        )));
    }
    if params.epochs == 0 {
        return Err(DebiasError::config("epoch budget must be at least 1"));
    }
    if params.learning_rate <= 0.0 {
        return Err(DebiasError::config("learning rate must be positive"));
    }

    let present_neutrals: Vec<&str> = neutral_words
        .iter()
        .filter(|w| vocab.contains(w))
        .map(String::as_str)
        .collect();
    let missing = neutral_words.len() - present_neutrals.len();
    if missing > 0 {
        warn!("{} neutral words were absent from the vocabulary", missing);
    }
    if present_neutrals.is_empty() {
        return Err(DebiasError::config(
            "no neutral words present in the vocabulary",
        ));
    }

    info!(
        "Soft debias: {} words, {} neutral targets, k={}, svd_acceleration={}, epochs<={}",
        vocab.len(),
        present_neutrals.len(),
        subspace.len(),
        params.use_svd_acceleration,
        params.epochs
    );

    let device = Device::Cpu;
    let w_rows = vocab_rows(vocab);
    let w = to_tensor(&w_rows, &device)?;

    // N: neutral embeddings as columns, B: subspace components as columns
    let mut n_rows = vec![vec![0.0; present_neutrals.len()]; dim];
    for (j, word) in present_neutrals.iter().enumerate() {
        let v = vocab.get(word).expect("presence checked above");
        for (i, &x) in v.iter().enumerate() {
            n_rows[i][j] = x;
        }
    }
    let n = to_tensor(&n_rows, &device)?;

    let mut b_rows = vec![vec![0.0; subspace.len()]; dim];
    for (j, component) in subspace.components().iter().enumerate() {
        for (i, &x) in component.iter().enumerate() {
            b_rows[i][j] = x;
        }
    }
    let b = to_tensor(&b_rows, &device)?;

    // Geometry-term constants: one of the two paths, computed once
    let (wtw, svd_pair, eye) = if params.use_svd_acceleration {
        let pair = svd_factors(&w_rows, &device)?;
        let eye = Tensor::eye(dim, DType::F64, &device)?;
        (None, Some(pair), Some(eye))
    } else {
        (Some(w.t()?.matmul(&w)?), None, None)
    };

    // Seeded random init of the transform
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let init: Vec<f64> = (0..dim * dim)
        .map(|_| StandardNormal.sample(&mut rng))
        .collect();
    let transform = Var::from_tensor(&Tensor::from_vec(init, (dim, dim), &device)?)?;

    let mut prev_loss: Option<f64> = None;
    for epoch in 0..params.epochs {
        let t = transform.as_tensor();
        let geometry = match (&svd_pair, &eye, &wtw) {
            (Some((t1, t2)), Some(eye), _) => gram_term_svd(t, t1, t2, eye)?,
            (_, _, Some(wtw)) => gram_term_direct(t, &w, wtw)?,
            _ => unreachable!("one geometry path is always configured"),
        };
        let alignment = bias_term(t, &n, &b)?;
        let loss = geometry.add(&alignment.affine(params.bias_weight, 0.0)?)?;

        let loss_val = loss.to_scalar::<f64>()?;
        if !loss_val.is_finite() {
            return Err(DebiasError::unstable(format!(
                "loss became non-finite at epoch {}",
                epoch
            )));
        }
        debug!("epoch {}: loss={:.6}", epoch, loss_val);

        let grads = loss.backward()?;
        if let Some(grad) = grads.get(transform.as_tensor()) {
            // θ ← θ − lr·∇θ, detached so the graph does not grow across steps
            let step = grad.affine(-params.learning_rate, 0.0)?;
            let updated = transform.as_tensor().add(&step)?.detach();
            transform.set(&updated)?;
        }

        if let Some(prev) = prev_loss {
            if params.convergence_tol > 0.0
                && (prev - loss_val).abs() <= params.convergence_tol * prev.abs().max(1e-12)
            {
                info!("loss plateaued at epoch {} ({:.6}), stopping early", epoch, loss_val);
                break;
            }
        }
        prev_loss = Some(loss_val);
    }

    // Apply the learned transform to every word and renormalize
    let t_final = transform.as_tensor().detach().to_vec2::<f64>()?;
    let originals: Vec<(&String, &Vec<f64>)> = vocab.into_iter().collect();

    use rayon::prelude::*;
    let transformed: Vec<Result<(String, Vec<f64>)>> = originals
        .par_iter()
        .map(|(word, vector)| {
            let mut out = vec![0.0; dim];
            for (i, row) in t_final.iter().enumerate() {
                out[i] = row
                    .iter()
                    .zip(vector.iter())
                    .map(|(t_ik, x)| t_ik * x)
                    .sum();
            }
            let unit = normalize(&out).map_err(|_| {
                DebiasError::unstable(format!(
                    "transform collapsed '{}' to zero norm",
                    word
                ))
            })?;
            Ok(((*word).clone(), unit))
        })
        .collect();

    let mut result = Vocabulary::new(dim);
    for entry in transformed {
        let (word, vector) = entry?;
        result.insert(word, vector)?;
    }

    debug_assert_eq!(result.len(), vocab.len());
    debug_assert!(result.all_finite());
    info!("Soft debias complete: {} words transformed", result.len());
    Ok(result)
}
