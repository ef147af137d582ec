//! Error type for estimation and debiasing failures.
//!
//! Two failure classes matter to callers:
//!
//! - `Configuration`: a structural precondition was violated before any
//!   numeric work started (empty word lists, subspace dimension exceeding
//!   the available rank, dimensionality mismatches). These are caller bugs
//!   and are raised eagerly.
//! - `NumericalInstability`: geometry degenerated mid-computation (a
//!   zero-norm vector reaching a required normalization, an equalization
//!   residual with magnitude above one). These are checked explicitly so
//!   that no NaN/Inf ever lands in an output vocabulary.
//!
//! Missing words are deliberately NOT an error anywhere in the crate: they
//! are skipped, counted, and logged with `log::warn!` at the call site.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DebiasError>;

#[derive(Debug, Error)]
pub enum DebiasError {
    /// Invalid hyperparameters or structurally invalid inputs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Degenerate geometry detected at runtime; the operation was aborted
    /// instead of propagating non-finite values.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    /// A matrix decomposition (PCA/SVD backend) failed to converge.
    #[error("decomposition failure: {0}")]
    Decomposition(String),

    /// Tensor/autodiff backend failure inside the soft debiaser.
    #[error(transparent)]
    Tensor(#[from] candle_core::Error),

    /// Filesystem failure in the embedding loader/writer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DebiasError {
    /// Shorthand used by eager precondition checks.
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        DebiasError::Configuration(msg.into())
    }

    /// Shorthand used by mid-computation degeneracy checks.
    pub(crate) fn unstable(msg: impl Into<String>) -> Self {
        DebiasError::NumericalInstability(msg.into())
    }
}
