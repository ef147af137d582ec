//! Pipeline configuration and orchestration.
//!
//! `DebiasBuilder` gathers the crate's hyperparameters behind `with_*`
//! methods and exposes the full flow (estimate, measure, debias) with
//! consistent logging, so callers do not have to wire
//! the modules by hand. Every operation takes the vocabulary by reference
//! and returns freshly constructed results.

use log::{debug, info};

use crate::core::Vocabulary;
use crate::error::Result;
use crate::hard::neutralize_and_equalize;
use crate::metrics::direct_bias;
use crate::soft::{equalize_and_soften, SoftDebiasParams};
use crate::subspace::{identify_bias_subspace, DefiningSets, Subspace};

/// Builder over the estimation and debiasing pipeline.
///
/// # Examples
///
/// ```
/// use debias::builder::DebiasBuilder;
///
/// let pipeline = DebiasBuilder::new()
///     .with_subspace_dim(1)
///     .with_bias_power(1.0)
///     .with_seed(7);
/// assert_eq!(pipeline.subspace_dim(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct DebiasBuilder {
    subspace_dim: usize,
    bias_power: f64,
    soft: SoftDebiasParams,
}

impl Default for DebiasBuilder {
    fn default() -> Self {
        debug!("Creating DebiasBuilder with default parameters");
        Self {
            subspace_dim: 1,
            bias_power: 1.0,
            soft: SoftDebiasParams::default(),
        }
    }
}

impl DebiasBuilder {
    pub fn new() -> Self {
        info!("Initializing new DebiasBuilder");
        Self::default()
    }

    /// Number of principal components retained as the bias subspace.
    pub fn with_subspace_dim(mut self, subspace_dim: usize) -> Self {
        info!("Configuring subspace_dim={}", subspace_dim);
        self.subspace_dim = subspace_dim;
        self
    }

    /// Exponent `c` applied per word inside the direct-bias average.
    pub fn with_bias_power(mut self, c: f64) -> Self {
        info!("Configuring bias power c={}", c);
        self.bias_power = c;
        self
    }

    /// Full soft-debias parameter set.
    pub fn with_soft_params(mut self, params: SoftDebiasParams) -> Self {
        info!(
            "Configuring soft debias: l={}, lr={}, epochs={}, svd={}",
            params.bias_weight, params.learning_rate, params.epochs, params.use_svd_acceleration
        );
        self.soft = params;
        self
    }

    /// Seed of the soft-debias transform initialization.
    pub fn with_seed(mut self, seed: u64) -> Self {
        info!("Configuring soft debias seed={}", seed);
        self.soft.seed = seed;
        self
    }

    /// Toggles the SVD-reparameterized geometry term.
    pub fn with_svd_acceleration(mut self, enabled: bool) -> Self {
        info!("Configuring svd acceleration: {}", enabled);
        self.soft.use_svd_acceleration = enabled;
        self
    }

    pub fn subspace_dim(&self) -> usize {
        self.subspace_dim
    }

    pub fn soft_params(&self) -> &SoftDebiasParams {
        &self.soft
    }

    /// Estimates the bias subspace from defining sets.
    pub fn identify_subspace(
        &self,
        vocab: &Vocabulary,
        def_sets: &DefiningSets,
    ) -> Result<Subspace> {
        identify_bias_subspace(vocab, def_sets, self.subspace_dim)
    }

    /// Residual direct bias of `neutral_words` under `subspace`.
    pub fn direct_bias(
        &self,
        vocab: &Vocabulary,
        neutral_words: &[String],
        subspace: &Subspace,
    ) -> Result<f64> {
        direct_bias(vocab, neutral_words, subspace, self.bias_power)
    }

    /// Closed-form neutralize-and-equalize; logs the bias before and after
    /// for observability.
    pub fn hard_debias(
        &self,
        vocab: &Vocabulary,
        neutral_words: &[String],
        eq_sets: &[Vec<String>],
        subspace: &Subspace,
    ) -> Result<Vocabulary> {
        let before = direct_bias(vocab, neutral_words, subspace, self.bias_power)?;
        let result = neutralize_and_equalize(vocab, neutral_words, eq_sets, subspace)?;
        let after = direct_bias(&result, neutral_words, subspace, self.bias_power)?;
        info!(
            "hard debias: direct bias {:.6} -> {:.6}",
            before, after
        );
        Ok(result)
    }

    /// Learned soft-debias transform over the whole vocabulary.
    pub fn soft_debias(
        &self,
        vocab: &Vocabulary,
        neutral_words: &[String],
        subspace: &Subspace,
    ) -> Result<Vocabulary> {
        equalize_and_soften(vocab, neutral_words, subspace, &self.soft)
    }
}
