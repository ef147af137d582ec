//! # debias
//!
//! Bias-subspace estimation and debiasing for word embedding
//! vocabularies, after Bolukbasi et al.'s neutralize/equalize
//! construction.
//!
//! The crate identifies a low-dimensional "bias direction" (e.g. a gender
//! subspace) from contrastive word pairs, measures residual bias, and
//! removes it two ways:
//!
//! - **Hard debiasing** ([`hard::neutralize_and_equalize`]): closed-form
//!   geometric projection. Neutral words lose their subspace component
//!   and equality sets are rebuilt symmetric about the subspace.
//! - **Soft debiasing** ([`soft::equalize_and_soften`]): a learned global
//!   linear transform trading bias removal against preservation of the
//!   embedding's pairwise inner-product geometry, optimized by seeded
//!   gradient descent with an optional SVD-accelerated loss.
//!
//! # Examples
//!
//! End-to-end on a toy two-dimensional vocabulary:
//!
//! ```
//! use debias::builder::DebiasBuilder;
//! use debias::core::Vocabulary;
//! use debias::subspace::DefiningSets;
//!
//! let mut vocab = Vocabulary::new(2);
//! vocab.insert("man", vec![1.0, 0.0]).unwrap();
//! vocab.insert("woman", vec![-1.0, 0.0]).unwrap();
//! vocab.insert("doctor", vec![0.5, 0.5]).unwrap();
//! vocab.insert("nurse", vec![0.6, 0.4]).unwrap();
//!
//! let mut def_sets = DefiningSets::new();
//! def_sets.insert("gender".into(), vec!["man".into(), "woman".into()]);
//!
//! let pipeline = DebiasBuilder::new().with_subspace_dim(1);
//! let subspace = pipeline.identify_subspace(&vocab, &def_sets).unwrap();
//!
//! let neutral = vec!["doctor".to_string(), "nurse".to_string()];
//! let before = pipeline.direct_bias(&vocab, &neutral, &subspace).unwrap();
//! let debiased = pipeline.hard_debias(&vocab, &neutral, &[], &subspace).unwrap();
//! let after = pipeline.direct_bias(&debiased, &neutral, &subspace).unwrap();
//!
//! assert!(after < before);
//! ```

pub mod builder;
pub mod core;
pub mod error;
pub mod hard;
pub mod io;
pub mod metrics;
pub mod operators;
pub mod reduction;
pub mod soft;
pub mod subspace;

#[cfg(test)]
mod tests;

pub use crate::builder::DebiasBuilder;
pub use crate::core::Vocabulary;
pub use crate::error::{DebiasError, Result};
pub use crate::subspace::Subspace;
