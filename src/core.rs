//! Vocabulary: a dimension-homogeneous word → vector mapping.
//!
//! This is the single data structure every other component consumes and
//! produces. Vectors are owned `Vec<f64>` of one fixed dimension `D`;
//! homogeneity is enforced at insertion time, so downstream numeric code
//! never re-validates widths. Iteration order is deterministic (sorted by
//! word), which keeps matrix assembly in the soft debiaser and the SVD
//! factors reproducible across runs.
//!
//! Design notes:
//! - Estimation and metric code takes `&Vocabulary` and never mutates it.
//! - Debiasers return a freshly constructed `Vocabulary`; the caller's
//!   original is left untouched for audit and before/after comparison.
//!
//! # Examples
//!
//! ```
//! use debias::core::Vocabulary;
//!
//! let mut vocab = Vocabulary::new(3);
//! vocab.insert("king", vec![0.9, 0.1, 0.0]).unwrap();
//! vocab.insert("queen", vec![-0.9, 0.1, 0.0]).unwrap();
//!
//! assert_eq!(vocab.dim(), 3);
//! assert_eq!(vocab.len(), 2);
//! assert!(vocab.contains("king"));
//! assert!(vocab.insert("bad", vec![1.0]).is_err());
//! ```

use std::collections::BTreeMap;

use crate::error::{DebiasError, Result};
use crate::operators::norm;

/// Word → embedding-vector map with a fixed dimension.
///
/// # Examples
///
/// ```
/// use debias::core::Vocabulary;
///
/// let vocab = Vocabulary::from_pairs(2, vec![
///     ("he".to_string(), vec![1.0, 0.0]),
///     ("she".to_string(), vec![-1.0, 0.0]),
/// ]);
/// assert_eq!(vocab.len(), 2);
/// assert_eq!(vocab.get("he"), Some(&[1.0, 0.0][..]));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vocabulary {
    dim: usize,
    vectors: BTreeMap<String, Vec<f64>>,
}

impl Vocabulary {
    /// Creates an empty vocabulary of embedding dimension `dim`.
    #[inline]
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: BTreeMap::new(),
        }
    }

    /// Builds a vocabulary from `(word, vector)` pairs, dropping any pair
    /// whose vector width differs from `dim`. Loader-side hygiene: dropped
    /// pairs are counted and logged, never an error.
    pub fn from_pairs<I>(dim: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<f64>)>,
    {
        let mut vocab = Self::new(dim);
        let mut dropped = 0usize;
        for (word, vector) in pairs {
            if vocab.insert(word, vector).is_err() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::debug!("Vocabulary::from_pairs dropped {} mismatched vectors", dropped);
        }
        vocab
    }

    /// Inserts a word vector, enforcing dimension homogeneity.
    ///
    /// # Errors
    ///
    /// `Configuration` if the vector width differs from `self.dim()`.
    #[inline]
    pub fn insert(&mut self, word: impl Into<String>, vector: Vec<f64>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(DebiasError::config(format!(
                "vector of dimension {} rejected by vocabulary of dimension {}",
                vector.len(),
                self.dim
            )));
        }
        self.vectors.insert(word.into(), vector);
        Ok(())
    }

    /// Embedding dimension `D`.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of words.
    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True if no words are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Borrowed vector for `word`, if present.
    #[inline]
    pub fn get(&self, word: &str) -> Option<&[f64]> {
        self.vectors.get(word).map(Vec::as_slice)
    }

    /// True if `word` has a stored vector.
    #[inline]
    pub fn contains(&self, word: &str) -> bool {
        self.vectors.contains_key(word)
    }

    /// Removes `word`, returning its vector if it was present.
    #[inline]
    pub fn remove(&mut self, word: &str) -> Option<Vec<f64>> {
        self.vectors.remove(word)
    }

    /// Iterates `(word, vector)` in sorted word order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.vectors.iter().map(|(w, v)| (w.as_str(), v.as_slice()))
    }

    /// Iterates words in sorted order.
    #[inline]
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.vectors.keys().map(String::as_str)
    }

    /// Returns a new vocabulary with every vector renormalized to unit
    /// length. This is the global normalization pass used by the hard
    /// debiaser: it constructs a fully new mapping rather than mutating,
    /// so the input and output never alias.
    ///
    /// # Errors
    ///
    /// `NumericalInstability` if any stored vector has zero norm.
    pub fn normalized(&self) -> Result<Self> {
        use rayon::prelude::*;

        let entries: Vec<(&String, &Vec<f64>)> = self.vectors.iter().collect();
        let normalized: Vec<Result<(String, Vec<f64>)>> = entries
            .par_iter()
            .map(|(word, vector)| {
                let n = norm(vector);
                if n <= 0.0 || !n.is_finite() {
                    return Err(DebiasError::unstable(format!(
                        "cannot renormalize '{}': norm is {}",
                        word, n
                    )));
                }
                Ok((
                    (*word).clone(),
                    vector.iter().map(|x| x / n).collect::<Vec<f64>>(),
                ))
            })
            .collect();

        let mut out = Self::new(self.dim);
        for entry in normalized {
            let (word, vector) = entry?;
            out.vectors.insert(word, vector);
        }
        Ok(out)
    }

    /// True if every stored value is finite. Debiaser outputs uphold this
    /// invariant; it is exposed for tests and post-load sanity checks.
    pub fn all_finite(&self) -> bool {
        self.vectors
            .values()
            .all(|v| v.iter().all(|x| x.is_finite()))
    }
}

impl<'a> IntoIterator for &'a Vocabulary {
    type Item = (&'a String, &'a Vec<f64>);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Vec<f64>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.vectors.iter()
    }
}
