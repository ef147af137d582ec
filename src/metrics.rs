//! Direct-bias metric.
//!
//! For each target ("neutral") word present in the vocabulary, take the
//! cosine similarity between its vector and every subspace component,
//! reduce that k-vector to its Euclidean norm, raise to the power `c`,
//! and average over the words. Higher means the words lean more heavily
//! into the bias subspace; a successfully neutralized word contributes
//! near zero.

use log::{debug, warn};

use crate::core::Vocabulary;
use crate::error::{DebiasError, Result};
use crate::operators::{cosine_similarity, norm};
use crate::subspace::Subspace;

/// Mean bias-subspace alignment of `neutral_words` in `vocab`, with the
/// per-word magnitude raised to the power `c` (`c = 1.0` for the plain
/// average).
///
/// Absent words are skipped, counted, and logged; the average runs over
/// the present words only.
///
/// # Errors
///
/// - `Configuration` if `neutral_words` is empty, if no listed word is
///   present in `vocab`, or if the subspace dimensionality does not match
///   the vocabulary.
///
/// # Examples
///
/// ```
/// use debias::core::Vocabulary;
/// use debias::metrics::direct_bias;
/// use debias::subspace::Subspace;
///
/// let mut vocab = Vocabulary::new(2);
/// vocab.insert("doctor", vec![0.5, 0.5]).unwrap();
/// let axis = Subspace::new(vec![vec![1.0, 0.0]], 2).unwrap();
///
/// let bias = direct_bias(&vocab, &["doctor".to_string()], &axis, 1.0).unwrap();
/// assert!((bias - 0.5f64.sqrt()).abs() < 1e-12);
/// ```
pub fn direct_bias(
    vocab: &Vocabulary,
    neutral_words: &[String],
    subspace: &Subspace,
    c: f64,
) -> Result<f64> {
    if neutral_words.is_empty() {
        return Err(DebiasError::config(
            "direct_bias needs a non-empty neutral word list",
        ));
    }
    if subspace.embedding_dim() != vocab.dim() {
        return Err(DebiasError::config(format!(
            "subspace dimension {} does not match vocabulary dimension {}",
            subspace.embedding_dim(),
            vocab.dim()
        )));
    }

    let mut total = 0.0;
    let mut present = 0usize;
    for word in neutral_words {
        let Some(vector) = vocab.get(word) else {
            continue;
        };
        let cosines: Vec<f64> = subspace
            .components()
            .iter()
            .map(|component| cosine_similarity(vector, component))
            .collect();
        total += norm(&cosines).powf(c);
        present += 1;
    }

    let missing = neutral_words.len() - present;
    if missing > 0 {
        warn!("{} neutral words were absent from the vocabulary", missing);
    }
    if present == 0 {
        return Err(DebiasError::config(
            "none of the neutral words are present in the vocabulary",
        ));
    }

    let measure = total / present as f64;
    debug!(
        "direct_bias over {} present words (c={}): {:.6}",
        present, c, measure
    );
    Ok(measure)
}
