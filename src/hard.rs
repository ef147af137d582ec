//! Hard debiasing: closed-form neutralize-and-equalize.
//!
//! ## Algorithm Overview
//!
//! 1. **Neutralize**: for every listed word present in the vocabulary,
//!    subtract its bias-subspace projection and renormalize to unit
//!    length. Absent words are skipped (counted, logged).
//! 2. **Global renormalization**: every vector in the working copy is
//!    renormalized to unit length, not just the neutralized subset. This
//!    is a second pass over a fully new mapping; the caller's vocabulary
//!    is never aliased or touched.
//! 3. **Equalize**: each equality set (after dropping absent words) is
//!    rebuilt around its shared neutral component:
//!    `upsilon = mean − project(mean)`, and every member becomes
//!    `upsilon + sqrt(1 − ‖upsilon‖²) · normalize(v_b − mean_b)`.
//!    Members then sit on a common sphere around `upsilon` and differ only
//!    inside the bias subspace. Since `upsilon ⊥ frac` and `frac` is unit
//!    length, every output is exactly unit norm.
//!
//! Degeneracy checks: an equality set emptied by filtering is a
//! `Configuration` error; `‖upsilon‖ > 1` or a zero-length `v_b − mean_b`
//! direction is a `NumericalInstability` error rather than a silent NaN.

use log::{debug, info, warn};

use crate::core::Vocabulary;
use crate::error::{DebiasError, Result};
use crate::operators::{dot, norm, normalize, project_onto_subspace};
use crate::subspace::Subspace;

/// Runs neutralize-and-equalize and returns a new vocabulary; the input is
/// left unmodified for before/after comparison.
///
/// # Errors
///
/// - `Configuration` if the subspace dimensionality does not match the
///   vocabulary, or if an equality set is empty after dropping absent
///   words.
/// - `NumericalInstability` on zero-norm renormalization or an
///   equalization residual with `‖upsilon‖ > 1`.
pub fn neutralize_and_equalize(
    vocab: &Vocabulary,
    neutral_words: &[String],
    eq_sets: &[Vec<String>],
    subspace: &Subspace,
) -> Result<Vocabulary> {
    let dim = vocab.dim();
    if subspace.embedding_dim() != dim {
        return Err(DebiasError::config(format!(
            "subspace dimension {} does not match vocabulary dimension {}",
            subspace.embedding_dim(),
            dim
        )));
    }
    info!(
        "Hard debias: {} neutral words, {} equality sets, k={}",
        neutral_words.len(),
        eq_sets.len(),
        subspace.len()
    );

    // Step 1: neutralize listed words into a working copy
    let mut working = vocab.clone();
    let mut skipped = 0usize;
    for word in neutral_words {
        let Some(v) = vocab.get(word) else {
            skipped += 1;
            continue;
        };
        let v_b = project_onto_subspace(v, subspace);
        let residual: Vec<f64> = v.iter().zip(v_b.iter()).map(|(x, b)| x - b).collect();
        let new_v = normalize(&residual).map_err(|_| {
            DebiasError::unstable(format!(
                "'{}' lies entirely inside the bias subspace; cannot neutralize",
                word
            ))
        })?;
        working.insert(word.clone(), new_v)?;
    }
    if skipped > 0 {
        warn!("{} neutral words were absent from the vocabulary", skipped);
    }
    debug!(
        "neutralized {} words",
        neutral_words.len() - skipped
    );

    // Step 2: global renormalization into a fresh mapping
    let mut result = working.normalized()?;

    // Step 3: equalize each set
    for (set_idx, eq_set) in eq_sets.iter().enumerate() {
        let members: Vec<&String> = eq_set.iter().filter(|w| result.contains(w)).collect();
        if members.len() < eq_set.len() {
            warn!(
                "equality set {} lost {} absent words",
                set_idx,
                eq_set.len() - members.len()
            );
        }
        if members.is_empty() {
            return Err(DebiasError::config(format!(
                "equality set {} is empty after dropping absent words",
                set_idx
            )));
        }

        let mut mean = vec![0.0; dim];
        for word in &members {
            let v = result.get(word).expect("member presence checked above");
            for (m, x) in mean.iter_mut().zip(v.iter()) {
                *m += x;
            }
        }
        for m in mean.iter_mut() {
            *m /= members.len() as f64;
        }

        let mean_b = project_onto_subspace(&mean, subspace);
        let upsilon: Vec<f64> = mean.iter().zip(mean_b.iter()).map(|(m, b)| m - b).collect();
        let upsilon_sq = dot(&upsilon, &upsilon);
        if upsilon_sq > 1.0 + 1e-12 {
            return Err(DebiasError::unstable(format!(
                "equality set {}: upsilon magnitude {:.6} exceeds 1",
                set_idx,
                upsilon_sq.sqrt()
            )));
        }
        let radius = (1.0 - upsilon_sq.min(1.0)).sqrt();

        let updates: Vec<(String, Vec<f64>)> = members
            .iter()
            .map(|word| {
                let v = result.get(word).expect("member presence checked above");
                let v_b = project_onto_subspace(v, subspace);
                let direction: Vec<f64> =
                    v_b.iter().zip(mean_b.iter()).map(|(x, b)| x - b).collect();
                if norm(&direction) <= 0.0 {
                    return Err(DebiasError::unstable(format!(
                        "equality set {}: '{}' has no bias offset from the set mean",
                        set_idx, word
                    )));
                }
                let frac = normalize(&direction)?;
                let new_v: Vec<f64> = upsilon
                    .iter()
                    .zip(frac.iter())
                    .map(|(u, f)| u + radius * f)
                    .collect();
                Ok(((*word).clone(), new_v))
            })
            .collect::<Result<_>>()?;

        for (word, new_v) in updates {
            result.insert(word, new_v)?;
        }
        debug!(
            "equalized set {} ({} members, radius {:.6})",
            set_idx,
            members.len(),
            radius
        );
    }

    debug_assert!(result.all_finite());
    info!("Hard debias complete: {} words in output", result.len());
    Ok(result)
}
