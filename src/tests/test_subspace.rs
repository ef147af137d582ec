use approx::{assert_abs_diff_eq, assert_relative_eq};

use crate::error::DebiasError;
use crate::operators::{dot, norm};
use crate::subspace::{identify_bias_subspace, Subspace};
use crate::tests::{gender_sets, gender_sets_4d, gendered_vocab_4d, toy_vocab, TOL};

#[test]
fn test_toy_subspace_recovers_gender_axis() {
    let vocab = toy_vocab();
    let subspace = identify_bias_subspace(&vocab, &gender_sets(), 1).unwrap();

    assert_eq!(subspace.len(), 1);
    let c = &subspace.components()[0];
    // sign convention puts the dominant entry positive
    assert_relative_eq!(c[0], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(c[1], 0.0, epsilon = 1e-6);
}

#[test]
fn test_components_are_orthonormal() {
    let vocab = gendered_vocab_4d();
    let subspace = identify_bias_subspace(&vocab, &gender_sets_4d(), 2).unwrap();

    let comps = subspace.components();
    assert_eq!(comps.len(), 2);
    for c in comps {
        assert_relative_eq!(norm(c), 1.0, epsilon = 1e-8);
    }
    assert_abs_diff_eq!(dot(&comps[0], &comps[1]), 0.0, epsilon = 1e-8);
}

#[test]
fn test_first_component_dominates_contrast_axis() {
    let vocab = gendered_vocab_4d();
    let subspace = identify_bias_subspace(&vocab, &gender_sets_4d(), 1).unwrap();

    let c = &subspace.components()[0];
    assert!(
        c[0].abs() > 0.95,
        "contrast axis should dominate the first component: {:?}",
        c
    );
}

#[test]
fn test_missing_words_are_tolerated() {
    let vocab = toy_vocab();
    let mut sets = gender_sets();
    sets.get_mut("gender")
        .unwrap()
        .push("nonexistent".to_string());

    let subspace = identify_bias_subspace(&vocab, &sets, 1).unwrap();
    assert_eq!(subspace.len(), 1);
}

#[test]
fn test_subspace_dim_zero_is_rejected() {
    let vocab = toy_vocab();
    let err = identify_bias_subspace(&vocab, &gender_sets(), 0).unwrap_err();
    assert!(matches!(err, DebiasError::Configuration(_)));
}

#[test]
fn test_subspace_dim_beyond_rank_is_rejected() {
    // a single pair stacks 2 rows, so at most 1 component is available
    let vocab = toy_vocab();
    let err = identify_bias_subspace(&vocab, &gender_sets(), 2).unwrap_err();
    assert!(matches!(err, DebiasError::Configuration(_)));
}

#[test]
fn test_all_words_missing_is_rejected() {
    let vocab = toy_vocab();
    let mut sets = gender_sets();
    sets.insert("ghost".to_string(), vec!["x".to_string(), "y".to_string()]);
    sets.remove("gender");

    let err = identify_bias_subspace(&vocab, &sets, 1).unwrap_err();
    assert!(matches!(err, DebiasError::Configuration(_)));
}

#[test]
fn test_singleton_set_contributes_zero_row() {
    // one full pair plus a singleton set: rank drops but estimation succeeds
    let vocab = gendered_vocab_4d();
    let mut sets = gender_sets_4d();
    sets.insert("lonely".to_string(), vec!["engineer".to_string()]);

    let subspace = identify_bias_subspace(&vocab, &sets, 1).unwrap();
    let c = &subspace.components()[0];
    assert_relative_eq!(norm(c), 1.0, epsilon = TOL);
}

#[test]
fn test_subspace_new_validations() {
    assert!(Subspace::new(vec![], 2).is_err());
    assert!(Subspace::new(vec![vec![1.0]], 2).is_err());
    assert!(Subspace::new(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]], 2).is_err());
    assert!(Subspace::new(vec![vec![1.0, 0.0]], 2).is_ok());
}
