mod test_soft;
mod test_subspace;

use crate::core::Vocabulary;
use crate::subspace::DefiningSets;

pub const TOL: f64 = 1e-9;

/// The two-dimensional end-to-end scenario: one gendered axis, two
/// occupation words leaning into it.
pub fn toy_vocab() -> Vocabulary {
    let mut vocab = Vocabulary::new(2);
    vocab.insert("man", vec![1.0, 0.0]).unwrap();
    vocab.insert("woman", vec![-1.0, 0.0]).unwrap();
    vocab.insert("doctor", vec![0.5, 0.5]).unwrap();
    vocab.insert("nurse", vec![0.6, 0.4]).unwrap();
    vocab
}

pub fn gender_sets() -> DefiningSets {
    let mut sets = DefiningSets::new();
    sets.insert(
        "gender".to_string(),
        vec!["man".to_string(), "woman".to_string()],
    );
    sets
}

/// Four-dimensional vocabulary where the contrast direction dominates the
/// first axis but the pairs are not perfectly antisymmetric, so the
/// stacked differences have rank above one.
pub fn gendered_vocab_4d() -> Vocabulary {
    let mut vocab = Vocabulary::new(4);
    vocab.insert("he", vec![0.9, 0.1, 0.2, 0.0]).unwrap();
    vocab.insert("she", vec![-0.85, 0.2, 0.15, 0.05]).unwrap();
    vocab.insert("man", vec![0.8, -0.2, 0.1, 0.1]).unwrap();
    vocab.insert("woman", vec![-0.75, -0.1, 0.15, 0.05]).unwrap();
    vocab.insert("engineer", vec![0.4, 0.5, 0.5, 0.3]).unwrap();
    vocab.insert("teacher", vec![-0.3, 0.6, 0.4, 0.4]).unwrap();
    vocab
}

pub fn gender_sets_4d() -> DefiningSets {
    let mut sets = DefiningSets::new();
    sets.insert(
        "pronouns".to_string(),
        vec!["he".to_string(), "she".to_string()],
    );
    sets.insert(
        "nouns".to_string(),
        vec!["man".to_string(), "woman".to_string()],
    );
    sets
}
