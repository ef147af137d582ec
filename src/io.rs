//! Embedding file I/O and vocabulary hygiene.
//!
//! Thin collaborators around the numeric core: a text word2vec loader and
//! writer plus the standard pre-filters applied before estimation. The
//! loader takes a dimension hint and silently discards malformed lines or
//! dimension mismatches (counted, logged at debug level); there is no
//! partial-vector tolerance. The writer strips non-ASCII characters from
//! words only, never from vector values.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info, warn};

use crate::core::Vocabulary;
use crate::error::Result;
use crate::operators::norm;

/// Loads a text word2vec file (`word v1 … vD` per line), keeping only
/// lines whose vector parses cleanly at exactly `dim` finite values.
pub fn load_word2vec<P: AsRef<Path>>(path: P, dim: usize) -> Result<Vocabulary> {
    let file = File::open(&path)?;
    let reader = BufReader::new(file);

    let mut vocab = Vocabulary::new(dim);
    let mut discarded = 0usize;
    for line in reader.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            discarded += 1;
            continue;
        };
        let values: Option<Vec<f64>> = parts
            .map(|tok| tok.parse::<f64>().ok().filter(|x| x.is_finite()))
            .collect();
        match values {
            Some(vector) if vector.len() == dim => {
                vocab.insert(word, vector)?;
            }
            _ => discarded += 1,
        }
    }

    if discarded > 0 {
        debug!("discarded {} malformed or mismatched lines", discarded);
    }
    info!(
        "loaded {} vectors of dimension {} from {:?}",
        vocab.len(),
        dim,
        path.as_ref()
    );
    Ok(vocab)
}

/// Writes `vocab` as one space-separated line per word. Non-ASCII
/// characters are stripped from the word; vector values are untouched.
pub fn write_word2vec<P: AsRef<Path>>(path: P, vocab: &Vocabulary) -> Result<()> {
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);

    for (word, vector) in vocab.iter() {
        let clean: String = word.chars().filter(char::is_ascii).collect();
        write!(writer, "{}", clean)?;
        for value in vector {
            write!(writer, " {}", value)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;

    info!("wrote {} vectors to {:?}", vocab.len(), path.as_ref());
    Ok(())
}

/// Bolukbasi-style hygiene filter: keep lower-case words/phrases over
/// `[a-z _]` with fewer than 20 non-underscore characters, renormalized to
/// unit length. Zero-norm vectors are dropped with a warning instead of
/// poisoning later normalizations.
pub fn preprocess(vocab: &Vocabulary) -> Vocabulary {
    let mut out = Vocabulary::new(vocab.dim());
    let mut zero_norm = 0usize;

    for (word, vector) in vocab.iter() {
        let allowed = word
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == ' ' || c == '_');
        let short = word.chars().filter(|&c| c != '_').count() < 20;
        if !(allowed && short) {
            continue;
        }
        let n = norm(vector);
        if n <= 0.0 || !n.is_finite() {
            zero_norm += 1;
            continue;
        }
        let unit: Vec<f64> = vector.iter().map(|x| x / n).collect();
        out.insert(word, unit).expect("dimension preserved");
    }

    if zero_norm > 0 {
        warn!("dropped {} zero-norm vectors during preprocessing", zero_norm);
    }
    debug!("preprocess kept {} of {} words", out.len(), vocab.len());
    out
}

/// Keeps only purely alphabetic words.
pub fn prune(vocab: &Vocabulary) -> Vocabulary {
    let mut out = Vocabulary::new(vocab.dim());
    for (word, vector) in vocab.iter() {
        if !word.is_empty() && word.chars().all(char::is_alphabetic) {
            out.insert(word, vector.to_vec()).expect("dimension preserved");
        }
    }
    debug!("prune kept {} of {} words", out.len(), vocab.len());
    out
}

/// Returns a copy of `vocab` without the listed words.
pub fn remove_words(vocab: &Vocabulary, words: &[String]) -> Vocabulary {
    let mut out = vocab.clone();
    for word in words {
        out.remove(word);
    }
    out
}
