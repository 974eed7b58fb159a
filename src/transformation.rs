//! Transformation steps applied to feature vectors.
//!
//! A model declares an ordered chain of steps. Each step maps one
//! [`FeatureVector`] to another; the chain is applied left to right:
//!
//! ```text
//! Text → ToLower → HashedNGrams → Normalize → Sparse
//! ```
//!
//! # Examples
//!
//! ```
//! use page_classifier::feature::FeatureVector;
//! use page_classifier::hashing::{HashVectorizer, HashVectorizerConfig};
//! use page_classifier::transformation::{Transformation, apply_chain};
//!
//! let chain = vec![
//!     Transformation::ToLower,
//!     Transformation::HashedNGrams(HashVectorizer::default()),
//! ];
//! let output = apply_chain(&chain, FeatureVector::text("TINY"));
//!
//! assert_eq!(output.dimension(), 10_000);
//! assert_eq!(output.as_sparse().unwrap().nnz(), 10);
//! ```

use std::fmt;

use crate::feature::{FeatureVector, SparseVector};
use crate::hashing::HashVectorizer;

/// One step of a transformation chain.
///
/// Steps expect a particular input kind (`ToLower` and `HashedNGrams` take
/// text, `Normalize` takes a numeric vector). Any other input is passed
/// through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformation {
    /// Lowercase text.
    ToLower,
    /// Scale a numeric vector to unit L2 norm.
    Normalize,
    /// Hash text into a sparse term-frequency vector.
    HashedNGrams(HashVectorizer),
}

impl Transformation {
    /// Apply this step to `input`.
    pub fn apply(&self, input: FeatureVector) -> FeatureVector {
        match (self, input) {
            (Transformation::ToLower, FeatureVector::Text(text)) => {
                FeatureVector::Text(text.to_ascii_lowercase())
            }
            (Transformation::HashedNGrams(vectorizer), FeatureVector::Text(text)) => {
                FeatureVector::sparse(vectorizer.get_frequencies(&text), vectorizer.bucket_count())
            }
            (Transformation::Normalize, FeatureVector::Sparse(sparse)) => {
                FeatureVector::Sparse(normalize_sparse(sparse))
            }
            (Transformation::Normalize, FeatureVector::Dense(values)) => {
                FeatureVector::Dense(normalize_dense(values))
            }
            (_, other) => other,
        }
    }

    /// Name used for this step in model descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            Transformation::ToLower => "TO_LOWER",
            Transformation::Normalize => "NORMALIZE",
            Transformation::HashedNGrams(_) => "HASHED_NGRAMS",
        }
    }

    /// Dimensionality of the vectors this step produces, when fixed.
    pub fn output_dimension(&self) -> Option<usize> {
        match self {
            Transformation::HashedNGrams(vectorizer) => Some(vectorizer.bucket_count()),
            _ => None,
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformation::HashedNGrams(vectorizer) => write!(
                f,
                "{}(num_buckets={}, ngrams_range={:?})",
                self.name(),
                vectorizer.bucket_count(),
                vectorizer.substring_lengths()
            ),
            _ => f.write_str(self.name()),
        }
    }
}

/// Apply every step of `chain` in order, feeding each output to the next.
pub fn apply_chain(chain: &[Transformation], input: FeatureVector) -> FeatureVector {
    chain
        .iter()
        .fold(input, |point, transformation| transformation.apply(point))
}

/// Dimensionality produced by the last fixed-size step in `chain`.
pub fn chain_output_dimension(chain: &[Transformation]) -> Option<usize> {
    chain.iter().rev().find_map(Transformation::output_dimension)
}

fn normalize_sparse(sparse: SparseVector) -> SparseVector {
    let norm = sparse.norm();
    if norm == 0.0 {
        return sparse;
    }
    let dim = sparse.dimension();
    let entries = sparse
        .into_entries()
        .into_iter()
        .map(|(index, value)| (index, value / norm))
        .collect();
    SparseVector::new(entries, dim)
}

fn normalize_dense(mut values: Vec<f64>) -> Vec<f64> {
    let norm = values.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in &mut values {
            *value /= norm;
        }
    }
    values
}
