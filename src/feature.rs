//! Feature vectors flowing through the classification pipeline.
//!
//! A [`FeatureVector`] is a sum type: raw text, a dense list of values, or a
//! sparse index-to-value map with a declared dimensionality. Only the active
//! representation is stored.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//! use page_classifier::feature::FeatureVector;
//!
//! let dense = FeatureVector::dense(vec![1.0, 2.0, 3.0]);
//! let sparse = FeatureVector::sparse(BTreeMap::from([(0, 2.0), (2, 1.0)]), 3);
//!
//! assert_eq!(dense.dot(&sparse), 5.0);
//! assert!(FeatureVector::text("hello").dot(&dense).is_nan());
//! ```

use std::collections::BTreeMap;
use std::ops::Mul;

use crate::error::{ClassifierError, Result};

/// Sparse vector: unlisted indices are implicitly zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    entries: BTreeMap<usize, f64>,
    dim: usize,
}

impl SparseVector {
    /// Create a sparse vector from its entries and declared dimensionality.
    ///
    /// Indices are expected to lie in `[0, dim)`; the dimensionality is taken
    /// as given and never derived from the entries.
    pub fn new(entries: BTreeMap<usize, f64>, dim: usize) -> Self {
        Self { entries, dim }
    }

    /// Declared dimensionality.
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Stored (explicit) entries, ordered by index.
    pub fn entries(&self) -> &BTreeMap<usize, f64> {
        &self.entries
    }

    /// Value at `index`, zero when absent.
    pub fn get(&self, index: usize) -> f64 {
        self.entries.get(&index).copied().unwrap_or(0.0)
    }

    /// Number of explicitly stored entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Calculate the L2 norm of this vector.
    pub fn norm(&self) -> f64 {
        self.entries.values().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Consume the vector, returning its entries.
    pub fn into_entries(self) -> BTreeMap<usize, f64> {
        self.entries
    }
}

/// A text, dense or sparse feature vector.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureVector {
    /// Raw untokenized content. Dimensionality 0.
    Text(String),
    /// Dense values; dimensionality is the length.
    Dense(Vec<f64>),
    /// Sparse values with a declared dimensionality.
    Sparse(SparseVector),
}

impl FeatureVector {
    /// Wrap raw text.
    pub fn text<S: Into<String>>(text: S) -> Self {
        FeatureVector::Text(text.into())
    }

    /// Wrap a dense sequence of values.
    pub fn dense(values: Vec<f64>) -> Self {
        FeatureVector::Dense(values)
    }

    /// Wrap a sparse map with an explicit dimensionality.
    pub fn sparse(entries: BTreeMap<usize, f64>, dim: usize) -> Self {
        FeatureVector::Sparse(SparseVector::new(entries, dim))
    }

    /// Get the dimensionality of this vector. Text vectors have none.
    pub fn dimension(&self) -> usize {
        match self {
            FeatureVector::Text(_) => 0,
            FeatureVector::Dense(values) => values.len(),
            FeatureVector::Sparse(sparse) => sparse.dimension(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FeatureVector::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureVector::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_dense(&self) -> Option<&[f64]> {
        match self {
            FeatureVector::Dense(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_sparse(&self) -> Option<&SparseVector> {
        match self {
            FeatureVector::Sparse(sparse) => Some(sparse),
            _ => None,
        }
    }

    /// Inner product with `other`.
    ///
    /// Returns NaN when either operand is text, has dimensionality 0, or the
    /// dimensionalities differ. Sparse indices outside a dense operand's range
    /// contribute nothing.
    pub fn dot(&self, other: &FeatureVector) -> f64 {
        let (a_dim, b_dim) = (self.dimension(), other.dimension());
        if a_dim == 0 || b_dim == 0 || a_dim != b_dim {
            return f64::NAN;
        }

        match (self, other) {
            (FeatureVector::Dense(a), FeatureVector::Dense(b)) => {
                a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
            }
            (FeatureVector::Dense(dense), FeatureVector::Sparse(sparse))
            | (FeatureVector::Sparse(sparse), FeatureVector::Dense(dense)) => sparse
                .entries
                .iter()
                .filter_map(|(&index, value)| dense.get(index).map(|d| d * value))
                .sum(),
            (FeatureVector::Sparse(a), FeatureVector::Sparse(b)) => {
                // Walk the smaller map and probe the larger one.
                let (small, large) = if a.nnz() <= b.nnz() { (a, b) } else { (b, a) };
                small
                    .entries
                    .iter()
                    .filter_map(|(index, x)| large.entries.get(index).map(|y| x * y))
                    .sum()
            }
            _ => f64::NAN,
        }
    }

    /// Inner product that reports failures as errors instead of NaN.
    pub fn try_dot(&self, other: &FeatureVector) -> Result<f64> {
        if self.is_text() || other.is_text() {
            return Err(ClassifierError::other(
                "inner product is undefined for text vectors",
            ));
        }
        let (a_dim, b_dim) = (self.dimension(), other.dimension());
        if a_dim == 0 || a_dim != b_dim {
            return Err(ClassifierError::dimension_mismatch(a_dim, b_dim));
        }
        Ok(self.dot(other))
    }

    /// L2 norm of a numeric vector, NaN for text.
    pub fn norm(&self) -> f64 {
        match self {
            FeatureVector::Text(_) => f64::NAN,
            FeatureVector::Dense(values) => values.iter().map(|x| x * x).sum::<f64>().sqrt(),
            FeatureVector::Sparse(sparse) => sparse.norm(),
        }
    }
}

impl Mul<&FeatureVector> for &FeatureVector {
    type Output = f64;

    fn mul(self, rhs: &FeatureVector) -> f64 {
        self.dot(rhs)
    }
}

impl From<&str> for FeatureVector {
    fn from(text: &str) -> Self {
        FeatureVector::text(text)
    }
}

impl From<String> for FeatureVector {
    fn from(text: String) -> Self {
        FeatureVector::Text(text)
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        FeatureVector::Dense(values)
    }
}

impl From<SparseVector> for FeatureVector {
    fn from(sparse: SparseVector) -> Self {
        FeatureVector::Sparse(sparse)
    }
}
