//! # Page Classifier
//!
//! On-device contextual text classification driven by a declarative,
//! versioned model description.
//!
//! ## Features
//!
//! - Text, dense and sparse feature vectors
//! - Deterministic CRC-32 hashed substring features
//! - Ordered transformation chains (lowercase, hashed n-grams, L2 normalize)
//! - Linear multi-class scoring with numerically stable softmax
//! - JSON model descriptions validated in a single pass
//!
//! ```text
//! raw text → transformations → feature vector → linear scores → softmax → filter
//! ```

pub mod classifier;
pub mod cli;
pub mod error;
pub mod feature;
pub mod hashing;
pub mod model;
pub mod page_classifier;
pub mod pipeline;
pub mod transformation;

pub mod prelude {
    pub use crate::classifier::{LinearSvm, Predictions, Scores, softmax};
    pub use crate::error::{ClassifierError, Result};
    pub use crate::feature::{FeatureVector, SparseVector};
    pub use crate::hashing::{HashVectorizer, HashVectorizerConfig};
    pub use crate::model::ModelDescription;
    pub use crate::page_classifier::{PageClassifier, PageClassifierConfig};
    pub use crate::pipeline::{Pipeline, PipelineConfig};
    pub use crate::transformation::{Transformation, apply_chain};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
