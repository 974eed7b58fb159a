//! Error types for the page classifier.
//!
//! All fallible operations return [`ClassifierError`] through the crate-wide
//! [`Result`] alias. Classification itself never fails: only model loading,
//! configuration and the defensive dimension checks produce errors.
//!
//! # Examples
//!
//! ```
//! use page_classifier::error::{ClassifierError, Result};
//!
//! fn load() -> Result<()> {
//!     Err(ClassifierError::malformed_model("missing `classifier`"))
//! }
//!
//! match load() {
//!     Ok(_) => println!("loaded"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for page classifier operations.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// The model description is structurally invalid (missing field, wrong
    /// type, inconsistent lengths, unknown transformation).
    #[error("Malformed model: {0}")]
    MalformedModel(String),

    /// Two vectors that must share a dimensionality do not.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vectorizer or pipeline configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors (model files, page text files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with ClassifierError.
pub type Result<T> = std::result::Result<T, ClassifierError>;

impl ClassifierError {
    /// Create a new malformed model error.
    pub fn malformed_model<S: Into<String>>(msg: S) -> Self {
        ClassifierError::MalformedModel(msg.into())
    }

    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        ClassifierError::DimensionMismatch { expected, actual }
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        ClassifierError::InvalidConfig(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ClassifierError::Other(msg.into())
    }

    /// Whether this error was raised while reading a model description.
    pub fn is_model_error(&self) -> bool {
        matches!(
            self,
            ClassifierError::MalformedModel(_)
                | ClassifierError::Json(_)
                | ClassifierError::DimensionMismatch { .. }
        )
    }
}
