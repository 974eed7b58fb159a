//! Hashed substring feature extraction.
//!
//! The [`HashVectorizer`] slides a window of every configured length over the
//! UTF-8 bytes of a text, hashes each window with CRC-32 and counts how often
//! each bucket is hit. The result is stable across platforms and runs, so a
//! model trained offline can be evaluated on device.
//!
//! # Examples
//!
//! ```
//! use page_classifier::hashing::{HashVectorizer, HashVectorizerConfig};
//!
//! let vectorizer = HashVectorizer::new(HashVectorizerConfig::default()).unwrap();
//! let frequencies = vectorizer.get_frequencies("tiny");
//!
//! // t, i, n, y, ti, in, ny, tin, iny, tiny
//! assert_eq!(frequencies.len(), 10);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// Default number of hash buckets.
pub const DEFAULT_NUM_BUCKETS: usize = 10_000;

/// Default longest substring length; lengths `1..=6` are used by default.
pub const DEFAULT_MAX_SUBSTRING_LENGTH: usize = 6;

/// Default cap on the number of bytes of text that are vectorized.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 1 << 20;

/// Configuration for a [`HashVectorizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashVectorizerConfig {
    /// Size of the hashed feature space.
    pub num_buckets: usize,
    /// Window lengths in bytes, applied in this order.
    pub substring_lengths: Vec<usize>,
    /// Texts longer than this many bytes are truncated before extraction.
    pub max_text_length: usize,
}

impl Default for HashVectorizerConfig {
    fn default() -> Self {
        Self {
            num_buckets: DEFAULT_NUM_BUCKETS,
            substring_lengths: (1..=DEFAULT_MAX_SUBSTRING_LENGTH).collect(),
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

impl HashVectorizerConfig {
    /// Create a config with the given bucket count and substring lengths.
    pub fn new(num_buckets: usize, substring_lengths: Vec<usize>) -> Self {
        Self {
            num_buckets,
            substring_lengths,
            ..Default::default()
        }
    }

    /// Set the truncation limit.
    pub fn with_max_text_length(mut self, max_text_length: usize) -> Self {
        self.max_text_length = max_text_length;
        self
    }

    /// Check that the configuration describes a usable vectorizer.
    pub fn validate(&self) -> Result<()> {
        if self.num_buckets == 0 {
            return Err(ClassifierError::invalid_config(
                "num_buckets must be at least 1",
            ));
        }
        if self.substring_lengths.is_empty() {
            return Err(ClassifierError::invalid_config(
                "at least one substring length is required",
            ));
        }
        if self.substring_lengths.contains(&0) {
            return Err(ClassifierError::invalid_config(
                "substring lengths must be at least 1",
            ));
        }
        if self.max_text_length == 0 {
            return Err(ClassifierError::invalid_config(
                "max_text_length must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Deterministic hashing feature extractor.
///
/// The default vectorizer uses [`HashVectorizerConfig::default`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashVectorizer {
    config: HashVectorizerConfig,
}

impl HashVectorizer {
    /// Create a new vectorizer.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidConfig`] if the bucket count, any
    /// substring length or the truncation limit is zero.
    pub fn new(config: HashVectorizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Number of buckets (the dimensionality of produced vectors).
    pub fn bucket_count(&self) -> usize {
        self.config.num_buckets
    }

    pub fn substring_lengths(&self) -> &[usize] {
        &self.config.substring_lengths
    }

    pub fn config(&self) -> &HashVectorizerConfig {
        &self.config
    }

    /// Bucket for a single substring.
    pub fn bucket(&self, substring: &[u8]) -> usize {
        crc32fast::hash(substring) as usize % self.config.num_buckets
    }

    /// Count bucket hits for every window of every configured length.
    ///
    /// Empty text, or text shorter than every window length, yields an empty
    /// map.
    pub fn get_frequencies(&self, text: &str) -> BTreeMap<usize, f64> {
        let bytes = text.as_bytes();
        let bytes = &bytes[..bytes.len().min(self.config.max_text_length)];

        let mut frequencies = BTreeMap::new();
        for &length in &self.config.substring_lengths {
            if length > bytes.len() {
                continue;
            }
            for window in bytes.windows(length) {
                *frequencies.entry(self.bucket(window)).or_insert(0.0) += 1.0;
            }
        }
        frequencies
    }
}
