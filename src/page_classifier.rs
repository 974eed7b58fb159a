//! Host-facing page classifier.
//!
//! [`PageClassifier`] is what a browser integration talks to: it is handed a
//! raw model description once (or again whenever the locale's model is
//! updated) and then classifies page text. A successful load builds a new
//! [`Pipeline`] and swaps it in; in-flight classifications keep using the
//! pipeline they started with.
//!
//! # Examples
//!
//! ```
//! use page_classifier::page_classifier::PageClassifier;
//!
//! let classifier = PageClassifier::default();
//! assert!(!classifier.initialize_from_model("{}"));
//! assert!(!classifier.is_ready());
//! assert!(classifier.classify("some page text").is_empty());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::classifier::Predictions;
use crate::error::Result;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Configuration for a [`PageClassifier`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageClassifierConfig {
    /// Options used when building pipelines from model descriptions.
    pub pipeline: PipelineConfig,
    /// Pages with fewer whitespace-separated words are not classified.
    /// Zero disables the check.
    pub minimum_words_to_classify: usize,
}

/// Holds the active page classification model.
#[derive(Debug, Default)]
pub struct PageClassifier {
    config: PageClassifierConfig,
    pipeline: RwLock<Option<Arc<Pipeline>>>,
    generation: AtomicU64,
}

impl PageClassifier {
    /// Create an uninitialized classifier.
    pub fn new(config: PageClassifierConfig) -> Self {
        Self {
            config,
            pipeline: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PageClassifierConfig {
        &self.config
    }

    /// Load a model, replacing the active one on success.
    ///
    /// On failure the active model (if any) stays in place.
    pub fn load_model(&self, raw_description: &str) -> Result<()> {
        let pipeline = Pipeline::from_json(raw_description, &self.config.pipeline)?;
        log::info!(
            "Page classifier model v{} loaded for locale '{}'",
            pipeline.version(),
            pipeline.locale()
        );
        self.install(pipeline);
        Ok(())
    }

    /// Load a model, reporting success as a boolean.
    pub fn initialize_from_model(&self, raw_description: &str) -> bool {
        match self.load_model(raw_description) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Rejected page classifier model: {e}");
                false
            }
        }
    }

    /// Install an already built pipeline.
    pub fn install(&self, pipeline: Pipeline) {
        *self.pipeline.write() = Some(Arc::new(pipeline));
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline.read().is_some()
    }

    /// Number of models installed so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The active pipeline, if any.
    pub fn pipeline(&self) -> Option<Arc<Pipeline>> {
        self.pipeline.read().clone()
    }

    /// Locale of the active model.
    pub fn locale(&self) -> Option<String> {
        self.pipeline
            .read()
            .as_ref()
            .map(|pipeline| pipeline.locale().to_string())
    }

    /// Whether `page_text` meets the configured minimum word count.
    pub fn has_enough_words(&self, page_text: &str) -> bool {
        let minimum = self.config.minimum_words_to_classify;
        minimum == 0 || page_text.split_whitespace().take(minimum).count() == minimum
    }

    /// Classify page text into categories doing better than chance.
    ///
    /// Returns an empty map when no model is loaded, the text is empty or
    /// the page is shorter than the configured minimum.
    pub fn classify(&self, page_text: &str) -> Predictions {
        if page_text.is_empty() {
            return Predictions::new();
        }
        if !self.has_enough_words(page_text) {
            log::debug!(
                "Skipping classification of page with fewer than {} words",
                self.config.minimum_words_to_classify
            );
            return Predictions::new();
        }

        // Snapshot so the lock is not held while classifying.
        let Some(pipeline) = self.pipeline() else {
            return Predictions::new();
        };
        pipeline.get_top_predictions(page_text)
    }
}
