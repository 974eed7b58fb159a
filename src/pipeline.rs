//! End-to-end classification pipeline.
//!
//! A [`Pipeline`] owns an ordered transformation chain and a linear
//! classifier. It is built once, either directly from its parts or from a
//! validated [`ModelDescription`], and is immutable afterwards; replacing a
//! model means building a new pipeline.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use page_classifier::classifier::LinearSvm;
//! use page_classifier::hashing::{HashVectorizer, HashVectorizerConfig};
//! use page_classifier::pipeline::Pipeline;
//! use page_classifier::transformation::Transformation;
//!
//! let vectorizer = HashVectorizer::new(HashVectorizerConfig::new(3, vec![1, 2, 3])).unwrap();
//! let classifier = LinearSvm::new(
//!     BTreeMap::from([
//!         ("class_1".to_string(), vec![1.0, 2.0, 3.0]),
//!         ("class_2".to_string(), vec![3.0, 2.0, 1.0]),
//!     ]),
//!     BTreeMap::from([("class_1".to_string(), 0.0), ("class_2".to_string(), 0.0)]),
//! )
//! .unwrap();
//! let pipeline = Pipeline::new(
//!     vec![Transformation::ToLower, Transformation::HashedNGrams(vectorizer)],
//!     classifier,
//! );
//!
//! let predictions = pipeline.get_top_predictions("Test String");
//! assert!(predictions.len() <= 2);
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classifier::{LinearSvm, Predictions};
use crate::error::{ClassifierError, Result};
use crate::feature::FeatureVector;
use crate::hashing::{DEFAULT_MAX_TEXT_LENGTH, HashVectorizer, HashVectorizerConfig};
use crate::model::{
    ClassifierDescription, ClassifierType, HashedNGramsParams, ModelDescription,
    TransformationDescription,
};
use crate::transformation::{Transformation, apply_chain, chain_output_dimension};

/// Locale assigned to pipelines built in memory.
pub const DEFAULT_LOCALE: &str = "en";

/// Options applied when building a pipeline from a model description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Truncation limit handed to every hashing step.
    pub max_text_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

/// Transformation chain plus classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    version: i64,
    timestamp: String,
    locale: String,
    transformations: Vec<Transformation>,
    classifier: LinearSvm,
}

impl Pipeline {
    /// Assemble a pipeline from in-memory parts.
    ///
    /// The caller is responsible for the chain producing vectors of the
    /// classifier's dimensionality; [`Pipeline::try_new`] checks it.
    pub fn new(transformations: Vec<Transformation>, classifier: LinearSvm) -> Self {
        Self {
            version: 0,
            timestamp: String::new(),
            locale: DEFAULT_LOCALE.to_string(),
            transformations,
            classifier,
        }
    }

    /// Like [`Pipeline::new`], rejecting a chain whose output
    /// dimensionality differs from the classifier's. A chain with no
    /// hashing step only ever produces text and is always rejected.
    pub fn try_new(transformations: Vec<Transformation>, classifier: LinearSvm) -> Result<Self> {
        let dim = chain_output_dimension(&transformations).unwrap_or(0);
        if dim != classifier.dimension() {
            return Err(ClassifierError::dimension_mismatch(
                classifier.dimension(),
                dim,
            ));
        }
        Ok(Self::new(transformations, classifier))
    }

    /// Set the descriptive metadata.
    pub fn with_metadata<T: Into<String>, L: Into<String>>(
        mut self,
        version: i64,
        timestamp: T,
        locale: L,
    ) -> Self {
        self.version = version;
        self.timestamp = timestamp.into();
        self.locale = locale.into();
        self
    }

    /// Build a pipeline from a model description.
    ///
    /// The description is validated first; nothing is built unless every
    /// field is consistent.
    pub fn from_model_description(
        description: &ModelDescription,
        config: &PipelineConfig,
    ) -> Result<Self> {
        description.validate()?;

        let transformations = description
            .transformations
            .iter()
            .map(|transformation| build_transformation(transformation, config))
            .collect::<Result<Vec<_>>>()?;
        let classifier = LinearSvm::new(
            description.classifier.class_weights.clone(),
            description.classifier.biases_by_class(),
        )?;

        let pipeline = Self::try_new(transformations, classifier)?.with_metadata(
            description.version,
            description.timestamp.clone(),
            description.locale.clone(),
        );

        log::debug!(
            "Loaded pipeline v{} ({}) for locale '{}': {} classes, chain [{}]",
            pipeline.version,
            pipeline.timestamp,
            pipeline.locale,
            pipeline.classifier.num_classes(),
            pipeline.describe_chain()
        );
        Ok(pipeline)
    }

    /// Parse and build from JSON text.
    pub fn from_json(json: &str, config: &PipelineConfig) -> Result<Self> {
        let description = ModelDescription::from_json(json)?;
        Self::from_model_description(&description, config)
    }

    /// Export this pipeline in the model description format.
    ///
    /// Class order follows the classifier's (ascending) class order.
    pub fn to_model_description(&self) -> ModelDescription {
        let transformations = self
            .transformations
            .iter()
            .map(|transformation| match transformation {
                Transformation::ToLower => TransformationDescription::ToLower,
                Transformation::Normalize => TransformationDescription::Normalize,
                Transformation::HashedNGrams(vectorizer) => TransformationDescription::HashedNGrams {
                    params: HashedNGramsParams {
                        num_buckets: vectorizer.bucket_count(),
                        ngrams_range: vectorizer.substring_lengths().to_vec(),
                    },
                },
            })
            .collect();

        let classes: Vec<String> = self.classifier.classes().map(str::to_string).collect();
        let class_weights: BTreeMap<String, Vec<f64>> = classes
            .iter()
            .map(|class| {
                let weights = self.classifier.weights(class).unwrap_or_default().to_vec();
                (class.clone(), weights)
            })
            .collect();
        let biases = classes
            .iter()
            .map(|class| self.classifier.bias(class).unwrap_or_default())
            .collect();

        ModelDescription {
            version: self.version,
            timestamp: self.timestamp.clone(),
            locale: self.locale.clone(),
            transformations,
            classifier: ClassifierDescription {
                classifier_type: ClassifierType::Linear,
                classes,
                class_weights,
                biases,
            },
        }
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn transformations(&self) -> &[Transformation] {
        &self.transformations
    }

    pub fn classifier(&self) -> &LinearSvm {
        &self.classifier
    }

    /// Human-readable chain, e.g. `TO_LOWER -> NORMALIZE`.
    pub fn describe_chain(&self) -> String {
        self.transformations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Run the chain on `input` and return every class's probability.
    pub fn apply(&self, input: &FeatureVector) -> Predictions {
        let point = apply_chain(&self.transformations, input.clone());
        self.classifier.top_predictions(&point, None)
    }

    /// Classify `text`, keeping only classes more probable than the uniform
    /// prior `1 / num_classes`.
    pub fn get_top_predictions(&self, text: &str) -> Predictions {
        if text.is_empty() {
            return Predictions::new();
        }

        let predictions = self.apply(&FeatureVector::text(text));
        let prior = 1.0 / predictions.len() as f64;
        let above_prior: Predictions = predictions
            .into_iter()
            .filter(|(_, probability)| *probability > prior)
            .collect();

        log::trace!(
            "Classified {} bytes: {} of {} classes above prior",
            text.len(),
            above_prior.len(),
            self.classifier.num_classes()
        );
        above_prior
    }
}

impl FromStr for Pipeline {
    type Err = ClassifierError;

    fn from_str(json: &str) -> Result<Self> {
        Self::from_json(json, &PipelineConfig::default())
    }
}

fn build_transformation(
    description: &TransformationDescription,
    config: &PipelineConfig,
) -> Result<Transformation> {
    let transformation = match description {
        TransformationDescription::ToLower => Transformation::ToLower,
        TransformationDescription::Normalize => Transformation::Normalize,
        TransformationDescription::HashedNGrams { params } => {
            let vectorizer_config =
                HashVectorizerConfig::new(params.num_buckets, params.ngrams_range.clone())
                    .with_max_text_length(config.max_text_length);
            Transformation::HashedNGrams(HashVectorizer::new(vectorizer_config)?)
        }
    };
    Ok(transformation)
}
