//! Serialized model descriptions.
//!
//! A model description is a JSON document naming the format version, the
//! locale it was trained for, the transformation chain and the linear
//! classifier weights:
//!
//! ```json
//! {
//!   "version": 1,
//!   "timestamp": "2020-11-18 12:00:00",
//!   "locale": "en",
//!   "transformations": [
//!     {"transformation_type": "TO_LOWER"},
//!     {"transformation_type": "HASHED_NGRAMS",
//!      "params": {"num_buckets": 3, "ngrams_range": [1, 2, 3]}},
//!     {"transformation_type": "NORMALIZE"}
//!   ],
//!   "classifier": {
//!     "classifier_type": "LINEAR",
//!     "classes": ["ham", "spam"],
//!     "class_weights": {"ham": [1.0, 0.0, 0.5], "spam": [0.0, 1.0, 0.5]},
//!     "biases": [0.0, 0.1]
//!   }
//! }
//! ```
//!
//! Parsing is a single deserialization pass followed by a single validation
//! pass. Either both succeed or the description is rejected as a whole.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// Top-level model description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    pub version: i64,
    pub timestamp: String,
    pub locale: String,
    pub transformations: Vec<TransformationDescription>,
    pub classifier: ClassifierDescription,
}

/// One entry of the `transformations` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transformation_type")]
pub enum TransformationDescription {
    #[serde(rename = "TO_LOWER")]
    ToLower,
    #[serde(rename = "NORMALIZE")]
    Normalize,
    #[serde(rename = "HASHED_NGRAMS")]
    HashedNGrams { params: HashedNGramsParams },
}

/// Parameters of a `HASHED_NGRAMS` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedNGramsParams {
    pub num_buckets: usize,
    pub ngrams_range: Vec<usize>,
}

/// Supported classifier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifierType {
    #[serde(rename = "LINEAR")]
    Linear,
}

/// The `classifier` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierDescription {
    pub classifier_type: ClassifierType,
    pub classes: Vec<String>,
    pub class_weights: BTreeMap<String, Vec<f64>>,
    pub biases: Vec<f64>,
}

impl ModelDescription {
    /// Parse and validate a JSON model description.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::MalformedModel`] for invalid JSON, missing
    /// or mistyped fields, unknown transformation or classifier types, and
    /// any inconsistency reported by [`ModelDescription::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let description: ModelDescription = serde_json::from_str(json)
            .map_err(|e| ClassifierError::malformed_model(e.to_string()))?;
        description.validate()?;
        Ok(description)
    }

    /// Serialize back into the JSON model format.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        for (position, transformation) in self.transformations.iter().enumerate() {
            if let TransformationDescription::HashedNGrams { params } = transformation {
                params.validate().map_err(|e| {
                    ClassifierError::malformed_model(format!("transformation {position}: {e}"))
                })?;
            }
        }

        let dim = self.classifier.validate()?;

        // Without a hashing step the chain never leaves text, which has no
        // numeric dimensionality.
        let num_buckets = self.hashed_output_dimension().unwrap_or(0);
        if num_buckets != dim {
            return Err(ClassifierError::dimension_mismatch(dim, num_buckets));
        }
        Ok(())
    }

    /// Bucket count of the last `HASHED_NGRAMS` step, if any.
    pub fn hashed_output_dimension(&self) -> Option<usize> {
        self.transformations
            .iter()
            .rev()
            .find_map(|transformation| match transformation {
                TransformationDescription::HashedNGrams { params } => Some(params.num_buckets),
                _ => None,
            })
    }
}

impl HashedNGramsParams {
    fn validate(&self) -> Result<()> {
        if self.num_buckets == 0 {
            return Err(ClassifierError::malformed_model(
                "num_buckets must be positive",
            ));
        }
        if self.ngrams_range.is_empty() {
            return Err(ClassifierError::malformed_model(
                "ngrams_range must not be empty",
            ));
        }
        if self.ngrams_range.contains(&0) {
            return Err(ClassifierError::malformed_model(
                "ngrams_range entries must be positive",
            ));
        }
        Ok(())
    }
}

impl ClassifierDescription {
    /// Validate the block, returning the shared weight dimensionality.
    fn validate(&self) -> Result<usize> {
        if self.classes.is_empty() {
            return Err(ClassifierError::malformed_model(
                "classifier declares no classes",
            ));
        }

        let mut seen = HashSet::with_capacity(self.classes.len());
        for class in &self.classes {
            if !seen.insert(class.as_str()) {
                return Err(ClassifierError::malformed_model(format!(
                    "duplicate class '{class}'"
                )));
            }
        }

        if self.biases.len() != self.classes.len() {
            return Err(ClassifierError::malformed_model(format!(
                "{} biases for {} classes",
                self.biases.len(),
                self.classes.len()
            )));
        }

        if let Some(extra) = self
            .class_weights
            .keys()
            .find(|class| !seen.contains(class.as_str()))
        {
            return Err(ClassifierError::malformed_model(format!(
                "weights given for undeclared class '{extra}'"
            )));
        }

        let mut dim = None;
        for class in &self.classes {
            let weights = self.class_weights.get(class).ok_or_else(|| {
                ClassifierError::malformed_model(format!("no weights for class '{class}'"))
            })?;
            if weights.is_empty() {
                return Err(ClassifierError::malformed_model(format!(
                    "class '{class}' has an empty weight vector"
                )));
            }
            match dim {
                None => dim = Some(weights.len()),
                Some(expected) if expected != weights.len() => {
                    return Err(ClassifierError::malformed_model(format!(
                        "class '{class}' has {} weights, expected {expected}",
                        weights.len()
                    )));
                }
                Some(_) => {}
            }
        }

        dim.ok_or_else(|| ClassifierError::malformed_model("classifier has no weights"))
    }

    /// Biases keyed by class name.
    pub fn biases_by_class(&self) -> BTreeMap<String, f64> {
        self.classes
            .iter()
            .cloned()
            .zip(self.biases.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn valid_model() -> Value {
        json!({
            "version": 1,
            "timestamp": "2020-11-18 12:00:00",
            "locale": "en",
            "transformations": [
                {"transformation_type": "TO_LOWER"},
                {"transformation_type": "HASHED_NGRAMS",
                 "params": {"num_buckets": 3, "ngrams_range": [1, 2, 3]}},
                {"transformation_type": "NORMALIZE"}
            ],
            "classifier": {
                "classifier_type": "LINEAR",
                "classes": ["ham", "spam"],
                "class_weights": {"ham": [1.0, 0.0, 0.5], "spam": [0, 1, 0.5]},
                "biases": [0.0, 0.1]
            }
        })
    }

    fn parse(value: &Value) -> Result<ModelDescription> {
        ModelDescription::from_json(&value.to_string())
    }

    fn assert_malformed(value: &Value) {
        match parse(value) {
            Err(e) => assert!(e.is_model_error(), "unexpected error kind: {e}"),
            Ok(_) => panic!("model should have been rejected: {value}"),
        }
    }

    #[test]
    fn test_parse_valid_model() {
        let description = parse(&valid_model()).unwrap();

        assert_eq!(description.version, 1);
        assert_eq!(description.locale, "en");
        assert_eq!(description.timestamp, "2020-11-18 12:00:00");
        assert_eq!(
            description.transformations,
            vec![
                TransformationDescription::ToLower,
                TransformationDescription::HashedNGrams {
                    params: HashedNGramsParams {
                        num_buckets: 3,
                        ngrams_range: vec![1, 2, 3],
                    },
                },
                TransformationDescription::Normalize,
            ]
        );
        assert_eq!(description.classifier.classifier_type, ClassifierType::Linear);
        assert_eq!(description.classifier.class_weights["spam"], vec![0.0, 1.0, 0.5]);
        assert_eq!(description.hashed_output_dimension(), Some(3));
        assert_eq!(
            description.classifier.biases_by_class(),
            BTreeMap::from([("ham".to_string(), 0.0), ("spam".to_string(), 0.1)])
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(ModelDescription::from_json("").is_err());
        assert!(ModelDescription::from_json("{").is_err());
        assert!(ModelDescription::from_json("{}").is_err());
        assert!(ModelDescription::from_json("[]").is_err());
    }

    #[test]
    fn test_missing_top_level_fields() {
        for field in ["version", "timestamp", "locale", "transformations", "classifier"] {
            let mut model = valid_model();
            model.as_object_mut().unwrap().remove(field);
            assert_malformed(&model);
        }
    }

    #[test]
    fn test_wrong_top_level_types() {
        let mut model = valid_model();
        model["version"] = json!("1");
        assert_malformed(&model);

        let mut model = valid_model();
        model["version"] = json!(1.5);
        assert_malformed(&model);

        let mut model = valid_model();
        model["timestamp"] = json!(12345);
        assert_malformed(&model);

        let mut model = valid_model();
        model["locale"] = json!(null);
        assert_malformed(&model);

        let mut model = valid_model();
        model["transformations"] = json!({"transformation_type": "TO_LOWER"});
        assert_malformed(&model);
    }

    #[test]
    fn test_unknown_transformation_type() {
        let mut model = valid_model();
        model["transformations"][0]["transformation_type"] = json!("STEM");
        assert_malformed(&model);

        let mut model = valid_model();
        model["transformations"][0] = json!({});
        assert_malformed(&model);
    }

    #[test]
    fn test_bad_hashed_ngrams_params() {
        let mut model = valid_model();
        model["transformations"][1]
            .as_object_mut()
            .unwrap()
            .remove("params");
        assert_malformed(&model);

        let mut model = valid_model();
        model["transformations"][1]["params"]["num_buckets"] = json!(-3);
        assert_malformed(&model);

        let mut model = valid_model();
        model["transformations"][1]["params"]["num_buckets"] = json!(0);
        assert_malformed(&model);

        let mut model = valid_model();
        model["transformations"][1]["params"]["ngrams_range"] = json!(3);
        assert_malformed(&model);

        let mut model = valid_model();
        model["transformations"][1]["params"]["ngrams_range"] = json!([1, 0]);
        assert_malformed(&model);
    }

    #[test]
    fn test_bad_classifier_block() {
        let mut model = valid_model();
        model["classifier"]["classifier_type"] = json!("NEURAL");
        assert_malformed(&model);

        let mut model = valid_model();
        model["classifier"]["classes"] = json!([]);
        assert_malformed(&model);

        let mut model = valid_model();
        model["classifier"]["classes"] = json!(["ham", "ham"]);
        assert_malformed(&model);

        let mut model = valid_model();
        model["classifier"]["biases"] = json!([0.0]);
        assert_malformed(&model);

        let mut model = valid_model();
        model["classifier"]["class_weights"]["spam"] = json!([0.0, 1.0]);
        assert_malformed(&model);

        let mut model = valid_model();
        model["classifier"]["class_weights"]["junk"] = json!([0.0, 1.0, 0.0]);
        assert_malformed(&model);

        let mut model = valid_model();
        model["classifier"]["class_weights"]
            .as_object_mut()
            .unwrap()
            .remove("ham");
        assert_malformed(&model);

        let mut model = valid_model();
        model["classifier"]["class_weights"]["ham"] = json!(["a", "b", "c"]);
        assert_malformed(&model);
    }

    #[test]
    fn test_bucket_count_must_match_weights() {
        let mut model = valid_model();
        model["transformations"][1]["params"]["num_buckets"] = json!(4);

        match parse(&model) {
            Err(ClassifierError::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 4);
            }
            other => panic!("Expected dimension mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_chain_without_hashing_is_rejected() {
        for chain in [
            json!([{"transformation_type": "NORMALIZE"}]),
            json!([{"transformation_type": "TO_LOWER"}]),
            json!([]),
        ] {
            let mut model = valid_model();
            model["transformations"] = chain;

            match parse(&model) {
                Err(ClassifierError::DimensionMismatch { expected, actual }) => {
                    assert_eq!(expected, 3);
                    assert_eq!(actual, 0);
                }
                other => panic!("Expected dimension mismatch, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let mut model = valid_model();
        model["comment"] = json!("trained offline");
        model["transformations"][0]["params"] = json!({});
        assert!(parse(&model).is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let description = parse(&valid_model()).unwrap();
        let json = description.to_json(true).unwrap();
        let reparsed = ModelDescription::from_json(&json).unwrap();
        assert_eq!(reparsed, description);
    }
}
