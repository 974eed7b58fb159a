//! Linear multi-class classifier with softmax scoring.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::error::{ClassifierError, Result};
use crate::feature::FeatureVector;

/// Raw per-class scores, keyed by class name.
pub type Scores = BTreeMap<String, f64>;

/// Per-class probabilities in descending order (ties by ascending class name).
pub type Predictions = IndexMap<String, f64>;

/// Convert raw scores into a probability distribution.
///
/// The maximum score is subtracted before exponentiating, so the result is
/// invariant under shifting every score by the same constant.
pub fn softmax(scores: &Scores) -> Scores {
    if scores.is_empty() {
        return Scores::new();
    }

    let maximum = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let exponentials: Scores = scores
        .iter()
        .map(|(class, &score)| (class.clone(), (score - maximum).exp()))
        .collect();
    let sum: f64 = exponentials.values().sum();

    exponentials
        .into_iter()
        .map(|(class, value)| (class, value / sum))
        .collect()
}

/// Linear classifier: one dense weight vector and one bias per class.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSvm {
    weights: BTreeMap<String, FeatureVector>,
    biases: BTreeMap<String, f64>,
    dim: usize,
}

impl LinearSvm {
    /// Create a classifier from per-class weights and biases.
    ///
    /// # Errors
    ///
    /// - [`ClassifierError::MalformedModel`] if there are no classes, the
    ///   weight and bias key sets differ, or the weight vectors are empty
    /// - [`ClassifierError::DimensionMismatch`] if weight vectors differ in
    ///   length
    pub fn new(weights: BTreeMap<String, Vec<f64>>, biases: BTreeMap<String, f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(ClassifierError::malformed_model(
                "classifier needs at least one class",
            ));
        }
        if !weights.keys().eq(biases.keys()) {
            return Err(ClassifierError::malformed_model(
                "weights and biases must cover the same classes",
            ));
        }

        let mut dim = None;
        for (class, values) in &weights {
            if values.is_empty() {
                return Err(ClassifierError::malformed_model(format!(
                    "class '{class}' has an empty weight vector"
                )));
            }
            match dim {
                None => dim = Some(values.len()),
                Some(expected) if expected != values.len() => {
                    return Err(ClassifierError::dimension_mismatch(expected, values.len()));
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            weights: weights
                .into_iter()
                .map(|(class, values)| (class, FeatureVector::dense(values)))
                .collect(),
            biases,
            dim: dim.unwrap_or_default(),
        })
    }

    /// Dimensionality shared by all weight vectors.
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Class names in ascending order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn num_classes(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self, class: &str) -> Option<&[f64]> {
        self.weights.get(class).and_then(FeatureVector::as_dense)
    }

    pub fn bias(&self, class: &str) -> Option<f64> {
        self.biases.get(class).copied()
    }

    /// Raw score `weight · x + bias` for every class.
    ///
    /// A dimensionality mismatch between `x` and the weights yields NaN
    /// scores; pipelines prevent this when they are built.
    pub fn predict(&self, x: &FeatureVector) -> Scores {
        self.weights
            .iter()
            .map(|(class, weight)| {
                let bias = self.biases.get(class).copied().unwrap_or_default();
                (class.clone(), weight.dot(x) + bias)
            })
            .collect()
    }

    /// Softmax of `scores`.
    pub fn softmax(scores: &Scores) -> Scores {
        softmax(scores)
    }

    /// The `top_count` most probable classes for `x`.
    ///
    /// `None` or `Some(0)` keeps every class.
    pub fn top_predictions(&self, x: &FeatureVector, top_count: Option<usize>) -> Predictions {
        let mut ranked: Vec<(String, f64)> = softmax(&self.predict(x)).into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        if let Some(count) = top_count.filter(|&count| count > 0) {
            ranked.truncate(count);
        }
        ranked.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-8;

    fn classifier(weights: &[(&str, Vec<f64>)], biases: &[f64]) -> LinearSvm {
        let weights: BTreeMap<String, Vec<f64>> = weights
            .iter()
            .map(|(class, values)| (class.to_string(), values.clone()))
            .collect();
        let biases = weights.keys().cloned().zip(biases.iter().copied()).collect();
        LinearSvm::new(weights, biases).unwrap()
    }

    fn scores(values: &[(&str, f64)]) -> Scores {
        values.iter().map(|(c, v)| (c.to_string(), *v)).collect()
    }

    fn identity_classifier() -> LinearSvm {
        classifier(
            &[
                ("class_1", vec![1.0, 0.0, 0.0]),
                ("class_2", vec![0.0, 1.0, 0.0]),
                ("class_3", vec![0.0, 0.0, 1.0]),
            ],
            &[0.0, 0.0, 0.0],
        )
    }

    #[test]
    fn test_three_classes_prediction() {
        let svm = identity_classifier();

        let res = svm.predict(&FeatureVector::dense(vec![1.0, 0.0, 0.0]));
        assert_eq!(res["class_1"], 1.0);
        assert_eq!(res["class_2"], 0.0);
        assert_eq!(res["class_3"], 0.0);
        let probabilities = softmax(&res);
        assert!(probabilities["class_1"] > probabilities["class_2"]);
        assert!(probabilities["class_1"] > probabilities["class_3"]);

        let res = svm.predict(&FeatureVector::dense(vec![0.0, 1.0, 2.0]));
        assert!(res["class_3"] > res["class_1"] && res["class_3"] > res["class_2"]);
    }

    #[test]
    fn test_biases_prediction() {
        let svm = classifier(
            &[
                ("class_1", vec![1.0, 0.0, 0.0]),
                ("class_2", vec![0.0, 1.0, 0.0]),
                ("class_3", vec![0.0, 0.0, 1.0]),
            ],
            &[0.5, 0.25, 1.0],
        );

        let res = svm.predict(&FeatureVector::dense(vec![1.0, 1.0, 1.0]));
        assert!(res["class_3"] > res["class_1"]);
        assert!(res["class_1"] > res["class_2"]);
    }

    #[test]
    fn test_binary_classifier_prediction() {
        let svm = classifier(&[("the_only_class", vec![0.3, 0.2, 0.25])], &[-0.45]);

        let res_0 = svm.predict(&FeatureVector::dense(vec![1.07, 1.52, 0.91]));
        let res_1 = svm.predict(&FeatureVector::dense(vec![1.11, 1.63, 1.21]));
        assert_eq!(res_0.len(), 1);
        assert!(res_0["the_only_class"] < 0.5);
        assert!(res_1["the_only_class"] > 0.5);
    }

    #[test]
    fn test_sparse_input_prediction() {
        let svm = identity_classifier();
        let x = FeatureVector::sparse(BTreeMap::from([(1, 2.0)]), 3);

        let res = svm.predict(&x);
        assert_eq!(res["class_2"], 2.0);
        assert_eq!(res["class_1"], 0.0);
    }

    #[test]
    fn test_dimension_mismatch_gives_nan_scores() {
        let svm = identity_classifier();
        let res = svm.predict(&FeatureVector::dense(vec![1.0, 0.0]));
        assert!(res.values().all(|score| score.is_nan()));
    }

    #[test]
    fn test_top_predictions() {
        let svm = classifier(
            &[
                ("class_1", vec![1.0, 0.5, 0.8]),
                ("class_2", vec![0.3, 1.0, 0.7]),
                ("class_3", vec![0.6, 0.9, 1.0]),
                ("class_4", vec![0.7, 1.0, 0.8]),
                ("class_5", vec![1.0, 0.2, 1.0]),
            ],
            &[0.21, 0.22, 0.23, 0.22, 0.21],
        );
        let x = FeatureVector::dense(vec![0.83, 0.79, 0.91]);

        let all = svm.top_predictions(&x, None);
        assert_eq!(all.len(), 5);
        assert_eq!(svm.top_predictions(&x, Some(0)).len(), 5);

        let values: Vec<f64> = all.values().copied().collect();
        assert!(values.windows(2).all(|pair| pair[0] >= pair[1]));
        assert!((values.iter().sum::<f64>() - 1.0).abs() < EPS);

        let top_2 = svm.top_predictions(&x, Some(2));
        assert_eq!(top_2.len(), 2);
        let expected: Vec<(&String, &f64)> = all.iter().take(2).collect();
        assert_eq!(top_2.iter().collect::<Vec<_>>(), expected);

        assert_eq!(svm.top_predictions(&x, Some(1)).len(), 1);
        assert_eq!(svm.top_predictions(&x, Some(10)).len(), 5);
    }

    #[test]
    fn test_top_predictions_ties_break_by_class_name() {
        let svm = classifier(
            &[
                ("zeta", vec![1.0, 0.0]),
                ("alpha", vec![1.0, 0.0]),
                ("mid", vec![0.0, 1.0]),
            ],
            &[0.0, 0.0, 0.0],
        );

        let predictions = svm.top_predictions(&FeatureVector::dense(vec![1.0, 0.0]), None);
        let order: Vec<&str> = predictions.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["alpha", "zeta", "mid"]);
    }

    #[test]
    fn test_softmax() {
        let sm = softmax(&scores(&[("c1", -1.0), ("c2", 2.0), ("c3", 3.0)]));

        assert!(sm["c3"] > sm["c1"]);
        assert!(sm["c3"] > sm["c2"]);
        assert!(sm["c2"] > sm["c1"]);
        assert!(sm.values().all(|&p| p > 0.0 && p < 1.0));
        assert!((sm.values().sum::<f64>() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_softmax_shift_invariance() {
        let sm_1 = softmax(&scores(&[("c1", 0.0), ("c2", 1.0), ("c3", 2.0)]));
        let sm_2 = softmax(&scores(&[("c1", 3.0), ("c2", 4.0), ("c3", 5.0)]));

        for class in ["c1", "c2", "c3"] {
            assert!((sm_1[class] - sm_2[class]).abs() < EPS);
        }
        assert!((sm_1["c1"] - 0.09003057).abs() < EPS);
        assert!((sm_1["c2"] - 0.24472847).abs() < EPS);
        assert!((sm_1["c3"] - 0.66524095).abs() < EPS);
    }

    #[test]
    fn test_softmax_properties_over_generated_scores() {
        for num_classes in 1..=7 {
            for seed in 0..10usize {
                let generated: Scores = (0..num_classes)
                    .map(|i| {
                        let value = ((seed * 31 + i * 7) as f64 * 0.37).sin() * 40.0;
                        (format!("c{i}"), value)
                    })
                    .collect();
                let sm = softmax(&generated);

                assert_eq!(sm.len(), num_classes);
                assert!((sm.values().sum::<f64>() - 1.0).abs() < EPS);
                assert!(sm.values().all(|&p| p > 0.0 && p <= 1.0));

                for shift in [-500.0, -0.25, 3.0, 750.0] {
                    let shifted: Scores = generated
                        .iter()
                        .map(|(class, value)| (class.clone(), value + shift))
                        .collect();
                    let sm_shifted = softmax(&shifted);
                    for (class, probability) in &sm {
                        assert!((sm_shifted[class] - probability).abs() < EPS);
                    }
                }

                // Larger scores never get smaller probabilities.
                for (a, score_a) in &generated {
                    for (b, score_b) in &generated {
                        if score_a > score_b {
                            assert!(sm[a] >= sm[b]);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_softmax_large_scores_are_stable() {
        let sm = softmax(&scores(&[("a", 1000.0), ("b", 999.0), ("c", -1000.0)]));

        assert!(sm.values().all(|p| p.is_finite()));
        assert!((sm.values().sum::<f64>() - 1.0).abs() < EPS);
        assert!(sm["a"] > sm["b"]);
    }

    #[test]
    fn test_softmax_empty() {
        assert!(softmax(&Scores::new()).is_empty());
    }

    #[test]
    fn test_invalid_construction() {
        let empty = LinearSvm::new(BTreeMap::new(), BTreeMap::new());
        assert!(matches!(empty, Err(ClassifierError::MalformedModel(_))));

        let weights = BTreeMap::from([
            ("a".to_string(), vec![1.0, 2.0]),
            ("b".to_string(), vec![1.0]),
        ]);
        let biases = BTreeMap::from([("a".to_string(), 0.0), ("b".to_string(), 0.0)]);
        assert!(matches!(
            LinearSvm::new(weights, biases),
            Err(ClassifierError::DimensionMismatch { .. })
        ));

        let weights = BTreeMap::from([("a".to_string(), vec![1.0])]);
        let biases = BTreeMap::from([("b".to_string(), 0.0)]);
        assert!(matches!(
            LinearSvm::new(weights, biases),
            Err(ClassifierError::MalformedModel(_))
        ));

        let weights = BTreeMap::from([("a".to_string(), vec![])]);
        let biases = BTreeMap::from([("a".to_string(), 0.0)]);
        assert!(LinearSvm::new(weights, biases).is_err());
    }

    #[test]
    fn test_accessors() {
        let svm = identity_classifier();

        assert_eq!(svm.dimension(), 3);
        assert_eq!(svm.num_classes(), 3);
        assert_eq!(
            svm.classes().collect::<Vec<_>>(),
            vec!["class_1", "class_2", "class_3"]
        );
        assert_eq!(svm.weights("class_2"), Some(&[0.0, 1.0, 0.0][..]));
        assert_eq!(svm.bias("class_3"), Some(0.0));
        assert_eq!(svm.bias("missing"), None);
    }
}
