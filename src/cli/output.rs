//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{ClassifierArgs, OutputFormat};
use crate::error::Result;

/// One class and its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub class: String,
    pub probability: f64,
}

/// Result structure for classification.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub locale: String,
    pub model_version: i64,
    pub text_bytes: usize,
    pub predictions: Vec<ClassProbability>,
}

/// Result structure for model inspection.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelSummary {
    pub version: i64,
    pub timestamp: String,
    pub locale: String,
    pub transformations: Vec<String>,
    pub classes: Vec<String>,
    pub dimension: usize,
}

/// One bucket of a hashed vector.
#[derive(Debug, Serialize, Deserialize)]
pub struct BucketCount {
    pub bucket: usize,
    pub count: f64,
}

/// Result structure for vectorization.
#[derive(Debug, Serialize, Deserialize)]
pub struct VectorizationResult {
    pub num_buckets: usize,
    pub substring_lengths: Vec<usize>,
    pub nonzero_buckets: usize,
    pub buckets: Vec<BucketCount>,
}

/// Plain-text rendering of a command result.
pub trait HumanReadable {
    fn render_human(&self) -> String;
}

impl HumanReadable for ClassificationResult {
    fn render_human(&self) -> String {
        if self.predictions.is_empty() {
            return "No category scored above the uniform prior.".to_string();
        }
        let width = self
            .predictions
            .iter()
            .map(|p| p.class.len())
            .max()
            .unwrap_or_default();
        self.predictions
            .iter()
            .map(|p| format!("{:<width$}  {:.6}", p.class, p.probability))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl HumanReadable for ModelSummary {
    fn render_human(&self) -> String {
        let mut lines = vec![
            format!("Version:    {}", self.version),
            format!("Timestamp:  {}", self.timestamp),
            format!("Locale:     {}", self.locale),
            format!("Dimension:  {}", self.dimension),
            format!("Chain:      {}", self.transformations.join(" -> ")),
            format!("Classes ({}):", self.classes.len()),
        ];
        lines.extend(self.classes.iter().map(|class| format!("  {class}")));
        lines.join("\n")
    }
}

impl HumanReadable for VectorizationResult {
    fn render_human(&self) -> String {
        let mut lines = vec![format!(
            "{} of {} buckets set (substring lengths {:?})",
            self.nonzero_buckets, self.num_buckets, self.substring_lengths
        )];
        lines.extend(
            self.buckets
                .iter()
                .map(|b| format!("  {:>8}  {}", b.bucket, b.count)),
        );
        lines.join("\n")
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanReadable>(
    message: &str,
    result: &T,
    args: &ClassifierArgs,
) -> Result<()> {
    println!("{}", render_result(message, result, args)?);
    Ok(())
}

/// Render a result in the specified format.
pub fn render_result<T: Serialize + HumanReadable>(
    message: &str,
    result: &T,
    args: &ClassifierArgs,
) -> Result<String> {
    match args.output_format {
        OutputFormat::Human => {
            let body = result.render_human();
            if args.verbosity() > 1 {
                Ok(format!("{message}\n\n{body}"))
            } else {
                Ok(body)
            }
        }
        OutputFormat::Json => {
            let json = if args.pretty {
                serde_json::to_string_pretty(result)?
            } else {
                serde_json::to_string(result)?
            };
            Ok(json)
        }
    }
}
