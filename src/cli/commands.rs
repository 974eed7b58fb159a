//! Command implementations for the page classifier CLI.

use std::fs;
use std::path::Path;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::classifier::Predictions;
use crate::error::{ClassifierError, Result};
use crate::feature::FeatureVector;
use crate::hashing::{HashVectorizer, HashVectorizerConfig};
use crate::page_classifier::{PageClassifier, PageClassifierConfig};
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute a CLI command.
pub fn execute_command(args: ClassifierArgs) -> Result<()> {
    match &args.command {
        Command::Classify(classify_args) => classify_text(classify_args.clone(), &args),
        Command::Inspect(inspect_args) => inspect_model(inspect_args.clone(), &args),
        Command::Vectorize(vectorize_args) => vectorize_text(vectorize_args.clone(), &args),
    }
}

/// Classify a text.
fn classify_text(args: ClassifyArgs, cli_args: &ClassifierArgs) -> Result<()> {
    let result = run_classification(&args)?;
    output_result(
        &format!(
            "Classified {} bytes with model v{} ({})",
            result.text_bytes, result.model_version, result.locale
        ),
        &result,
        cli_args,
    )
}

/// Show a model's metadata.
fn inspect_model(args: InspectArgs, cli_args: &ClassifierArgs) -> Result<()> {
    let summary = summarize_model(&args.model)?;
    output_result(
        &format!("Model {}", args.model.display()),
        &summary,
        cli_args,
    )
}

/// Print the hashed frequencies of a text.
fn vectorize_text(args: VectorizeArgs, cli_args: &ClassifierArgs) -> Result<()> {
    let result = run_vectorization(&args)?;
    output_result("Hashed substring frequencies", &result, cli_args)
}

pub fn run_classification(args: &ClassifyArgs) -> Result<ClassificationResult> {
    let classifier = PageClassifier::new(PageClassifierConfig {
        minimum_words_to_classify: args.min_words,
        ..Default::default()
    });
    classifier.load_model(&read_model_file(&args.model)?)?;
    let pipeline = classifier
        .pipeline()
        .ok_or_else(|| ClassifierError::other("No model installed after loading"))?;

    let text = read_text_input(&args.input)?;
    let predictions = if !args.all {
        classifier.classify(&text)
    } else if text.is_empty() || !classifier.has_enough_words(&text) {
        Predictions::new()
    } else {
        pipeline.apply(&FeatureVector::text(text.as_str()))
    };

    let limit = args.top.unwrap_or(usize::MAX);
    Ok(ClassificationResult {
        locale: pipeline.locale().to_string(),
        model_version: pipeline.version(),
        text_bytes: text.len(),
        predictions: predictions
            .into_iter()
            .take(limit)
            .map(|(class, probability)| ClassProbability { class, probability })
            .collect(),
    })
}

pub fn summarize_model(path: &Path) -> Result<ModelSummary> {
    let pipeline = Pipeline::from_json(&read_model_file(path)?, &PipelineConfig::default())?;
    let classifier = pipeline.classifier();

    Ok(ModelSummary {
        version: pipeline.version(),
        timestamp: pipeline.timestamp().to_string(),
        locale: pipeline.locale().to_string(),
        transformations: pipeline
            .transformations()
            .iter()
            .map(ToString::to_string)
            .collect(),
        classes: classifier.classes().map(str::to_string).collect(),
        dimension: classifier.dimension(),
    })
}

pub fn run_vectorization(args: &VectorizeArgs) -> Result<VectorizationResult> {
    let vectorizer = HashVectorizer::new(HashVectorizerConfig::new(
        args.buckets,
        args.ngrams.clone(),
    ))?;
    let text = if args.lowercase {
        args.text.to_ascii_lowercase()
    } else {
        args.text.clone()
    };

    let frequencies = vectorizer.get_frequencies(&text);
    Ok(VectorizationResult {
        num_buckets: vectorizer.bucket_count(),
        substring_lengths: vectorizer.substring_lengths().to_vec(),
        nonzero_buckets: frequencies.len(),
        buckets: frequencies
            .into_iter()
            .map(|(bucket, count)| BucketCount { bucket, count })
            .collect(),
    })
}

fn read_model_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ClassifierError::invalid_config(format!(
            "Model file not found: {}",
            path.display()
        )));
    }
    log::debug!("Reading model from {}", path.display());
    Ok(fs::read_to_string(path)?)
}

fn read_text_input(input: &TextInput) -> Result<String> {
    match (&input.text, &input.file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => Ok(fs::read_to_string(path)?),
        (None, None) => Err(ClassifierError::invalid_config(
            "Either --text or --file is required",
        )),
    }
}
