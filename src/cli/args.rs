//! Command line argument parsing for the page classifier CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::hashing::DEFAULT_NUM_BUCKETS;

/// Page Classifier - classify text with a hashed n-gram linear model
#[derive(Parser, Debug, Clone)]
#[command(name = "page-classifier")]
#[command(about = "Classify page text with a declarative hashed n-gram model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ClassifierArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl ClassifierArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n + 1,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Classify text with a model
    Classify(ClassifyArgs),

    /// Show a model's metadata, chain and classes
    Inspect(InspectArgs),

    /// Print the hashed frequency vector of a text
    Vectorize(VectorizeArgs),
}

/// Arguments for classification
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Model description file (JSON)
    #[arg(short, long, value_name = "MODEL_FILE", env = "PAGE_CLASSIFIER_MODEL")]
    pub model: PathBuf,

    #[command(flatten)]
    pub input: TextInput,

    /// Report every class instead of only those above the uniform prior
    #[arg(long)]
    pub all: bool,

    /// Keep at most this many classes
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Skip pages with fewer words than this
    #[arg(long, default_value = "0")]
    pub min_words: usize,
}

/// Where the text to classify comes from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct TextInput {
    /// Text to classify
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// File containing the text to classify
    #[arg(long, value_name = "TEXT_FILE")]
    pub file: Option<PathBuf>,
}

/// Arguments for model inspection
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Model description file (JSON)
    #[arg(short, long, value_name = "MODEL_FILE", env = "PAGE_CLASSIFIER_MODEL")]
    pub model: PathBuf,
}

/// Arguments for vectorizing text
#[derive(Parser, Debug, Clone)]
pub struct VectorizeArgs {
    /// Text to vectorize
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Number of hash buckets
    #[arg(short, long, default_value_t = DEFAULT_NUM_BUCKETS)]
    pub buckets: usize,

    /// Substring lengths, comma separated
    #[arg(short, long, value_delimiter = ',', default_values_t = vec![1, 2, 3, 4, 5, 6])]
    pub ngrams: Vec<usize>,

    /// Lowercase the text first
    #[arg(long)]
    pub lowercase: bool,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
