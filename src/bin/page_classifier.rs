//! Page classifier CLI binary.

use std::io::Write;
use std::process;

use anyhow::Context;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use page_classifier::cli::args::*;
use page_classifier::cli::commands::*;

fn main() {
    let args = ClassifierArgs::parse();

    let log_level = match args.verbosity() {
        0 => LevelFilter::Error, // Quiet mode
        1 => LevelFilter::Warn,  // Default
        2 => LevelFilter::Info,  // Verbose
        _ => LevelFilter::Debug, // Very verbose (3+)
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let command = command_name(&args.command);
    if let Err(e) = execute_command(args).with_context(|| format!("{command} failed")) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Classify(_) => "classify",
        Command::Inspect(_) => "inspect",
        Command::Vectorize(_) => "vectorize",
    }
}
