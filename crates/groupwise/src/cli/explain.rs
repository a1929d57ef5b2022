//! Explain command - describe what a pattern matches

use crate::cli::analyze::load_analysis;
use groupwise_core::{explain_pattern, PatternField};
use std::path::PathBuf;

/// Arguments for the explain command
#[derive(Debug)]
pub struct ExplainArgs {
    pub pattern: String,
    pub field: PatternField,
    pub samples: Vec<String>,
    pub sample_dir: Option<PathBuf>,
    pub sample_limit: usize,
    pub json: bool,
}

/// Execute the explain command
pub fn run(args: ExplainArgs) -> anyhow::Result<()> {
    let mut samples = args.samples;
    if let Some(dir) = &args.sample_dir {
        samples.extend(load_analysis(dir, args.sample_limit)?.filenames);
    }

    let explanation = explain_pattern(&args.pattern, args.field, &samples);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&explanation)?);
    } else {
        print!("{}", explanation);
    }
    Ok(())
}
