//! Generate command - synthesize group and role patterns from sample files

use crate::cli::analyze::load_analysis;
use crate::cli::error::HelpfulError;
use crate::cli::output::{print_table, print_validation};
use crate::cli::rules::parse_rules;
use groupwise_core::{
    CancellationToken, CustomTokenSet, PatternConfiguration, PatternField, PatternGenerator,
    TokenType, ValidationResult, Validator,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the generate command
#[derive(Debug)]
pub struct GenerateArgs {
    pub dir: PathBuf,
    pub group_type: TokenType,
    pub optional: Vec<TokenType>,
    pub rules: Vec<String>,
    pub flexible_extensions: bool,
    pub sample_limit: usize,
    pub preview_limit: usize,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct GenerateOutput<'a> {
    configuration: &'a PatternConfiguration,
    validation: &'a ValidationResult,
}

/// Execute the generate command
pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let rules = parse_rules(&args.rules)?;
    let analysis = load_analysis(&args.dir, args.sample_limit)?;

    if !analysis.detected_types().contains(&args.group_type) {
        let available: Vec<String> =
            analysis.detected_types().iter().map(|t| t.to_string()).collect();
        return Err(
            HelpfulError::group_type_not_found(args.group_type.as_str(), &available).into(),
        );
    }

    let mut config = PatternConfiguration::new();
    config.tokens = analysis.representative_tokens(args.preview_limit);
    config.group_id_token_type = Some(args.group_type);
    config.optional_token_types = args.optional.iter().copied().collect::<BTreeSet<_>>();
    config.role_rules = rules;

    let populated = PatternGenerator::new(args.flexible_extensions)
        .populate(&config, &CustomTokenSet::new())?;
    let validation = Validator::new()
        .validate_against_samples(&populated, &analysis.filenames, &CancellationToken::new())
        .unwrap_or_default();
    info!(valid = validation.valid, "Generated pattern configuration");

    if args.json {
        let output = GenerateOutput {
            configuration: &populated,
            validation: &validation,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let rows = PatternField::all()
        .into_iter()
        .map(|field| {
            let pattern = populated.pattern(field);
            vec![
                field.name().to_string(),
                if pattern.is_empty() { "(none)".to_string() } else { pattern.to_string() },
            ]
        })
        .collect();
    print_table(&["FIELD", "PATTERN"], rows);
    println!();
    print_validation(&validation);

    Ok(())
}
