//! Validate command - check a hand-written pattern configuration

use crate::cli::output::print_validation;
use crate::cli::rules::parse_rules;
use groupwise_core::{
    assemble_role_pattern, CancellationToken, ImageRole, PatternConfiguration, PatternField,
    RoleRule, Validator,
};
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Debug, Default)]
pub struct ValidateArgs {
    pub group: Option<String>,
    pub front: Option<String>,
    pub rear: Option<String>,
    pub overview: Option<String>,
    pub rules: Vec<String>,
    pub samples: Vec<String>,
    pub sample_dir: Option<PathBuf>,
    pub sample_limit: usize,
    pub json: bool,
}

/// Configuration described by the arguments.
///
/// Roles without an explicit pattern take the pattern assembled from their
/// rules.
pub fn build_configuration(args: &ValidateArgs, rules: Vec<RoleRule>) -> PatternConfiguration {
    let mut config = PatternConfiguration::new();
    config.group_pattern = args.group.clone().unwrap_or_default();

    for role in ImageRole::all() {
        let explicit = match role {
            ImageRole::Front => &args.front,
            ImageRole::Rear => &args.rear,
            ImageRole::Overview => &args.overview,
        };
        let pattern = match explicit {
            Some(pattern) => pattern.clone(),
            None => assemble_role_pattern(&rules, role),
        };
        config.set_pattern(PatternField::from(role), pattern);
    }
    config.role_rules = rules;
    config
}

/// Execute the validate command
pub fn run(args: ValidateArgs) -> anyhow::Result<()> {
    let rules = parse_rules(&args.rules)?;
    let config = build_configuration(&args, rules);

    let mut samples = args.samples.clone();
    if let Some(dir) = &args.sample_dir {
        let analysis = crate::cli::analyze::load_analysis(dir, args.sample_limit)?;
        samples.extend(analysis.filenames);
    }

    let result = Validator::new()
        .validate_against_samples(&config, &samples, &CancellationToken::new())
        .unwrap_or_default();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_validation(&result);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupwise_core::RuleType;

    #[test]
    fn test_rules_fill_missing_role_patterns() {
        let args = ValidateArgs {
            group: Some(r"^v_(\d+)".to_string()),
            rear: Some(".*_r.*".to_string()),
            ..Default::default()
        };
        let rules = vec![
            RoleRule::new(ImageRole::Front, RuleType::Contains, "front"),
            RoleRule::new(ImageRole::Rear, RuleType::Contains, "rear"),
        ];
        let config = build_configuration(&args, rules);

        assert_eq!(config.front_pattern, "(?i:.*front.*)");
        // Explicit pattern wins over rules
        assert_eq!(config.rear_pattern, ".*_r.*");
        assert!(config.overview_pattern.is_empty());
        assert!(Validator::new().validate(&config).valid);
    }
}
