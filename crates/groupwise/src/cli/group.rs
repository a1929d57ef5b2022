//! Group command - apply patterns to the image files of a directory

use crate::cli::analyze::load_analysis;
use crate::cli::error::HelpfulError;
use crate::cli::output::{print_table, print_table_colored};
use comfy_table::Color;
use groupwise_core::grouping::GroupingError;
use groupwise_core::{group_files, CancellationToken, PatternConfiguration, PatternField};
use std::path::PathBuf;

/// Arguments for the group command
#[derive(Debug)]
pub struct GroupArgs {
    pub dir: PathBuf,
    pub group: String,
    pub front: Option<String>,
    pub rear: Option<String>,
    pub overview: Option<String>,
    pub sample_limit: usize,
    pub json: bool,
}

/// Execute the group command
pub fn run(args: GroupArgs) -> anyhow::Result<()> {
    let mut config = PatternConfiguration::new();
    config.set_pattern(PatternField::Group, args.group.clone());
    for (field, pattern) in [
        (PatternField::Front, &args.front),
        (PatternField::Rear, &args.rear),
        (PatternField::Overview, &args.overview),
    ] {
        if let Some(pattern) = pattern {
            config.set_pattern(field, pattern.clone());
        }
    }

    let analysis = load_analysis(&args.dir, args.sample_limit)?;
    let cancel = CancellationToken::new();
    let report = group_files(&config, &analysis.filenames, None, &cancel).map_err(|err| match err {
        GroupingError::InvalidPattern { field, source } => {
            anyhow::Error::from(HelpfulError::invalid_pattern(field, &source.to_string()))
        }
        other => anyhow::Error::from(other),
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} group(s), {} matched file(s), {} unmatched\n",
        report.group_count(),
        report.matched_file_count(),
        report.unmatched.len()
    );

    let mut rows = Vec::new();
    for (group_id, files) in &report.groups {
        for file in files {
            let roles = if file.roles.is_empty() {
                ("-".to_string(), Some(Color::DarkGrey))
            } else {
                let names: Vec<&str> = file.roles.iter().map(|r| r.as_str()).collect();
                let color = if file.is_ambiguous() { Some(Color::Yellow) } else { None };
                (names.join(", "), color)
            };
            rows.push(vec![
                (group_id.clone(), Some(Color::Green)),
                (file.filename.clone(), None),
                roles,
            ]);
        }
    }
    print_table_colored(&["GROUP", "FILE", "ROLES"], rows);

    if !report.unmatched.is_empty() {
        println!();
        let rows = report
            .unmatched
            .iter()
            .map(|u| vec![u.filename.clone(), u.reason.to_string()])
            .collect();
        print_table(&["UNMATCHED", "REASON"], rows);
    }

    Ok(())
}
