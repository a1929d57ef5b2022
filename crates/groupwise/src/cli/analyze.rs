//! Analyze command - tokenize the image filenames of a directory

use crate::cli::error::HelpfulError;
use crate::cli::output::{format_confidence, print_table, print_table_colored};
use comfy_table::Color;
use groupwise_core::analysis::{analyze_directory, AnalysisError};
use groupwise_core::{CancellationToken, TokenAnalysis, TokenType};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Arguments for the analyze command
#[derive(Debug)]
pub struct AnalyzeArgs {
    pub dir: PathBuf,
    pub limit: usize,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct AnalyzeOutput<'a> {
    directory: &'a Path,
    file_count: usize,
    #[serde(flatten)]
    analysis: &'a TokenAnalysis,
}

/// Tokenize the image files of `dir`, mapping failures to CLI errors
pub fn load_analysis(dir: &Path, limit: usize) -> anyhow::Result<TokenAnalysis> {
    if !dir.exists() {
        return Err(HelpfulError::path_not_found(dir).into());
    }

    let analysis =
        analyze_directory(dir, limit, &CancellationToken::new()).map_err(|err| match err {
            AnalysisError::NotADirectory(path) => {
                anyhow::Error::from(HelpfulError::not_a_directory(&path))
            }
            other => anyhow::Error::from(other),
        })?;

    if analysis.is_empty() {
        return Err(HelpfulError::no_image_files(dir).into());
    }
    Ok(analysis)
}

/// Execute the analyze command
pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let analysis = load_analysis(&args.dir, args.limit)?;

    if args.json {
        let output = AnalyzeOutput {
            directory: &args.dir,
            file_count: analysis.file_count(),
            analysis: &analysis,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Analyzed {} image file(s) in {}\n", analysis.file_count(), args.dir.display());

    let rows = analysis
        .suggestions
        .iter()
        .map(|s| {
            vec![
                s.position.map(|p| p.to_string()).unwrap_or_else(|| "ext".to_string()),
                s.token_type.label().to_string(),
                format_confidence(s.confidence),
                s.examples.join(", "),
                s.rationale.clone(),
            ]
        })
        .collect();
    print_table(&["POS", "TYPE", "CONF", "EXAMPLES", "WHY"], rows);

    let rows = analysis
        .filenames
        .iter()
        .map(|filename| {
            let tokens = analysis.tokens_for(filename).unwrap_or_default();
            let rendered = tokens
                .iter()
                .map(|t| format!("{}={}", t.value, t.suggested_type.label()))
                .collect::<Vec<_>>()
                .join("  ");
            let color = if tokens.iter().any(|t| t.suggested_type == TokenType::GroupId) {
                None
            } else {
                Some(Color::Yellow)
            };
            vec![(filename.clone(), color), (rendered, None)]
        })
        .collect();
    print_table_colored(&["FILE", "TOKENS"], rows);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_analysis_errors() {
        let temp = TempDir::new().unwrap();

        let missing = load_analysis(&temp.path().join("missing"), 10).unwrap_err();
        assert!(missing.downcast_ref::<HelpfulError>().unwrap().message.contains("Path not found"));

        let empty = load_analysis(temp.path(), 10).unwrap_err();
        assert!(empty.downcast_ref::<HelpfulError>().unwrap().message.contains("No image files"));

        let file = temp.path().join("a_001_front.jpg");
        std::fs::write(&file, b"").unwrap();
        let not_dir = load_analysis(&file, 10).unwrap_err();
        let helpful = not_dir.downcast_ref::<HelpfulError>().unwrap();
        assert!(helpful.message.contains("Not a directory"));
    }

    #[test]
    fn test_load_analysis_tokenizes() {
        let temp = TempDir::new().unwrap();
        for name in ["vehicle_001_front.jpg", "vehicle_002_rear.jpg"] {
            std::fs::write(temp.path().join(name), b"").unwrap();
        }
        let analysis = load_analysis(temp.path(), 10).unwrap();
        assert_eq!(analysis.file_count(), 2);
        assert!(analysis.detected_types().contains(&TokenType::GroupId));
    }
}
