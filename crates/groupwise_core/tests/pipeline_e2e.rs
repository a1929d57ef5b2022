//! End-to-end tests for the grouping pipeline
//!
//! Directory listing → tokenization → pattern generation → validation →
//! grouping, driven through the public API only.

use groupwise_core::analysis::{analyze_directory, AnalysisService, AnalysisStatus};
use groupwise_core::explain::SampleOutcome;
use groupwise_core::validate::{count_capturing_groups, ValidationWarningKind};
use groupwise_core::{
    explain_pattern, group_files, CancellationToken, CustomTokenSet, FilenameTokenizer, ImageRole,
    PatternConfiguration, PatternField, PatternGenerator, RoleRule, RuleType, TokenType, Validator,
};
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Temp directory of empty image files
struct TestEnv {
    _temp: TempDir,
    pub dir: PathBuf,
}

impl TestEnv {
    fn new(files: &[&str]) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let dir = temp.path().to_path_buf();
        for name in files {
            fs::write(dir.join(name), b"").expect("Failed to write file");
        }
        Self { _temp: temp, dir }
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn builder_config(tokens: Vec<groupwise_core::FilenameToken>) -> PatternConfiguration {
    let mut config = PatternConfiguration::new();
    config.tokens = tokens;
    config.group_id_token_type = Some(TokenType::GroupId);
    config.role_rules = vec![
        RoleRule::new(ImageRole::Front, RuleType::Contains, "front"),
        RoleRule::new(ImageRole::Rear, RuleType::Contains, "rear"),
    ];
    config
}

// ============================================================================
// Full pipeline
// ============================================================================

#[test]
fn test_vehicle_files_group_by_id() {
    let env = TestEnv::new(&[
        "vehicle_001_front.jpg",
        "vehicle_001_rear.jpg",
        "vehicle_002_front.jpg",
        "readme.txt",
    ]);
    let cancel = CancellationToken::new();

    let analysis = analyze_directory(&env.dir, 500, &cancel).unwrap();
    assert_eq!(analysis.file_count(), 3);
    assert_eq!(analysis.positions_of(TokenType::GroupId).into_iter().collect::<Vec<_>>(), vec![1]);

    let config = builder_config(analysis.representative_tokens(10));
    let populated = PatternGenerator::default()
        .populate(&config, &CustomTokenSet::new())
        .unwrap();

    assert_eq!(count_capturing_groups(&populated.group_pattern), 1);
    assert_eq!(populated.front_pattern, "(?i:.*front.*)");
    assert_eq!(populated.rear_pattern, "(?i:.*rear.*)");

    let result = Validator::new()
        .validate_against_samples(&populated, &analysis.filenames, &cancel)
        .unwrap();
    assert!(result.valid, "{:?}", result.errors);
    assert!(result.has_warning(ValidationWarningKind::NoOverviewImages));
    assert!(!result.has_warning(ValidationWarningKind::PartialSampleMatches));

    let report = group_files(&populated, &analysis.filenames, None, &cancel).unwrap();
    assert_eq!(report.group_count(), 2);
    assert_eq!(report.roles_in("001"), vec![ImageRole::Front, ImageRole::Rear]);
    assert_eq!(report.roles_in("002"), vec![ImageRole::Front]);
    assert!(report.unmatched.is_empty());
}

#[test]
fn test_dashed_names_with_varying_id_width() {
    let files = names(&[
        "cam1-ev-5789-rear.png",
        "cam1-ev-11707-front.png",
        "cam1-ev-5789-front.png",
    ]);
    let analysis = FilenameTokenizer::new().analyze(&files);

    let config = builder_config(analysis.representative_tokens(files.len()));
    let populated = PatternGenerator::default()
        .populate(&config, &CustomTokenSet::new())
        .unwrap();
    assert!(populated.group_pattern.contains(r"(\d{4,5})"), "{}", populated.group_pattern);

    let group = Regex::new(&populated.group_pattern).unwrap();
    assert!(files.iter().all(|f| group.is_match(f)));

    let report = group_files(&populated, &files, None, &CancellationToken::new()).unwrap();
    assert_eq!(report.groups.keys().collect::<Vec<_>>(), vec!["11707", "5789"]);
    assert_eq!(report.roles_in("5789"), vec![ImageRole::Front, ImageRole::Rear]);
}

#[test]
fn test_flexible_extensions_accept_other_formats() {
    let files = names(&["vehicle_001_front.jpg", "vehicle_002_rear.jpg"]);
    let analysis = FilenameTokenizer::new().analyze(&files);
    let config = builder_config(analysis.representative_tokens(2));

    let strict = PatternGenerator::new(false).populate(&config, &CustomTokenSet::new()).unwrap();
    let flexible = PatternGenerator::new(true).populate(&config, &CustomTokenSet::new()).unwrap();

    let probe = "vehicle_003_front.PNG";
    assert!(!Regex::new(&strict.group_pattern).unwrap().is_match(probe));
    assert!(Regex::new(&flexible.group_pattern).unwrap().is_match(probe));
}

#[test]
fn test_generated_pattern_explains_samples() {
    let files = names(&["vehicle_001_front.jpg", "vehicle_002_front.jpg"]);
    let analysis = FilenameTokenizer::new().analyze(&files);
    let populated = PatternGenerator::default()
        .populate(&builder_config(analysis.representative_tokens(2)), &CustomTokenSet::new())
        .unwrap();

    let explanation = explain_pattern(&populated.group_pattern, PatternField::Group, &files);
    assert!(explanation.error.is_none());
    assert_eq!(explanation.capturing_groups, 1);
    assert_eq!(explanation.samples[1].outcome, SampleOutcome::GroupId("002".to_string()));
}

// ============================================================================
// Background analysis
// ============================================================================

#[tokio::test]
async fn test_service_analysis_feeds_generation() {
    let env = TestEnv::new(&["vehicle_001_front.jpg", "vehicle_002_rear.jpg"]);
    let service = AnalysisService::new(100);
    let mut status = service.subscribe();

    let analysis = service.start(env.dir.clone()).await.unwrap().unwrap();
    status.changed().await.unwrap();
    assert!(matches!(*status.borrow(), AnalysisStatus::Ready { request: 1, .. }));

    let populated = PatternGenerator::default()
        .populate(&builder_config(analysis.representative_tokens(10)), &CustomTokenSet::new())
        .unwrap();
    assert!(Validator::new().validate(&populated).valid);
}
