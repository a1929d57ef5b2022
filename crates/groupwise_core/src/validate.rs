//! Configuration validation
//!
//! Structural checks, regex syntax checks and semantic warnings over a
//! [`PatternConfiguration`]. Problems are data in the returned
//! [`ValidationResult`], never `Err`.
//!
//! ## Check order
//!
//! 1. Group pattern present, group-id type resolved against the tokens
//! 2. Exactly one capturing group in the group pattern
//! 3. At least one role pattern or role rule
//! 4. Rule values usable, every declared pattern compiles
//! 5. Warnings: overview coverage, overlapping rules, repeated group-id type
//!
//! Every check runs; one failure never hides another.

use crate::cancel::CancellationToken;
use crate::model::{PatternConfiguration, PatternField, RoleRule, RuleType};
use crate::token::{ImageRole, TokenType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    NoGroupIdSelected,
    EmptyGroupPattern,
    UnresolvedGroupIdType,
    NoCapturingGroups,
    MultipleCapturingGroups,
    NoRolePatterns,
    InvalidRuleValue,
    RegexSyntaxError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationWarningKind {
    NoOverviewImages,
    OverlappingRules,
    GroupIdMultiplePositions,
    NoSampleMatches,
    PartialSampleMatches,
}

/// Blocking problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
    pub hint: Option<String>,
    /// Pattern the error refers to, when there is one
    pub field: Option<PatternField>,
}

/// Informational problem; never affects validity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub kind: ValidationWarningKind,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn from_parts(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn has_error(&self, kind: ValidationErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    pub fn has_warning(&self, kind: ValidationWarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    pub fn error_kinds(&self) -> Vec<ValidationErrorKind> {
        self.errors.iter().map(|e| e.kind).collect()
    }

    /// Neither errors nor warnings
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Copy with extra warnings appended
    pub fn with_warnings(mut self, warnings: impl IntoIterator<Item = ValidationWarning>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

/// Count capturing groups by scanning the pattern text.
///
/// Escapes and character classes (including nested classes and a leading
/// literal `]`) are skipped. `(?:`, `(?i:` and look-around openers do not
/// count; `(?P<name>` and `(?<name>` do.
pub fn count_capturing_groups(pattern: &str) -> usize {
    let chars: Vec<char> = pattern.chars().collect();
    let mut count = 0;
    let mut class_depth = 0usize;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if escaped {
            escaped = false;
            i += 1;
            continue;
        }

        match c {
            '\\' => escaped = true,
            '[' => {
                class_depth += 1;
                // `[]...]` and `[^]...]` start with a literal bracket
                let mut j = i + 1;
                if chars.get(j) == Some(&'^') {
                    j += 1;
                }
                if chars.get(j) == Some(&']') {
                    j += 1;
                }
                i = j;
                continue;
            }
            ']' if class_depth > 0 => class_depth -= 1,
            '(' if class_depth == 0 => {
                if chars.get(i + 1) == Some(&'?') {
                    match (chars.get(i + 2), chars.get(i + 3)) {
                        (Some('P'), Some('<')) => count += 1,
                        (Some('<'), Some(next)) if *next != '=' && *next != '!' => count += 1,
                        _ => {}
                    }
                } else {
                    count += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    count
}

/// Configuration validator
#[derive(Debug, Clone, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, config: &PatternConfiguration) -> ValidationResult {
        // A fresh token is never cancelled
        self.validate_with_cancel(config, &CancellationToken::new())
            .unwrap_or_default()
    }

    /// Validate, checking `cancel` between checks. `None` when cancelled.
    pub fn validate_with_cancel(
        &self,
        config: &PatternConfiguration,
        cancel: &CancellationToken,
    ) -> Option<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        self.check_group_presence(config, &mut errors);
        self.check_capturing_groups(config, &mut errors);
        self.check_role_coverage(config, &mut errors);
        cancel.checkpoint().ok()?;

        for rule in &config.role_rules {
            cancel.checkpoint().ok()?;
            self.check_rule_value(rule, &mut errors);
        }

        for (field, pattern) in config.declared_patterns() {
            cancel.checkpoint().ok()?;
            if let Err(err) = Regex::new(pattern) {
                errors.push(ValidationError {
                    kind: ValidationErrorKind::RegexSyntaxError,
                    message: format!("{} pattern has invalid regex syntax: {}", field.name(), err),
                    hint: Some(
                        "Check for unescaped special characters or unmatched parentheses".to_string(),
                    ),
                    field: Some(field),
                });
            }
        }

        self.check_overview_coverage(config, &mut warnings);
        self.check_overlapping_rules(&config.role_rules, &mut warnings);
        self.check_group_positions(config, &mut warnings);

        let result = ValidationResult::from_parts(errors, warnings);
        debug!(
            valid = result.valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Validated configuration"
        );
        Some(result)
    }

    /// Validate, then apply a compiling group pattern to `samples`.
    ///
    /// Adds `NO_SAMPLE_MATCHES` or `PARTIAL_SAMPLE_MATCHES` warnings. Checks
    /// `cancel` once per sample.
    pub fn validate_against_samples(
        &self,
        config: &PatternConfiguration,
        samples: &[String],
        cancel: &CancellationToken,
    ) -> Option<ValidationResult> {
        let result = self.validate_with_cancel(config, cancel)?;
        if samples.is_empty() || config.group_pattern.trim().is_empty() {
            return Some(result);
        }
        let Ok(group) = Regex::new(&config.group_pattern) else {
            return Some(result);
        };

        let mut matched = 0usize;
        for sample in samples {
            cancel.checkpoint().ok()?;
            if group.is_match(sample) {
                matched += 1;
            }
        }

        let warning = if matched == 0 {
            Some(ValidationWarning {
                kind: ValidationWarningKind::NoSampleMatches,
                message: format!(
                    "Group pattern matches none of the {} sample files",
                    samples.len()
                ),
                hint: Some(
                    "Regenerate patterns from the current files or loosen the group pattern".to_string(),
                ),
            })
        } else if matched < samples.len() {
            Some(ValidationWarning {
                kind: ValidationWarningKind::PartialSampleMatches,
                message: format!(
                    "Group pattern matches {} of {} sample files",
                    matched,
                    samples.len()
                ),
                hint: Some(
                    "Unmatched files will not be grouped; mark varying tokens optional".to_string(),
                ),
            })
        } else {
            None
        };
        Some(result.with_warnings(warning))
    }

    fn check_group_presence(
        &self,
        config: &PatternConfiguration,
        errors: &mut Vec<ValidationError>,
    ) {
        if config.group_pattern.trim().is_empty() {
            let error = match config.group_id_token_type {
                None => ValidationError {
                    kind: ValidationErrorKind::NoGroupIdSelected,
                    message: "No group ID token selected".to_string(),
                    hint: Some(
                        "Select the token type that identifies a vehicle or event".to_string(),
                    ),
                    field: Some(PatternField::Group),
                },
                Some(_) => ValidationError {
                    kind: ValidationErrorKind::EmptyGroupPattern,
                    message: "Group pattern is empty".to_string(),
                    hint: Some("Generate patterns or enter a group pattern".to_string()),
                    field: Some(PatternField::Group),
                },
            };
            errors.push(error);
        }

        if let Some(group_type) = config.group_id_token_type {
            let resolved = config.tokens.iter().any(|t| t.suggested_type == group_type);
            if !config.tokens.is_empty() && !resolved {
                errors.push(ValidationError {
                    kind: ValidationErrorKind::UnresolvedGroupIdType,
                    message: format!("No token is classified as {}", group_type.label()),
                    hint: Some(
                        "Assign the group ID type to a token or pick another type".to_string(),
                    ),
                    field: Some(PatternField::Group),
                });
            }
        }
    }

    fn check_capturing_groups(
        &self,
        config: &PatternConfiguration,
        errors: &mut Vec<ValidationError>,
    ) {
        if config.group_pattern.trim().is_empty() {
            return;
        }
        match count_capturing_groups(&config.group_pattern) {
            1 => {}
            0 => errors.push(ValidationError {
                kind: ValidationErrorKind::NoCapturingGroups,
                message: "Group pattern must contain exactly one capturing group".to_string(),
                hint: Some(r"Wrap the group ID part in parentheses, e.g. (\d+)".to_string()),
                field: Some(PatternField::Group),
            }),
            n => errors.push(ValidationError {
                kind: ValidationErrorKind::MultipleCapturingGroups,
                message: format!("Group pattern has {} capturing groups, expected exactly one", n),
                hint: Some(
                    "Remove extra parentheses or use non-capturing groups (?:...)".to_string(),
                ),
                field: Some(PatternField::Group),
            }),
        }
    }

    fn check_role_coverage(
        &self,
        config: &PatternConfiguration,
        errors: &mut Vec<ValidationError>,
    ) {
        let has_rules = config.role_rules.iter().any(RoleRule::has_value);
        if !config.has_role_patterns() && !has_rules {
            errors.push(ValidationError {
                kind: ValidationErrorKind::NoRolePatterns,
                message: "No role patterns defined".to_string(),
                hint: Some("Add at least one front, rear or overview pattern or rule".to_string()),
                field: None,
            });
        }
    }

    fn check_rule_value(&self, rule: &RoleRule, errors: &mut Vec<ValidationError>) {
        let field = PatternField::from(rule.target_role);
        if !rule.has_value() {
            errors.push(ValidationError {
                kind: ValidationErrorKind::InvalidRuleValue,
                message: format!("{} {} rule has an empty value", field.name(), rule.rule_type),
                hint: Some("Enter a value or remove the rule".to_string()),
                field: Some(field),
            });
            return;
        }
        if rule.rule_type == RuleType::RegexOverride {
            if let Err(err) = Regex::new(rule.value.trim()) {
                errors.push(ValidationError {
                    kind: ValidationErrorKind::InvalidRuleValue,
                    message: format!(
                        "{} regex rule '{}' does not compile: {}",
                        field.name(),
                        rule.value,
                        err
                    ),
                    hint: Some(
                        "Check for unescaped special characters or unmatched parentheses".to_string(),
                    ),
                    field: Some(field),
                });
            }
        }
    }

    fn check_overview_coverage(
        &self,
        config: &PatternConfiguration,
        warnings: &mut Vec<ValidationWarning>,
    ) {
        let has_pattern = !config.overview_pattern.trim().is_empty();
        let has_rule = config.rules_for(ImageRole::Overview).any(RoleRule::has_value);
        if !has_pattern && !has_rule {
            warnings.push(ValidationWarning {
                kind: ValidationWarningKind::NoOverviewImages,
                message: "No overview pattern defined".to_string(),
                hint: Some("Overview images will not be assigned a role".to_string()),
            });
        }
    }

    fn check_overlapping_rules(&self, rules: &[RoleRule], warnings: &mut Vec<ValidationWarning>) {
        let contains: Vec<&RoleRule> = rules
            .iter()
            .filter(|r| r.rule_type == RuleType::Contains && r.has_value())
            .collect();

        for (i, a) in contains.iter().enumerate() {
            for b in &contains[i + 1..] {
                if a.target_role == b.target_role {
                    continue;
                }
                let va = a.value.to_lowercase();
                let vb = b.value.to_lowercase();
                if va.contains(&vb) || vb.contains(&va) {
                    warnings.push(ValidationWarning {
                        kind: ValidationWarningKind::OverlappingRules,
                        message: format!(
                            "{} rule '{}' and {} rule '{}' may match the same files",
                            PatternField::from(a.target_role),
                            a.value,
                            PatternField::from(b.target_role),
                            b.value
                        ),
                        hint: Some(
                            "Use more specific values or EQUALS/ENDS_WITH rules".to_string(),
                        ),
                    });
                }
            }
        }
    }

    fn check_group_positions(
        &self,
        config: &PatternConfiguration,
        warnings: &mut Vec<ValidationWarning>,
    ) {
        let Some(group_type) = config.group_id_token_type else {
            return;
        };
        if group_type == TokenType::Extension {
            return;
        }
        let positions: BTreeSet<usize> = config
            .tokens
            .iter()
            .filter(|t| t.suggested_type == group_type)
            .map(|t| t.position)
            .collect();
        if positions.len() > 1 {
            let listed: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
            warnings.push(ValidationWarning {
                kind: ValidationWarningKind::GroupIdMultiplePositions,
                message: format!(
                    "{} appears at positions {}; only the first is captured",
                    group_type.label(),
                    listed.join(", ")
                ),
                hint: Some("Reassign the extra tokens to another type".to_string()),
            });
        }
    }
}
