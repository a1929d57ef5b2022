//! Pattern assembly
//!
//! Builds the whole-filename group pattern from tokens and the per-role
//! patterns from user rules.
//!
//! ## Group pattern shape
//!
//! ```text
//! ^ pos0 [_\-\.\s]+ (pos1) [_\-\.\s]+ (?:a|b) ... [_\-\.\s]+ (?i:jpg) $
//!          └ captured: first position carrying the group-id type
//! ```
//!
//! Optional positions are wrapped together with their preceding delimiter:
//! `(?:[_\-\.\s]+frag)?`.

use crate::custom::CustomTokenSet;
use crate::extension::apply_extension_matching;
use crate::infer::{infer_date_pattern, infer_pattern};
use crate::model::{PatternConfiguration, RoleRule, RuleType};
use crate::token::{FilenameToken, ImageRole, TokenType};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Delimiter class inserted between positions
pub const DELIMITER_CLASS: &str = r"[_\-\.\s]+";

/// Assembler input contract violations
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Group id type {0} does not occur in the tokens")]
    InvalidGroupType(TokenType),
}

pub type Result<T> = std::result::Result<T, PatternError>;

/// Assemble the anchored group pattern.
///
/// Exactly one capturing group is emitted, around the first position that
/// carries `group_type`. Empty `tokens` yield an empty pattern.
pub fn assemble_group_pattern(
    tokens: &[FilenameToken],
    group_type: TokenType,
    optional_types: &BTreeSet<TokenType>,
) -> Result<String> {
    if tokens.is_empty() {
        return Ok(String::new());
    }
    if group_type == TokenType::Extension {
        return Err(PatternError::InvalidArgument(
            "the extension cannot be the group id".to_string(),
        ));
    }
    if !tokens.iter().any(|t| t.suggested_type == group_type) {
        return Err(PatternError::InvalidGroupType(group_type));
    }

    let mut positions: BTreeMap<usize, Vec<&FilenameToken>> = BTreeMap::new();
    let mut extensions: Vec<&str> = Vec::new();
    for token in tokens {
        if token.suggested_type == TokenType::Extension {
            if !extensions.contains(&token.value.as_str()) {
                extensions.push(&token.value);
            }
        } else {
            positions.entry(token.position).or_default().push(token);
        }
    }

    let mut segments: Vec<(String, bool)> = Vec::with_capacity(positions.len() + 1);
    let mut captured = false;

    for (&position, position_tokens) in &positions {
        let fragments = position_fragments(position_tokens);
        let has_group = position_tokens.iter().any(|t| t.suggested_type == group_type);

        let capture = has_group && !captured;
        let body = if capture {
            captured = true;
            format!("({})", fragments.join("|"))
        } else if fragments.len() > 1 {
            format!("(?:{})", fragments.join("|"))
        } else {
            fragments.concat()
        };

        // The captured position is never optional
        let optional = !capture
            && position_tokens.iter().any(|t| optional_types.contains(&t.suggested_type));
        debug!(position, optional, fragment = %body, "Assembled position");
        segments.push((body, optional));
    }

    if !extensions.is_empty() {
        let escaped: Vec<String> = extensions.iter().map(|e| regex::escape(e)).collect();
        let optional = optional_types.contains(&TokenType::Extension);
        segments.push((format!("(?i:{})", escaped.join("|")), optional));
    }

    let mut pattern = String::from("^");
    for (index, (body, optional)) in segments.iter().enumerate() {
        match (index == 0, *optional) {
            (true, false) => pattern.push_str(body),
            (true, true) => {
                let joiner = if segments.len() > 1 { DELIMITER_CLASS } else { "" };
                pattern.push_str(&format!("(?:{}{})?", body, joiner));
            }
            (false, false) => {
                pattern.push_str(DELIMITER_CLASS);
                pattern.push_str(body);
            }
            (false, true) => pattern.push_str(&format!("(?:{}{})?", DELIMITER_CLASS, body)),
        }
    }
    pattern.push('$');

    info!(group_type = %group_type, pattern = %pattern, "Assembled group pattern");
    Ok(pattern)
}

/// Fragments for one position: one per type observed there, in first-seen order
fn position_fragments(tokens: &[&FilenameToken]) -> Vec<String> {
    let mut by_type: Vec<(TokenType, Vec<&str>)> = Vec::new();
    for token in tokens {
        match by_type.iter_mut().find(|(t, _)| *t == token.suggested_type) {
            Some((_, values)) => {
                if !values.contains(&token.value.as_str()) {
                    values.push(&token.value);
                }
            }
            None => by_type.push((token.suggested_type, vec![token.value.as_str()])),
        }
    }

    let mut fragments: Vec<String> = Vec::new();
    for (token_type, values) in by_type {
        for fragment in type_fragments(token_type, &values) {
            if !fragments.contains(&fragment) {
                fragments.push(fragment);
            }
        }
    }
    fragments
}

/// Fragments matching `values` for one token type
pub fn type_fragments(token_type: TokenType, values: &[&str]) -> Vec<String> {
    match token_type {
        TokenType::Prefix | TokenType::Suffix => values.iter().map(|v| regex::escape(v)).collect(),
        TokenType::CameraSide => {
            let mut fragments: Vec<String> = Vec::new();
            for value in values {
                let fragment = camera_side_fragment(value);
                if !fragments.contains(&fragment) {
                    fragments.push(fragment);
                }
            }
            fragments
        }
        TokenType::Extension => {
            let escaped: Vec<String> = values.iter().map(|v| regex::escape(v)).collect();
            vec![format!("(?i:{})", escaped.join("|"))]
        }
        TokenType::Date => vec![infer_date_pattern(values)],
        TokenType::GroupId | TokenType::Index | TokenType::Unknown => vec![infer_pattern(values)],
    }
}

/// Case-insensitive alternation over the role synonyms of `value`
fn camera_side_fragment(value: &str) -> String {
    match ImageRole::from_synonym(value) {
        Some(role) => format!("(?i:{})", role.synonyms().join("|")),
        None => format!("(?i:{})", regex::escape(value)),
    }
}

/// Assemble the alternation for one role. No rules for the role gives "".
pub fn assemble_role_pattern(rules: &[RoleRule], role: ImageRole) -> String {
    let mut matching: Vec<&RoleRule> = rules
        .iter()
        .filter(|r| r.target_role == role && r.has_value())
        .collect();
    matching.sort_by_key(|r| r.priority);

    let branches: Vec<String> = matching.into_iter().map(rule_branch).collect();
    let pattern = match branches.len() {
        0 => String::new(),
        1 => branches.concat(),
        _ => format!("(?:{})", branches.join("|")),
    };
    debug!(role = %role, pattern = %pattern, "Assembled role pattern");
    pattern
}

fn rule_branch(rule: &RoleRule) -> String {
    let raw = rule.value.trim();
    let value = regex::escape(raw);
    let branch = match rule.rule_type {
        RuleType::RegexOverride => return raw.to_string(),
        RuleType::Equals => format!("^{}$", value),
        RuleType::Contains => format!(".*{}.*", value),
        RuleType::StartsWith => format!("^{}.*", value),
        RuleType::EndsWith => format!(".*{}$", value),
    };

    if rule.case_sensitive {
        branch
    } else {
        format!("(?i:{})", branch)
    }
}

/// Fills every pattern slot of a configuration from its builder state
#[derive(Debug, Clone, Default)]
pub struct PatternGenerator {
    flexible_extensions: bool,
}

impl PatternGenerator {
    pub fn new(flexible_extensions: bool) -> Self {
        Self { flexible_extensions }
    }

    /// Return a copy of `config` with group and role patterns regenerated
    pub fn populate(
        &self,
        config: &PatternConfiguration,
        custom: &CustomTokenSet,
    ) -> Result<PatternConfiguration> {
        let group_type = config.group_id_token_type.ok_or_else(|| {
            PatternError::InvalidArgument("no group id token type selected".to_string())
        })?;

        let optional = config.effective_optional_types(custom);
        let group_pattern = assemble_group_pattern(&config.tokens, group_type, &optional)?;

        let mut populated = config.clone();
        populated.group_pattern =
            apply_extension_matching(&group_pattern, self.flexible_extensions);
        for role in ImageRole::all() {
            populated.set_pattern(role.into(), assemble_role_pattern(&config.role_rules, role));
        }
        Ok(populated)
    }
}
