//! Pattern configuration model
//!
//! `PatternConfiguration` is the unit of work handed between the assemblers,
//! the validator and the grouping semantics. The core never persists it.

use crate::custom::CustomTokenSet;
use crate::token::{FilenameToken, ImageRole, TokenType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How a role rule matches a filename
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    /// Value is used verbatim as a regex
    RegexOverride,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Equals => "EQUALS",
            RuleType::Contains => "CONTAINS",
            RuleType::StartsWith => "STARTS_WITH",
            RuleType::EndsWith => "ENDS_WITH",
            RuleType::RegexOverride => "REGEX_OVERRIDE",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "equals" | "eq" => Ok(RuleType::Equals),
            "contains" => Ok(RuleType::Contains),
            "starts_with" | "startswith" | "prefix" => Ok(RuleType::StartsWith),
            "ends_with" | "endswith" | "suffix" => Ok(RuleType::EndsWith),
            "regex" | "regex_override" => Ok(RuleType::RegexOverride),
            _ => Err(format!("unknown rule type '{}'", s)),
        }
    }
}

/// User-declared rule assigning files to a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRule {
    pub target_role: ImageRole,
    pub rule_type: RuleType,
    pub value: String,
    pub case_sensitive: bool,
    /// Lower values are emitted first in the alternation
    pub priority: i32,
}

impl RoleRule {
    /// Case-insensitive rule with priority 0
    pub fn new(target_role: ImageRole, rule_type: RuleType, value: impl Into<String>) -> Self {
        Self {
            target_role,
            rule_type,
            value: value.into(),
            case_sensitive: false,
            priority: 0,
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn has_value(&self) -> bool {
        !self.value.trim().is_empty()
    }
}

/// Names one of the four pattern slots of a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternField {
    Group,
    Front,
    Rear,
    Overview,
}

impl PatternField {
    pub fn all() -> [PatternField; 4] {
        [
            PatternField::Group,
            PatternField::Front,
            PatternField::Rear,
            PatternField::Overview,
        ]
    }

    /// Title-case name used in messages ("Front pattern ...")
    pub fn name(&self) -> &'static str {
        match self {
            PatternField::Group => "Group",
            PatternField::Front => "Front",
            PatternField::Rear => "Rear",
            PatternField::Overview => "Overview",
        }
    }

    pub fn role(&self) -> Option<ImageRole> {
        match self {
            PatternField::Group => None,
            PatternField::Front => Some(ImageRole::Front),
            PatternField::Rear => Some(ImageRole::Rear),
            PatternField::Overview => Some(ImageRole::Overview),
        }
    }
}

impl From<ImageRole> for PatternField {
    fn from(role: ImageRole) -> Self {
        match role {
            ImageRole::Front => PatternField::Front,
            ImageRole::Rear => PatternField::Rear,
            ImageRole::Overview => PatternField::Overview,
        }
    }
}

impl fmt::Display for PatternField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "group" => Ok(PatternField::Group),
            "front" => Ok(PatternField::Front),
            "rear" => Ok(PatternField::Rear),
            "overview" => Ok(PatternField::Overview),
            _ => Err(format!("unknown pattern field '{}'", s)),
        }
    }
}

/// Patterns plus the builder state they were generated from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfiguration {
    pub group_pattern: String,
    pub front_pattern: String,
    pub rear_pattern: String,
    pub overview_pattern: String,
    pub role_rules: Vec<RoleRule>,
    pub tokens: Vec<FilenameToken>,
    pub group_id_token_type: Option<TokenType>,
    pub optional_token_types: BTreeSet<TokenType>,
    pub optional_custom_token_names: BTreeSet<String>,
}

impl PatternConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(&self, field: PatternField) -> &str {
        match field {
            PatternField::Group => &self.group_pattern,
            PatternField::Front => &self.front_pattern,
            PatternField::Rear => &self.rear_pattern,
            PatternField::Overview => &self.overview_pattern,
        }
    }

    pub fn set_pattern(&mut self, field: PatternField, pattern: impl Into<String>) {
        let pattern = pattern.into();
        match field {
            PatternField::Group => self.group_pattern = pattern,
            PatternField::Front => self.front_pattern = pattern,
            PatternField::Rear => self.rear_pattern = pattern,
            PatternField::Overview => self.overview_pattern = pattern,
        }
    }

    pub fn role_pattern(&self, role: ImageRole) -> &str {
        self.pattern(role.into())
    }

    /// Non-empty patterns, in field order
    pub fn declared_patterns(&self) -> impl Iterator<Item = (PatternField, &str)> {
        PatternField::all()
            .into_iter()
            .map(move |field| (field, self.pattern(field)))
            .filter(|(_, pattern)| !pattern.trim().is_empty())
    }

    pub fn has_role_patterns(&self) -> bool {
        ImageRole::all()
            .into_iter()
            .any(|role| !self.role_pattern(role).trim().is_empty())
    }

    pub fn rules_for(&self, role: ImageRole) -> impl Iterator<Item = &RoleRule> {
        self.role_rules.iter().filter(move |rule| rule.target_role == role)
    }

    /// A group pattern and at least one role pattern are present
    pub fn is_complete(&self) -> bool {
        !self.group_pattern.trim().is_empty() && self.has_role_patterns()
    }

    /// Tokens and a group-id type are present, so patterns can be regenerated
    pub fn has_builder_state(&self) -> bool {
        !self.tokens.is_empty() && self.group_id_token_type.is_some()
    }

    /// Optional token types including those reached through optional custom tokens
    pub fn effective_optional_types(&self, custom: &CustomTokenSet) -> BTreeSet<TokenType> {
        let mut types = self.optional_token_types.clone();
        for name in &self.optional_custom_token_names {
            if let Some(definition) = custom.get(name) {
                types.insert(definition.mapped_type);
            }
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom::CustomToken;

    #[test]
    fn test_set_and_get_pattern() {
        let mut config = PatternConfiguration::new();
        config.set_pattern(PatternField::Rear, ".*rear.*");
        assert_eq!(config.pattern(PatternField::Rear), ".*rear.*");
        assert_eq!(config.role_pattern(ImageRole::Rear), ".*rear.*");
        assert!(!config.is_complete());

        config.set_pattern(PatternField::Group, r"^(\d+)");
        assert!(config.is_complete());
    }

    #[test]
    fn test_rule_type_parsing() {
        assert_eq!("starts-with".parse::<RuleType>().unwrap(), RuleType::StartsWith);
        assert_eq!("regex".parse::<RuleType>().unwrap(), RuleType::RegexOverride);
        assert!("matches".parse::<RuleType>().is_err());
    }

    #[test]
    fn test_effective_optional_types_includes_custom() {
        let mut custom = CustomTokenSet::new();
        custom.insert(CustomToken::new("lane", TokenType::Index));

        let mut config = PatternConfiguration::new();
        config.optional_token_types.insert(TokenType::Date);
        config.optional_custom_token_names.insert("lane".to_string());
        config.optional_custom_token_names.insert("missing".to_string());

        let types = config.effective_optional_types(&custom);
        assert_eq!(types.into_iter().collect::<Vec<_>>(), vec![TokenType::Date, TokenType::Index]);
    }

    #[test]
    fn test_builder_state_requires_tokens_and_type() {
        let mut config = PatternConfiguration::new();
        config.group_id_token_type = Some(TokenType::GroupId);
        assert!(!config.has_builder_state());
        config.tokens.push(FilenameToken::new("001", 1, TokenType::GroupId, 0.7));
        assert!(config.has_builder_state());
    }
}
