//! Custom token definitions
//!
//! Users can name recurring fragments ("lane", "site") and map them onto the
//! fixed token vocabulary. Applying a set reassigns matching tokens in an
//! analysis; optional custom tokens contribute their mapped type to the
//! optional set used by the group assembler.

use crate::token::TokenType;
use crate::tokenizer::TokenAnalysis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomToken {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Fragment values recognised as this token
    #[serde(default)]
    pub examples: Vec<String>,
    pub mapped_type: TokenType,
}

impl CustomToken {
    pub fn new(name: impl Into<String>, mapped_type: TokenType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            examples: Vec::new(),
            mapped_type,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, value: &str) -> bool {
        self.examples.iter().any(|example| example.eq_ignore_ascii_case(value))
    }
}

/// Custom tokens keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomTokenSet {
    tokens: BTreeMap<String, CustomToken>,
}

impl CustomTokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by name
    pub fn insert(&mut self, token: CustomToken) {
        self.tokens.insert(token.name.clone(), token);
    }

    pub fn get(&self, name: &str) -> Option<&CustomToken> {
        self.tokens.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<CustomToken> {
        self.tokens.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomToken> {
        self.tokens.values()
    }

    /// First definition (by name) whose examples contain `value`
    pub fn lookup(&self, value: &str) -> Option<&CustomToken> {
        self.tokens.values().find(|token| token.matches(value))
    }

    /// Superseding analysis with every matching token reassigned to its mapped type
    pub fn apply(&self, analysis: &TokenAnalysis) -> TokenAnalysis {
        let mut result = analysis.clone();
        for token in self.tokens.values() {
            for example in &token.examples {
                result = result.with_type_override(example, token.mapped_type);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::FilenameTokenizer;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut set = CustomTokenSet::new();
        set.insert(CustomToken::new("site", TokenType::Prefix).with_examples(["A12", "B07"]));
        assert_eq!(set.lookup("a12").map(|t| t.name.as_str()), Some("site"));
        assert!(set.lookup("C01").is_none());
    }

    #[test]
    fn test_apply_reassigns_tokens() {
        let tokenizer = FilenameTokenizer::new();
        let analysis = tokenizer.analyze(&[
            "cam1_12345_front.jpg".to_string(),
            "cam1_12346_rear.jpg".to_string(),
        ]);

        let mut set = CustomTokenSet::new();
        set.insert(
            CustomToken::new("camera", TokenType::CameraSide)
                .with_description("Camera unit")
                .with_examples(["cam1"]),
        );
        let applied = set.apply(&analysis);

        let first = &applied.tokens_for("cam1_12345_front.jpg").unwrap()[0];
        assert_eq!(first.suggested_type, TokenType::CameraSide);
        assert_eq!(first.confidence, crate::token::MANUAL_OVERRIDE_CONFIDENCE);
    }
}
