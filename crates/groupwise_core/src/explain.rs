//! Human-readable pattern explanations

use crate::assemble::DELIMITER_CLASS;
use crate::model::PatternField;
use crate::validate::count_capturing_groups;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static DIGIT_QUANTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\d\{(\d+)(?:,(\d*))?\}").unwrap());

/// A recognized construct and what it does
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternComponent {
    pub construct: String,
    pub meaning: String,
}

impl PatternComponent {
    fn new(construct: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            construct: construct.into(),
            meaning: meaning.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "group_id", rename_all = "snake_case")]
pub enum SampleOutcome {
    /// Group pattern matched and captured this id
    GroupId(String),
    Matched,
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleExplanation {
    pub filename: String,
    pub outcome: SampleOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternExplanation {
    pub field: PatternField,
    pub pattern: String,
    pub components: Vec<PatternComponent>,
    pub capturing_groups: usize,
    pub samples: Vec<SampleExplanation>,
    /// Set when the pattern is empty or does not compile
    pub error: Option<String>,
}

/// Describe the constructs in `pattern` and run it against `samples`.
///
/// Group patterns report the captured id per sample; role patterns report
/// match or no match.
pub fn explain_pattern(
    pattern: &str,
    field: PatternField,
    samples: &[String],
) -> PatternExplanation {
    let mut explanation = PatternExplanation {
        field,
        pattern: pattern.to_string(),
        components: Vec::new(),
        capturing_groups: 0,
        samples: Vec::new(),
        error: None,
    };

    if pattern.trim().is_empty() {
        explanation.error = Some(format!("{} pattern is empty", field.name()));
        return explanation;
    }

    explanation.components = components(pattern);
    explanation.capturing_groups = count_capturing_groups(pattern);

    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => {
            explanation.error = Some(err.to_string());
            return explanation;
        }
    };

    explanation.samples = samples
        .iter()
        .map(|filename| SampleExplanation {
            filename: filename.clone(),
            outcome: sample_outcome(&re, field, filename),
        })
        .collect();
    explanation
}

fn sample_outcome(re: &Regex, field: PatternField, filename: &str) -> SampleOutcome {
    if field != PatternField::Group {
        return if re.is_match(filename) {
            SampleOutcome::Matched
        } else {
            SampleOutcome::NoMatch
        };
    }
    match re.captures(filename) {
        Some(caps) => match caps.get(1) {
            Some(id) if !id.as_str().is_empty() => SampleOutcome::GroupId(id.as_str().to_string()),
            Some(_) => SampleOutcome::NoMatch,
            None => SampleOutcome::Matched,
        },
        None => SampleOutcome::NoMatch,
    }
}

fn components(pattern: &str) -> Vec<PatternComponent> {
    let mut out = Vec::new();

    if pattern.starts_with('^') {
        out.push(PatternComponent::new("^", "match starts at the beginning of the filename"));
    }
    if pattern.ends_with('$') && !pattern.ends_with(r"\$") {
        out.push(PatternComponent::new("$", "match ends at the end of the filename"));
    }
    if pattern.contains(".*") {
        out.push(PatternComponent::new(".*", "any characters (zero or more)"));
    }
    if pattern.contains(".+") {
        out.push(PatternComponent::new(".+", "any characters (one or more)"));
    }
    if pattern.contains(r"\d+") {
        out.push(PatternComponent::new(r"\d+", "one or more digits"));
    }
    for caps in DIGIT_QUANTIFIER.captures_iter(pattern) {
        let min = &caps[1];
        let meaning = match caps.get(2).map(|m| m.as_str()) {
            None => format!("exactly {} digits", min),
            Some("") => format!("at least {} digits", min),
            Some(max) => format!("{} to {} digits", min, max),
        };
        out.push(PatternComponent::new(&caps[0], meaning));
    }
    if pattern.contains(r"\w+") {
        out.push(PatternComponent::new(r"\w+", "one or more word characters (letters, digits, _)"));
    }
    if pattern.contains(DELIMITER_CLASS) {
        out.push(PatternComponent::new(DELIMITER_CLASS, "one or more delimiters (_, -, ., space)"));
    }
    if pattern.contains("(?i:") {
        out.push(PatternComponent::new("(?i:...)", "case-insensitive section"));
    }

    out
}

impl fmt::Display for PatternExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} pattern: {}", self.field.name(), self.pattern)?;
        if let Some(error) = &self.error {
            return writeln!(f, "  error: {}", error);
        }

        for component in &self.components {
            writeln!(f, "  {:<16} {}", component.construct, component.meaning)?;
        }
        match self.capturing_groups {
            0 => {}
            1 => writeln!(f, "  {:<16} capturing group (1 total)", "(...)")?,
            n => writeln!(f, "  {:<16} capturing groups ({} total)", "(...)", n)?,
        }

        if !self.samples.is_empty() {
            writeln!(f)?;
        }
        for sample in &self.samples {
            match &sample.outcome {
                SampleOutcome::GroupId(id) => {
                    writeln!(f, "  ✓ {} -> group id \"{}\"", sample.filename, id)?
                }
                SampleOutcome::Matched => writeln!(f, "  ✓ {}", sample.filename)?,
                SampleOutcome::NoMatch => writeln!(f, "  ✗ {} (no match)", sample.filename)?,
            }
        }
        Ok(())
    }
}
