//! Token-pattern inference
//!
//! Turns the set of values observed for one token type into the tightest
//! regex fragment that still matches every value.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Fallback fragment for an empty value set
pub const FALLBACK_FRAGMENT: &str = r"\w+";

/// Recognised date layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// YYYY-MM-DD
    Iso,
    /// MM-DD-YYYY
    Us,
    /// YYYYMMDD
    Compact,
}

impl DateShape {
    pub fn regex(&self) -> &'static str {
        match self {
            DateShape::Iso => r"\d{4}-\d{2}-\d{2}",
            DateShape::Us => r"\d{2}-\d{2}-\d{4}",
            DateShape::Compact => r"\d{8}",
        }
    }
}

struct DatePatterns {
    iso: Regex,
    us: Regex,
    compact: Regex,
}

static DATES: LazyLock<DatePatterns> = LazyLock::new(|| DatePatterns {
    iso: Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap(),
    us: Regex::new(r"^(\d{2})-(\d{2})-(\d{4})$").unwrap(),
    compact: Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap(),
});

/// Classify a fragment as a date.
///
/// Dashed forms only need the right digit layout. Compact `YYYYMMDD` also
/// needs a plausible year, month and day, since 8-digit ids are common.
pub fn date_shape(value: &str) -> Option<DateShape> {
    if DATES.iso.is_match(value) {
        return Some(DateShape::Iso);
    }
    if DATES.us.is_match(value) {
        return Some(DateShape::Us);
    }
    let caps = DATES.compact.captures(value)?;
    let year: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let plausible =
        (1900..=2100).contains(&year) && (1..=12).contains(&month) && (1..=31).contains(&day);
    plausible.then_some(DateShape::Compact)
}

/// Infer a fragment for values of a generic type (group id, index, unknown).
///
/// Character class: `\d` when all digits, `[a-zA-Z]` when all letters,
/// `[a-zA-Z0-9]` when alphanumeric, otherwise `[\w...]` extended with the
/// punctuation actually seen. Quantifier: `{n}` for one length, `{min,max}`
/// for a spread of at most 2, `{min,}` for wider spreads with min > 1, else `+`.
pub fn infer_pattern<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let values: BTreeSet<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
    if values.is_empty() {
        return FALLBACK_FRAGMENT.to_string();
    }

    let class = character_class(&values);
    let lengths = values.iter().map(|v| v.chars().count());
    let min = lengths.clone().min().unwrap_or(0);
    let max = lengths.max().unwrap_or(0);

    format!("{}{}", class, quantifier(min, max))
}

/// Infer a fragment for date values, keeping a shared layout when there is one
pub fn infer_date_pattern<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let values: Vec<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
    let shapes: BTreeSet<_> = values.iter().map(|v| date_shape(v).map(|s| s.regex())).collect();

    match shapes.into_iter().collect::<Vec<_>>().as_slice() {
        [Some(regex)] => (*regex).to_string(),
        _ => infer_pattern(values),
    }
}

fn character_class(values: &BTreeSet<String>) -> String {
    let chars = || values.iter().flat_map(|v| v.chars());

    if chars().all(|c| c.is_ascii_digit()) {
        return r"\d".to_string();
    }
    if chars().all(|c| c.is_ascii_alphabetic()) {
        return "[a-zA-Z]".to_string();
    }
    if chars().all(|c| c.is_ascii_alphanumeric()) {
        return "[a-zA-Z0-9]".to_string();
    }

    let mut class = String::from(r"[\w");
    let mut extra: BTreeSet<char> = BTreeSet::new();
    let mut whitespace = false;
    for c in chars() {
        if c.is_alphanumeric() || c == '_' {
            continue;
        }
        if c.is_whitespace() {
            whitespace = true;
        } else {
            extra.insert(c);
        }
    }
    for c in extra {
        class.push_str(&regex::escape(&c.to_string()));
    }
    if whitespace {
        class.push_str(r"\s");
    }
    class.push(']');
    class
}

fn quantifier(min: usize, max: usize) -> String {
    if min == max {
        format!("{{{}}}", min)
    } else if max - min <= 2 {
        format!("{{{},{}}}", min, max)
    } else if min > 1 {
        format!("{{{},}}", min)
    } else {
        "+".to_string()
    }
}
