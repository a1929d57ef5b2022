//! Filename Tokenizer
//!
//! Splits image filenames into delimiter-bounded fragments and classifies
//! each fragment with a token type and a confidence.
//!
//! ## Pipeline
//!
//! 1. Strip the extension and split the stem on `_`, `-`, `.` and whitespace.
//!    Dashed date runs (`2024-03-15`, `03-15-2024`) are kept as one fragment.
//! 2. Classify every fragment on its own (synonyms, dates, digit runs,
//!    first/last position).
//! 3. Reconcile per position across the whole sample set: the majority type
//!    wins, constant "ids" are demoted, and a single varying fragment is
//!    promoted to group id when nothing else qualifies. A constant id is kept
//!    when no other candidate exists.

use crate::cancel::CancellationToken;
use crate::infer::date_shape;
use crate::token::{FilenameToken, ImageRole, TokenType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

/// Characters that separate filename fragments
pub const DELIMITERS: &[char] = &['_', '-', '.'];

/// Classifications at or above this confidence survive reconciliation untouched
const STRONG_CONFIDENCE: f64 = 0.9;

const SYNONYM_CONFIDENCE: f64 = 0.95;
const EXTENSION_CONFIDENCE: f64 = 0.95;
const DATE_CONFIDENCE: f64 = 0.9;
const PREFIX_CONFIDENCE: f64 = 0.8;
const DIGIT_CONFIDENCE: f64 = 0.7;
const SUFFIX_CONFIDENCE: f64 = 0.7;
const UNKNOWN_CONFIDENCE: f64 = 0.5;
const DEMOTED_CONFIDENCE: f64 = 0.6;
const PROMOTED_CONFIDENCE: f64 = 0.75;

/// Per-position type suggestion with a short justification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSuggestion {
    /// Fragment position; `None` for the trailing extension
    pub position: Option<usize>,
    pub token_type: TokenType,
    pub confidence: f64,
    pub rationale: String,
    /// Up to five distinct observed values
    pub examples: Vec<String>,
}

/// Result of one tokenization run. Superseded, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenAnalysis {
    /// Analysed filenames in input order
    pub filenames: Vec<String>,
    pub tokens: BTreeMap<String, Vec<FilenameToken>>,
    pub suggestions: Vec<TokenSuggestion>,
    /// Mean confidence per token type
    pub type_confidence: BTreeMap<TokenType, f64>,
}

impl TokenAnalysis {
    fn from_tokens(filenames: Vec<String>, tokens: BTreeMap<String, Vec<FilenameToken>>) -> Self {
        let suggestions = summarize(&filenames, &tokens);
        let type_confidence = aggregate_confidence(&tokens);
        Self {
            filenames,
            tokens,
            suggestions,
            type_confidence,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.filenames.len()
    }

    pub fn tokens_for(&self, filename: &str) -> Option<&[FilenameToken]> {
        self.tokens.get(filename).map(Vec::as_slice)
    }

    /// Token types present anywhere in the analysis
    pub fn detected_types(&self) -> BTreeSet<TokenType> {
        self.tokens
            .values()
            .flatten()
            .map(|t| t.suggested_type)
            .collect()
    }

    /// Positions at which `token_type` occurs (extension excluded)
    pub fn positions_of(&self, token_type: TokenType) -> BTreeSet<usize> {
        self.tokens
            .values()
            .flatten()
            .filter(|t| t.suggested_type == token_type && t.suggested_type != TokenType::Extension)
            .map(|t| t.position)
            .collect()
    }

    /// Tokens of the first `n` filenames, de-duplicated by (value, position)
    pub fn representative_tokens(&self, n: usize) -> Vec<FilenameToken> {
        let mut seen: HashSet<(&str, usize)> = HashSet::new();
        let mut result = Vec::new();
        for filename in self.filenames.iter().take(n) {
            let Some(tokens) = self.tokens.get(filename) else {
                continue;
            };
            for token in tokens {
                if seen.insert((token.value.as_str(), token.position)) {
                    result.push(token.clone());
                }
            }
        }
        result
    }

    /// Superseding analysis in which every token equal to `value` is `new_type`
    pub fn with_type_override(&self, value: &str, new_type: TokenType) -> TokenAnalysis {
        let mut changed = 0usize;
        let tokens = self
            .tokens
            .iter()
            .map(|(filename, tokens)| {
                let tokens = tokens
                    .iter()
                    .map(|t| {
                        if t.value == value {
                            changed += 1;
                            t.with_override(new_type)
                        } else {
                            t.clone()
                        }
                    })
                    .collect();
                (filename.clone(), tokens)
            })
            .collect();
        debug!(value, token_type = %new_type, changed, "Applied manual token type override");
        TokenAnalysis::from_tokens(self.filenames.clone(), tokens)
    }
}

/// Filename tokenizer
pub struct FilenameTokenizer {
    /// Digit runs at least this long are group id candidates, shorter ones are indexes
    group_id_min_digits: usize,
}

impl FilenameTokenizer {
    pub fn new() -> Self {
        Self { group_id_min_digits: 3 }
    }

    /// True when `value` is a front-camera synonym
    pub fn is_front_token(value: &str) -> bool {
        ImageRole::from_synonym(value) == Some(ImageRole::Front)
    }

    /// Tokenize a sample set. Empty input gives an empty analysis.
    pub fn analyze(&self, filenames: &[String]) -> TokenAnalysis {
        // A fresh token is never cancelled
        self.analyze_with_cancel(filenames, &CancellationToken::new())
            .unwrap_or_default()
    }

    /// Tokenize, checking `cancel` once per filename. `None` when cancelled.
    pub fn analyze_with_cancel(
        &self,
        filenames: &[String],
        cancel: &CancellationToken,
    ) -> Option<TokenAnalysis> {
        let mut ordered = Vec::with_capacity(filenames.len());
        let mut tokens = BTreeMap::new();

        for filename in filenames {
            if cancel.is_cancelled() {
                debug!(processed = ordered.len(), "Tokenization cancelled");
                return None;
            }
            if filename.is_empty() || tokens.contains_key(filename) {
                continue;
            }
            tokens.insert(filename.clone(), self.tokenize(filename));
            ordered.push(filename.clone());
        }

        if ordered.is_empty() {
            return Some(TokenAnalysis::default());
        }

        reconcile(&ordered, &mut tokens);
        let analysis = TokenAnalysis::from_tokens(ordered, tokens);
        info!(
            files = analysis.file_count(),
            positions = analysis.suggestions.len(),
            "Tokenized sample filenames"
        );
        Some(analysis)
    }

    /// Split and classify a single filename without cross-file reconciliation
    pub fn tokenize(&self, filename: &str) -> Vec<FilenameToken> {
        let (stem, extension) = split_extension(filename);
        let fragments = split_fragments(stem);
        let count = fragments.len();

        let mut tokens: Vec<FilenameToken> = fragments
            .into_iter()
            .enumerate()
            .map(|(position, value)| {
                let (token_type, confidence) = self.classify(&value, position, count);
                FilenameToken::new(value, position, token_type, confidence)
            })
            .collect();

        if let Some(extension) = extension {
            tokens.push(FilenameToken::new(
                extension,
                count,
                TokenType::Extension,
                EXTENSION_CONFIDENCE,
            ));
        }
        tokens
    }

    fn classify(&self, fragment: &str, position: usize, count: usize) -> (TokenType, f64) {
        if ImageRole::from_synonym(fragment).is_some() {
            return (TokenType::CameraSide, SYNONYM_CONFIDENCE);
        }

        if date_shape(fragment).is_some() {
            return (TokenType::Date, DATE_CONFIDENCE);
        }

        if fragment.chars().all(|c| c.is_ascii_digit()) {
            if fragment.len() >= self.group_id_min_digits {
                return (TokenType::GroupId, DIGIT_CONFIDENCE);
            }
            return (TokenType::Index, DIGIT_CONFIDENCE);
        }

        if position == 0 {
            return (TokenType::Prefix, PREFIX_CONFIDENCE);
        }

        if position + 1 == count {
            return (TokenType::Suffix, SUFFIX_CONFIDENCE);
        }

        (TokenType::Unknown, UNKNOWN_CONFIDENCE)
    }
}

impl Default for FilenameTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_delimiter(c: char) -> bool {
    DELIMITERS.contains(&c) || c.is_whitespace()
}

/// Split off a trailing extension: 1 to 5 ASCII alphanumerics with at least one letter
fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &filename[idx + 1..];
            let valid = (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && ext.chars().any(|c| c.is_ascii_alphabetic());
            if valid {
                (&filename[..idx], Some(ext))
            } else {
                (filename, None)
            }
        }
        _ => (filename, None),
    }
}

struct RawPiece {
    text: String,
    /// Delimiter that ended this piece
    delimiter: Option<char>,
}

fn split_fragments(stem: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in stem.chars() {
        if is_delimiter(c) {
            pieces.push(RawPiece {
                text: std::mem::take(&mut current),
                delimiter: Some(c),
            });
        } else {
            current.push(c);
        }
    }
    pieces.push(RawPiece {
        text: current,
        delimiter: None,
    });

    let mut fragments = Vec::with_capacity(pieces.len());
    let mut i = 0;
    while i < pieces.len() {
        if let Some(date) = merge_dashed_date(&pieces[i..]) {
            fragments.push(date);
            i += 3;
            continue;
        }
        // Double delimiters leave empty pieces behind
        if !pieces[i].text.is_empty() {
            fragments.push(pieces[i].text.clone());
        }
        i += 1;
    }
    fragments
}

fn merge_dashed_date(pieces: &[RawPiece]) -> Option<String> {
    let [a, b, c, ..] = pieces else {
        return None;
    };
    if a.delimiter != Some('-') || b.delimiter != Some('-') {
        return None;
    }
    let merged = format!("{}-{}-{}", a.text, b.text, c.text);
    date_shape(&merged).map(|_| merged)
}

/// Tokens at one position across files: (file index, token index)
type Slot = (usize, usize);

fn reconcile(filenames: &[String], tokens: &mut BTreeMap<String, Vec<FilenameToken>>) {
    let mut files: Vec<Vec<FilenameToken>> = filenames
        .iter()
        .map(|f| tokens.remove(f).unwrap_or_default())
        .collect();

    let positions = index_positions(&files);
    let file_count = files.len();

    // Majority vote per position
    for slots in positions.values() {
        let Some(majority) = majority_type(&files, slots) else {
            continue;
        };
        let agreeing = count_type(&files, slots, majority);
        let agreement = agreeing as f64 / slots.len() as f64;
        for &(f, t) in slots {
            let token = &mut files[f][t];
            if token.suggested_type != majority && token.confidence < STRONG_CONFIDENCE {
                token.suggested_type = majority;
                token.confidence = agreement * 0.8;
            }
        }
    }

    // Constant values cannot tell groups apart
    let mut constant_ids: Vec<(Vec<Slot>, TokenType)> = Vec::new();
    if file_count > 1 {
        for (&position, slots) in &positions {
            let id_slots: Vec<Slot> = slots
                .iter()
                .copied()
                .filter(|&(f, t)| files[f][t].suggested_type == TokenType::GroupId)
                .collect();
            if id_slots.len() > 1 && distinct_values(&files, slots, TokenType::GroupId) == 1 {
                let demoted = if position == 0 { TokenType::Prefix } else { TokenType::Unknown };
                debug!(position, "Demoting constant group id position");
                retype(&mut files, &id_slots, &[TokenType::GroupId], demoted, DEMOTED_CONFIDENCE);
                constant_ids.push((id_slots, demoted));
            }
        }
    }

    let group_positions: Vec<usize> = positions
        .iter()
        .filter(|(_, slots)| count_type(&files, slots, TokenType::GroupId) > 0)
        .map(|(&p, _)| p)
        .collect();

    match group_positions.len() {
        0 => {
            promote_distinctive(&mut files, &positions, file_count);
            // Every file shares one id: the lowest constant position is still the best guess
            let has_group_id =
                files.iter().flatten().any(|t| t.suggested_type == TokenType::GroupId);
            if let (false, Some((slots, demoted))) = (has_group_id, constant_ids.first()) {
                debug!("Restoring constant group id position");
                retype(&mut files, slots, &[*demoted], TokenType::GroupId, DEMOTED_CONFIDENCE);
            }
        }
        1 => {}
        _ => {
            let best = group_positions
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    let key = |p: usize| {
                        let slots = &positions[&p];
                        let count = count_type(&files, slots, TokenType::GroupId);
                        let repeats = distinct_values(&files, slots, TokenType::GroupId) < count;
                        (repeats, count)
                    };
                    // Lower position wins ties
                    key(a).cmp(&key(b)).then_with(|| b.cmp(&a))
                });
            for p in group_positions {
                if Some(p) != best {
                    retype(
                        &mut files,
                        &positions[&p],
                        &[TokenType::GroupId],
                        TokenType::Index,
                        DEMOTED_CONFIDENCE,
                    );
                }
            }
        }
    }

    for (filename, file_tokens) in filenames.iter().zip(files) {
        tokens.insert(filename.clone(), file_tokens);
    }
}

/// Promote the single varying fragment shared by most files to group id
fn promote_distinctive(
    files: &mut [Vec<FilenameToken>],
    positions: &BTreeMap<usize, Vec<Slot>>,
    file_count: usize,
) {
    let tiers: [&[TokenType]; 2] = [&[TokenType::Unknown], &[TokenType::Prefix, TokenType::Suffix]];

    for tier in tiers {
        let view: &[Vec<FilenameToken>] = files;
        let candidates: Vec<usize> = positions
            .iter()
            .filter(|(_, slots)| {
                let Some(majority) = majority_type(view, slots) else {
                    return false;
                };
                let varying = file_count == 1 || distinct_values(view, slots, majority) > 1;
                tier.contains(&majority) && slots.len() * 2 > file_count && varying
            })
            .map(|(&p, _)| p)
            .collect();

        if let [position] = candidates.as_slice() {
            debug!(position, "Promoting distinctive position to group id");
            retype(files, &positions[position], tier, TokenType::GroupId, PROMOTED_CONFIDENCE);
            return;
        }
        if candidates.len() > 1 {
            return;
        }
    }
}

fn index_positions(files: &[Vec<FilenameToken>]) -> BTreeMap<usize, Vec<Slot>> {
    let mut positions: BTreeMap<usize, Vec<Slot>> = BTreeMap::new();
    for (f, tokens) in files.iter().enumerate() {
        for (t, token) in tokens.iter().enumerate() {
            if token.suggested_type != TokenType::Extension {
                positions.entry(token.position).or_default().push((f, t));
            }
        }
    }
    positions
}

/// Most frequent type; ties go to the higher confidence sum, then declaration order
fn majority_type(files: &[Vec<FilenameToken>], slots: &[Slot]) -> Option<TokenType> {
    let mut tally: BTreeMap<TokenType, (usize, f64)> = BTreeMap::new();
    for &(f, t) in slots {
        let token = &files[f][t];
        let entry = tally.entry(token.suggested_type).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += token.confidence;
    }
    tally
        .into_iter()
        .max_by(|(ta, (ca, sa)), (tb, (cb, sb))| {
            ca.cmp(cb)
                .then_with(|| sa.partial_cmp(sb).unwrap_or(Ordering::Equal))
                .then_with(|| tb.cmp(ta))
        })
        .map(|(token_type, _)| token_type)
}

fn count_type(files: &[Vec<FilenameToken>], slots: &[Slot], token_type: TokenType) -> usize {
    slots.iter().filter(|&&(f, t)| files[f][t].suggested_type == token_type).count()
}

fn distinct_values(files: &[Vec<FilenameToken>], slots: &[Slot], token_type: TokenType) -> usize {
    slots
        .iter()
        .map(|&(f, t)| &files[f][t])
        .filter(|token| token.suggested_type == token_type)
        .map(|token| token.value.as_str())
        .collect::<HashSet<_>>()
        .len()
}

fn retype(
    files: &mut [Vec<FilenameToken>],
    slots: &[Slot],
    from: &[TokenType],
    to: TokenType,
    confidence: f64,
) {
    for &(f, t) in slots {
        let token = &mut files[f][t];
        if from.contains(&token.suggested_type) && token.confidence < STRONG_CONFIDENCE {
            token.suggested_type = to;
            token.confidence = confidence;
        }
    }
}

fn summarize(
    filenames: &[String],
    tokens: &BTreeMap<String, Vec<FilenameToken>>,
) -> Vec<TokenSuggestion> {
    let mut by_position: BTreeMap<Option<usize>, Vec<&FilenameToken>> = BTreeMap::new();
    for filename in filenames {
        for token in tokens.get(filename).into_iter().flatten() {
            let key = (token.suggested_type != TokenType::Extension).then_some(token.position);
            by_position.entry(key).or_default().push(token);
        }
    }

    // Numbered positions first, extension last
    let mut entries: Vec<_> = by_position.into_iter().collect();
    entries.sort_by_key(|(position, _)| position.is_none());

    entries
        .into_iter()
        .filter_map(|(position, tokens)| {
            let mut tally: BTreeMap<TokenType, usize> = BTreeMap::new();
            for token in &tokens {
                *tally.entry(token.suggested_type).or_default() += 1;
            }
            let (token_type, agreeing) = tally
                .into_iter()
                .max_by(|(ta, ca), (tb, cb)| ca.cmp(cb).then_with(|| tb.cmp(ta)))?;

            let of_type: Vec<&FilenameToken> = tokens
                .iter()
                .copied()
                .filter(|t| t.suggested_type == token_type)
                .collect();
            let confidence =
                of_type.iter().map(|t| t.confidence).sum::<f64>() / of_type.len() as f64;

            let mut examples: Vec<String> = Vec::new();
            for token in &of_type {
                if examples.len() == 5 {
                    break;
                }
                if !examples.contains(&token.value) {
                    examples.push(token.value.clone());
                }
            }
            let distinct = of_type.iter().map(|t| t.value.as_str()).collect::<HashSet<_>>().len();

            Some(TokenSuggestion {
                position,
                token_type,
                confidence,
                rationale: format!(
                    "{} ({}/{} files)",
                    rationale(token_type, distinct),
                    agreeing,
                    tokens.len()
                ),
                examples,
            })
        })
        .collect()
}

fn rationale(token_type: TokenType, distinct: usize) -> String {
    match token_type {
        TokenType::Prefix if distinct == 1 => "constant leading text".to_string(),
        TokenType::Prefix => "leading text".to_string(),
        TokenType::Suffix => "trailing text before the extension".to_string(),
        TokenType::GroupId => format!("varies across files with {} distinct values", distinct),
        TokenType::CameraSide => "matches camera/side synonyms".to_string(),
        TokenType::Date => "date-shaped values".to_string(),
        TokenType::Index => "short numeric sequence".to_string(),
        TokenType::Extension => "file extension".to_string(),
        TokenType::Unknown if distinct == 1 => "constant text".to_string(),
        TokenType::Unknown => "no recognised pattern".to_string(),
    }
}

fn aggregate_confidence(tokens: &BTreeMap<String, Vec<FilenameToken>>) -> BTreeMap<TokenType, f64> {
    let mut sums: BTreeMap<TokenType, (f64, usize)> = BTreeMap::new();
    for token in tokens.values().flatten() {
        let entry = sums.entry(token.suggested_type).or_insert((0.0, 0));
        entry.0 += token.confidence;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(token_type, (sum, count))| (token_type, sum / count as f64))
        .collect()
}
