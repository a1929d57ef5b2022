//! Grouping semantics
//!
//! Applies a finished configuration to a set of filenames: the group pattern
//! buckets files by the captured group id, role patterns tag each file.

use crate::cancel::{CancellationToken, Cancelled};
use crate::model::{PatternConfiguration, PatternField};
use crate::token::ImageRole;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum GroupingError {
    #[error("Group pattern is empty")]
    MissingGroupPattern,

    #[error("{field} pattern does not compile: {source}")]
    InvalidPattern {
        field: PatternField,
        #[source]
        source: regex::Error,
    },

    #[error("Grouping cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, GroupingError>;

impl From<Cancelled> for GroupingError {
    fn from(_: Cancelled) -> Self {
        GroupingError::Cancelled
    }
}

/// One file inside a group and the roles it matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedFile {
    pub filename: String,
    /// Every role whose pattern matched, in front/rear/overview order
    pub roles: Vec<ImageRole>,
}

impl GroupedFile {
    /// The role, when exactly one matched
    pub fn role(&self) -> Option<ImageRole> {
        match self.roles.as_slice() {
            [role] => Some(*role),
            _ => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.roles.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    NoGroupMatch,
    /// The capturing group matched the empty string
    EmptyGroupId,
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedReason::NoGroupMatch => f.write_str("no group match"),
            UnmatchedReason::EmptyGroupId => f.write_str("empty group id"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedFile {
    pub filename: String,
    pub reason: UnmatchedReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupingReport {
    /// Group id (exact captured text) to its files in input order
    pub groups: BTreeMap<String, Vec<GroupedFile>>,
    pub unmatched: Vec<UnmatchedFile>,
    /// Input was cut at the file limit
    pub truncated: bool,
}

impl GroupingReport {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn matched_file_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Files that matched more than one role pattern
    pub fn ambiguous(&self) -> impl Iterator<Item = (&str, &GroupedFile)> {
        self.groups
            .iter()
            .flat_map(|(id, files)| files.iter().map(move |f| (id.as_str(), f)))
            .filter(|(_, f)| f.is_ambiguous())
    }

    /// Groups in which no file matched any role
    pub fn groups_without_roles(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .filter(|(_, files)| files.iter().all(|f| f.roles.is_empty()))
            .map(|(id, _)| id.as_str())
    }

    pub fn roles_in(&self, group_id: &str) -> Vec<ImageRole> {
        let mut roles: Vec<ImageRole> = self
            .groups
            .get(group_id)
            .into_iter()
            .flatten()
            .flat_map(|f| f.roles.iter().copied())
            .collect();
        roles.sort();
        roles.dedup();
        roles
    }
}

fn compile(field: PatternField, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| GroupingError::InvalidPattern { field, source })
}

/// Partition `filenames` into groups and tag roles.
///
/// At most `limit` files are considered. `cancel` is checked per file.
pub fn group_files(
    config: &PatternConfiguration,
    filenames: &[String],
    limit: Option<usize>,
    cancel: &CancellationToken,
) -> Result<GroupingReport> {
    if config.group_pattern.trim().is_empty() {
        return Err(GroupingError::MissingGroupPattern);
    }
    let group = compile(PatternField::Group, &config.group_pattern)?;

    let mut roles: Vec<(ImageRole, Regex)> = Vec::new();
    for role in ImageRole::all() {
        let pattern = config.role_pattern(role);
        if !pattern.trim().is_empty() {
            roles.push((role, compile(role.into(), pattern)?));
        }
    }

    let limit = limit.unwrap_or(usize::MAX);
    let mut report = GroupingReport {
        truncated: filenames.len() > limit,
        ..Default::default()
    };

    for filename in filenames.iter().take(limit) {
        if let Err(cancelled) = cancel.checkpoint() {
            let processed = report.matched_file_count() + report.unmatched.len();
            debug!(processed, "Grouping cancelled");
            return Err(cancelled.into());
        }

        let Some(caps) = group.captures(filename) else {
            report.unmatched.push(UnmatchedFile {
                filename: filename.clone(),
                reason: UnmatchedReason::NoGroupMatch,
            });
            continue;
        };
        let group_id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if group_id.is_empty() {
            report.unmatched.push(UnmatchedFile {
                filename: filename.clone(),
                reason: UnmatchedReason::EmptyGroupId,
            });
            continue;
        }

        let matched_roles = roles
            .iter()
            .filter(|(_, re)| re.is_match(filename))
            .map(|(role, _)| *role)
            .collect();

        report.groups.entry(group_id.to_string()).or_default().push(GroupedFile {
            filename: filename.clone(),
            roles: matched_roles,
        });
    }

    info!(
        groups = report.group_count(),
        matched = report.matched_file_count(),
        unmatched = report.unmatched.len(),
        ambiguous = report.ambiguous().count(),
        "Grouped files"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn config() -> PatternConfiguration {
        let mut config = PatternConfiguration::new();
        config.group_pattern = r"^vehicle_(\d+)_".to_string();
        config.front_pattern = "(?i:.*front.*)".to_string();
        config.rear_pattern = "(?i:.*rear.*)".to_string();
        config
    }

    #[test]
    fn test_groups_and_roles() {
        let files = names(&[
            "vehicle_001_front.jpg",
            "vehicle_001_rear.jpg",
            "vehicle_002_front.jpg",
        ]);
        let report = group_files(&config(), &files, None, &CancellationToken::new()).unwrap();

        assert_eq!(report.group_count(), 2);
        assert_eq!(report.roles_in("001"), vec![ImageRole::Front, ImageRole::Rear]);
        assert_eq!(report.roles_in("002"), vec![ImageRole::Front]);
        assert!(report.unmatched.is_empty());
    }

    #[test]
    fn test_unmatched_and_ambiguous() {
        let mut cfg = config();
        cfg.overview_pattern = ".*front.*".to_string();
        let files = names(&["vehicle_007_front.jpg", "truck_7_front.jpg", "vehicle_008_side.jpg"]);
        let report = group_files(&cfg, &files, None, &CancellationToken::new()).unwrap();

        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(report.unmatched[0].reason, UnmatchedReason::NoGroupMatch);
        assert_eq!(report.unmatched[0].reason.to_string(), "no group match");

        let ambiguous: Vec<_> = report.ambiguous().map(|(id, _)| id).collect();
        assert_eq!(ambiguous, vec!["007"]);

        // A group with no role matches is kept
        assert_eq!(report.groups_without_roles().collect::<Vec<_>>(), vec!["008"]);
    }

    #[test]
    fn test_group_ids_not_normalized() {
        let mut cfg = config();
        cfg.group_pattern = r"^vehicle_(\w+)_".to_string();
        let files = names(&["vehicle_AB_front.jpg", "vehicle_ab_rear.jpg"]);
        let report = group_files(&cfg, &files, None, &CancellationToken::new()).unwrap();
        assert_eq!(report.group_count(), 2);
    }

    #[test]
    fn test_empty_capture_is_unmatched() {
        let mut cfg = config();
        cfg.group_pattern = r"^x(\d*)_".to_string();
        let files = names(&["x_front.jpg"]);
        let report = group_files(&cfg, &files, None, &CancellationToken::new()).unwrap();
        assert_eq!(report.unmatched[0].reason, UnmatchedReason::EmptyGroupId);
    }

    #[test]
    fn test_limit_truncates() {
        let files = names(&[
            "vehicle_001_front.jpg",
            "vehicle_002_front.jpg",
            "vehicle_003_front.jpg",
        ]);
        let report = group_files(&config(), &files, Some(2), &CancellationToken::new()).unwrap();
        assert!(report.truncated);
        assert_eq!(report.matched_file_count(), 2);
    }

    #[test]
    fn test_errors() {
        let cancel = CancellationToken::new();
        let files = names(&["vehicle_001_front.jpg"]);

        let mut cfg = config();
        cfg.group_pattern.clear();
        assert!(matches!(
            group_files(&cfg, &files, None, &cancel),
            Err(GroupingError::MissingGroupPattern)
        ));

        let mut cfg = config();
        cfg.rear_pattern = "(rear".to_string();
        assert!(matches!(
            group_files(&cfg, &files, None, &cancel),
            Err(GroupingError::InvalidPattern { field: PatternField::Rear, .. })
        ));

        cancel.cancel();
        assert!(matches!(
            group_files(&config(), &files, None, &cancel),
            Err(GroupingError::Cancelled)
        ));
    }
}
