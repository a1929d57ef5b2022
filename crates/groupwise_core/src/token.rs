//! Token vocabulary
//!
//! The closed set of classification labels applied to filename fragments,
//! the image roles a file can play inside a group, and the token value type
//! produced by the tokenizer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confidence assigned to a token whose type was set by hand.
pub const MANUAL_OVERRIDE_CONFIDENCE: f64 = 0.9;

/// Classification label for a filename fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    /// Leading fixed text (vehicle_, IMG_)
    Prefix,
    /// Trailing fixed text before the extension
    Suffix,
    /// Identifier shared by every image of one vehicle/event
    GroupId,
    /// Camera or side marker (front, rear, overview and synonyms)
    CameraSide,
    /// Date fragment
    Date,
    /// Short sequence number
    Index,
    /// File extension
    Extension,
    /// Not classified
    Unknown,
}

impl TokenType {
    /// Every token type, in declaration order
    pub fn all() -> [TokenType; 8] {
        [
            TokenType::Prefix,
            TokenType::Suffix,
            TokenType::GroupId,
            TokenType::CameraSide,
            TokenType::Date,
            TokenType::Index,
            TokenType::Extension,
            TokenType::Unknown,
        ]
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            TokenType::Prefix => "Prefix",
            TokenType::Suffix => "Suffix",
            TokenType::GroupId => "Group ID",
            TokenType::CameraSide => "Camera/Side",
            TokenType::Date => "Date",
            TokenType::Index => "Index",
            TokenType::Extension => "Extension",
            TokenType::Unknown => "Unknown",
        }
    }

    /// Hex colour used when rendering tokens of this type
    pub fn color(&self) -> &'static str {
        match self {
            TokenType::Prefix | TokenType::Suffix => "#6c757d",
            TokenType::GroupId => "#dc3545",
            TokenType::CameraSide => "#fd7e14",
            TokenType::Date => "#20c997",
            TokenType::Index => "#0d6efd",
            TokenType::Extension => "#6f42c1",
            TokenType::Unknown => "#adb5bd",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TokenType::Prefix => "Fixed text at the start of the filename",
            TokenType::Suffix => "Fixed text at the end of the filename",
            TokenType::GroupId => "Identifier shared by all images of one vehicle or event",
            TokenType::CameraSide => "Camera position or vehicle side (front, rear, overview)",
            TokenType::Date => "Date in YYYY-MM-DD, MM-DD-YYYY or YYYYMMDD form",
            TokenType::Index => "Sequence number distinguishing images within a group",
            TokenType::Extension => "File extension",
            TokenType::Unknown => "Fragment with no recognised meaning",
        }
    }

    /// Stable identifier (`GROUP_ID`)
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Prefix => "PREFIX",
            TokenType::Suffix => "SUFFIX",
            TokenType::GroupId => "GROUP_ID",
            TokenType::CameraSide => "CAMERA_SIDE",
            TokenType::Date => "DATE",
            TokenType::Index => "INDEX",
            TokenType::Extension => "EXTENSION",
            TokenType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = String;

    /// Accepts `GROUP_ID`, `group_id`, `group-id` and `groupid`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "prefix" => Ok(TokenType::Prefix),
            "suffix" => Ok(TokenType::Suffix),
            "groupid" | "group" | "id" => Ok(TokenType::GroupId),
            "cameraside" | "camera" | "side" => Ok(TokenType::CameraSide),
            "date" => Ok(TokenType::Date),
            "index" => Ok(TokenType::Index),
            "extension" | "ext" => Ok(TokenType::Extension),
            "unknown" => Ok(TokenType::Unknown),
            _ => Err(format!("unknown token type '{}'", s)),
        }
    }
}

/// Functional category of an image inside a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageRole {
    Front,
    Rear,
    Overview,
}

const FRONT_SYNONYMS: &[&str] = &["front", "f", "fr", "forward"];
const REAR_SYNONYMS: &[&str] = &["rear", "r", "rr", "back", "behind"];
const OVERVIEW_SYNONYMS: &[&str] = &["overview", "ov", "ovr", "ovw", "scene", "full"];

impl ImageRole {
    pub fn all() -> [ImageRole; 3] {
        [ImageRole::Front, ImageRole::Rear, ImageRole::Overview]
    }

    /// Lowercase words that mark a filename fragment as this role
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            ImageRole::Front => FRONT_SYNONYMS,
            ImageRole::Rear => REAR_SYNONYMS,
            ImageRole::Overview => OVERVIEW_SYNONYMS,
        }
    }

    /// Resolve a fragment to a role by synonym, case-insensitively
    pub fn from_synonym(value: &str) -> Option<ImageRole> {
        let lower = value.to_lowercase();
        ImageRole::all()
            .into_iter()
            .find(|role| role.synonyms().contains(&lower.as_str()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageRole::Front => "front",
            ImageRole::Rear => "rear",
            ImageRole::Overview => "overview",
        }
    }
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageRole::from_synonym(s).ok_or_else(|| format!("unknown image role '{}'", s))
    }
}

/// A delimiter-bounded fragment of one filename
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilenameToken {
    pub value: String,
    /// 0-based index within the delimiter-split filename
    pub position: usize,
    pub suggested_type: TokenType,
    /// Classification confidence in [0, 1]
    pub confidence: f64,
}

impl FilenameToken {
    pub fn new(
        value: impl Into<String>,
        position: usize,
        suggested_type: TokenType,
        confidence: f64,
    ) -> Self {
        Self {
            value: value.into(),
            position,
            suggested_type,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Copy of this token with a hand-picked type
    pub fn with_override(&self, token_type: TokenType) -> Self {
        Self {
            value: self.value.clone(),
            position: self.position,
            suggested_type: token_type,
            confidence: MANUAL_OVERRIDE_CONFIDENCE,
        }
    }

    /// Display identity: value and position, ignoring type
    pub fn same_slot(&self, other: &FilenameToken) -> bool {
        self.value == other.value && self.position == other.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_from_str_variants() {
        assert_eq!("GROUP_ID".parse::<TokenType>().unwrap(), TokenType::GroupId);
        assert_eq!("group-id".parse::<TokenType>().unwrap(), TokenType::GroupId);
        assert_eq!("camera_side".parse::<TokenType>().unwrap(), TokenType::CameraSide);
        assert_eq!("ext".parse::<TokenType>().unwrap(), TokenType::Extension);
        assert!("plate".parse::<TokenType>().is_err());
    }

    #[test]
    fn test_token_type_serde_names() {
        let json = serde_json::to_string(&TokenType::CameraSide).unwrap();
        assert_eq!(json, "\"CAMERA_SIDE\"");
        let back: TokenType = serde_json::from_str("\"GROUP_ID\"").unwrap();
        assert_eq!(back, TokenType::GroupId);
    }

    #[test]
    fn test_prefix_and_suffix_share_colour() {
        assert_eq!(TokenType::Prefix.color(), TokenType::Suffix.color());
        assert_eq!(TokenType::GroupId.color(), "#dc3545");
    }

    #[test]
    fn test_role_from_synonym() {
        assert_eq!(ImageRole::from_synonym("FR"), Some(ImageRole::Front));
        assert_eq!(ImageRole::from_synonym("behind"), Some(ImageRole::Rear));
        assert_eq!(ImageRole::from_synonym("Scene"), Some(ImageRole::Overview));
        assert_eq!(ImageRole::from_synonym("side"), None);
    }

    #[test]
    fn test_override_resets_confidence() {
        let token = FilenameToken::new("12345", 1, TokenType::Unknown, 0.4);
        let overridden = token.with_override(TokenType::GroupId);
        assert_eq!(overridden.suggested_type, TokenType::GroupId);
        assert_eq!(overridden.confidence, MANUAL_OVERRIDE_CONFIDENCE);
        assert!(overridden.same_slot(&token));
    }
}
