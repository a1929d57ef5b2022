//! Extension matching
//!
//! Widens a pattern's trailing image extension to every supported image
//! extension, case-insensitively.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions treated as images (lowercase)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "gif", "webp"];

/// Replacement fragment for a literal image extension
pub const FLEXIBLE_EXTENSION: &str = r"(?i:jpe?g|png|bmp|tiff?|gif|webp)";

/// Trailing `\.jpg`, `\.(?i:jpg)` or `]+(?i:jpg|png)`, optionally followed by `$`
static TRAILING_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<lead>\\\.|\]\+)",
        r"(?:\(\?i:(?P<alts>[A-Za-z0-9|]+)\)|(?P<bare>[A-Za-z0-9]+))",
        r"(?P<end>\$?)$"
    ))
    .unwrap()
});

/// True when `filename` ends in a supported image extension
pub fn has_image_extension(filename: impl AsRef<Path>) -> bool {
    filename
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Rewrite a trailing literal image extension into [`FLEXIBLE_EXTENSION`].
///
/// Returns the pattern unchanged when disabled, when the tail is not a
/// literal extension, or when any listed extension is not an image type.
/// Applying the rewrite twice gives the same result as applying it once.
pub fn apply_extension_matching(pattern: &str, enabled: bool) -> String {
    if !enabled {
        return pattern.to_string();
    }

    let Some(caps) = TRAILING_EXTENSION.captures(pattern) else {
        return pattern.to_string();
    };
    let (Some(whole), Some(lead)) = (caps.get(0), caps.name("lead")) else {
        return pattern.to_string();
    };

    // An odd run of backslashes escapes our lead character
    let preceding = pattern[..whole.start()].chars().rev().take_while(|c| *c == '\\').count();
    if preceding % 2 == 1 {
        return pattern.to_string();
    }

    let listed = caps
        .name("alts")
        .or_else(|| caps.name("bare"))
        .map(|m| m.as_str())
        .unwrap_or_default();
    let all_images = listed
        .split('|')
        .all(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    if !all_images {
        return pattern.to_string();
    }

    let end = caps.name("end").map(|m| m.as_str()).unwrap_or_default();
    format!(
        "{}{}{}{}",
        &pattern[..whole.start()],
        lead.as_str(),
        FLEXIBLE_EXTENSION,
        end
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_extension_rewritten() {
        assert_eq!(
            apply_extension_matching(r"^vehicle_(\d+)_front\.jpg$", true),
            r"^vehicle_(\d+)_front\.(?i:jpe?g|png|bmp|tiff?|gif|webp)$"
        );
        assert_eq!(
            apply_extension_matching(r"^(\d+)[_\-\.\s]+(?i:PNG|jpg)$", true),
            r"^(\d+)[_\-\.\s]+(?i:jpe?g|png|bmp|tiff?|gif|webp)$"
        );
    }

    #[test]
    fn test_disabled_is_identity() {
        let pattern = r"^(\d+)\.jpg$";
        assert_eq!(apply_extension_matching(pattern, false), pattern);
    }

    #[test]
    fn test_idempotent() {
        for pattern in [r"^(\d+)\.jpg$", r"^(\d+)[_\-\.\s]+(?i:jpg)$", r"^(\d+)\.txt$", r"(\d+)"] {
            let once = apply_extension_matching(pattern, true);
            assert_eq!(apply_extension_matching(&once, true), once, "pattern {}", pattern);
        }
    }

    #[test]
    fn test_non_image_and_escaped_left_alone() {
        assert_eq!(apply_extension_matching(r"^(\d+)\.txt$", true), r"^(\d+)\.txt$");
        // `\\.jpg` is a literal backslash followed by any character
        assert_eq!(apply_extension_matching(r"^(\d+)\\.jpg$", true), r"^(\d+)\\.jpg$");
    }

    #[test]
    fn test_rewritten_pattern_matches_other_extensions() {
        let pattern = apply_extension_matching(r"^(\d+)_f\.jpg$", true);
        let re = Regex::new(&pattern).unwrap();
        for name in ["17_f.jpg", "17_f.JPEG", "17_f.png", "17_f.TIF", "17_f.webp"] {
            assert!(re.is_match(name), "{} should match {}", pattern, name);
        }
        assert!(!re.is_match("17_f.txt"));
    }

    #[test]
    fn test_image_filter() {
        assert!(has_image_extension("a_1.JPG"));
        assert!(has_image_extension("dir/a_1.webp"));
        assert!(!has_image_extension("notes.txt"));
        assert!(!has_image_extension("README"));
    }
}
