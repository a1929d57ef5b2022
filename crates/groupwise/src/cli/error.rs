//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use groupwise_core::PatternField;
use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    /// Create a new helpful error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add multiple suggestions
    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Path does not exist
    pub fn path_not_found(path: &Path) -> Self {
        Self::new(format!("Path not found: {}", path.display()))
            .with_context("The specified path does not exist on the filesystem")
            .with_suggestions([
                format!("TRY: Check that the path exists: ls -la {}", path.display()),
                "TRY: Verify you have read permissions for this path".to_string(),
                "TRY: Check for typos in the path".to_string(),
            ])
    }

    /// Path exists but is not a directory
    pub fn not_a_directory(path: &Path) -> Self {
        Self::new(format!("Not a directory: {}", path.display()))
            .with_context("Sample filenames are read from a directory of images, not a single file")
            .with_suggestions([format!(
                "TRY: Analyze the parent directory: groupwise analyze {}",
                path.parent().map(|p| p.display().to_string()).unwrap_or_else(|| ".".to_string())
            )])
    }

    /// Directory has no files with an image extension
    pub fn no_image_files(path: &Path) -> Self {
        Self::new(format!("No image files in {}", path.display()))
            .with_context("Only jpg, jpeg, png, bmp, tif, tiff, gif and webp files are sampled")
            .with_suggestions([
                format!("TRY: List the directory: ls {}", path.display()),
                "TRY: Point at the folder that holds the camera images".to_string(),
            ])
    }

    /// `--rule` argument did not parse
    pub fn invalid_rule(rule_arg: &str, reason: &str) -> Self {
        Self::new(format!("Invalid rule '{}': {}", rule_arg, reason))
            .with_context("Rules are written ROLE:TYPE:VALUE with optional :cs and :pN suffixes")
            .with_suggestions([
                "TRY: --rule front:contains:front".to_string(),
                "TRY: --rule rear:ends_with:_r:cs:p1".to_string(),
                "TRY: Roles: front, rear, overview".to_string(),
                "TRY: Types: equals, contains, starts_with, ends_with, regex".to_string(),
            ])
    }

    /// The requested group id type is not among the analysed tokens
    pub fn group_type_not_found(requested: &str, available: &[String]) -> Self {
        Self::new(format!("No token is classified as {}", requested))
            .with_context(format!("Token types found in the samples: {}", available.join(", ")))
            .with_suggestions([
                "TRY: Run 'groupwise analyze <dir>' to see the suggested types per position"
                    .to_string(),
                "TRY: Pass one of the listed types with --group-type".to_string(),
            ])
    }

    /// A pattern argument does not compile
    pub fn invalid_pattern(field: PatternField, reason: &str) -> Self {
        Self::new(format!("{} pattern does not compile", field.name()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Quote the pattern so the shell leaves backslashes alone".to_string(),
                format!(
                    "TRY: Inspect it: groupwise explain '<pattern>' --field {}",
                    field.name().to_lowercase()
                ),
            ])
    }

    /// Settings file exists but cannot be used
    pub fn settings_unreadable(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot load settings: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Fix the TOML syntax or delete the file to use defaults".to_string(),
                "TRY: Point GROUPWISE_HOME at another directory".to_string(),
            ])
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print a command failure as a JSON object on stdout
pub fn print_json_error(err: &anyhow::Error) {
    let value = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({
            "error": helpful.message,
            "context": helpful.context,
            "suggestions": helpful.suggestions,
        }),
        None => serde_json::json!({ "error": format!("{:#}", err) }),
    };
    println!("{}", value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While grouping files")
            .with_suggestions(["Try again"]);

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While grouping files"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_path_not_found() {
        let path = PathBuf::from("/nonexistent/path");
        let err = HelpfulError::path_not_found(&path);

        let display = format!("{}", err);
        assert!(display.contains("/nonexistent/path"));
        assert!(display.contains("TRY:"));
    }

    #[test]
    fn test_invalid_rule_lists_format() {
        let err = HelpfulError::invalid_rule("side:contains:x", "unknown image role 'side'");
        assert!(err.message.contains("side:contains:x"));
        assert!(err.context.unwrap().contains("ROLE:TYPE:VALUE"));
    }

    #[test]
    fn test_invalid_pattern_names_field() {
        let err = HelpfulError::invalid_pattern(PatternField::Rear, "unclosed group");
        assert_eq!(err.message, "Rear pattern does not compile");
        assert!(err.suggestions.iter().any(|s| s.contains("--field rear")));
    }
}
