//! Engine settings
//!
//! Reads tuning knobs from `<home>/config.toml`. Missing file or missing keys
//! fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Hard ceiling on sampled files per analysis
pub const SAMPLE_FILE_CEILING: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub analysis: AnalysisSettings,

    #[serde(default)]
    pub validation: ValidationSettings,

    #[serde(default)]
    pub patterns: PatternSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Files listed per directory analysis (capped at 500)
    #[serde(default = "default_max_sample_files")]
    pub max_sample_files: usize,

    /// Files whose tokens feed pattern generation
    #[serde(default = "default_preview_files")]
    pub preview_files: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_sample_files: default_max_sample_files(),
            preview_files: default_preview_files(),
        }
    }
}

impl AnalysisSettings {
    pub fn sample_limit(&self) -> usize {
        self.max_sample_files.clamp(1, SAMPLE_FILE_CEILING)
    }

    pub fn preview_limit(&self) -> usize {
        self.preview_files.clamp(1, self.sample_limit())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Quiet period before live revalidation
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl ValidationSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSettings {
    /// Widen literal image extensions in generated group patterns
    #[serde(default)]
    pub flexible_extensions: bool,
}

fn default_max_sample_files() -> usize { SAMPLE_FILE_CEILING }
fn default_preview_files() -> usize { 10 }
fn default_debounce_ms() -> u64 { 300 }

/// Load settings from a file; a missing file yields defaults
pub fn load_settings(path: &Path) -> Result<EngineSettings> {
    if !path.exists() {
        return Ok(EngineSettings::default());
    }

    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.analysis.max_sample_files, 500);
        assert_eq!(settings.analysis.preview_files, 10);
        assert_eq!(settings.validation.debounce(), Duration::from_millis(300));
        assert!(!settings.patterns.flexible_extensions);
    }

    #[test]
    fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [validation]
            debounce_ms = 150

            [patterns]
            flexible_extensions = true
            "#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.validation.debounce_ms, 150);
        assert!(settings.patterns.flexible_extensions);
        assert_eq!(settings.analysis.preview_files, 10);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = load_settings(&temp.path().join("missing.toml")).unwrap();
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[analysis\nmax_sample_files = ").unwrap();
        assert!(matches!(load_settings(&path), Err(SettingsError::Toml(_))));
    }

    #[test]
    fn test_limits_are_clamped() {
        let analysis = AnalysisSettings {
            max_sample_files: 10_000,
            preview_files: 900,
        };
        assert_eq!(analysis.sample_limit(), 500);
        assert_eq!(analysis.preview_limit(), 500);
    }
}
