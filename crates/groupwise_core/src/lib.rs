//! Groupwise Core - Filename Grouping Engine
//!
//! Turns a sample of image filenames into regular expressions that group the
//! files by a shared identifier and tag each one with a role.
//!
//! # Pipeline
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Tokenizer  │     │  Assembler  │     │  Validator  │     │  Grouping   │
//! │ (filename → │────▶│ (tokens +   │────▶│ (structural │────▶│ (regex →    │
//! │   tokens)   │     │ rules → re) │     │ + samples)  │     │  buckets)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Token**: A delimiter-separated fragment with a suggested [`TokenType`]
//! - **Group pattern**: Regex whose first capturing group is the group id
//! - **Role pattern**: Regex (or rules) marking a file as front, rear or overview
//! - **Live validation**: Debounced revalidation while a configuration is edited

pub mod analysis;
pub mod assemble;
pub mod cancel;
pub mod custom;
pub mod explain;
pub mod extension;
pub mod grouping;
pub mod infer;
pub mod live;
pub mod model;
pub mod settings;
pub mod token;
pub mod tokenizer;
pub mod validate;

// Re-exports for convenience
pub use analysis::{AnalysisError, AnalysisService, AnalysisStatus};
pub use assemble::{assemble_group_pattern, assemble_role_pattern, PatternError, PatternGenerator};
pub use cancel::{CancellationToken, Cancelled};
pub use custom::{CustomToken, CustomTokenSet};
pub use explain::{explain_pattern, PatternExplanation};
pub use extension::apply_extension_matching;
pub use grouping::{group_files, GroupingError, GroupingReport};
pub use infer::{infer_date_pattern, infer_pattern};
pub use live::{LiveState, LiveValidationModel};
pub use model::{PatternConfiguration, PatternField, RoleRule, RuleType};
pub use settings::{load_settings, EngineSettings};
pub use token::{FilenameToken, ImageRole, TokenType};
pub use tokenizer::{FilenameTokenizer, TokenAnalysis, TokenSuggestion};
pub use validate::{ValidationResult, Validator};
