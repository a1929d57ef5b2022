//! groupwise command-line front end
//!
//! Tokenizes sample image filenames, synthesizes grouping patterns and
//! checks them before they are handed to a batch job.

use anyhow::Result;
use clap::{Parser, Subcommand};
use groupwise_core::settings::{load_settings, EngineSettings};
use groupwise_core::{PatternField, TokenType};
use groupwise_logging::{config_path, init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

mod cli;

use cli::error::HelpfulError;

#[derive(Parser, Debug)]
#[command(name = "groupwise", about = "Synthesize filename grouping patterns for image sets")]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenize the image filenames of a directory
    Analyze {
        /// Directory of sample images
        dir: PathBuf,

        /// Maximum number of files to sample (capped at 500)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate group and role patterns from a directory
    Generate {
        /// Directory of sample images
        dir: PathBuf,

        /// Token type that identifies a group (e.g. group_id, date, prefix)
        #[arg(short = 't', long, default_value = "group_id")]
        group_type: TokenType,

        /// Token type that may be absent from some filenames (repeatable)
        #[arg(long)]
        optional: Vec<TokenType>,

        /// Role rule ROLE:TYPE:VALUE[:cs][:pN] (repeatable)
        #[arg(short, long = "rule")]
        rules: Vec<String>,

        /// Accept any common image extension in the group pattern
        #[arg(long)]
        flexible_ext: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a hand-written pattern configuration
    Validate {
        /// Group pattern; its first capturing group is the group id
        #[arg(long)]
        group: Option<String>,

        #[arg(long)]
        front: Option<String>,

        #[arg(long)]
        rear: Option<String>,

        #[arg(long)]
        overview: Option<String>,

        /// Role rule ROLE:TYPE:VALUE[:cs][:pN] (repeatable)
        #[arg(short, long = "rule")]
        rules: Vec<String>,

        /// Sample filename to check the group pattern against (repeatable)
        #[arg(short, long = "sample")]
        samples: Vec<String>,

        /// Directory whose image filenames are used as samples
        #[arg(long)]
        sample_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Group the image files of a directory
    Group {
        /// Directory of images
        dir: PathBuf,

        /// Group pattern; its first capturing group is the group id
        #[arg(long)]
        group: String,

        #[arg(long)]
        front: Option<String>,

        #[arg(long)]
        rear: Option<String>,

        #[arg(long)]
        overview: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Explain what a pattern matches
    Explain {
        /// Regular expression to explain
        pattern: String,

        /// Which slot the pattern fills (group, front, rear, overview)
        #[arg(short, long, default_value = "group")]
        field: PatternField,

        /// Filename to run the pattern against (repeatable)
        #[arg(short, long = "sample")]
        samples: Vec<String>,

        /// Directory whose image filenames are used as samples
        #[arg(long)]
        sample_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn command_wants_json(cmd: &Commands) -> bool {
    match cmd {
        Commands::Analyze { json, .. }
        | Commands::Generate { json, .. }
        | Commands::Validate { json, .. }
        | Commands::Group { json, .. }
        | Commands::Explain { json, .. } => *json,
    }
}

fn load_engine_settings() -> Result<EngineSettings> {
    let path = config_path();
    let settings = load_settings(&path)
        .map_err(|err| HelpfulError::settings_unreadable(&path, &err.to_string()))?;
    debug!(path = %path.display(), ?settings, "Loaded settings");
    Ok(settings)
}

fn run_command(cli: Cli, settings: EngineSettings) -> Result<()> {
    let sample_limit = settings.analysis.sample_limit();

    match cli.command {
        Commands::Analyze { dir, limit, json } => cli::analyze::run(cli::analyze::AnalyzeArgs {
            dir,
            limit: limit
                .map(|l| l.clamp(1, groupwise_core::settings::SAMPLE_FILE_CEILING))
                .unwrap_or(sample_limit),
            json,
        }),
        Commands::Generate {
            dir,
            group_type,
            optional,
            rules,
            flexible_ext,
            json,
        } => cli::generate::run(cli::generate::GenerateArgs {
            dir,
            group_type,
            optional,
            rules,
            flexible_extensions: flexible_ext || settings.patterns.flexible_extensions,
            sample_limit,
            preview_limit: settings.analysis.preview_limit(),
            json,
        }),
        Commands::Validate {
            group,
            front,
            rear,
            overview,
            rules,
            samples,
            sample_dir,
            json,
        } => cli::validate::run(cli::validate::ValidateArgs {
            group,
            front,
            rear,
            overview,
            rules,
            samples,
            sample_dir,
            sample_limit,
            json,
        }),
        Commands::Group {
            dir,
            group,
            front,
            rear,
            overview,
            json,
        } => cli::group::run(cli::group::GroupArgs {
            dir,
            group,
            front,
            rear,
            overview,
            sample_limit,
            json,
        }),
        Commands::Explain {
            pattern,
            field,
            samples,
            sample_dir,
            json,
        } => cli::explain::run(cli::explain::ExplainArgs {
            pattern,
            field,
            samples,
            sample_dir,
            sample_limit,
            json,
        }),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    let _log_guard = match init_logging(LogConfig {
        app_name: "groupwise",
        verbose: cli.verbose,
        json_output: json_mode,
    }) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: {:#}", err);
            None
        }
    };

    let result = load_engine_settings().and_then(|settings| run_command(cli, settings));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
