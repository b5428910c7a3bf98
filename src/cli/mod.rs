//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{self, Config};

/// JSTS - Static testability scores for JavaScript and TypeScript code bases.
///
/// A higher score means better testability.
#[derive(Parser)]
#[command(name = "jsts")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the directory to analyze
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Calculate testability scores per file
    #[command(alias = "s")]
    Score(ScoreArgs),

    /// Extract raw metrics per file without scoring
    #[command(alias = "m")]
    Metrics(MetricsArgs),
}

#[derive(Args)]
pub struct ScoreArgs {
    /// Also print every metric score and value
    #[arg(long)]
    pub metrics: bool,

    /// Reference dataset JSON file (overrides the configured dataset)
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Fail when the average score is below this value
    #[arg(long, value_name = "N")]
    pub fail_under: Option<f64>,
}

#[derive(Args)]
pub struct MetricsArgs {
    /// Disable the dialect fallback when a file fails to parse
    #[arg(long)]
    pub no_fallback: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    #[value(alias = "md")]
    Markdown,
    #[value(alias = "txt")]
    Text,
}

impl From<OutputFormat> for config::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => config::OutputFormat::Json,
            OutputFormat::Markdown => config::OutputFormat::Markdown,
            OutputFormat::Text => config::OutputFormat::Text,
        }
    }
}

impl Cli {
    /// Fold command line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(format) = self.format {
            config.output.format = format.into();
        }
        match &self.command {
            Command::Score(args) => {
                if let Some(data) = &args.data {
                    config.score.dataset = Some(data.clone());
                }
                if let Some(minimum) = args.fail_under {
                    config.score.fail_under = Some(minimum);
                }
            }
            Command::Metrics(args) => {
                if args.no_fallback {
                    config.parser.fallback = false;
                }
            }
        }
    }
}
