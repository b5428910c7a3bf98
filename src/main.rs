//! JSTS CLI - Static testability scores for JavaScript and TypeScript.

use std::io::stdout;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jsts::analyzers::MetricsAnalyzer;
use jsts::cli::{Cli, Command, ScoreArgs};
use jsts::config::Config;
use jsts::core::progress::ProgressTracker;
use jsts::core::{AnalysisContext, Analyzer, FileSet};
use jsts::output::{Format, ScoreOptions};
use jsts::score;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(&cli.path)?,
    };
    cli.apply(&mut config);

    let file_set = FileSet::from_path(&cli.path, &config)?;
    let format = Format::from(config.output.format);

    match &cli.command {
        Command::Score(args) => run_score(args, &file_set, &config, format),
        Command::Metrics(_) => {
            let result = run_analyzer(MetricsAnalyzer::new(), &file_set, &config)?;
            format.format(&result, &mut stdout())?;
            Ok(())
        }
    }
}

fn run_score(
    args: &ScoreArgs,
    file_set: &FileSet,
    config: &Config,
    format: Format,
) -> anyhow::Result<()> {
    let analyzer = score::Analyzer::bundled().context("failed to load the bundled dataset")?;
    let analysis = run_analyzer(analyzer, file_set, config)?;

    let options = ScoreOptions {
        metrics: args.metrics,
        color: config.output.color,
    };
    format.format_scores(&analysis, options, &mut stdout())?;

    if let Some(minimum) = config.score.fail_under {
        analysis.check_threshold(minimum)?;
    }
    Ok(())
}

fn run_analyzer<A: Analyzer>(
    mut analyzer: A,
    file_set: &FileSet,
    config: &Config,
) -> anyhow::Result<A::Output> {
    analyzer.configure(config)?;

    let progress = ProgressTracker::for_terminal(file_set.len(), "Analyzing", true);
    let tracker = progress.clone();
    let ctx = AnalysisContext::new(file_set, config, None)
        .with_progress(move |current, _total| tracker.set_position(current));

    let result = analyzer
        .analyze(&ctx)
        .with_context(|| format!("{} analysis failed", analyzer.name()))?;
    progress.finish_and_clear();
    Ok(result)
}
