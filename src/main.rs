//! driftwatch - Main CLI entry point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use driftwatch::cli::{Args, Commands, Verbosity};
use driftwatch::config::Config;
use driftwatch::pipeline::DriftPipeline;
use driftwatch::RunOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbosity());

    let config = match &args.config {
        Some(path) => Config::load_from(path.clone())?,
        None => Config::load()?,
    };
    config.validate()?;

    match args.command {
        Commands::Run => run_pipeline(config, args.verbosity()).await,
        Commands::Detect => run_detection(config).await,
        Commands::Config => show_config(&config),
    }
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run_pipeline(config: Config, verbosity: Verbosity) -> Result<()> {
    let pipeline = DriftPipeline::from_config(config)?;

    let spinner = if verbosity.show_progress() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
        pb.set_message("Running drift pipeline...");
        Some(pb)
    } else {
        None
    };

    let report = pipeline.run().await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let report = report?;
    let stats = pipeline.telemetry().stats();

    println!("{}", "Drift pipeline run complete".bold());
    println!("  Run:              {}", report.run_id);
    println!(
        "  Band:             ({:.4}, {:.4})",
        report.band.lower_threshold, report.band.upper_threshold
    );
    println!("  Embeddings:       {}", stats.embeddings_fetched);
    println!("  Drift events:     {}", report.drift_events);
    println!("  Events in window: {}", report.events_in_window);
    println!("  Queries archived: {}", report.archived_queries);

    match &report.outcome {
        RunOutcome::Stopped => {
            println!("  Outcome:          {}", "no trend, stopped".yellow());
        }
        RunOutcome::Retrained { samples, artifact } => {
            println!(
                "  Outcome:          {} ({} samples -> {})",
                "retraining triggered".green(),
                samples,
                artifact
            );
        }
    }

    Ok(())
}

async fn run_detection(config: Config) -> Result<()> {
    let pipeline = DriftPipeline::from_config(config)?;
    let (band, report) = pipeline.detect_only().await?;

    println!(
        "Band: ({:.4}, {:.4})",
        band.lower_threshold, band.upper_threshold
    );

    if report.events.is_empty() {
        println!("{}", "No data drift detected".green());
    } else {
        println!(
            "{}",
            format!("Data drift detected in {} queries", report.events.len()).red()
        );
        for event in &report.events {
            println!("  {:.4}  {}", event.similarity, event.query);
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
