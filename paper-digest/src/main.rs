use anyhow::Context;
use clap::{Parser, Subcommand};
use paper_digest::{AppConfig, PaperAggregator, RssFeedSource};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paper-digest", version, about = "Daily digest of new papers from journal RSS feeds")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch all feeds and record new papers in the corpus
    Fetch {
        /// Corpus file (overrides PAPER_DIGEST_STATE)
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Write the report for papers not yet surfaced
    Digest {
        /// Corpus file (overrides PAPER_DIGEST_STATE)
        #[arg(long)]
        state: Option<PathBuf>,
        /// Report path, may contain {date} (overrides PAPER_DIGEST_REPORT)
        #[arg(long)]
        report: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("invalid configuration")?;

    match cli.command {
        Command::Fetch { state } => {
            if let Some(state) = state {
                config.state_path = state;
            }
            info!("Starting fetch of {} feeds into {}", config.feeds.len(), config.state_path.display());

            let source = RssFeedSource::new(config.fetch.clone()).context("failed to build HTTP client")?;
            let aggregator = PaperAggregator::new(config);
            let summary = aggregator.run_fetch(&source).await.map_err(|e| {
                error!("Fetch failed: {}", e);
                e
            })?;

            if summary.first_run {
                info!("First run: recorded {} existing papers without reporting them", summary.bootstrapped);
            }
            info!("New papers this run: {}", summary.new_records);
            info!("Total papers tracked: {}", summary.corpus_size);
            if summary.feeds_failed > 0 {
                info!("{} of {} feeds could not be fetched", summary.feeds_failed, summary.feeds_total);
            }
        }
        Command::Digest { state, report } => {
            if let Some(state) = state {
                config.state_path = state;
            }
            if let Some(report) = report {
                config.report_path = report;
            }

            let aggregator = PaperAggregator::new(config);
            let summary = aggregator.run_digest().await.context("digest failed")?;

            info!(
                "Digest written to {} ({} new papers, narrative {})",
                summary.report_path.display(),
                summary.new_records,
                summary.narrative.status()
            );
        }
    }

    Ok(())
}
