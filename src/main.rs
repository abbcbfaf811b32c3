//! Command-line interface for mailchimp-sync
//!
//! # Usage Examples
//!
//! ## Incremental Sync
//! ```bash
//! # Contacts modified in the last hour (the default watermark)
//! mailchimp-sync
//!
//! # Contacts modified since an explicit timestamp
//! mailchimp-sync --since "2024-06-01T00:00:00Z"
//! ```
//!
//! ## Full Resync
//! ```bash
//! # Everything, from the epoch, capped at 10000 contacts
//! mailchimp-sync --full-sync --limit 10000
//! ```
//!
//! ## Rehearsal and Error Policy
//! ```bash
//! # Log would-be writes without touching Mailchimp
//! mailchimp-sync --dry-run
//!
//! # Keep going when individual upserts fail
//! mailchimp-sync --allow-partial
//! ```
//!
//! Credentials come from the environment: `DATAVERSE_TENANT_ID`,
//! `DATAVERSE_CLIENT_ID`, `DATAVERSE_CLIENT_SECRET`, `DATAVERSE_RESOURCE`,
//! `MAILCHIMP_API_KEY`, and `MAILCHIMP_AUDIENCE_ID`.
//!
//! Exit status: 0 for a completed run (even with `--allow-partial`
//! failures), 2 when a strict run aborts on a write failure, 1 for any
//! other fatal error.

use clap::Parser;
use dataverse_source::DataverseOpts;
use mailchimp_sink::MailchimpOpts;
use mailchimp_sync::run_sync;
use mailchimp_sync::watermark::resolve_watermark;
use sync_core::{RunConfig, RunReport};

#[derive(Parser)]
#[command(name = "mailchimp-sync")]
#[command(about = "A tool for syncing modified Dataverse contacts into a Mailchimp audience")]
#[command(long_about = None)]
struct Cli {
    /// Sync contacts modified after this timestamp (default: one hour ago)
    #[arg(long, value_name = "ISO8601", conflicts_with = "full_sync")]
    since: Option<String>,

    /// Sync all contacts from the epoch instead of a recent window
    #[arg(long)]
    full_sync: bool,

    /// Process at most this many contacts
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    limit: Option<u64>,

    /// Log would-be writes without calling the Mailchimp API
    #[arg(long)]
    dry_run: bool,

    /// Continue after per-contact write failures instead of aborting
    #[arg(long)]
    allow_partial: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Dataverse connection options
    #[command(flatten)]
    dataverse: DataverseOpts,

    /// Mailchimp connection options
    #[command(flatten)]
    mailchimp: MailchimpOpts,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match run().await {
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
        // The engine has already logged the summary for aborted runs.
        Ok(report) if report.aborted() => std::process::exit(2),
        Ok(_) => Ok(()),
    }
}

async fn run() -> anyhow::Result<RunReport> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG takes precedence over --log-level.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let since = resolve_watermark(cli.since.as_deref(), cli.full_sync, chrono::Utc::now())?;
    let config = RunConfig {
        since,
        limit: cli.limit,
        allow_partial: cli.allow_partial,
        dry_run: cli.dry_run,
    };

    tracing::info!(
        "sync_started: since={} full_sync={} limit={:?} dry_run={} allow_partial={}",
        config.since.to_rfc3339(),
        cli.full_sync,
        config.limit,
        config.dry_run,
        config.allow_partial
    );

    let report = run_sync(&config, &cli.dataverse, &cli.mailchimp).await?;

    tracing::info!("sync_finished");
    Ok(report)
}
