use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cc_provisioner::commands::{ping, replay_file, run_bulk};
use cc_provisioner::config::build_search_client;
use cc_provisioner::{Dependencies, ProvisionerConfig};
use cc_provisioning::TracingReporter;
use cc_search_repository::types::{SiteId, MAIN_SITE_ID};
use cc_search_shared::ContentType;

#[derive(Parser)]
#[command(name = "cc-provisioner")]
#[command(about = "Keeps a cc-search index in sync with a network snapshot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Network snapshot to read entities from and write search IDs back to
    #[arg(long, default_value = "network.json", global = true)]
    snapshot: PathBuf,

    /// Send documents to an in-memory index instead of cc-search
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision every eligible entity of the given content types
    Bulk {
        /// Comma-separated content types (post, profile, group, site, discussion); all when omitted
        #[arg(long, value_delimiter = ',', value_parser = parse_content_type)]
        types: Vec<ContentType>,

        /// Site whose posts and discussions are provisioned
        #[arg(long, default_value_t = MAIN_SITE_ID)]
        site: SiteId,
    },
    /// Replay a JSON-lines file of lifecycle events
    Replay {
        /// Event log, one JSON event per line
        events: PathBuf,
    },
    /// Check that cc-search is reachable
    Ping,
}

fn parse_content_type(value: &str) -> Result<ContentType, String> {
    value.parse().map_err(|e: cc_search_shared::UnknownContentType| e.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let config = ProvisionerConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Ping => {
            let client = build_search_client(&config, cli.dry_run)?;
            Ok(ping(&client).await?)
        }
        Commands::Bulk { types, site } => {
            let deps = Dependencies::new(&config, &cli.snapshot, cli.dry_run)?;
            info!(site_id = site, "Starting bulk provisioning");
            let summary = run_bulk(&deps.bulk, &types, site, &TracingReporter).await?;
            deps.save_snapshot(&cli.snapshot)?;
            println!(
                "submitted={} linked={} failed={} unmapped={} unresolved={}",
                summary.submitted,
                summary.linked,
                summary.failed,
                summary.unmapped,
                summary.unresolved
            );
            Ok(summary.failed == 0 && summary.unresolved == 0)
        }
        Commands::Replay { events } => {
            let deps = Dependencies::new(&config, &cli.snapshot, cli.dry_run)?;
            info!(events = %events.display(), "Starting replay");
            let summary = replay_file(&deps.bus, &events)
                .await
                .with_context(|| format!("Failed to replay {}", events.display()))?;
            deps.save_snapshot(&cli.snapshot)?;
            println!(
                "dispatched={} failed={} malformed={}",
                summary.dispatched, summary.failed, summary.malformed
            );
            Ok(summary.failed == 0 && summary.malformed == 0)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Provisioner failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
