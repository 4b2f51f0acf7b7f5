use gm_sender::config::GmConfig;
use gm_sender::report::{export_json, ConsoleReporter};
use gm_sender::{DispatchScheduler, HttpConnector};

use anyhow::{Context, Result};
use clap::Parser;
use core_logic::{setup_logger, CoreError, CredentialLoader, WorkerRunner, RESULT_TARGET};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file; missing file falls back to defaults + environment
    #[arg(short, long, default_value = "gm.toml")]
    config: String,
    /// Private keys file (overrides `private_keys_file`)
    #[arg(short, long)]
    keys: Option<PathBuf>,
    /// Chain to target (overrides `chain`); `all` runs every chain
    #[arg(long, conflicts_with = "all")]
    chain: Option<String>,
    /// Send on every registered chain, in registry order
    #[arg(long)]
    all: bool,
    /// Randomize wallet order
    #[arg(long)]
    shuffle: bool,
    /// Print the registered chains and exit
    #[arg(long)]
    list_chains: bool,
    /// Write the final batch result as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,
    /// Show non-result log events on the console
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();
    let _log_guard = setup_logger(args.verbose);

    info!("Loading config from: {}", args.config);
    let mut config = GmConfig::load(&args.config).context("Failed to load configuration")?;
    if let Some(keys) = args.keys {
        config.private_keys_file = keys;
    }
    let shuffle = args.shuffle || config.shuffle_wallets;

    let registry = config.registry().context("Invalid chain configuration")?;

    if args.list_chains {
        for profile in registry.profiles() {
            info!(
                target: RESULT_TARGET,
                "{:<12} chain {:<8} {}",
                profile.name(),
                profile.chain_id(),
                profile.rpc_endpoint()
            );
        }
        return Ok(());
    }

    let chains = config.select_chains(&registry, args.chain.as_deref(), args.all)?;

    let credentials = match config.credential_source().load(shuffle).await {
        Ok(keys) => keys,
        Err(CoreError::Wallet(e)) => {
            error!("{}", e);
            error!(
                "Add one private key per line to {}",
                config.private_keys_file.display()
            );
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to load private keys"),
    };

    let delay_policy = config.delay_policy()?;
    let confirmation = config.confirmation()?;
    info!(
        target: RESULT_TARGET,
        "Sending GM from {} wallet(s) on {} | delay between wallets: {}{}",
        credentials.len(),
        chains
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", "),
        delay_policy.display_range(),
        if shuffle { " | shuffled" } else { "" }
    );

    let scheduler = DispatchScheduler::new(delay_policy, confirmation)
        .with_cancellation(WorkerRunner::shutdown_token());
    let connector = HttpConnector::new(config.rpc_timeout(), confirmation.poll_interval);
    let mut reporter = ConsoleReporter::new();

    let batch = scheduler
        .run(&connector, &chains, &credentials, &mut reporter)
        .await;

    if let Some(path) = args.report_json {
        match export_json(&batch, &path).await {
            Ok(()) => info!(target: RESULT_TARGET, "Report written to {}", path.display()),
            Err(e) => error!("Failed to export report: {:#}", e),
        }
    }

    Ok(())
}
