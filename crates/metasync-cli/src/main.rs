//! metasync CLI
//!
//! Syncs a local folder to or from a directory-backed object store.

mod cli;

use anyhow::Context;
use clap::Parser;
use metasync::{ChangeSet, SyncReport, Syncer};
use tracing_subscriber::EnvFilter;

use cli::Cli;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let syncer = Syncer::with_store_root(cli.store_root.clone(), cli.sync_config());
    tracing::debug!(store_root = %cli.store_root.display(), "using object store");
    if let Some(credentials) = cli.credentials() {
        tracing::warn!(
            region = credentials.region.as_deref().unwrap_or("-"),
            "the directory-backed store needs no credentials; ignoring --key/--secret"
        );
    }

    if cli.dry_run {
        let changes = syncer
            .plan(&cli.source, &cli.destination)
            .await
            .with_context(|| format!("planning {} -> {}", cli.source, cli.destination))?;
        print_plan(&changes);
    } else {
        let report = syncer
            .sync(&cli.source, &cli.destination)
            .await
            .with_context(|| format!("syncing {} -> {}", cli.source, cli.destination))?;
        print_report(&report);
    }
    Ok(())
}

/// `RUST_LOG` wins; otherwise warnings, or debug with `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_plan(changes: &ChangeSet) {
    for path in &changes.delete {
        println!("delete   {}", path);
    }
    for path in &changes.transfer {
        println!("transfer {}", path);
    }
    println!("{}", changes);
}

fn print_report(report: &SyncReport) {
    println!(
        "{}: {} transferred ({} bytes), {} deleted, {} unchanged",
        report.direction,
        report.transferred.len(),
        report.bytes_transferred,
        report.deleted.len(),
        report.unchanged
    );
}
