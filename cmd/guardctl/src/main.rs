//! guardctl - storage sync and inspection for the identity database.
//!
//! Operational companion to the faceguard engine: reconcile an image tree
//! against the identity store and inspect what is enrolled or still
//! pending. Anything needing the embedding extractor (enrollment,
//! matching) lives with the serving process, not here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use faceguard_filestore::DiskStore;
use faceguard_reconcile::{Reconciler, ReconcilerConfig};
use faceguard_store::{FaceStatus, IdentityFilter, IdentityStore, RedbStore, TOTAL_COUNTER};

#[derive(Parser, Debug)]
#[command(name = "guardctl")]
#[command(about = "Storage sync and inspection for the identity database")]
struct Args {
    /// Identity database file
    #[arg(long, default_value = "faceguard.redb")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile identity records with an enrollment image tree
    Sync {
        /// Root directory of the image tree
        #[arg(long)]
        root: PathBuf,

        /// Allowed top-level group segments, e.g. --segment CSE --segment ECE
        /// (default: allow all)
        #[arg(long = "segment")]
        segments: Vec<String>,
    },
    /// List identities with status and counters
    List,
    /// List identities awaiting enrollment
    Pending,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store = RedbStore::open(&args.db)?;

    match args.command {
        Command::Sync { root, segments } => {
            let config = ReconcilerConfig {
                allowed_segments: if segments.is_empty() {
                    Vec::new()
                } else {
                    vec![segments]
                },
            };
            let reconciler = Reconciler::new(
                config,
                Arc::new(store),
                Arc::new(DiskStore::new(root)),
            );
            let report = reconciler.sweep()?;
            println!("sync: {report}");
        }
        Command::List => {
            for identity in store.find(&IdentityFilter::default())? {
                let group = identity.group_path.join("/");
                println!(
                    "{:<16} {:<8} {:<12} images={} violations={}",
                    identity.identity_id,
                    identity.status.to_string(),
                    if group.is_empty() { "-" } else { group.as_str() },
                    identity.source_images.len(),
                    identity.counter(TOTAL_COUNTER),
                );
            }
        }
        Command::Pending => {
            for identity in store.find(&IdentityFilter::with_status(FaceStatus::Pending))? {
                println!(
                    "{} ({} discovered images)",
                    identity.identity_id,
                    identity.source_images.len()
                );
            }
        }
    }

    Ok(())
}
