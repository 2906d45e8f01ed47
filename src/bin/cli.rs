//! TrayStore CLI
//!
//! Command-line interface over a local TrayStore directory. Values are
//! stored as strings.
//!
//! Exit status: 0 on success, 2 when the key has no data or has expired,
//! 1 on any other error.

use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use traystore::{Config, ExpiryStatus, FileStorage, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// TrayStore CLI
#[derive(Parser, Debug)]
#[command(name = "traystore-cli")]
#[command(about = "CLI for the TrayStore file-backed key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./traystore_data")]
    data_dir: String,

    /// Skip reading every live value into memory on open
    #[arg(long)]
    lazy: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,

        /// Read from disk instead of the cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Expire the value after this many seconds
        #[arg(short, long)]
        ttl_secs: Option<u64>,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Show whether a key has expired
    Expired {
        /// The key to check
        key: String,
    },

    /// List live keys
    Keys,

    /// Remove every expired key
    Purge,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,traystore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .eager_load(!args.lazy)
        .build();

    let storage = match FileStorage::open(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open storage: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&storage, args.command) {
        // Missing and expired keys are ordinary lookup results, not failures
        if e.is_no_data() || e.is_expired() {
            tracing::warn!("{}", e);
            process::exit(2);
        }
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(storage: &FileStorage, command: Commands) -> Result<()> {
    match command {
        Commands::Get { key, no_cache } => {
            let value: String = if no_cache {
                storage.get_no_cache(&key)?
            } else {
                storage.get(&key)?
            };
            println!("{}", value);
        }
        Commands::Set { key, value, ttl_secs } => match ttl_secs {
            Some(secs) => storage.set_with_ttl(&key, &value, Duration::from_secs(secs))?,
            None => storage.set(&key, &value, None)?,
        },
        Commands::Del { key } => storage.delete(&key)?,
        Commands::Expired { key } => {
            let label = match storage.is_expired(&key)? {
                ExpiryStatus::Live => "live",
                ExpiryStatus::Expired => "expired",
                ExpiryStatus::NeverExpires => "never",
            };
            println!("{}", label);
        }
        Commands::Keys => {
            for key in storage.keys() {
                println!("{}", key);
            }
        }
        Commands::Purge => {
            let reaped = storage.purge_expired()?;
            println!("{}", reaped);
        }
    }
    Ok(())
}
