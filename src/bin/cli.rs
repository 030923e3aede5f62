//! DynaKV CLI
//!
//! Command-line interface operating directly on a data directory.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use dynakv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// DynaKV CLI
#[derive(Parser, Debug)]
#[command(name = "dynakv-cli")]
#[command(about = "CLI for the DynaKV embedded key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./dynakv_data")]
    data_dir: PathBuf,

    /// JSON settings file (overrides --data-dir and --segment-mb)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Segment size limit in MB before rotation
    #[arg(short = 's', long, default_value = "16")]
    segment_mb: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Print every live record
    Scan {
        /// Only the latest version of each key
        #[arg(long)]
        latest: bool,
    },

    /// Print segment and index statistics
    Stats,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dynakv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config: {}", e);
                process::exit(1);
            }
        },
        None => Config::builder()
            .data_dir(&args.data_dir)
            .segment_size_mb(args.segment_mb)
            .build(),
    };

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&engine, args.command) {
        tracing::error!("Command failed: {}", e);
        process::exit(1);
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close engine: {}", e);
        process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands) -> dynakv::Result<()> {
    match command {
        Commands::Get { key } => match engine.get(key.as_bytes())? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => {
                println!("(not found)");
            }
        },
        Commands::Put { key, value } => {
            engine.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { key } => {
            if engine.erase(key.as_bytes())? {
                println!("deleted");
            } else {
                println!("(not found)");
            }
        }
        Commands::Scan { latest } => {
            let records: Box<dyn Iterator<Item = dynakv::Result<(Vec<u8>, Vec<u8>)>> + '_> =
                if latest {
                    Box::new(engine.scan_latest())
                } else {
                    Box::new(engine.scan_all())
                };
            for item in records {
                let (key, value) = item?;
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&value)
                );
            }
        }
        Commands::Stats => {
            println!("data_dir:        {}", engine.data_dir().display());
            println!("segments:        {}", engine.segment_count());
            println!("active_segment:  {}", engine.active_segment_id());
            println!("indexed_keys:    {}", engine.index_len());
        }
    }
    Ok(())
}
