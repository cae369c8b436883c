// src/cli/mod.rs
//! CLI definitions for pprof-vault
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! Commands:
//! - `export` - Capture profiles from a pprof endpoint and keep the newest N
//! - `import` - Serve every stored profile for analysis
//! - `list` - Show the stored profiles grouped by source
//! - `prune` - Run one retention pass for a source

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod store;

pub use store::StoreArgs;

#[derive(Parser)]
#[command(name = "pprof-vault")]
#[command(author = "pprof-vault contributors")]
#[command(version)]
#[command(about = "Capture pprof profiles into object storage and serve them for analysis", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Periodically capture profiles and upload them to the object store
    Export {
        /// Base URL of the pprof endpoint (e.g., http://localhost:9100/debug/pprof)
        #[arg(long, value_name = "URL")]
        source_url: Option<String>,

        /// Profile to capture (heap, goroutine, block, mutex, profile, ...)
        #[arg(long)]
        profile_type: Option<String>,

        /// Value passed as the `debug` query parameter
        #[arg(long)]
        debug: Option<String>,

        /// Sample duration of each profile, in seconds
        #[arg(long, value_name = "SECONDS")]
        profile_duration_seconds: Option<u64>,

        /// Delay between two captures, in seconds
        #[arg(long, value_name = "SECONDS")]
        profile_delay_seconds: Option<u64>,

        /// Number of profiles to keep for this source
        #[arg(long)]
        keep_count: Option<usize>,

        /// Source id used in object keys (default: host name)
        #[arg(long)]
        source_id: Option<String>,

        /// Run a single capture cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Serve every stored profile over HTTP
    Import {
        /// Address to listen on (e.g., 127.0.0.1:4000)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Directory for downloaded profiles (default: system temp dir)
        #[arg(long, value_name = "DIR")]
        scratch_dir: Option<PathBuf>,
    },

    /// List stored profiles grouped by source
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the oldest profiles of a source beyond the keep count
    Prune {
        /// Source whose profiles are pruned
        #[arg(long)]
        source_id: String,

        /// Number of profiles to keep
        #[arg(long)]
        keep_count: Option<usize>,
    },
}
