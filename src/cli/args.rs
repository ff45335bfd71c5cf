//! CLI argument definitions using clap
//!
//! Commands:
//! - aeroremote encode-error --kind <kind> --message <text>
//! - aeroremote decode-error --policy <policy> [--message <text>]
//! - aeroremote chunk --size <n> --bytes <len>
//! - aeroremote demo [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aeroremote - remote access protocol for AeroDB tables
#[derive(Parser, Debug)]
#[command(name = "aeroremote")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a typed error into its tunneled wire message
    EncodeError {
        /// Error kind (ArgumentError, StorageError, NotAuthorized, ServiceUnavailable)
        #[arg(long)]
        kind: String,

        /// Human-readable detail
        #[arg(long)]
        message: String,
    },

    /// Decode a generic failure message under a call policy
    DecodeError {
        /// Call policy: always or privileged
        #[arg(long, default_value = "always")]
        policy: String,

        /// Raw failure message; omit to decode a failure without one
        #[arg(long)]
        message: Option<String>,
    },

    /// Show how a payload of the given length is split into chunks
    Chunk {
        /// Maximum payload bytes per chunk
        #[arg(long, default_value_t = crate::config::DEFAULT_MAX_CHUNK_SIZE)]
        size: usize,

        /// Payload length in bytes
        #[arg(long)]
        bytes: usize,
    },

    /// Run a session against an in-process store and print its metrics
    Demo {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
