//! CLI module for aeroremote
//!
//! Provides command-line tools for:
//! - encode-error: Show the tunneled form of a typed error
//! - decode-error: Decode a raw failure message under a call policy
//! - chunk: Show how a payload length splits into chunks
//! - demo: Run a session over the in-process loopback channel

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{chunk_plan, decode_error, demo, encode_error, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
