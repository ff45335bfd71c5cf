//! aeroremote - remote access protocol for AeroDB tables
//!
//! Client-side plumbing that lets one process read tables and table
//! metadata held by another over a size-bounded call channel:
//!
//! - `chunk`: splits payloads into linked chunk chains and reassembles them
//! - `tunnel`: carries typed errors through the channel's generic failure
//! - `client`: typed remote operations and per-session metadata caching
//! - `channel`: the channel contract plus an in-process loopback peer

pub mod channel;
pub mod chunk;
pub mod cli;
pub mod client;
pub mod config;
pub mod metadata;
pub mod observability;
pub mod protocol;
pub mod store;
pub mod tunnel;
