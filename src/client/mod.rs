//! Client side of the protocol
//!
//! `RemoteClient` turns typed operations into channel invocations and back;
//! `ClientSession` pairs it with a per-session metadata cache.

mod operation;
mod remote;
mod session;

pub use operation::Operation;
pub use remote::RemoteClient;
pub use session::ClientSession;
