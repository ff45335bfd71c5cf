//! Opaque 128-bit tokens
//!
//! Tokens identify chunks on the wire and metadata revisions. They carry no
//! ordering and are compared by value only.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Size of a token on the wire, in bytes
pub const TOKEN_SIZE: usize = 16;

/// An opaque 128-bit identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(Uuid);

impl Token {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build a token from its wire bytes.
    pub fn from_bytes(bytes: [u8; TOKEN_SIZE]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Wire bytes of this token.
    pub fn as_bytes(&self) -> &[u8; TOKEN_SIZE] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
