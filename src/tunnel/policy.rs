//! Call-site error policies
//!
//! A policy is the closed set of error kinds a call site may reconstruct
//! from the generic failure channel. Kinds outside the policy collapse to
//! `Internal` on decode.

use std::fmt;

use crate::protocol::ErrorKind;

/// Closed set of error kinds recognized at one call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    name: &'static str,
    allowed: &'static [ErrorKind],
}

impl CallPolicy {
    /// Policy for ordinary operations
    pub const ALWAYS_ALLOWED: CallPolicy = CallPolicy {
        name: "always_allowed",
        allowed: &[
            ErrorKind::ArgumentError,
            ErrorKind::StorageError,
            ErrorKind::ServiceUnavailable,
        ],
    };

    /// Policy for mutating or administrative operations
    pub const PRIVILEGED: CallPolicy = CallPolicy {
        name: "privileged",
        allowed: &[
            ErrorKind::ArgumentError,
            ErrorKind::StorageError,
            ErrorKind::ServiceUnavailable,
            ErrorKind::NotAuthorized,
        ],
    };

    /// Policy name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Kinds this policy recognizes
    pub fn allowed(&self) -> &'static [ErrorKind] {
        self.allowed
    }

    /// Whether `kind` may be reconstructed under this policy.
    pub fn allows(&self, kind: ErrorKind) -> bool {
        self.allowed.contains(&kind)
    }

    /// Look up a policy by name (`always_allowed`/`always`, `privileged`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "always_allowed" | "always" => Some(Self::ALWAYS_ALLOWED),
            "privileged" => Some(Self::PRIVILEGED),
            _ => None,
        }
    }
}

impl fmt::Display for CallPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
