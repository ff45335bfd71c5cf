//! Transport error types
//!
//! Every remote operation ends in either a typed value or a
//! `TransportError`. The error taxonomy is closed:
//!
//! - `ArgumentError` (caller-supplied invalid input)
//! - `StorageError` (backing store rejected the operation)
//! - `NotAuthorized` (privileged call sites only)
//! - `ServiceUnavailable` (remote process unreachable, handle must be re-established)
//! - `Internal` (unclassified, or a kind outside the call site's policy)
//!
//! This layer never retries and never turns a recognized error into success.

use std::fmt;

/// Severity levels for transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The operation failed, the remote handle remains usable
    Error,
    /// The operation or the remote handle is unusable
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Error kinds that may cross the process boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller-supplied input was invalid
    ArgumentError,
    /// The backing store rejected the operation
    StorageError,
    /// Permission denied
    NotAuthorized,
    /// The remote process is unreachable or has died
    ServiceUnavailable,
    /// Unclassified or unexpected failure
    Internal,
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::ArgumentError,
        ErrorKind::StorageError,
        ErrorKind::NotAuthorized,
        ErrorKind::ServiceUnavailable,
        ErrorKind::Internal,
    ];

    /// Name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::ArgumentError => "ArgumentError",
            ErrorKind::StorageError => "StorageError",
            ErrorKind::NotAuthorized => "NotAuthorized",
            ErrorKind::ServiceUnavailable => "ServiceUnavailable",
            ErrorKind::Internal => "Internal",
        }
    }

    /// Parse a wire name. Returns None for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::ArgumentError => "AERO_REMOTE_ARGUMENT_ERROR",
            ErrorKind::StorageError => "AERO_REMOTE_STORAGE_ERROR",
            ErrorKind::NotAuthorized => "AERO_REMOTE_NOT_AUTHORIZED",
            ErrorKind::ServiceUnavailable => "AERO_REMOTE_SERVICE_UNAVAILABLE",
            ErrorKind::Internal => "AERO_REMOTE_INTERNAL",
        }
    }

    /// Returns the severity level for this kind
    ///
    /// `ServiceUnavailable` is fatal to the remote handle, `Internal` is
    /// fatal to the current operation.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorKind::ArgumentError => ErrorSeverity::Error,
            ErrorKind::StorageError => ErrorSeverity::Error,
            ErrorKind::NotAuthorized => ErrorSeverity::Error,
            ErrorKind::ServiceUnavailable => ErrorSeverity::Fatal,
            ErrorKind::Internal => ErrorSeverity::Fatal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A typed error produced by a remote operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Error kind
    pub kind: ErrorKind,
    /// Error detail
    pub message: String,
}

impl TransportError {
    /// Create a new transport error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an argument error.
    pub fn argument_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArgumentError, message)
    }

    /// Create a storage error.
    pub fn storage_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageError, message)
    }

    /// Create a not-authorized error.
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthorized, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error detail
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Check if this error is fatal to the operation or the handle.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind.severity(), ErrorSeverity::Fatal)
    }

    /// Check if the caller must discard its remote handle and reconnect.
    pub fn requires_reconnect(&self) -> bool {
        self.kind == ErrorKind::ServiceUnavailable
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.kind.severity(),
            self.kind.code(),
            self.message
        )
    }
}

impl std::error::Error for TransportError {}

/// Result type for remote operations
pub type TransportResult<T> = Result<T, TransportError>;
