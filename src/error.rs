//! # Regional Zoom Error Handling
//!
//! Every failure of the region engine is returned to the caller; nothing in this
//! crate retries on its own. The error type carries an [`ErrorContext`] and is
//! classified through small traits so the caller can decide between retrying the
//! `apply`, tearing the session down, or treating the failure as a logic defect.
//!
//! ## Error Classification
//!
//! - `Retryable`: the same call may succeed if issued again (hardware hiccups)
//! - `Recoverable`: the session is still usable after the failure
//! - `HasSeverity`: `CacheSlotMissing` is `Fatal`, it can only come from a bug
//!
//! ## Usage
//!
//! ```rust
//! use regional_zoom::error::{HasSeverity, Retryable, ZoomError};
//! use zoom_kernels::Algorithm;
//!
//! let error = ZoomError::hardware_timeout(Algorithm::NearestNeighbor, 50, 5000)
//!     .with_operation("regional zoom in");
//!
//! assert!(error.is_retryable());
//! assert_eq!(error.category(), "hardware_timeout");
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

use zoom_kernels::Algorithm;

use crate::core::frame::Region;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Warnings that may indicate potential issues
    Warning,
    /// Errors that affect operation but can be recovered from
    Error,
    /// Errors after which the remote banks may hold an intermediate frame
    Critical,
    /// Logic defects; the session invariants no longer hold
    Fatal,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Additional metadata as key-value pairs
    pub metadata: Vec<(String, String)>,
}

impl ErrorContext {
    /// Create a new error context with the given severity
    pub fn new(severity: ErrorSeverity) -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            recovery_suggestion: None,
            severity,
            metadata: Vec::new(),
        }
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new(ErrorSeverity::Error)
    }
}

/// Failure codes reported by the frame-store driver itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwError {
    /// Address outside `0..76800` (driver code -1)
    InvalidAddress(u32),
    /// The store did not acknowledge a pixel transfer (driver code -2)
    Timeout,
    /// The store raised its error flag during a transfer (driver code -3)
    Device(i32),
}

impl HwError {
    /// The driver's numeric return code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            HwError::InvalidAddress(_) => -1,
            HwError::Timeout => -2,
            HwError::Device(_) => -3,
        }
    }
}

impl fmt::Display for HwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HwError::InvalidAddress(addr) => write!(f, "invalid frame address {}", addr),
            HwError::Timeout => write!(f, "frame store did not respond"),
            HwError::Device(code) => write!(f, "frame store reported error (status {})", code),
        }
    }
}

impl StdError for HwError {}

/// Error type for region sessions, the zoom engine and the global tracker
#[derive(Debug)]
pub enum ZoomError {
    /// A buffer could not be allocated
    Allocation {
        what: &'static str,
        bytes: usize,
        context: ErrorContext,
    },
    /// The selected rectangle is empty or leaves the frame
    BoundaryViolation {
        region: Region,
        reason: String,
        context: ErrorContext,
    },
    /// The done flag never rose within the polling budget
    HardwareTimeout {
        algorithm: Algorithm,
        attempts: u32,
        waited_ms: u64,
        context: ErrorContext,
    },
    /// The store finished the pass with its error flag raised
    HardwareErrorFlag {
        algorithm: Algorithm,
        context: ErrorContext,
    },
    /// A cache level expected to be populated was empty
    CacheSlotMissing { level: usize, context: ErrorContext },
    /// A single pixel transfer failed
    Hardware {
        operation: String,
        source: HwError,
        context: ErrorContext,
    },
    /// A second session was requested while one is active
    SessionActive { active: u64, context: ErrorContext },
    /// The handle does not name the active session
    UnknownSession { handle: u64, context: ErrorContext },
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors (bank files, image loading)
    Io {
        operation: String,
        source: std::io::Error,
        context: ErrorContext,
    },
}

impl ZoomError {
    /// Create an allocation error
    pub fn allocation(what: &'static str, bytes: usize) -> Self {
        Self::Allocation {
            what,
            bytes,
            context: ErrorContext::new(ErrorSeverity::Error),
        }
    }

    /// Create a boundary violation error
    pub fn boundary(region: Region, reason: impl Into<String>) -> Self {
        Self::BoundaryViolation {
            region,
            reason: reason.into(),
            context: ErrorContext::new(ErrorSeverity::Warning),
        }
    }

    /// Create a polling timeout error
    pub fn hardware_timeout(algorithm: Algorithm, attempts: u32, waited_ms: u64) -> Self {
        Self::HardwareTimeout {
            algorithm,
            attempts,
            waited_ms,
            context: ErrorContext::new(ErrorSeverity::Critical),
        }
        .with_recovery_suggestion("retry the zoom step or end the session")
    }

    /// Create an error-flag error
    pub fn hardware_flag(algorithm: Algorithm) -> Self {
        Self::HardwareErrorFlag {
            algorithm,
            context: ErrorContext::new(ErrorSeverity::Critical),
        }
        .with_recovery_suggestion("retry the zoom step or end the session")
    }

    /// Create a missing cache slot error
    pub fn cache_slot_missing(level: usize) -> Self {
        Self::CacheSlotMissing {
            level,
            context: ErrorContext::new(ErrorSeverity::Fatal),
        }
    }

    /// Create a pixel transfer error
    pub fn hardware(operation: impl Into<String>, source: HwError) -> Self {
        Self::Hardware {
            operation: operation.into(),
            source,
            context: ErrorContext::new(ErrorSeverity::Critical),
        }
    }

    /// Create a session-already-active error
    pub fn session_active(active: u64) -> Self {
        Self::SessionActive {
            active,
            context: ErrorContext::new(ErrorSeverity::Warning),
        }
        .with_recovery_suggestion("end the active session before selecting a new region")
    }

    /// Create an unknown session error
    pub fn unknown_session(handle: u64) -> Self {
        Self::UnknownSession {
            handle,
            context: ErrorContext::new(ErrorSeverity::Warning),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
            context: ErrorContext::default(),
        }
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.context_mut().severity = severity;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.push((key.into(), value.into()));
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Allocation { context, .. } => context,
            Self::BoundaryViolation { context, .. } => context,
            Self::HardwareTimeout { context, .. } => context,
            Self::HardwareErrorFlag { context, .. } => context,
            Self::CacheSlotMissing { context, .. } => context,
            Self::Hardware { context, .. } => context,
            Self::SessionActive { context, .. } => context,
            Self::UnknownSession { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Allocation { context, .. } => context,
            Self::BoundaryViolation { context, .. } => context,
            Self::HardwareTimeout { context, .. } => context,
            Self::HardwareErrorFlag { context, .. } => context,
            Self::CacheSlotMissing { context, .. } => context,
            Self::Hardware { context, .. } => context,
            Self::SessionActive { context, .. } => context,
            Self::UnknownSession { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Allocation { .. } => "allocation",
            Self::BoundaryViolation { .. } => "boundary_violation",
            Self::HardwareTimeout { .. } => "hardware_timeout",
            Self::HardwareErrorFlag { .. } => "hardware_error_flag",
            Self::CacheSlotMissing { .. } => "cache_slot_missing",
            Self::Hardware { .. } => "hardware",
            Self::SessionActive { .. } => "session_active",
            Self::UnknownSession { .. } => "unknown_session",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
        }
    }
}

impl fmt::Display for ZoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoomError::Allocation { what, bytes, .. } => {
                write!(f, "Failed to allocate {} bytes for {}", bytes, what)
            }
            ZoomError::BoundaryViolation { region, reason, .. } => {
                write!(f, "Region {} rejected: {}", region, reason)
            }
            ZoomError::HardwareTimeout {
                algorithm,
                attempts,
                waited_ms,
                ..
            } => {
                write!(
                    f,
                    "{} did not complete after {} polls ({}ms)",
                    algorithm, attempts, waited_ms
                )
            }
            ZoomError::HardwareErrorFlag { algorithm, .. } => {
                write!(f, "Frame store raised its error flag during {}", algorithm)
            }
            ZoomError::CacheSlotMissing { level, .. } => {
                write!(f, "Cache level {} is empty but should be populated", level)
            }
            ZoomError::Hardware {
                operation, source, ..
            } => {
                write!(f, "Frame store transfer failed during {}: {}", operation, source)
            }
            ZoomError::SessionActive { active, .. } => {
                write!(f, "Region session #{} is still active", active)
            }
            ZoomError::UnknownSession { handle, .. } => {
                write!(f, "Session #{} is not the active region session", handle)
            }
            ZoomError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            ZoomError::Io {
                operation, source, ..
            } => {
                write!(f, "I/O error during {}: {}", operation, source)
            }
        }
    }
}

impl StdError for ZoomError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Hardware { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type ZoomResult<T> = Result<T, ZoomError>;

/// Trait for errors that can be retried
pub trait Retryable {
    /// Check if this error can be retried
    fn is_retryable(&self) -> bool;
}

impl Retryable for ZoomError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HardwareTimeout { .. }
                | Self::HardwareErrorFlag { .. }
                | Self::Hardware { .. }
                | Self::Allocation { .. }
        )
    }
}

/// Trait for errors after which the session can keep going
pub trait Recoverable {
    /// Check if the session survives this error
    fn is_recoverable(&self) -> bool;
}

impl Recoverable for ZoomError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::CacheSlotMissing { .. } => false,
            // Recoverable only if the store was not touched yet.
            Self::Allocation { context, .. } => context.severity < ErrorSeverity::Critical,
            _ => true,
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for ZoomError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for ZoomError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Check if an error is transient (may resolve itself)
    pub fn is_transient(error: &ZoomError) -> bool {
        matches!(
            error,
            ZoomError::HardwareTimeout { .. } | ZoomError::Hardware { .. }
        )
    }

    /// Check if an error is fatal (cannot be recovered from)
    pub fn is_fatal(error: &ZoomError) -> bool {
        error.severity() == ErrorSeverity::Fatal
    }

    /// Whether the remote banks may hold a frame the session did not finish
    /// compositing, so the caller should re-apply or tear down.
    pub fn session_needs_teardown(error: &ZoomError) -> bool {
        error.severity() >= ErrorSeverity::Critical
    }
}

impl From<std::io::Error> for ZoomError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}
