//! Error types for the Strato engine
//!
//! This module defines the error types used throughout the engine,
//! including device submission, buffer allocation, and configuration.
//!
//! Read-back failures, object pool exhaustion and double unregistration
//! are not errors: they are recovered locally or surfaced as `None`.

use std::fmt;

/// Result type for Strato engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Strato engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Compute backend error (dispatch, upload, read-back request)
    BackendError(String),

    /// Out of device memory
    OutOfMemory,

    /// Invalid resource (unknown buffer key, mismatched buffer size, etc.)
    InvalidResource(String),

    /// Configuration rejected by validation
    InvalidConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of device memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::BackendError` from it
///
/// # Example
///
/// ```no_run
/// use strato_engine::engine_err;
///
/// let err = engine_err!("strato::cpu", "Read-back {} lost", 3);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::strato::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with an `Error::BackendError`
///
/// # Example
///
/// ```no_run
/// use strato_engine::engine_bail;
///
/// fn submit(count: usize) -> strato_engine::strato::Result<()> {
///     if count == 0 {
///         engine_bail!("strato::cpu", "Empty submission");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
