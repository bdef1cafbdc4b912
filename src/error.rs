//! Error types for resumable JSON writing.
//!
//! Every error surfaced by the engine is terminal for the write in progress.
//! Normal suspension ("call me again after a flush") is not an error; it is
//! reported as `Ok(false)` by [`JsonWrite::write_json`](crate::JsonWrite::write_json).
//!
//! ## Error Categories
//!
//! - **Protocol violations**: the engine was re-entered with a different value than
//!   the one a suspended frame expects, or a collection changed between calls
//! - **Encoding failures**: the text encoder refused its input (for example an
//!   unpaired UTF-16 surrogate)
//! - **Capacity exhaustion**: the sink hit its hard limit
//! - **I/O errors**: draining the sink into its writer failed
//!
//! Bytes already committed to the sink are never retracted. Output is append-only.
//!
//! ## Examples
//!
//! ```rust
//! use chunked_json::Error;
//!
//! let err = Error::protocol("expected array frame");
//! assert!(err.is_protocol());
//! assert!(err.to_string().contains("expected array frame"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while writing JSON.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error while draining the sink
    #[error("IO error: {0}")]
    Io(String),

    /// The engine was re-entered in a way that does not match the suspended frames
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// The text or binary encoder rejected its input
    #[error("Encoding failure at unit {offset}: {msg}")]
    Encoding { offset: usize, msg: String },

    /// The sink cannot grow any further
    #[error("Sink capacity exhausted: {requested} bytes requested, hard limit is {limit} bytes")]
    CapacityExhausted { requested: usize, limit: usize },

    /// No writer is known for the runtime type
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A scalar encoder rejected the value itself (e.g. NaN with strict float handling)
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a protocol violation error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunked_json::Error;
    ///
    /// let err = Error::protocol("collection was modified");
    /// assert!(err.to_string().starts_with("Protocol violation"));
    /// ```
    pub fn protocol(msg: &str) -> Self {
        Error::Protocol(msg.to_string())
    }

    /// Creates an encoding failure located at `offset` input units into the value.
    pub fn encoding(offset: usize, msg: &str) -> Self {
        Error::Encoding {
            offset,
            msg: msg.to_string(),
        }
    }

    pub fn capacity_exhausted(requested: usize, limit: usize) -> Self {
        Error::CapacityExhausted { requested, limit }
    }

    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates an error for a scalar the encoder cannot represent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunked_json::Error;
    ///
    /// let err = Error::invalid_value("NaN is not representable");
    /// assert!(err.to_string().contains("NaN"));
    /// ```
    pub fn invalid_value(msg: &str) -> Self {
        Error::InvalidValue(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for sink drain failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns `true` for protocol violations.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }

    /// Returns `true` for encoder failures.
    #[must_use]
    pub const fn is_encoding(&self) -> bool {
        matches!(self, Error::Encoding { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
