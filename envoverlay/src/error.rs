//! Error types for the envoverlay library.
//!
//! An overlay pass fails in exactly two ways: the root handed to it is not a
//! record, or an environment variable holds a value the decoder rejects.
//! Absent variables are never an error.

use thiserror::Error;

/// Boxed error returned by [`Decoder`](crate::Decoder) implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for overlay operations.
///
/// # Examples
///
/// ```
/// use envoverlay::{Error, Result};
///
/// fn example_operation() -> Result<usize> {
///     Ok(3)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the envoverlay library.
#[derive(Debug, Error)]
pub enum Error {
    /// The value handed to the overlay pass is not a record.
    ///
    /// Only reachable through dynamically typed roots such as
    /// `serde_json::Value`; typed roots are checked by the compiler.
    #[error("overlay root must be a record, found {found}")]
    InvalidRootKind {
        /// The kind of value that was found at the root.
        found: &'static str,
    },

    /// An environment variable was set but its value could not be decoded
    /// into the type of the field it targets.
    #[error("cannot decode {variable} as {format}: {source}")]
    Decode {
        /// The environment variable holding the bad value.
        variable: String,
        /// The name of the decoder's format (e.g. "yaml").
        format: &'static str,
        /// The underlying decoder error.
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Check if the error was caused by an undecodable override value.
    ///
    /// # Examples
    ///
    /// ```
    /// use envoverlay::Error;
    ///
    /// let err = Error::InvalidRootKind { found: "string" };
    /// assert!(!err.is_decode());
    /// ```
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Check if the error was caused by a non-record root.
    #[must_use]
    pub fn is_invalid_root(&self) -> bool {
        matches!(self, Self::InvalidRootKind { .. })
    }

    /// The environment variable responsible for the error, if any.
    #[must_use]
    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::Decode { variable, .. } => Some(variable),
            Self::InvalidRootKind { .. } => None,
        }
    }
}
