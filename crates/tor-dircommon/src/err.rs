//! Declare an error type for the tor-dircommon crate.

use thiserror::Error;

/// An error from parsing one of the shared directory types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A hexadecimal string could not be decoded.
    #[error("invalid hexadecimal in {0:?}")]
    BadHex(String),
    /// An identity or digest had the wrong number of bytes.
    #[error("wrong length for {what}: got {got} bytes")]
    BadLength {
        /// What we were trying to decode.
        what: &'static str,
        /// How many bytes we actually found.
        got: usize,
    },
    /// A timestamp could not be parsed.
    #[error("invalid time {0:?}: {1}")]
    BadTime(String, String),
}
