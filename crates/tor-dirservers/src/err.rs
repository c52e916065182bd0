//! Declare an error type for the tor-dirservers crate.

use thiserror::Error;

/// An error originated while choosing directory servers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A `DirAuthority` or `FallbackDir` line couldn't be parsed.
    #[error("bad {kind} line {line:?}: {problem}")]
    BadDirLine {
        /// Which kind of line this was.
        kind: &'static str,
        /// The line itself.
        line: String,
        /// What was wrong with it.
        problem: String,
    },
    /// Two configuration options can't be used together.
    #[error("configuration conflict: {0}")]
    ConfigConflict(&'static str),
    /// A directory server was described with missing or impossible values.
    #[error("bad directory server: {0}")]
    BadDirServer(&'static str),
}
