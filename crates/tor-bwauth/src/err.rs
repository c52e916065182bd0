//! Declare an error type for the tor-bwauth crate.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// An error originated while reading a bandwidth or guardfraction file.
///
/// Most of these describe a single bad line, and are recovered from by
/// skipping that line.  The ones that describe a whole file (a bad
/// timestamp, a stale file, a bad guardfraction header) make the whole
/// read fail.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A line contained nothing but whitespace.
    #[error("empty line")]
    EmptyLine,
    /// The last line of a file did not end with a newline.
    #[error("line truncated before newline")]
    TruncatedLine,
    /// A token appeared more than once on a single line.
    #[error("duplicate {0}= entry")]
    DuplicateToken(&'static str),
    /// A line was missing a token that it needed.
    #[error("missing {0}= entry")]
    MissingToken(&'static str),
    /// A `bw=` value was not a non-negative decimal integer.
    #[error("invalid bandwidth {0:?}")]
    BadBandwidth(String),
    /// A `node_id=` or `nickname=` value was malformed.
    #[error("invalid node identity {0:?}")]
    BadNodeId(String),
    /// A line in the header block is a header, not a relay line.
    ///
    /// This is only returned when parsing before the end of the headers.
    #[error("line is a bandwidth file header")]
    HeaderLine,
    /// A line in the header block is neither a relay line nor a valid header.
    #[error("invalid header line {0:?}")]
    BadHeaderLine(String),
    /// The file was empty.
    #[error("empty file")]
    EmptyFile,
    /// The first line of a bandwidth file was not a timestamp.
    #[error("invalid timestamp line {0:?}")]
    BadTimestamp(String),
    /// A bandwidth file was too old to use.
    #[error("bandwidth file is stale ({0:?} old)")]
    StaleFile(Duration),
    /// A guardfraction file declared a version we don't know.
    #[error("unrecognized guardfraction file version {0:?}")]
    BadGuardFractionVersion(String),
    /// A guardfraction file had an unparseable `written-at` line.
    #[error("bad guardfraction date {0:?}")]
    BadGuardFractionDate(String),
    /// A guardfraction file was written too long ago.
    #[error("guardfraction file was written too long ago ({0:?})")]
    GuardFractionTooOld(String),
    /// A single guard line in a guardfraction file was malformed.
    #[error("bad guard line: {0}")]
    BadGuardLine(String),
    /// We couldn't read a file.
    #[error("couldn't read {0}")]
    Io(String, #[source] Arc<std::io::Error>),
    /// A background reader went away without telling us what happened.
    #[error("background file reader exited without a result")]
    WorkerGone,
}
