//! Declare an error type for the tor-dirspool crate.

use thiserror::Error;
use tor_dircommon::DocDigest;

/// An error originated while spooling directory documents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The document a resource refers to isn't available.
    ///
    /// The connection should answer with a 404 for this resource.
    #[error("no document found for {0}")]
    NotFound(DocDigest),
    /// A resource was constructed with arguments that don't make sense
    /// for its source.
    #[error("bad spooled resource: {0}")]
    BadArgument(&'static str),
    /// A request key could not be turned into a list of resources.
    #[error("can't parse resource key {0:?}")]
    BadResourceKey(String),
}
