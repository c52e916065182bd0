//! Types shared by the directory server crates.
//!
//! A directory server spends most of its time identifying things: relays
//! by the SHA1 digest of their RSA identity key, documents by a 256-bit
//! digest, and directory servers by the kinds of directory information
//! they can serve.  This crate holds those types, along with the small
//! time-parsing helpers that the directory file formats need.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

mod dirinfo;
mod err;
mod ids;
pub mod time;

pub use dirinfo::DirInfo;
pub use err::Error;
pub use ids::{DocDigest, RsaIdentity, DOC_DIGEST_LEN, RSA_ID_LEN};

/// Alias for the Result type returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;
