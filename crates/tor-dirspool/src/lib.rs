//! Spooling directory documents to directory connections.
//!
//! # Overview
//!
//! This crate is part of
//! [Arti](https://gitlab.torproject.org/tpo/core/arti/), a project to
//! implement [Tor](https://www.torproject.org/) in Rust.
//!
//! A directory cache answers requests for many documents at once, some
//! of them several megabytes long, and it answers many connections at
//! once.  Rather than building each response in memory, each connection
//! keeps a [`SpoolQueue`] of [`SpooledResource`]s, and puts a few
//! kilobytes of output at a time onto its outgoing buffer whenever that
//! buffer drains.
//!
//! Small documents (descriptors and microdescriptors) are looked up and
//! sent whole.  Large ones (consensus documents) are shared between
//! connections behind an [`Arc`](std::sync::Arc), and each resource keeps
//! its own position in the document.  A document is freed when the last
//! connection sending it finishes or closes.
//!
//! This crate doesn't do any networking: connections are represented by
//! the [`SpoolSink`] trait, and document storage by the [`SpoolStore`]
//! trait.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

mod cached;
mod err;
mod queue;
pub mod request;
mod resource;
mod sink;
mod source;
mod store;

pub use cached::{CachedConsensusMap, CachedDir, ConsensusCacheEntry, DEFAULT_FLAVOR};
pub use err::Error;
pub use queue::{SpoolEstimate, SpoolProgress, SpoolQueue, SPOOL_BUFFER_MIN};
pub use resource::{FlushStatus, SpoolState, SpooledResource, CACHED_DIR_CHUNK_SIZE};
pub use sink::{MemorySink, SpoolSink, WriteSink};
pub use source::{DocKind, SpoolSource};
pub use store::{MemoryStore, SpoolStore, StoredDoc};

/// A Result as returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;
