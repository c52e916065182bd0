//! A single document that a connection has been asked to send.

use crate::cached::{CachedDir, ConsensusCacheEntry};
use crate::sink::SpoolSink;
use crate::source::SpoolSource;
use crate::store::SpoolStore;
use crate::{Error, Result};

use std::sync::Arc;
use std::time::SystemTime;
use tor_dircommon::DocDigest;
use tracing::trace;

/// Largest number of bytes of a shared document we send at once.
pub const CACHED_DIR_CHUNK_SIZE: usize = 8192;

/// Where a [`SpooledResource`] is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpoolState {
    /// Nothing sent yet.
    Pending,
    /// Part of the document has been sent.
    Streaming,
    /// The whole document has been sent.
    Done,
    /// The document couldn't be found.
    Missing,
}

/// What happened when we tried to send part of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushStatus {
    /// We sent some of the resource; there's more to send.
    More,
    /// We've sent the whole resource.
    Done,
    /// We weren't allowed to send anything.
    Blocked,
}

/// The part of a resource that depends on how it's sent.
#[derive(Clone, Debug)]
enum Payload {
    /// A small document, looked up and sent in one piece.
    Eager,
    /// A shared cached document, sent in chunks.  `dir` is filled in the
    /// first time we look at the resource.
    CachedDir {
        /// The document, once resolved.
        dir: Option<Arc<CachedDir>>,
        /// Bytes of the encoded document already sent.
        offset: usize,
    },
    /// A consensus cache entry, sent in chunks.
    CacheEntry {
        /// The entry.
        entry: Arc<ConsensusCacheEntry>,
        /// Bytes of the entry already sent.
        offset: usize,
    },
}

/// A document that a connection is going to send, or is sending.
///
/// Resources that refer to a shared document hold a reference to it
/// until they are dropped.
#[derive(Clone, Debug)]
pub struct SpooledResource {
    /// How to find the document.
    source: SpoolSource,
    /// Which document to find.
    digest: DocDigest,
    /// State for sending.
    payload: Payload,
    /// How far along we are.
    state: SpoolState,
}

impl SpooledResource {
    /// Make a new resource for the document named by `digest` in `source`.
    ///
    /// Digests shorter than 32 bytes are zero-padded; longer ones are
    /// truncated.  Resources for [`SpoolSource::ConsensusCacheEntry`]
    /// can only be made with [`from_cache_entry`](Self::from_cache_entry).
    pub fn new(source: SpoolSource, digest: &[u8]) -> Result<Self> {
        let payload = match source {
            SpoolSource::ConsensusCacheEntry => {
                return Err(Error::BadArgument(
                    "consensus cache entries need an entry, not a digest",
                ))
            }
            SpoolSource::NetworkStatus => Payload::CachedDir {
                dir: None,
                offset: 0,
            },
            _ => Payload::Eager,
        };
        Ok(SpooledResource {
            source,
            digest: DocDigest::from_slice_padded(digest),
            payload,
            state: SpoolState::Pending,
        })
    }

    /// Make a new resource that sends `entry`.
    pub fn from_cache_entry(entry: Arc<ConsensusCacheEntry>) -> Self {
        SpooledResource {
            source: SpoolSource::ConsensusCacheEntry,
            digest: *entry.digest(),
            payload: Payload::CacheEntry { entry, offset: 0 },
            state: SpoolState::Pending,
        }
    }

    /// Return the source of this resource.
    pub fn source(&self) -> SpoolSource {
        self.source
    }

    /// Return the digest that names this resource's document.
    pub fn digest(&self) -> &DocDigest {
        &self.digest
    }

    /// Return the current state of this resource.
    pub fn state(&self) -> SpoolState {
        self.state
    }

    /// Return true if this resource is sent all at once.
    pub fn spools_eagerly(&self) -> bool {
        matches!(self.payload, Payload::Eager)
    }

    /// Return how many bytes of a chunked document we've sent.
    pub fn offset(&self) -> usize {
        match &self.payload {
            Payload::Eager => 0,
            Payload::CachedDir { offset, .. } | Payload::CacheEntry { offset, .. } => *offset,
        }
    }

    /// Guess how many bytes this resource will put on a connection.
    ///
    /// Also returns the time at which the document was published, if it
    /// has one.  A missing document has size 0.
    pub fn estimate_size<S>(&self, store: &S, compressed: bool) -> (usize, Option<SystemTime>)
    where
        S: SpoolStore + ?Sized,
    {
        match &self.payload {
            Payload::Eager => match store.lookup_body(self.source, &self.digest) {
                Some(doc) => (doc.body.len(), doc.published),
                None => (0, None),
            },
            Payload::CachedDir { dir: Some(d), .. } => {
                (d.encoded(compressed).len(), Some(d.published()))
            }
            Payload::CachedDir { dir: None, .. } => {
                match store.lookup_cached_dir(self.source, &self.digest) {
                    Some(d) => (d.encoded(compressed).len(), Some(d.published())),
                    None => (0, None),
                }
            }
            Payload::CacheEntry { entry, .. } => (entry.body().len(), Some(entry.valid_after())),
        }
    }

    /// Put up to `max_bytes` of this resource onto `sink`.
    ///
    /// Small documents are always sent whole.  Shared documents are sent
    /// at most [`CACHED_DIR_CHUNK_SIZE`] bytes at a time; a compressed
    /// sink gets the precompressed form of a cached document.
    ///
    /// Returns [`Error::NotFound`] if the document can't be found, after
    /// which this resource is in the [`SpoolState::Missing`] state.
    pub fn spool_send<S, K>(&mut self, store: &S, sink: &mut K, max_bytes: usize) -> Result<FlushStatus>
    where
        S: SpoolStore + ?Sized,
        K: SpoolSink + ?Sized,
    {
        match self.state {
            SpoolState::Done => return Ok(FlushStatus::Done),
            SpoolState::Missing => return Err(Error::NotFound(self.digest)),
            SpoolState::Pending | SpoolState::Streaming => {}
        }
        if max_bytes == 0 {
            return Ok(FlushStatus::Blocked);
        }

        let source = self.source;
        let digest = self.digest;
        let (data, offset): (&[u8], &mut usize) = match &mut self.payload {
            Payload::Eager => {
                return match store.lookup_body(source, &digest) {
                    Some(doc) => {
                        sink.append(doc.body);
                        self.state = SpoolState::Done;
                        Ok(FlushStatus::Done)
                    }
                    None => {
                        self.state = SpoolState::Missing;
                        Err(Error::NotFound(digest))
                    }
                };
            }
            Payload::CachedDir { dir, offset } => {
                if dir.is_none() {
                    *dir = store.lookup_cached_dir(source, &digest);
                }
                match dir {
                    Some(d) => (d.encoded(sink.is_compressed()), offset),
                    None => {
                        self.state = SpoolState::Missing;
                        return Err(Error::NotFound(digest));
                    }
                }
            }
            Payload::CacheEntry { entry, offset } => (entry.body(), offset),
        };

        let start = (*offset).min(data.len());
        let n = (data.len() - start)
            .min(max_bytes)
            .min(CACHED_DIR_CHUNK_SIZE);
        sink.append_encoded(&data[start..start + n]);
        *offset = start + n;
        trace!("Spooled {} bytes of {}", n, digest);

        if *offset == data.len() {
            self.state = SpoolState::Done;
            Ok(FlushStatus::Done)
        } else {
            self.state = SpoolState::Streaming;
            Ok(FlushStatus::More)
        }
    }
}
