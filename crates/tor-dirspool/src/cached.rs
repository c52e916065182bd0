//! Large documents that are shared among many connections.
//!
//! A consensus can be a few megabytes, and every client wants it.  We
//! keep one copy of each, in plain and zlib-compressed form, behind an
//! [`Arc`].  Every connection that is sending the document holds a
//! reference, so the document stays alive until the last of them is
//! done even after a newer one replaces it.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tor_dircommon::DocDigest;
use tracing::debug;

/// zlib compression level for cached documents.
const COMPRESSION_LEVEL: u8 = 6;

/// Compute the digest we use to name a document body.
fn body_digest(body: &[u8]) -> DocDigest {
    let d: [u8; 32] = Sha256::digest(body).into();
    d.into()
}

/// A large directory document, with a precompressed copy.
#[derive(Clone, Debug)]
pub struct CachedDir {
    /// The document itself.
    body: Vec<u8>,
    /// The document, zlib-compressed.
    compressed: Vec<u8>,
    /// When the document was published.
    published: SystemTime,
    /// SHA256 digest of `body`.
    digest: DocDigest,
}

impl CachedDir {
    /// Make a new cached document from `body`, compressing it.
    pub fn new(body: impl Into<Vec<u8>>, published: SystemTime) -> Self {
        let body = body.into();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&body, COMPRESSION_LEVEL);
        let digest = body_digest(&body);
        CachedDir {
            body,
            compressed,
            published,
            digest,
        }
    }

    /// Return the uncompressed document.
    pub fn body(&self) -> &[u8] {
        &self.body[..]
    }

    /// Return the compressed document.
    pub fn compressed(&self) -> &[u8] {
        &self.compressed[..]
    }

    /// Return the document in the encoding a connection wants.
    pub fn encoded(&self, compressed: bool) -> &[u8] {
        if compressed {
            self.compressed()
        } else {
            self.body()
        }
    }

    /// Return when this document was published.
    pub fn published(&self) -> SystemTime {
        self.published
    }

    /// Return the SHA256 digest of the uncompressed document.
    pub fn digest(&self) -> &DocDigest {
        &self.digest
    }
}

/// A document from the consensus cache.
///
/// Unlike a [`CachedDir`], the body of a cache entry is stored already
/// in the encoding that it will be sent in.
#[derive(Clone, Debug)]
pub struct ConsensusCacheEntry {
    /// The encoded document.
    body: Vec<u8>,
    /// When the document becomes valid.
    valid_after: SystemTime,
    /// SHA256 digest of `body`.
    digest: DocDigest,
}

impl ConsensusCacheEntry {
    /// Make a new cache entry holding `body`.
    pub fn new(body: impl Into<Vec<u8>>, valid_after: SystemTime) -> Self {
        let body = body.into();
        let digest = body_digest(&body);
        ConsensusCacheEntry {
            body,
            valid_after,
            digest,
        }
    }

    /// Return the body of this entry.
    pub fn body(&self) -> &[u8] {
        &self.body[..]
    }

    /// Return the valid-after time of this entry.
    pub fn valid_after(&self) -> SystemTime {
        self.valid_after
    }

    /// Return the SHA256 digest of this entry's body.
    pub fn digest(&self) -> &DocDigest {
        &self.digest
    }
}

/// The consensus flavor that an all-zero digest refers to.
pub const DEFAULT_FLAVOR: &str = "ns";

/// The consensus documents we are currently serving, by flavor.
#[derive(Debug, Default, Clone)]
pub struct CachedConsensusMap {
    /// Map from flavor name to the latest consensus of that flavor.
    by_flavor: HashMap<String, Arc<CachedDir>>,
}

impl CachedConsensusMap {
    /// Construct a new empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start serving `body` as the consensus of flavor `flavor`.
    ///
    /// Connections that are already sending the previous consensus
    /// keep their reference to it.
    pub fn set(&mut self, flavor: &str, body: impl Into<Vec<u8>>, published: SystemTime) -> Arc<CachedDir> {
        let dir = Arc::new(CachedDir::new(body, published));
        debug!("Caching new {} consensus, digest {}", flavor, dir.digest());
        self.by_flavor.insert(flavor.to_string(), Arc::clone(&dir));
        dir
    }

    /// Return the consensus of flavor `flavor`, if we have one.
    pub fn get(&self, flavor: &str) -> Option<Arc<CachedDir>> {
        self.by_flavor.get(flavor).cloned()
    }

    /// Return the consensus with digest `digest`, if we have one.
    ///
    /// An all-zero digest means "the current consensus of the default
    /// flavor".
    pub fn get_by_digest(&self, digest: &DocDigest) -> Option<Arc<CachedDir>> {
        if *digest == DocDigest::default() {
            return self.get(DEFAULT_FLAVOR);
        }
        self.by_flavor
            .values()
            .find(|d| d.digest() == digest)
            .cloned()
    }

    /// Stop serving every consensus published before `cutoff`.
    ///
    /// Returns the number of documents removed.
    pub fn clear_old(&mut self, cutoff: SystemTime) -> usize {
        let before = self.by_flavor.len();
        self.by_flavor.retain(|_, d| d.published() >= cutoff);
        before - self.by_flavor.len()
    }

    /// Return the number of consensus documents we're serving.
    pub fn len(&self) -> usize {
        self.by_flavor.len()
    }

    /// Return true if we aren't serving any consensus documents.
    pub fn is_empty(&self) -> bool {
        self.by_flavor.is_empty()
    }
}
