//! Looking up the documents that spooled resources refer to.

use crate::cached::{CachedConsensusMap, CachedDir};
use crate::source::{DocKind, SpoolSource};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tor_dircommon::DocDigest;

/// A small document found in a [`SpoolStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoredDoc<'a> {
    /// The document's body.
    pub body: &'a [u8],
    /// When the document was published, if it has a publication time.
    pub published: Option<SystemTime>,
}

/// Something that can find the documents we spool.
///
/// This is how a spool queue finds out about descriptor stores and
/// cached consensus documents without owning them.
pub trait SpoolStore {
    /// Find the small document named by `digest` in `source`.
    ///
    /// Only called for sources that spool eagerly.
    fn lookup_body(&self, source: SpoolSource, digest: &DocDigest) -> Option<StoredDoc<'_>>;

    /// Find the large shared document named by `digest` in `source`.
    ///
    /// Only called for [`SpoolSource::NetworkStatus`].
    fn lookup_cached_dir(&self, source: SpoolSource, digest: &DocDigest) -> Option<Arc<CachedDir>>;
}

/// A document held by a [`MemoryStore`].
#[derive(Clone, Debug)]
struct Entry {
    /// Body of the document.
    body: Vec<u8>,
    /// When it was published, if known.
    published: Option<SystemTime>,
}

/// A [`SpoolStore`] that keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    /// Documents by kind and digest.
    docs: HashMap<(DocKind, DocDigest), Entry>,
    /// Current document digest for each relay identity, by kind.
    by_fingerprint: HashMap<(DocKind, DocDigest), DocDigest>,
    /// The consensus documents we serve.
    consensuses: CachedConsensusMap,
}

impl MemoryStore {
    /// Construct a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document of kind `kind`.
    ///
    /// If `fingerprint` is given, the document becomes the current one
    /// for that relay.
    pub fn insert(
        &mut self,
        kind: DocKind,
        digest: DocDigest,
        fingerprint: Option<DocDigest>,
        body: impl Into<Vec<u8>>,
        published: Option<SystemTime>,
    ) {
        let body = body.into();
        self.docs.insert((kind, digest), Entry { body, published });
        if let Some(fp) = fingerprint {
            self.by_fingerprint.insert((kind, fp), digest);
        }
    }

    /// Remove the document of kind `kind` with digest `digest`.
    pub fn remove(&mut self, kind: DocKind, digest: &DocDigest) -> bool {
        self.by_fingerprint
            .retain(|(k, _), d| !(*k == kind && *d == *digest));
        self.docs.remove(&(kind, *digest)).is_some()
    }

    /// Return the consensus documents in this store.
    pub fn consensuses(&self) -> &CachedConsensusMap {
        &self.consensuses
    }

    /// Return the consensus documents in this store, mutably.
    pub fn consensuses_mut(&mut self) -> &mut CachedConsensusMap {
        &mut self.consensuses
    }
}

impl SpoolStore for MemoryStore {
    fn lookup_body(&self, source: SpoolSource, digest: &DocDigest) -> Option<StoredDoc<'_>> {
        let kind = source.doc_kind()?;
        let digest = if source.by_fingerprint() {
            self.by_fingerprint.get(&(kind, *digest))?
        } else {
            digest
        };
        self.docs.get(&(kind, *digest)).map(|e| StoredDoc {
            body: &e.body[..],
            published: e.published,
        })
    }

    fn lookup_cached_dir(&self, source: SpoolSource, digest: &DocDigest) -> Option<Arc<CachedDir>> {
        match source {
            SpoolSource::NetworkStatus => self.consensuses.get_by_digest(digest),
            _ => None,
        }
    }
}
