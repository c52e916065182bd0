//! Where the bytes of a spooled resource come from.

use tor_dircommon::{DOC_DIGEST_LEN, RSA_ID_LEN};

/// A way of turning a digest into the bytes of a directory document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum SpoolSource {
    /// A server descriptor, named by its SHA1 digest.
    ServerByDigest,
    /// The current server descriptor of a relay, named by its identity.
    ServerByFingerprint,
    /// An extra-info document, named by its SHA1 digest.
    ExtraInfoByDigest,
    /// The current extra-info document of a relay, named by its identity.
    ExtraInfoByFingerprint,
    /// A microdescriptor, named by its SHA256 digest.
    Microdescriptor,
    /// A cached network-status document (a consensus).
    NetworkStatus,
    /// An entry from the consensus cache.
    ConsensusCacheEntry,
}

/// The kinds of small document that a [`SpoolStore`](crate::SpoolStore)
/// holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DocKind {
    /// Server descriptors.
    Server,
    /// Extra-info documents.
    ExtraInfo,
    /// Microdescriptors.
    Microdesc,
}

impl SpoolSource {
    /// Return true if resources from this source are sent all at once.
    ///
    /// Small documents are put on the connection whole.  Large ones are
    /// kept behind a shared reference and sent a chunk at a time.
    pub fn spools_eagerly(self) -> bool {
        !matches!(
            self,
            SpoolSource::NetworkStatus | SpoolSource::ConsensusCacheEntry
        )
    }

    /// Return true if this source names documents by relay identity
    /// rather than by document digest.
    pub fn by_fingerprint(self) -> bool {
        matches!(
            self,
            SpoolSource::ServerByFingerprint | SpoolSource::ExtraInfoByFingerprint
        )
    }

    /// Return the kind of stored document this source looks up, if it
    /// is an eager source.
    pub fn doc_kind(self) -> Option<DocKind> {
        match self {
            SpoolSource::ServerByDigest | SpoolSource::ServerByFingerprint => Some(DocKind::Server),
            SpoolSource::ExtraInfoByDigest | SpoolSource::ExtraInfoByFingerprint => {
                Some(DocKind::ExtraInfo)
            }
            SpoolSource::Microdescriptor => Some(DocKind::Microdesc),
            SpoolSource::NetworkStatus | SpoolSource::ConsensusCacheEntry => None,
        }
    }

    /// Return the number of meaningful bytes in this source's digests.
    pub fn digest_len(self) -> usize {
        match self {
            SpoolSource::Microdescriptor | SpoolSource::ConsensusCacheEntry => DOC_DIGEST_LEN,
            _ => RSA_ID_LEN,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn eagerness() {
        assert!(SpoolSource::ServerByDigest.spools_eagerly());
        assert!(SpoolSource::Microdescriptor.spools_eagerly());
        assert!(!SpoolSource::NetworkStatus.spools_eagerly());
        assert!(!SpoolSource::ConsensusCacheEntry.spools_eagerly());

        assert!(SpoolSource::ExtraInfoByFingerprint.by_fingerprint());
        assert!(!SpoolSource::ExtraInfoByDigest.by_fingerprint());
        assert_eq!(SpoolSource::NetworkStatus.doc_kind(), None);
        assert_eq!(SpoolSource::Microdescriptor.digest_len(), 32);
        assert_eq!(SpoolSource::ServerByDigest.digest_len(), 20);
    }
}
