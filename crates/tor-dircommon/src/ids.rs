//! Relay identities and document digests.
//!
//! Relays are named by an [`RsaIdentity`]: the SHA1 digest of their
//! legacy RSA identity key.  Directory documents that we spool are named
//! by a [`DocDigest`], which is wide enough for a SHA256 or SHA3-256
//! digest; shorter digests are zero-padded into it.

use crate::{Error, Result};

use std::convert::TryInto;
use std::fmt;
use subtle::ConstantTimeEq;

/// How many bytes are in an "RSA ID"?
pub const RSA_ID_LEN: usize = 20;

/// How many bytes are in a [`DocDigest`]?
pub const DOC_DIGEST_LEN: usize = 32;

/// An identifier for a Tor relay, based on its legacy RSA identity key.
///
/// Identities are ordered bytewise, which is the order in which vote
/// routerstatus lists are kept.
#[derive(Clone, Copy, Eq, PartialOrd, Ord)]
pub struct RsaIdentity {
    /// SHA1 digest of a DER-encoded RSA public key.
    id: [u8; RSA_ID_LEN],
}

impl PartialEq<RsaIdentity> for RsaIdentity {
    fn eq(&self, rhs: &RsaIdentity) -> bool {
        self.id.ct_eq(&rhs.id).unwrap_u8() == 1
    }
}

impl std::hash::Hash for RsaIdentity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for RsaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", hex::encode_upper(&self.id[..]))
    }
}
impl fmt::Debug for RsaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RsaIdentity {{ {} }}", self)
    }
}

impl RsaIdentity {
    /// Expose an RsaIdentity as a slice of bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.id[..]
    }

    /// Construct an RsaIdentity from a slice of bytes.
    ///
    /// Returns None if the input is not of the correct length.
    ///
    /// ```
    /// use tor_dircommon::RsaIdentity;
    ///
    /// let bytes = b"xyzzyxyzzyxyzzyxyzzy";
    /// let id = RsaIdentity::from_bytes(bytes);
    /// assert_eq!(id.unwrap().as_bytes(), bytes);
    ///
    /// assert_eq!(RsaIdentity::from_bytes(b"xyzzy"), None);
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let id: [u8; RSA_ID_LEN] = bytes.try_into().ok()?;
        Some(RsaIdentity { id })
    }

    /// Decode an RsaIdentity from exactly 40 hexadecimal digits.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::BadHex(s.to_string()))?;
        RsaIdentity::from_bytes(&bytes).ok_or(Error::BadLength {
            what: "RSA identity",
            got: bytes.len(),
        })
    }

    /// Return true if every byte of this identity is zero.
    pub fn is_zero(&self) -> bool {
        self.id.iter().all(|b| *b == 0)
    }
}

/// A 256-bit name for a spooled document.
///
/// Descriptors and extra-info documents are named by 20-byte SHA1
/// digests; microdescriptors and consensus documents use 32 bytes.  We
/// keep them all in one fixed-size array so they sort and compare the
/// same way.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct DocDigest([u8; DOC_DIGEST_LEN]);

impl DocDigest {
    /// Construct a digest from a slice of any length.
    ///
    /// Short inputs are zero-padded on the right; long inputs are
    /// truncated.
    pub fn from_slice_padded(bytes: &[u8]) -> Self {
        let mut d = [0_u8; DOC_DIGEST_LEN];
        let n = bytes.len().min(DOC_DIGEST_LEN);
        d[..n].copy_from_slice(&bytes[..n]);
        DocDigest(d)
    }

    /// Return the bytes of this digest.
    pub fn as_bytes(&self) -> &[u8; DOC_DIGEST_LEN] {
        &self.0
    }
}

impl From<[u8; DOC_DIGEST_LEN]> for DocDigest {
    fn from(d: [u8; DOC_DIGEST_LEN]) -> Self {
        DocDigest(d)
    }
}

impl fmt::Display for DocDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(&self.0[..]))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn rsa_identity() -> Result<()> {
        let fp = "7467A97D19CD2B4F2BC0388AA99C5E67710F847E";
        let id = RsaIdentity::from_hex(fp)?;
        assert_eq!(id.as_bytes(), &hex!("7467A97D19CD2B4F2BC0388AA99C5E67710F847E"));
        assert_eq!(id.to_string(), format!("${}", fp));

        assert!(RsaIdentity::from_hex("7467A97D19CD2B4F2BC0388AA99C5E67710F84").is_err());
        assert!(RsaIdentity::from_hex("7467A97D19CD2B4F2BC0388AA99C5E67710F847Q").is_err());
        assert!(!id.is_zero());
        assert!(RsaIdentity::from_bytes(&[0; 20]).unwrap().is_zero());
        Ok(())
    }

    #[test]
    fn ordering() {
        let a = RsaIdentity::from_bytes(&[1; 20]).unwrap();
        let b = RsaIdentity::from_bytes(&[2; 20]).unwrap();
        assert!(a < b);
    }

    #[test]
    fn padded_digest() {
        let d = DocDigest::from_slice_padded(&[7; 20]);
        assert_eq!(&d.as_bytes()[..20], &[7; 20]);
        assert_eq!(&d.as_bytes()[20..], &[0; 12]);

        let d = DocDigest::from_slice_padded(&[9; 40]);
        assert_eq!(d.as_bytes(), &[9; 32]);
    }
}
