//! Turning the resource part of a directory request into spooled resources.
//!
//! Descriptor requests look like `d/<hex>+<hex>+...` (by document digest)
//! or `fp/<hex>+<hex>+...` (by relay identity).  Microdescriptor
//! requests look like `d/<base64>-<base64>-...`, with unpadded base64
//! SHA256 digests.  Any of these may end with `.z`.

use crate::resource::SpooledResource;
use crate::source::{DocKind, SpoolSource};
use crate::{Error, Result};

use tracing::warn;

/// Length of an unpadded base64 SHA256 digest.
const B64_DIGEST256_LEN: usize = 43;

/// Parse `key` as a request for documents of kind `kind`, and return one
/// resource for each distinct document it names, sorted by digest.
///
/// Malformed digests are skipped.
pub fn parse_resource_key(key: &str, kind: DocKind) -> Result<Vec<SpooledResource>> {
    let key = key.strip_suffix(".z").unwrap_or(key);
    let (source, list) = match (kind, key.split_once('/')) {
        (DocKind::Server, Some(("d", list))) => (SpoolSource::ServerByDigest, list),
        (DocKind::Server, Some(("fp", list))) => (SpoolSource::ServerByFingerprint, list),
        (DocKind::ExtraInfo, Some(("d", list))) => (SpoolSource::ExtraInfoByDigest, list),
        (DocKind::ExtraInfo, Some(("fp", list))) => (SpoolSource::ExtraInfoByFingerprint, list),
        (DocKind::Microdesc, Some(("d", list))) => (SpoolSource::Microdescriptor, list),
        _ => return Err(Error::BadResourceKey(key.to_string())),
    };

    let len = source.digest_len();
    let mut digests: Vec<Vec<u8>> = if source == SpoolSource::Microdescriptor {
        list.split('-')
            .filter_map(|s| decode_b64_digest(s, len).or_else(|| skip(s)))
            .collect()
    } else {
        list.split('+')
            .filter_map(|s| decode_hex_digest(s, len).or_else(|| skip(s)))
            .collect()
    };
    digests.sort();
    digests.dedup();

    digests
        .iter()
        .map(|d| SpooledResource::new(source, d))
        .collect()
}

/// Log that we're skipping the malformed digest `s`.
fn skip(s: &str) -> Option<Vec<u8>> {
    if !s.is_empty() {
        warn!("Skipping malformed digest {:?} in request", s);
    }
    None
}

/// Decode a hex-encoded digest of exactly `len` bytes.
fn decode_hex_digest(s: &str, len: usize) -> Option<Vec<u8>> {
    if s.len() != len * 2 {
        return None;
    }
    hex::decode(s).ok()
}

/// Decode an unpadded base64 digest of exactly `len` bytes.
fn decode_b64_digest(s: &str, len: usize) -> Option<Vec<u8>> {
    if s.len() != B64_DIGEST256_LEN {
        return None;
    }
    base64::decode_config(s, base64::STANDARD_NO_PAD)
        .ok()
        .filter(|d| d.len() == len)
}
