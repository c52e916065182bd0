//! Parsing for individual lines of a bandwidth file.
//!
//! A bandwidth file, as produced by a bandwidth scanner, looks like this:
//!
//! ```text
//! 1523911758
//! version=1.1.0
//! software=sbws
//! =====
//! bw=760 nick=Test node_id=$9C7E9C4E2D27B30B8B3C26E5D8D58EFDDC5C6E4E
//! bw=1024 node_id=$557365204145532d32353620696e73746561642e
//! ```
//!
//! The first line is a timestamp, and the lines up to the `=====`
//! terminator are `key=value` headers.  Everything after that is one
//! relay per line.  Relay lines are whitespace-separated `key=value`
//! tokens; we only look at the ones we understand, so that scanners can
//! add new ones.

use crate::{Error, Result};
use tor_dircommon::RsaIdentity;

/// Longest header line that we accept, not counting the newline.
pub const MAX_HEADER_LINE_LEN: usize = 128;

/// Longest relay nickname that we accept.
pub const MAX_NICKNAME_LEN: usize = 19;

/// Longest value for [`MeasuredBwLine::node_hex`]: a `$` and 40 hex digits.
pub const MAX_HEX_NICKNAME_LEN: usize = 41;

/// One relay's measured bandwidth, as parsed from a bandwidth file.
///
/// Every line names its relay by `node_id=` (preferred) or by
/// `nickname=`.  Lines that only carry a nickname get their identity
/// filled in when they are matched against a vote's routerstatuses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeasuredBwLine {
    /// The relay's RSA identity, if we know it.
    node_id: Option<RsaIdentity>,
    /// The relay's nickname, if the line gave one.
    nickname: Option<String>,
    /// Printable name for this relay: `$` and hex if we had an identity
    /// when parsing, otherwise the nickname.
    node_hex: String,
    /// Measured bandwidth, in kilobytes per second.
    bw_kb: i64,
}

impl MeasuredBwLine {
    /// Parse a single line from a bandwidth file.
    ///
    /// `after_headers` should be true once we've passed the `=====`
    /// terminator, or seen a complete relay line.  Before that point, a
    /// line that isn't a relay line gives [`Error::HeaderLine`] if it is
    /// a well-formed header, and [`Error::BadHeaderLine`] otherwise.
    ///
    /// A single trailing newline is ignored.
    pub fn parse(line: &str, after_headers: bool) -> Result<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        if line.trim().is_empty() {
            return Err(Error::EmptyLine);
        }

        let mut bw_kb = None;
        let mut node_id = None;
        let mut nickname = None;

        for tok in line.split(|c| c == ' ' || c == '\t').filter(|t| !t.is_empty()) {
            if let Some(v) = tok.strip_prefix("bw=") {
                if bw_kb.is_some() {
                    return Err(Error::DuplicateToken("bw"));
                }
                bw_kb = Some(parse_bw(v)?);
            } else if let Some(v) = tok.strip_prefix("node_id=") {
                if node_id.is_some() {
                    return Err(Error::DuplicateToken("node_id"));
                }
                node_id = Some(parse_node_id(v)?);
            } else if let Some(v) = tok
                .strip_prefix("nick=")
                .or_else(|| tok.strip_prefix("nickname="))
            {
                if nickname.is_some() {
                    return Err(Error::DuplicateToken("nickname"));
                }
                if !is_legal_nickname(v) {
                    return Err(Error::BadNodeId(v.to_string()));
                }
                nickname = Some(v.to_string());
            }
            // Anything else is a token we don't know about yet.
        }

        let missing = |what: &'static str| -> Result<Self> {
            if after_headers {
                Err(Error::MissingToken(what))
            } else if is_valid_header_line(line) {
                Err(Error::HeaderLine)
            } else {
                Err(Error::BadHeaderLine(line.to_string()))
            }
        };

        let (bw_kb, node_hex) = match (bw_kb, &node_id, &nickname) {
            (Some(bw), Some(id), _) => (bw, id.to_string()),
            (Some(bw), None, Some(nick)) => (bw, nick.clone()),
            (Some(_), None, None) => return missing("node_id"),
            (None, _, _) => return missing("bw"),
        };

        Ok(MeasuredBwLine {
            node_id,
            nickname,
            node_hex,
            bw_kb,
        })
    }

    /// Return the identity of the relay this line describes, if known.
    pub fn node_id(&self) -> Option<&RsaIdentity> {
        self.node_id.as_ref()
    }

    /// Return the nickname given on this line, if any.
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Return a printable name for the relay this line describes.
    pub fn node_hex(&self) -> &str {
        &self.node_hex
    }

    /// Return the measured bandwidth, in kilobytes.
    pub fn bw_kb(&self) -> i64 {
        self.bw_kb
    }

    /// Record that this line's relay has identity `id`.
    ///
    /// Used after a nickname-only line has been matched to a routerstatus.
    pub(crate) fn resolve(&mut self, id: RsaIdentity) {
        self.node_id = Some(id);
    }
}

/// Parse the value of a `bw=` token.
fn parse_bw(v: &str) -> Result<i64> {
    match v.parse::<i64>() {
        Ok(bw) if bw >= 0 => Ok(bw),
        _ => Err(Error::BadBandwidth(v.to_string())),
    }
}

/// Parse the value of a `node_id=` token: 40 hex digits, optionally
/// preceded by a `$`.
fn parse_node_id(v: &str) -> Result<RsaIdentity> {
    let hex = v.strip_prefix('$').unwrap_or(v);
    if hex.len() + 1 != MAX_HEX_NICKNAME_LEN {
        return Err(Error::BadNodeId(v.to_string()));
    }
    RsaIdentity::from_hex(hex).map_err(|_| Error::BadNodeId(v.to_string()))
}

/// Return true if `s` could be a relay's nickname.
fn is_legal_nickname(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_NICKNAME_LEN && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Return true if `line` is acceptable as a bandwidth file header.
///
/// Headers are `key=value`, with no whitespace, made only of printable
/// ASCII, and no longer than [`MAX_HEADER_LINE_LEN`].
pub fn is_valid_header_line(line: &str) -> bool {
    let line = line.strip_suffix('\n').unwrap_or(line);
    if line.len() > MAX_HEADER_LINE_LEN {
        return false;
    }
    if !line.bytes().all(|b| b.is_ascii_graphic()) {
        return false;
    }
    match line.find('=') {
        Some(idx) => idx > 0,
        None => false,
    }
}
