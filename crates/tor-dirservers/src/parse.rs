//! Parsing `DirAuthority` and `FallbackDir` configuration lines.
//!
//! An authority line looks like:
//!
//! ```text
//! moria1 orport=9101 v3ident=D586D18309DED4CD6D57C18FDB97EFA96D330566
//!     128.31.0.39:9131 9695 DFC3 5FFE B861 329B 9F1A B04C 4639 7020 CE31
//! ```
//!
//! That is: an optional nickname, some flags, the IPv4 directory
//! address, and the relay's identity fingerprint (which may contain
//! spaces).  A fallback line looks like:
//!
//! ```text
//! 1.2.3.4:54321 orport=12345 id=50e643986f31ea1235bcc1af17a1c5c5cfc0ee54
//! ```
//!
//! Addresses must be literal IP addresses; we never look up hostnames.

use crate::dirserver::{DirServer, DirServerBuilder};
use crate::{Error, Result};

use std::net::{SocketAddrV4, SocketAddrV6};
use tor_dircommon::{DirInfo, RsaIdentity};
use tracing::{debug, warn};

/// Longest nickname a relay may have.
const MAX_NICKNAME_LEN: usize = 19;

/// Return true if `s` is a legal relay nickname.
fn is_legal_nickname(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_NICKNAME_LEN && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Split a `key=value` token, lowercasing the key.
fn split_flag(tok: &str) -> (String, Option<&str>) {
    match tok.split_once('=') {
        Some((k, v)) => (k.to_ascii_lowercase(), Some(v)),
        None => (tok.to_ascii_lowercase(), None),
    }
}

/// Parse a port number from 1 through 65535.
fn parse_port(s: &str) -> Option<u16> {
    match s.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(p) => Some(p),
    }
}

/// Parse a weight: any non-negative finite number.
fn parse_weight(s: &str) -> Option<f64> {
    match s.parse::<f64>() {
        Ok(w) if w.is_finite() && w >= 0.0 => Some(w),
        _ => None,
    }
}

/// Parse the value of an `ipv6=` flag: `[addr]:port`.
fn parse_ipv6(s: &str) -> Option<SocketAddrV6> {
    match s.parse::<SocketAddrV6>() {
        Ok(a) if a.port() != 0 => Some(a),
        _ => None,
    }
}

/// Parse a `DirAuthority` line.
///
/// If `required` is non-empty, only authorities that provide at least
/// one of the kinds of directory information in `required` are
/// returned; for others, we return `Ok(None)`.
pub fn parse_dir_authority_line(line: &str, required: DirInfo) -> Result<Option<DirServer>> {
    let bad = |problem: &str| Error::BadDirLine {
        kind: "DirAuthority",
        line: line.to_string(),
        problem: problem.to_string(),
    };

    let mut items = line.split_ascii_whitespace().peekable();
    if items.peek().is_none() {
        return Err(bad("no arguments"));
    }

    let nickname = if items.peek().map_or(false, |n| is_legal_nickname(n)) {
        items.next()
    } else {
        None
    };

    let mut dirinfo = DirInfo::empty();
    let mut or_port = 0;
    let mut weight = None;
    let mut v3_identity = None;
    let mut ipv6_orport = None;

    while let Some(&flag) = items.peek() {
        if flag.starts_with(|c: char| c.is_ascii_digit()) {
            break;
        }
        let (key, value) = split_flag(flag);
        match (key.as_str(), value) {
            ("hs", None) | ("no-hs", None) => {
                warn!("The DirAuthority options 'hs' and 'no-hs' are obsolete; you don't need them any more.");
            }
            ("no-v2", None) => {}
            ("bridge", None) => dirinfo |= DirInfo::BRIDGE,
            ("orport", Some(v)) => {
                or_port = parse_port(v).ok_or_else(|| bad("invalid orport"))?;
            }
            ("weight", Some(v)) => {
                weight = Some(parse_weight(v).ok_or_else(|| bad("invalid weight"))?);
            }
            ("v3ident", Some(v)) => {
                let id = RsaIdentity::from_hex(v).map_err(|_| bad("bad v3 identity digest"))?;
                v3_identity = Some(id);
                dirinfo |= DirInfo::v3_authority();
            }
            ("ipv6", Some(v)) => {
                if ipv6_orport.is_some() {
                    return Err(bad("redundant ipv6 addr/port"));
                }
                ipv6_orport = Some(parse_ipv6(v).ok_or_else(|| bad("bad ipv6 addr/port"))?);
            }
            _ => {
                warn!("Unrecognized flag '{}' on DirAuthority line", flag);
            }
        }
        items.next();
    }

    let addrport = items.next().ok_or_else(|| bad("too few arguments"))?;
    let fingerprint: String = items.collect();
    if fingerprint.is_empty() {
        return Err(bad("too few arguments"));
    }
    let dir_addr: SocketAddrV4 = addrport
        .parse()
        .map_err(|_| bad("address is not an IPv4 address:port"))?;
    if dir_addr.port() == 0 {
        return Err(bad("missing dirport"));
    }
    let identity = RsaIdentity::from_hex(&fingerprint).map_err(|_| bad("bad key digest"))?;

    if !required.is_empty() && !required.intersects(dirinfo) {
        debug!(
            "Skipping DirAuthority {} which provides none of {:?}",
            nickname.unwrap_or("(unnamed)"),
            required
        );
        return Ok(None);
    }

    let mut b = DirServerBuilder::authority(identity, dir_addr);
    if let Some(n) = nickname {
        b.set_nickname(n);
    }
    b.set_or_port(or_port);
    b.add_dirinfo(dirinfo);
    if let Some(id) = v3_identity {
        b.set_v3_identity(id);
    }
    if let Some(a) = ipv6_orport {
        b.set_ipv6_orport(a);
    }
    if let Some(w) = weight {
        b.set_weight(w);
    }
    b.finalize().map(Some)
}

/// Parse a `FallbackDir` line.
pub fn parse_dir_fallback_line(line: &str) -> Result<DirServer> {
    let bad = |problem: &str| Error::BadDirLine {
        kind: "FallbackDir",
        line: line.to_string(),
        problem: problem.to_string(),
    };

    let mut positional = Vec::new();
    let mut or_port = None;
    let mut identity = None;
    let mut ipv6_orport = None;
    let mut weight = None;

    for tok in line.split_ascii_whitespace() {
        let (key, value) = match tok.split_once('=') {
            Some(kv) => kv,
            None => {
                positional.push(tok);
                continue;
            }
        };
        match key {
            "orport" => or_port = Some(parse_port(value).ok_or_else(|| bad("bad orport"))?),
            "id" => {
                identity = Some(RsaIdentity::from_hex(value).map_err(|_| bad("bad id"))?);
            }
            "ipv6" => {
                if ipv6_orport.is_some() {
                    warn!("Redundant ipv6 addr/port on FallbackDir line");
                } else {
                    ipv6_orport = Some(parse_ipv6(value).ok_or_else(|| bad("bad ipv6 addr/port"))?);
                }
            }
            "weight" => weight = Some(parse_weight(value).ok_or_else(|| bad("bad weight"))?),
            _ => {}
        }
    }

    let addrport = match positional[..] {
        [a] => a,
        _ => return Err(bad("expected exactly one address:port")),
    };
    let identity = match identity {
        Some(id) if !id.is_zero() => id,
        _ => return Err(bad("missing identity")),
    };
    let or_port = or_port.ok_or_else(|| bad("missing orport"))?;
    let dir_addr: SocketAddrV4 = addrport
        .parse()
        .map_err(|_| bad("couldn't parse address:port"))?;
    if dir_addr.port() == 0 {
        return Err(bad("missing dirport"));
    }

    let mut b = DirServerBuilder::fallback(identity, dir_addr);
    b.set_or_port(or_port);
    if let Some(a) = ipv6_orport {
        b.set_ipv6_orport(a);
    }
    if let Some(w) = weight {
        b.set_weight(w);
    }
    b.finalize()
}
