//! A single directory authority or fallback directory cache.

use crate::{Error, Result};

use std::net::{Ipv4Addr, SocketAddrV4, SocketAddrV6};
use tor_dircommon::{DirInfo, RsaIdentity};

/// The weight that a directory server gets if none is configured.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// A directory server that we might ask for directory information.
///
/// Authorities are trusted to vote on (or, for bridge authorities,
/// to collect) directory information.  Fallbacks are just caches that
/// we know about in advance.  Every authority can also be used as a
/// fallback.
#[derive(Clone, Debug, PartialEq)]
pub struct DirServer {
    /// Nickname, if this server has one.  Fallbacks don't.
    nickname: Option<String>,
    /// IPv4 address of this server.
    addr: Ipv4Addr,
    /// Port for directory requests.
    dir_port: u16,
    /// Port for OR connections; 0 if we don't know it.
    or_port: u16,
    /// IPv6 address for OR connections, if any.
    ipv6_orport: Option<SocketAddrV6>,
    /// RSA identity of the relay.
    identity: RsaIdentity,
    /// v3 signing identity, for v3 authorities.
    v3_identity: Option<RsaIdentity>,
    /// Which kinds of directory information this server provides.
    dirinfo: DirInfo,
    /// How often to choose this server, relative to others.
    weight: f64,
    /// True if this is an authority.
    is_authority: bool,
}

impl DirServer {
    /// Return the nickname of this server, if it has one.
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }
    /// Return the IPv4 address of this server.
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }
    /// Return the address for directory requests.
    pub fn dir_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.addr, self.dir_port)
    }
    /// Return the port for directory requests.
    pub fn dir_port(&self) -> u16 {
        self.dir_port
    }
    /// Return the IPv4 OR port of this server, or 0 if unknown.
    pub fn or_port(&self) -> u16 {
        self.or_port
    }
    /// Return the IPv6 OR address of this server, if it has one.
    pub fn ipv6_orport(&self) -> Option<&SocketAddrV6> {
        self.ipv6_orport.as_ref()
    }
    /// Return the RSA identity of this server.
    pub fn identity(&self) -> &RsaIdentity {
        &self.identity
    }
    /// Return the v3 signing identity of this server, if it's a v3
    /// authority.
    pub fn v3_identity(&self) -> Option<&RsaIdentity> {
        self.v3_identity.as_ref()
    }
    /// Return the kinds of directory information this server provides.
    pub fn dirinfo(&self) -> DirInfo {
        self.dirinfo
    }
    /// Return the weight of this server.
    pub fn weight(&self) -> f64 {
        self.weight
    }
    /// Return true if this server is an authority.
    pub fn is_authority(&self) -> bool {
        self.is_authority
    }
    /// Return true if this server is a bridge authority.
    pub fn is_bridge(&self) -> bool {
        self.is_authority && self.dirinfo.contains(DirInfo::BRIDGE)
    }
}

/// Builder for a [`DirServer`].
///
/// Make one with [`DirServerBuilder::authority`] or
/// [`DirServerBuilder::fallback`], set whatever optional fields apply,
/// then call `finalize`.
///
/// # Examples
///
/// ```
/// # use tor_dirservers::*;
/// # fn x() -> tor_dirservers::Result<()> {
/// let id = tor_dircommon::RsaIdentity::from_bytes(&[9; 20]).unwrap();
/// let mut builder = DirServerBuilder::fallback(id, "1.2.3.4:80".parse().unwrap());
/// builder.set_or_port(443);
/// let fallback = builder.finalize()?;
/// assert!(!fallback.is_authority());
/// # Ok(()) }
/// # x().unwrap()
/// ```
#[derive(Clone, Debug)]
pub struct DirServerBuilder {
    /// The server we're building.
    ds: DirServer,
}

impl DirServerBuilder {
    /// Start building an authority with the given identity and directory
    /// address.
    ///
    /// The new authority provides no kinds of directory information
    /// until some are added with [`add_dirinfo`](Self::add_dirinfo).
    pub fn authority(identity: RsaIdentity, dir_addr: SocketAddrV4) -> Self {
        DirServerBuilder {
            ds: DirServer {
                nickname: None,
                addr: *dir_addr.ip(),
                dir_port: dir_addr.port(),
                or_port: 0,
                ipv6_orport: None,
                identity,
                v3_identity: None,
                dirinfo: DirInfo::empty(),
                weight: DEFAULT_WEIGHT,
                is_authority: true,
            },
        }
    }

    /// Start building a fallback cache with the given identity and
    /// directory address.
    ///
    /// Fallbacks provide every kind of directory information.
    pub fn fallback(identity: RsaIdentity, dir_addr: SocketAddrV4) -> Self {
        let mut b = Self::authority(identity, dir_addr);
        b.ds.is_authority = false;
        b.ds.dirinfo = DirInfo::all();
        b
    }

    /// Set the nickname of this server.
    pub fn set_nickname(&mut self, nickname: &str) {
        self.ds.nickname = Some(nickname.to_string());
    }

    /// Set the IPv4 OR port of this server.
    pub fn set_or_port(&mut self, port: u16) {
        self.ds.or_port = port;
    }

    /// Set the IPv6 OR address of this server.
    pub fn set_ipv6_orport(&mut self, addr: SocketAddrV6) {
        self.ds.ipv6_orport = Some(addr);
    }

    /// Set the v3 signing identity of this server.
    pub fn set_v3_identity(&mut self, id: RsaIdentity) {
        self.ds.v3_identity = Some(id);
    }

    /// Add to the kinds of directory information this server provides.
    pub fn add_dirinfo(&mut self, dirinfo: DirInfo) {
        self.ds.dirinfo |= dirinfo;
    }

    /// Set the weight of this server.
    pub fn set_weight(&mut self, weight: f64) {
        self.ds.weight = weight;
    }

    /// Check this builder and return the [`DirServer`] it describes.
    pub fn finalize(self) -> Result<DirServer> {
        if self.ds.dir_port == 0 {
            return Err(Error::BadDirServer("missing dirport"));
        }
        if !self.ds.weight.is_finite() || self.ds.weight < 0.0 {
            return Err(Error::BadDirServer("weight out of range"));
        }
        if !self.ds.is_authority && self.ds.identity.is_zero() {
            return Err(Error::BadDirServer("missing identity"));
        }
        if !self.ds.is_authority && self.ds.or_port == 0 {
            return Err(Error::BadDirServer("missing orport"));
        }
        Ok(self.ds)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn id(b: u8) -> RsaIdentity {
        RsaIdentity::from_bytes(&[b; 20]).unwrap()
    }

    #[test]
    fn authority() -> Result<()> {
        let mut b = DirServerBuilder::authority(id(1), "127.0.0.1:9059".parse().unwrap());
        b.set_nickname("ds");
        b.set_or_port(9060);
        b.add_dirinfo(DirInfo::v3_authority());
        b.set_ipv6_orport("[::1]:9061".parse().unwrap());
        let ds = b.finalize()?;
        assert_eq!(ds.nickname(), Some("ds"));
        assert_eq!(ds.dir_addr(), "127.0.0.1:9059".parse().unwrap());
        assert_eq!(ds.or_port(), 9060);
        assert_eq!(ds.ipv6_orport().unwrap().port(), 9061);
        assert!(ds.is_authority());
        assert!(!ds.is_bridge());
        assert_eq!(ds.weight(), DEFAULT_WEIGHT);

        // Authorities may have an all-zero identity and no orport.
        let ds = DirServerBuilder::authority(id(0), "127.0.0.1:9059".parse().unwrap()).finalize()?;
        assert!(ds.dirinfo().is_empty());
        Ok(())
    }

    #[test]
    fn fallback() -> Result<()> {
        let mut b = DirServerBuilder::fallback(id(2), "127.0.0.1:9059".parse().unwrap());
        b.set_or_port(9060);
        let ds = b.finalize()?;
        assert!(!ds.is_authority());
        assert_eq!(ds.dirinfo(), DirInfo::all());
        assert_eq!(ds.nickname(), None);

        let b = DirServerBuilder::fallback(id(2), "127.0.0.1:9059".parse().unwrap());
        assert_eq!(b.finalize(), Err(Error::BadDirServer("missing orport")));
        let mut b = DirServerBuilder::fallback(id(0), "127.0.0.1:9059".parse().unwrap());
        b.set_or_port(9060);
        assert_eq!(b.finalize(), Err(Error::BadDirServer("missing identity")));
        let mut b = DirServerBuilder::fallback(id(2), "127.0.0.1:0".parse().unwrap());
        b.set_or_port(9060);
        assert_eq!(b.finalize(), Err(Error::BadDirServer("missing dirport")));
        let mut b = DirServerBuilder::fallback(id(2), "127.0.0.1:80".parse().unwrap());
        b.set_or_port(9060);
        b.set_weight(-1.0);
        assert!(b.finalize().is_err());
        Ok(())
    }
}
