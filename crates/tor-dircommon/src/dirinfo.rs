//! Kinds of directory information that a directory server can provide.

use bitflags::bitflags;

bitflags! {
    /// A set of directory document flavors that a directory server serves.
    ///
    /// Authorities advertise the flavors they vote on; fallback caches
    /// serve everything.  The bit values match Tor's `dirinfo_type_t`.
    pub struct DirInfo: u8 {
        /// Serves v3 networkstatus consensus documents and votes.
        const V3 = (1<<2);
        /// Serves extra-info documents.
        const EXTRAINFO = (1<<3);
        /// Serves bridge descriptors.
        const BRIDGE = (1<<4);
        /// Serves microdescriptors.
        const MICRODESC = (1<<5);
    }
}

impl DirInfo {
    /// The flavors an authority with a v3 identity serves.
    pub fn v3_authority() -> Self {
        DirInfo::V3 | DirInfo::EXTRAINFO | DirInfo::MICRODESC
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn v3_authority() {
        let v3 = DirInfo::v3_authority();
        assert!(v3.contains(DirInfo::V3));
        assert!(v3.contains(DirInfo::MICRODESC));
        assert!(!v3.intersects(DirInfo::BRIDGE));
        assert_eq!(v3.bits(), 0x2c);
    }
}
