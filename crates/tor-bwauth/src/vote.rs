//! The routerstatus entries of a vote under construction.
//!
//! An authority builds one [`VoteRouterStatus`] for each relay it is
//! about to vote on, and then fills in the measured bandwidth and guard
//! fraction from the files that its scanners produce.

use crate::bwline::MeasuredBwLine;
use std::collections::HashMap;
use std::convert::TryFrom;
use tor_dircommon::RsaIdentity;
use tracing::debug;

/// One relay's entry in a vote that we're building.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteRouterStatus {
    /// The relay's nickname.  May be empty if we don't know it.
    pub nickname: String,
    /// The relay's RSA identity.
    pub identity: RsaIdentity,
    /// The bandwidth that the relay declared for itself, in kilobytes.
    pub bandwidth_kb: u32,
    /// True if we've got a measured bandwidth for this relay.
    pub has_measured_bw: bool,
    /// The measured bandwidth, in kilobytes; meaningful only if
    /// `has_measured_bw` is set.
    pub measured_bw_kb: u32,
    /// True if we know what fraction of the time this relay was a guard.
    pub has_guardfraction: bool,
    /// Percentage of the time that this relay was a guard, from 0 to 100.
    pub guardfraction_percentage: u32,
}

impl VoteRouterStatus {
    /// Construct a new routerstatus with no measurement information.
    pub fn new(nickname: &str, identity: RsaIdentity, bandwidth_kb: u32) -> Self {
        VoteRouterStatus {
            nickname: nickname.to_string(),
            identity,
            bandwidth_kb,
            has_measured_bw: false,
            measured_bw_kb: 0,
            has_guardfraction: false,
            guardfraction_percentage: 0,
        }
    }

    /// Return the bandwidth this relay should have in our vote: the
    /// measured value if we have one, and the declared value otherwise.
    pub fn voted_bw_kb(&self) -> u32 {
        if self.has_measured_bw {
            self.measured_bw_kb
        } else {
            self.bandwidth_kb
        }
    }
}

/// A set of routerstatuses, kept sorted by identity.
#[derive(Clone, Debug, Default)]
pub struct VoteRouterStatusSet {
    /// The routerstatuses, sorted and without duplicate identities.
    entries: Vec<VoteRouterStatus>,
    /// Map from nickname to index in `entries`, for nicknames that
    /// appear exactly once.  None if some entry has no nickname, in
    /// which case we never match by nickname.
    by_nickname: Option<HashMap<String, usize>>,
}

impl VoteRouterStatusSet {
    /// Build a set from a list of routerstatuses.
    ///
    /// If two entries share an identity, the later one is kept.
    pub fn new(mut entries: Vec<VoteRouterStatus>) -> Self {
        entries.reverse();
        entries.sort_by(|a, b| a.identity.cmp(&b.identity));
        entries.dedup_by(|a, b| a.identity == b.identity);

        let by_nickname = if entries.iter().all(|rs| !rs.nickname.is_empty()) {
            let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
            for (idx, rs) in entries.iter().enumerate() {
                let e = counts.entry(rs.nickname.as_str()).or_insert((idx, 0));
                e.1 += 1;
            }
            Some(
                counts
                    .into_iter()
                    .filter(|(_, (_, n))| *n == 1)
                    .map(|(nick, (idx, _))| (nick.to_string(), idx))
                    .collect(),
            )
        } else {
            None
        };

        VoteRouterStatusSet {
            entries,
            by_nickname,
        }
    }

    /// Return the routerstatus for `id`, if there is one.
    pub fn get(&self, id: &RsaIdentity) -> Option<&VoteRouterStatus> {
        self.position(id).map(|idx| &self.entries[idx])
    }

    /// Return a mutable reference to the routerstatus for `id`, if any.
    pub fn get_mut(&mut self, id: &RsaIdentity) -> Option<&mut VoteRouterStatus> {
        self.position(id).map(move |idx| &mut self.entries[idx])
    }

    /// Find the index of `id` in our sorted list.
    fn position(&self, id: &RsaIdentity) -> Option<usize> {
        self.entries
            .binary_search_by(|rs| rs.identity.cmp(id))
            .ok()
    }

    /// Find the index of the one routerstatus with the given nickname.
    fn position_by_nickname(&self, nickname: &str) -> Option<usize> {
        self.by_nickname.as_ref()?.get(nickname).copied()
    }

    /// Return an iterator over the routerstatuses, in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &VoteRouterStatus> {
        self.entries.iter()
    }

    /// Return the number of routerstatuses in this set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if this set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a measured bandwidth line to the matching routerstatus.
    ///
    /// We match by the line's identity if it has one, and otherwise by
    /// nickname.  If the line only had a nickname and we matched it, the
    /// line is updated with the relay's identity.
    ///
    /// Returns true if we found a match.
    pub fn apply_measured_bw(&mut self, line: &mut MeasuredBwLine) -> bool {
        let idx = match (line.node_id(), line.nickname()) {
            (Some(id), _) => self.position(id),
            (None, Some(nick)) => self.position_by_nickname(nick),
            (None, None) => None,
        };
        let idx = match idx {
            Some(idx) => idx,
            None => {
                debug!("No routerstatus for measured relay {}", line.node_hex());
                return false;
            }
        };
        let rs = &mut self.entries[idx];
        rs.has_measured_bw = true;
        rs.measured_bw_kb = u32::try_from(line.bw_kb()).unwrap_or(u32::MAX);
        if line.node_id().is_none() {
            line.resolve(rs.identity);
        }
        true
    }

    /// Record that the relay `id` was a guard `percentage` percent of the
    /// time.
    ///
    /// Returns true if we found a match.
    pub fn apply_guardfraction(&mut self, id: &RsaIdentity, percentage: u32) -> bool {
        match self.get_mut(id) {
            Some(rs) => {
                rs.has_guardfraction = true;
                rs.guardfraction_percentage = percentage;
                true
            }
            None => false,
        }
    }
}

impl From<Vec<VoteRouterStatus>> for VoteRouterStatusSet {
    fn from(v: Vec<VoteRouterStatus>) -> Self {
        Self::new(v)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn id(b: u8) -> RsaIdentity {
        RsaIdentity::from_bytes(&[b; 20]).unwrap()
    }

    fn set(nicks: &[(&str, u8)]) -> VoteRouterStatusSet {
        nicks
            .iter()
            .map(|(n, b)| VoteRouterStatus::new(n, id(*b), 100))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn lookup() {
        let s = set(&[("c", 3), ("a", 1), ("b", 2)]);
        assert_eq!(s.len(), 3);
        let ids: Vec<_> = s.iter().map(|rs| rs.identity).collect();
        assert_eq!(ids, vec![id(1), id(2), id(3)]);
        assert_eq!(s.get(&id(2)).unwrap().nickname, "b");
        assert!(s.get(&id(4)).is_none());
    }

    #[test]
    fn apply_by_id() {
        let mut s = set(&[("a", 0xAA), ("b", 0xBB)]);
        let mut l =
            MeasuredBwLine::parse("bw=800 node_id=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", true)
                .unwrap();
        assert!(s.apply_measured_bw(&mut l));
        let rs = s.get(&id(0xAA)).unwrap();
        assert!(rs.has_measured_bw);
        assert_eq!(rs.measured_bw_kb, 800);
        assert_eq!(rs.voted_bw_kb(), 800);
        assert!(!s.get(&id(0xBB)).unwrap().has_measured_bw);
        assert_eq!(s.get(&id(0xBB)).unwrap().voted_bw_kb(), 100);

        let mut l =
            MeasuredBwLine::parse("bw=800 node_id=CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC", true)
                .unwrap();
        assert!(!s.apply_measured_bw(&mut l));
    }

    #[test]
    fn apply_by_nickname() {
        let mut s = set(&[("Alice", 1), ("Bob", 2), ("Bob", 3)]);
        let mut l = MeasuredBwLine::parse("bw=50 nick=Alice", true).unwrap();
        assert!(s.apply_measured_bw(&mut l));
        assert_eq!(l.node_id(), Some(&id(1)));
        assert_eq!(s.get(&id(1)).unwrap().measured_bw_kb, 50);

        // Ambiguous nicknames never match.
        let mut l = MeasuredBwLine::parse("bw=50 nick=Bob", true).unwrap();
        assert!(!s.apply_measured_bw(&mut l));
        assert_eq!(l.node_id(), None);

        // If any routerstatus lacks a nickname, we don't match by nickname.
        let mut s = set(&[("Alice", 1), ("", 2)]);
        let mut l = MeasuredBwLine::parse("bw=50 nick=Alice", true).unwrap();
        assert!(!s.apply_measured_bw(&mut l));
    }

    #[test]
    fn guardfraction() {
        let mut s = set(&[("a", 1)]);
        assert!(s.apply_guardfraction(&id(1), 42));
        assert!(!s.apply_guardfraction(&id(2), 42));
        let rs = s.get(&id(1)).unwrap();
        assert!(rs.has_guardfraction);
        assert_eq!(rs.guardfraction_percentage, 42);
    }
}
