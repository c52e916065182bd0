//! A cache of recent bandwidth measurements, keyed by relay identity.
//!
//! When a bandwidth file stops listing a relay, we keep using that
//! relay's last measurement for a while, so that a scanner hiccup
//! doesn't make the relay fall back to its self-reported bandwidth.

use crate::bwline::MeasuredBwLine;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use tor_dircommon::{time::age, RsaIdentity};
use tracing::trace;

/// How long do we keep a measurement after the file it came from?
pub const MAX_MEASUREMENT_AGE: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// A single cached measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachedMeasurement {
    /// Measured bandwidth, in kilobytes.
    pub bw_kb: i64,
    /// When the measurement was made: the timestamp of its bandwidth file.
    pub as_of: SystemTime,
}

/// A map from relay identity to its most recent measurement.
///
/// At most one entry exists per identity.  A later [`cache`](Self::cache)
/// of the same identity replaces the earlier entry, whatever its
/// timestamp.
#[derive(Debug, Default, Clone)]
pub struct MeasuredBwCache {
    /// The cached entries.
    entries: HashMap<RsaIdentity, CachedMeasurement>,
}

impl MeasuredBwCache {
    /// Construct a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the measurement in `line`, as of `as_of`.
    ///
    /// Lines that don't (yet) name a relay identity can't be cached;
    /// returns false for those.
    pub fn cache(&mut self, line: &MeasuredBwLine, as_of: SystemTime) -> bool {
        match line.node_id() {
            Some(id) => {
                self.insert(*id, line.bw_kb(), as_of);
                true
            }
            None => false,
        }
    }

    /// Remember that `id` was measured at `bw_kb` as of `as_of`.
    pub fn insert(&mut self, id: RsaIdentity, bw_kb: i64, as_of: SystemTime) {
        self.entries.insert(id, CachedMeasurement { bw_kb, as_of });
    }

    /// Look up the measurement for `id`.
    ///
    /// Returns None if there is no entry, or if the entry is older than
    /// [`MAX_MEASUREMENT_AGE`] as of `now`.
    pub fn query(&self, id: &RsaIdentity, now: SystemTime) -> Option<CachedMeasurement> {
        self.entries
            .get(id)
            .filter(|m| age(now, m.as_of) <= MAX_MEASUREMENT_AGE)
            .copied()
    }

    /// Return true if we have a usable measurement for `id` as of `now`.
    pub fn has_measurement(&self, id: &RsaIdentity, now: SystemTime) -> bool {
        self.query(id, now).is_some()
    }

    /// Remove every entry older than [`MAX_MEASUREMENT_AGE`] as of `now`.
    ///
    /// Returns the number of entries removed.
    pub fn expire(&mut self, now: SystemTime) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, m| age(now, m.as_of) <= MAX_MEASUREMENT_AGE);
        let removed = before - self.entries.len();
        if removed > 0 {
            trace!("Expired {} old bandwidth measurements", removed);
        }
        removed
    }

    /// Return the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
