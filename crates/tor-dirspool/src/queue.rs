//! The list of documents that one connection is sending.

use crate::resource::{FlushStatus, SpooledResource, SpoolState, CACHED_DIR_CHUNK_SIZE};
use crate::sink::SpoolSink;
use crate::store::SpoolStore;
use crate::Error;

use std::collections::VecDeque;
use std::time::SystemTime;
use tracing::{debug, info};

/// Don't add more to a connection's output while it has at least this
/// many bytes queued.
pub const SPOOL_BUFFER_MIN: usize = 16384;

/// The result of [`SpoolQueue::remove_missing_and_guess_size`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpoolEstimate {
    /// About how many bytes the remaining resources will take.
    pub estimated_size: u64,
    /// How many resources we removed for being too old.
    pub n_expired: usize,
    /// How many resources we removed because we couldn't find them.
    pub n_missing: usize,
}

/// What a connection's spool queue did when the connection flushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpoolProgress {
    /// There's more to send once the connection has room.
    Blocked,
    /// Everything has been sent, and the sink has been told so.
    Finished,
}

/// The resources that a connection still has to send, in order.
///
/// Only the first resource may be partially sent.
#[derive(Debug, Default)]
pub struct SpoolQueue {
    /// The resources.
    resources: VecDeque<SpooledResource>,
    /// How many resources we've dropped because their documents were
    /// missing when we went to send them.
    n_missing: usize,
}

impl SpoolQueue {
    /// Construct a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to the end of this queue.
    pub fn push(&mut self, resource: SpooledResource) {
        self.resources.push_back(resource);
    }

    /// Return the number of resources in this queue.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Return true if this queue is empty.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Return an iterator over the resources in this queue.
    pub fn iter(&self) -> impl Iterator<Item = &SpooledResource> {
        self.resources.iter()
    }

    /// Return how many resources we've skipped while sending because
    /// their documents were missing.
    pub fn n_missing(&self) -> usize {
        self.n_missing
    }

    /// Remove every resource whose document is missing or was published
    /// before `cutoff`, and estimate how much the rest will take to send.
    ///
    /// Call this before sending anything.
    pub fn remove_missing_and_guess_size<S>(
        &mut self,
        store: &S,
        cutoff: Option<SystemTime>,
        compressed: bool,
    ) -> SpoolEstimate
    where
        S: SpoolStore + ?Sized,
    {
        let mut est = SpoolEstimate::default();
        self.resources.retain(|r| {
            let (size, published) = r.estimate_size(store, compressed);
            match (published, cutoff) {
                (Some(p), Some(c)) if p < c => {
                    est.n_expired += 1;
                    false
                }
                _ if size == 0 => {
                    est.n_missing += 1;
                    false
                }
                _ => {
                    est.estimated_size = est.estimated_size.saturating_add(size as u64);
                    true
                }
            }
        });
        debug!(
            "Spool estimate: {} bytes; removed {} expired and {} missing",
            est.estimated_size, est.n_expired, est.n_missing
        );
        est
    }

    /// Sort the pending resources in this queue by digest.
    ///
    /// The sort is stable.  A resource that is partway through being
    /// sent stays at the front.
    pub fn sort(&mut self) {
        let skip = match self.resources.front() {
            Some(r) if r.state() == SpoolState::Streaming => 1,
            _ => 0,
        };
        let mut rest: Vec<_> = self.resources.drain(skip..).collect();
        rest.sort_by(|a, b| a.digest().cmp(b.digest()));
        self.resources.extend(rest);
    }

    /// Called when a connection has flushed some of its output: put more
    /// onto `sink`, until it has at least [`SPOOL_BUFFER_MIN`] bytes
    /// queued or we run out of resources.
    ///
    /// Resources whose documents have gone missing are skipped.
    pub fn flushed_some<S, K>(&mut self, store: &S, sink: &mut K) -> SpoolProgress
    where
        S: SpoolStore + ?Sized,
        K: SpoolSink + ?Sized,
    {
        while sink.queued_len() < SPOOL_BUFFER_MIN {
            let front = match self.resources.front_mut() {
                Some(r) => r,
                None => break,
            };
            match front.spool_send(store, sink, CACHED_DIR_CHUNK_SIZE) {
                Ok(FlushStatus::More) => {}
                Ok(FlushStatus::Blocked) => return SpoolProgress::Blocked,
                Ok(FlushStatus::Done) => {
                    self.resources.pop_front();
                }
                Err(Error::NotFound(d)) => {
                    debug!("Skipping missing document {}", d);
                    self.n_missing += 1;
                    self.resources.pop_front();
                }
                Err(e) => {
                    debug!("Skipping unsendable resource: {}", e);
                    self.n_missing += 1;
                    self.resources.pop_front();
                }
            }
        }

        if self.resources.is_empty() {
            sink.finish();
            if self.n_missing > 0 {
                info!("Finished spooling; {} documents were missing", self.n_missing);
            }
            SpoolProgress::Finished
        } else {
            SpoolProgress::Blocked
        }
    }

    /// Drop every resource in this queue, as when its connection closes.
    ///
    /// Returns the number of resources dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.resources.len();
        self.resources.clear();
        n
    }
}
