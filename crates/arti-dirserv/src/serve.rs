//! Spooling a consensus document to an output stream.

use crate::SpoolConfig;

use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::time::SystemTime;
use tor_dirspool::{MemoryStore, SpoolProgress, SpoolQueue, SpoolSource, SpooledResource, WriteSink};
use tracing::debug;

/// Spool `body`, as the consensus of the flavor in `cfg`, to `out`.
///
/// Output is written a chunk at a time as the queue produces it.
/// Returns the number of bytes written.
pub(crate) fn spool_document<W: Write>(
    cfg: &SpoolConfig,
    body: Vec<u8>,
    published: SystemTime,
    out: W,
) -> Result<u64> {
    let mut store = MemoryStore::new();
    let dir = store.consensuses_mut().set(&cfg.flavor, body, published);

    let mut queue = SpoolQueue::new();
    queue.push(SpooledResource::new(
        SpoolSource::NetworkStatus,
        dir.digest().as_bytes(),
    )?);
    // The store holds its own reference.
    drop(dir);

    let estimate = queue.remove_missing_and_guess_size(&store, None, cfg.compressed);
    debug!("Expect to send about {} bytes", estimate.estimated_size);

    let mut sink = WriteSink::new(out, cfg.compressed);
    if queue.flushed_some(&store, &mut sink) != SpoolProgress::Finished {
        return Err(anyhow!("spooling stalled with {} resources left", queue.len()));
    }
    if queue.n_missing() > 0 {
        return Err(anyhow!("document went missing while spooling"));
    }
    let written = sink.written();
    sink.into_inner().context("writing document")?;
    Ok(written)
}
