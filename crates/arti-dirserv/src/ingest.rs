//! Reading the bandwidth and guardfraction files named in our
//! configuration.

use crate::MeasurementConfig;

use anyhow::{Context, Result};
use futures::executor::block_on;
use std::sync::Arc;
use std::time::SystemTime;
use tor_bwauth::worker::{read_bwfile_in_background, read_guardfraction_in_background};
use tor_bwauth::{FsLoader, MeasuredBwCache};
use tracing::info;

/// Read whichever measurement files `cfg` names, on background threads,
/// and add the bandwidth measurements to `cache`.
///
/// There's no vote under construction here, so bandwidth measurements
/// only go to the cache, and the guardfraction file is parsed and
/// checked but otherwise unused.
pub(crate) fn load_measurements(
    cfg: &MeasurementConfig,
    cache: &mut MeasuredBwCache,
    now: SystemTime,
) -> Result<()> {
    let loader = Arc::new(FsLoader);

    let bw = match &cfg.v3_bandwidths_file {
        Some(p) => Some(read_bwfile_in_background(Arc::clone(&loader), p.clone(), now)?),
        None => None,
    };
    let gf = match &cfg.guardfraction_file {
        Some(p) => Some(read_guardfraction_in_background(
            Arc::clone(&loader),
            p.clone(),
            now,
        )?),
        None => None,
    };

    if let Some(pending) = bw {
        let bwfile = block_on(pending.wait()).context("reading bandwidth file")?;
        let summary = bwfile.apply(None, cache, now);
        info!(
            "Cached {} bandwidth measurements; {} headers; {} expired",
            summary.n_cached,
            summary.headers.len(),
            summary.n_expired
        );
    }
    if let Some(pending) = gf {
        let gffile = block_on(pending.wait()).context("reading guardfraction file")?;
        let summary = gffile.apply(None);
        info!(
            "Checked guardfraction file: {} guards, {} bad lines; nothing to apply it to",
            summary.n_parsed, summary.n_failed
        );
    }
    Ok(())
}
