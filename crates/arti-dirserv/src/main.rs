//! A small tool for exercising Tor directory-authority plumbing.
//!
//! `arti-dirserv` loads its configuration, decides which directory
//! authorities and fallbacks to trust, reads any bandwidth and
//! guardfraction files it has been told about, and optionally spools a
//! consensus document to standard output the way a directory cache
//! would send it to a client.
//!
//! This is a demo; you get no stability guarantee.

#![warn(missing_docs)]

mod cmdline;
mod ingest;
mod serve;

use std::path::PathBuf;
use std::time::SystemTime;

use tor_bwauth::MeasuredBwCache;
use tor_dircommon::DirInfo;
use tor_dirservers::{DirServerOptions, DirServerRegistry};

use anyhow::{Context, Result};
use argh::FromArgs;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(FromArgs, Debug, Clone)]
/// Choose directory servers, read bandwidth measurements, and spool
/// directory documents.
///
/// This is a demo; you get no stability guarantee.
struct Args {
    /// read configuration from this file (may be repeated)
    #[argh(option, short = 'f')]
    rc: Vec<String>,
    /// override a configuration option (uses toml syntax)
    #[argh(option, short = 'c')]
    cfg: Vec<String>,
}

/// Default options to use for our configuration.
const DIRSERV_DEFAULTS: &str = include_str!("./dirserv_defaults.toml");

/// Structure to hold our configuration options, whether from a
/// configuration file or the command line.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
struct DirServConfig {
    /// Whether to log at trace level.
    trace: bool,
    /// Which directory servers to trust.
    dirservers: DirServerOptions,
    /// Where to find measurement files.
    #[serde(default)]
    measurements: MeasurementConfig,
    /// What to spool, and how.
    spool: SpoolConfig,
}

/// Locations of the files written by bandwidth scanners and guard
/// tracking.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct MeasurementConfig {
    /// A bandwidth file to read.
    pub(crate) v3_bandwidths_file: Option<PathBuf>,
    /// A guardfraction file to read.
    pub(crate) guardfraction_file: Option<PathBuf>,
}

/// Configuration for spooling a document to standard output.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct SpoolConfig {
    /// A consensus document to spool.
    pub(crate) document: Option<PathBuf>,
    /// The flavor of that consensus.
    pub(crate) flavor: String,
    /// Whether to compress the output.
    pub(crate) compressed: bool,
}

/// Build a configuration from our defaults, then `files`, then `opts`.
fn load_config(files: &[String], opts: &[String]) -> Result<DirServConfig> {
    let mut cfg = config::Config::new();
    cfg.merge(config::File::from_str(
        DIRSERV_DEFAULTS,
        config::FileFormat::Toml,
    ))?;
    for f in files {
        cfg.merge(config::File::with_name(f).format(config::FileFormat::Toml))
            .with_context(|| format!("loading {}", f))?;
    }
    cfg.merge(cmdline::CmdLine::new(opts))?;
    Ok(cfg.try_into()?)
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    let config = load_config(&args.rc, &args.cfg)?;

    let level = if config.trace {
        tracing::Level::TRACE
    } else {
        tracing::Level::DEBUG
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    config
        .dirservers
        .validate()
        .context("bad directory server configuration")?;
    let registry = DirServerRegistry::with_builtin_defaults();
    registry.consider_adding_dir_servers(&config.dirservers, None)?;
    info!(
        "{} v3 authorities, {} bridge authorities, {} directory servers in all",
        registry.n_authorities(DirInfo::V3),
        registry.n_authorities(DirInfo::BRIDGE),
        registry.fallbacks().len()
    );
    for ds in registry.trusted() {
        debug!(
            "Authority {} at {}",
            ds.nickname().unwrap_or("(unnamed)"),
            ds.dir_addr()
        );
    }

    let now = SystemTime::now();
    let mut cache = MeasuredBwCache::new();
    ingest::load_measurements(&config.measurements, &mut cache, now)?;

    if let Some(path) = &config.spool.document {
        let body = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let n = serve::spool_document(&config.spool, body, now, &mut out)?;
        info!("Spooled {} bytes from {}", n, path.display());
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn load_default_config() -> Result<()> {
        let config = load_config(&[], &[])?;
        assert!(!config.trace);
        assert_eq!(config.dirservers, DirServerOptions::default());
        assert!(config.measurements.v3_bandwidths_file.is_none());
        assert_eq!(config.spool.flavor, "ns");
        assert!(!config.spool.compressed);
        Ok(())
    }

    #[test]
    fn overrides() -> Result<()> {
        let opts = vec![
            "trace=true".to_string(),
            "spool.flavor=microdesc".to_string(),
            "dirservers.use_default_fallback_dirs=false".to_string(),
            "dirservers.fallback_dir=[\"1.2.3.4:80 orport=443 id=50e643986f31ea1235bcc1af17a1c5c5cfc0ee54\"]"
                .to_string(),
        ];
        let config = load_config(&[], &opts)?;
        assert!(config.trace);
        assert_eq!(config.spool.flavor, "microdesc");
        assert!(!config.dirservers.use_default_fallback_dirs);
        assert_eq!(config.dirservers.fallback_dir.as_ref().map(Vec::len), Some(1));
        config.dirservers.validate()?;
        Ok(())
    }
}
