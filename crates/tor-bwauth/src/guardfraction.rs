//! Reading guardfraction files.
//!
//! A guardfraction file records, for each relay, how much of the recent
//! past it has spent as a guard:
//!
//! ```text
//! guardfraction-file-version 1
//! written-at 2015-10-04 14:30:48
//! n-inputs 1500 2 1490
//! guard-seen D0EDB47BEAD32D26D0A837F7D5357EC3AD3B8777 100 1420
//! guard-seen 07B5547026DF3E229806E135CFA8552D56AFBABC 5 90
//! ```
//!
//! The version and date lines are required exactly once.  A bad
//! `guard-seen` line only loses that one guard, but a bad version or date
//! rejects the whole file.

use crate::loader::FileLoader;
use crate::vote::VoteRouterStatusSet;
use crate::{Error, Result};

use std::path::Path;
use std::time::{Duration, SystemTime};
use tor_dircommon::time::{age, parse_iso8601_sp};
use tor_dircommon::RsaIdentity;
use tracing::{info, warn};

/// How old can a guardfraction file be before we stop trusting it?
pub const MAX_GUARDFRACTION_FILE_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// The only guardfraction file format version we understand.
const GUARDFRACTION_FILE_VERSION: u32 = 1;

/// One `guard-seen` line from a guardfraction file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardSeen {
    /// Identity of the relay.
    pub identity: RsaIdentity,
    /// Percentage of the time the relay was a guard, from 0 to 100.
    pub percentage: u32,
    /// How many consensuses the relay appeared in.
    pub appearances: u32,
}

/// A parsed guardfraction file.
#[derive(Clone, Debug)]
pub struct GuardFractionFile {
    /// When the file says it was written.
    written_at: SystemTime,
    /// The `n-inputs` line, if any.
    n_inputs: Option<String>,
    /// The guards we parsed.
    guards: Vec<GuardSeen>,
    /// How many lines we had to skip.
    n_failed: usize,
}

/// What happened when we read a guardfraction file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct GuardFractionSummary {
    /// How many guard lines we parsed.
    pub n_parsed: usize,
    /// How many of those matched a routerstatus.
    pub n_applied: usize,
    /// How many lines we had to skip.
    pub n_failed: usize,
}

impl GuardFractionFile {
    /// Parse the text of a guardfraction file, as of `now`.
    pub fn parse(text: &str, now: SystemTime) -> Result<Self> {
        let mut version = None;
        let mut written_at = None;
        let mut n_inputs = None;
        let mut guards = Vec::new();
        let mut n_failed = 0;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (keyword, args) = match line.find(|c: char| c.is_ascii_whitespace()) {
                Some(idx) => (&line[..idx], line[idx..].trim_start()),
                None => (line, ""),
            };
            match keyword {
                "guardfraction-file-version" => {
                    if version.is_some() {
                        return Err(Error::BadGuardFractionVersion(args.to_string()));
                    }
                    version = Some(parse_version(args)?);
                }
                "written-at" => {
                    if written_at.is_some() {
                        return Err(Error::BadGuardFractionDate(args.to_string()));
                    }
                    let t = parse_iso8601_sp(args)
                        .map_err(|_| Error::BadGuardFractionDate(args.to_string()))?;
                    if age(now, t) > MAX_GUARDFRACTION_FILE_AGE {
                        return Err(Error::GuardFractionTooOld(args.to_string()));
                    }
                    written_at = Some(t);
                }
                "n-inputs" => {
                    n_inputs = Some(args.to_string());
                }
                "guard-seen" => match parse_guard_seen(args) {
                    Ok(g) => guards.push(g),
                    Err(e) => {
                        warn!("Skipping line in guardfraction file: {}", e);
                        n_failed += 1;
                    }
                },
                other => {
                    warn!("Unrecognized keyword {:?} in guardfraction file", other);
                    n_failed += 1;
                }
            }
        }

        if version.is_none() {
            return Err(Error::BadGuardFractionVersion("(missing)".into()));
        }
        let written_at =
            written_at.ok_or_else(|| Error::BadGuardFractionDate("(missing)".into()))?;

        Ok(GuardFractionFile {
            written_at,
            n_inputs,
            guards,
            n_failed,
        })
    }

    /// Return the time at which this file was written.
    pub fn written_at(&self) -> SystemTime {
        self.written_at
    }

    /// Return the arguments of the `n-inputs` line, if there was one.
    pub fn n_inputs(&self) -> Option<&str> {
        self.n_inputs.as_deref()
    }

    /// Return the guards listed in this file.
    pub fn guards(&self) -> &[GuardSeen] {
        &self.guards[..]
    }

    /// Apply this file to `routerstatuses`, if provided.
    pub fn apply(&self, routerstatuses: Option<&mut VoteRouterStatusSet>) -> GuardFractionSummary {
        let n_applied = match routerstatuses {
            Some(rs) => self
                .guards
                .iter()
                .filter(|g| rs.apply_guardfraction(&g.identity, g.percentage))
                .count(),
            None => 0,
        };
        info!(
            "Read {} guardfraction lines ({} applied, {} bad lines)",
            self.guards.len(),
            n_applied,
            self.n_failed
        );
        GuardFractionSummary {
            n_parsed: self.guards.len(),
            n_applied,
            n_failed: self.n_failed,
        }
    }
}

/// Parse the argument of a `guardfraction-file-version` line.
fn parse_version(args: &str) -> Result<u32> {
    match args.parse::<u32>() {
        Ok(GUARDFRACTION_FILE_VERSION) => Ok(GUARDFRACTION_FILE_VERSION),
        _ => Err(Error::BadGuardFractionVersion(args.to_string())),
    }
}

/// Parse the arguments of a `guard-seen` line.
fn parse_guard_seen(args: &str) -> Result<GuardSeen> {
    let bad = |why: &str| Error::BadGuardLine(format!("{} in {:?}", why, args));
    let mut parts = args.split_ascii_whitespace();
    let (hex, pct, appearances) = match (parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(a)) => (h, p, a),
        _ => return Err(bad("too few arguments")),
    };
    let identity = RsaIdentity::from_hex(hex).map_err(|_| bad("bad identity"))?;
    let percentage = match pct.parse::<u32>() {
        Ok(p) if p <= 100 => p,
        _ => return Err(bad("bad percentage")),
    };
    let appearances = appearances
        .parse::<u32>()
        .map_err(|_| bad("bad appearance count"))?;
    Ok(GuardSeen {
        identity,
        percentage,
        appearances,
    })
}

/// Read the guardfraction file in `text`, and apply it to
/// `routerstatuses` if provided.
pub fn read_guardfraction_file_from_str(
    text: &str,
    now: SystemTime,
    routerstatuses: Option<&mut VoteRouterStatusSet>,
) -> Result<GuardFractionSummary> {
    let file = GuardFractionFile::parse(text, now)?;
    Ok(file.apply(routerstatuses))
}

/// Load the guardfraction file at `path` with `loader`, and apply it to
/// `routerstatuses` if provided.
pub fn read_guardfraction_file<L: FileLoader + ?Sized>(
    loader: &L,
    path: &Path,
    now: SystemTime,
    routerstatuses: Option<&mut VoteRouterStatusSet>,
) -> Result<GuardFractionSummary> {
    let text = loader.load(path)?;
    read_guardfraction_file_from_str(&text, now, routerstatuses).map_err(|e| {
        warn!("Couldn't read guardfraction file {}: {}", path.display(), e);
        e
    })
}
