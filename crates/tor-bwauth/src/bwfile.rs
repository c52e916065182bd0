//! Reading whole bandwidth files.
//!
//! Reading happens in two steps.  [`BwFile::parse`] turns the text of a
//! file into a list of measurements, and can run anywhere.
//! [`BwFile::apply`] then applies those measurements to a vote's
//! routerstatuses and to a [`MeasuredBwCache`]; that part has to happen
//! wherever that state lives.

use crate::bwcache::{MeasuredBwCache, MAX_MEASUREMENT_AGE};
use crate::bwline::MeasuredBwLine;
use crate::loader::FileLoader;
use crate::vote::VoteRouterStatusSet;
use crate::{Error, Result};

use std::path::Path;
use std::time::SystemTime;
use tor_dircommon::time::{age, from_unix_secs};
use tracing::{debug, info, warn};

/// The line that ends the header block of a bandwidth file.
pub const BW_FILE_TERMINATOR: &str = "=====\n";

/// Most headers we'll keep from a single bandwidth file, including the
/// `timestamp=` header that we synthesize from its first line.
pub const MAX_BW_FILE_HEADERS: usize = 50;

/// A parsed bandwidth file, not yet applied to anything.
#[derive(Clone, Debug)]
pub struct BwFile {
    /// When the file says it was generated.
    file_time: SystemTime,
    /// The headers, in order, without trailing newlines.
    headers: Vec<String>,
    /// The relay lines that we could parse.
    lines: Vec<MeasuredBwLine>,
    /// How many lines we had to skip.
    n_failed: usize,
}

/// What happened when we read and applied a bandwidth file.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct BwFileSummary {
    /// When the file says it was generated.
    pub file_time: SystemTime,
    /// The file's headers, starting with `timestamp=`.
    pub headers: Vec<String>,
    /// How many relay lines we parsed successfully.
    pub n_parsed: usize,
    /// How many of those matched a routerstatus.
    pub n_applied: usize,
    /// How many of those we added to the cache.
    pub n_cached: usize,
    /// How many lines we had to skip.
    pub n_failed: usize,
    /// How many stale entries we removed from the cache afterwards.
    pub n_expired: usize,
}

impl BwFile {
    /// Parse the contents of a bandwidth file, as of `now`.
    ///
    /// Fails if the file has no usable timestamp, or if that timestamp
    /// is older than [`MAX_MEASUREMENT_AGE`].  Bad lines elsewhere in
    /// the file are logged, counted, and skipped.
    pub fn parse(text: &str, now: SystemTime) -> Result<Self> {
        let mut lines = text.split_inclusive('\n');
        let first = lines.next().ok_or(Error::EmptyFile)?;
        let file_time = parse_timestamp_line(first)?;

        let file_age = age(now, file_time);
        if file_age > MAX_MEASUREMENT_AGE {
            return Err(Error::StaleFile(file_age));
        }

        let secs = first.trim();
        let mut bwfile = BwFile {
            file_time,
            headers: vec![format!("timestamp={}", secs)],
            lines: Vec::new(),
            n_failed: 0,
        };

        let mut after_headers = false;
        for line in lines {
            if !line.ends_with('\n') {
                warn!("Bandwidth file ended with a truncated line");
                bwfile.n_failed += 1;
                continue;
            }
            if !after_headers && line == BW_FILE_TERMINATOR {
                after_headers = true;
                continue;
            }
            match MeasuredBwLine::parse(line, after_headers) {
                Ok(l) => {
                    after_headers = true;
                    bwfile.lines.push(l);
                }
                Err(Error::HeaderLine) => {
                    if bwfile.headers.len() < MAX_BW_FILE_HEADERS {
                        bwfile.headers.push(line.trim_end().to_string());
                    } else {
                        debug!("Ignoring extra bandwidth file header {:?}", line.trim_end());
                    }
                }
                Err(e) => {
                    if after_headers {
                        warn!("Skipping line in bandwidth file: {}", e);
                    } else {
                        debug!("Skipping header in bandwidth file: {}", e);
                    }
                    bwfile.n_failed += 1;
                }
            }
        }

        Ok(bwfile)
    }

    /// Return the time at which this file was generated.
    pub fn file_time(&self) -> SystemTime {
        self.file_time
    }

    /// Return the headers from this file, starting with `timestamp=`.
    pub fn headers(&self) -> &[String] {
        &self.headers[..]
    }

    /// Return the relay lines that we parsed.
    pub fn lines(&self) -> &[MeasuredBwLine] {
        &self.lines[..]
    }

    /// Return the number of lines we couldn't parse.
    pub fn n_failed(&self) -> usize {
        self.n_failed
    }

    /// Apply the measurements in this file.
    ///
    /// Each measurement is applied to `routerstatuses` (if provided), and
    /// then added to `cache` as of the file's timestamp, whether or not it
    /// matched a routerstatus.  Finally, the cache is purged of entries
    /// that are too old as of `now`.
    pub fn apply(
        self,
        mut routerstatuses: Option<&mut VoteRouterStatusSet>,
        cache: &mut MeasuredBwCache,
        now: SystemTime,
    ) -> BwFileSummary {
        let n_parsed = self.lines.len();
        let mut n_applied = 0;
        let mut n_cached = 0;
        for mut line in self.lines {
            if let Some(rs) = routerstatuses.as_mut() {
                if rs.apply_measured_bw(&mut line) {
                    n_applied += 1;
                }
            }
            if cache.cache(&line, self.file_time) {
                n_cached += 1;
            } else {
                debug!("Not caching unresolved measurement for {}", line.node_hex());
            }
        }
        let n_expired = cache.expire(now);

        info!(
            "Read {} bandwidth measurements ({} applied, {} bad lines)",
            n_parsed, n_applied, self.n_failed
        );

        BwFileSummary {
            file_time: self.file_time,
            headers: self.headers,
            n_parsed,
            n_applied,
            n_cached,
            n_failed: self.n_failed,
            n_expired,
        }
    }
}

/// Parse the first line of a bandwidth file: a decimal UNIX timestamp.
fn parse_timestamp_line(line: &str) -> Result<SystemTime> {
    let secs = line
        .strip_suffix('\n')
        .ok_or_else(|| Error::BadTimestamp(line.to_string()))?
        .trim();
    let n: u64 = secs
        .parse()
        .map_err(|_| Error::BadTimestamp(secs.to_string()))?;
    from_unix_secs(n).ok_or_else(|| Error::BadTimestamp(secs.to_string()))
}

/// Read the bandwidth file in `text`, and apply it to `routerstatuses`
/// (if provided) and `cache`.
pub fn read_measured_bandwidths(
    text: &str,
    now: SystemTime,
    routerstatuses: Option<&mut VoteRouterStatusSet>,
    cache: &mut MeasuredBwCache,
) -> Result<BwFileSummary> {
    let bwfile = BwFile::parse(text, now)?;
    Ok(bwfile.apply(routerstatuses, cache, now))
}

/// Load the bandwidth file at `path` using `loader`, and apply it to
/// `routerstatuses` (if provided) and `cache`.
pub fn read_measured_bandwidths_file<L: FileLoader + ?Sized>(
    loader: &L,
    path: &Path,
    now: SystemTime,
    routerstatuses: Option<&mut VoteRouterStatusSet>,
    cache: &mut MeasuredBwCache,
) -> Result<BwFileSummary> {
    let text = loader.load(path)?;
    read_measured_bandwidths(&text, now, routerstatuses, cache).map_err(|e| {
        warn!("Couldn't read bandwidth file {}: {}", path.display(), e);
        e
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    const T: u64 = 1_523_911_758;

    fn now() -> SystemTime {
        from_unix_secs(T + 60).unwrap()
    }

    #[test]
    fn headers_and_terminator() -> Result<()> {
        let text = format!(
            "{}\nversion=1.1.0\nsoftware=sbws\n=====\n\
             bw=760 node_id=$9C7E9C4E2D27B30B8B3C26E5D8D58EFDDC5C6E4E\n",
            T
        );
        let f = BwFile::parse(&text, now())?;
        assert_eq!(f.file_time(), from_unix_secs(T).unwrap());
        assert_eq!(
            f.headers(),
            &[
                format!("timestamp={}", T),
                "version=1.1.0".to_string(),
                "software=sbws".to_string()
            ]
        );
        assert_eq!(f.lines().len(), 1);
        assert_eq!(f.n_failed(), 0);
        Ok(())
    }

    #[test]
    fn headers_end_at_first_relay() -> Result<()> {
        // Old-style files have no terminator.
        let text = format!(
            "{}\nnode_id=$9C7E9C4E2D27B30B8B3C26E5D8D58EFDDC5C6E4E bw=10\nversion=2\n",
            T
        );
        let f = BwFile::parse(&text, now())?;
        assert_eq!(f.headers().len(), 1);
        assert_eq!(f.lines().len(), 1);
        assert_eq!(f.n_failed(), 1);
        Ok(())
    }

    #[test]
    fn too_many_headers() -> Result<()> {
        let mut text = format!("{}\n", T);
        for i in 0..60 {
            text.push_str(&format!("key{}=val\n", i));
        }
        text.push_str("=====\n");
        let f = BwFile::parse(&text, now())?;
        assert_eq!(f.headers().len(), MAX_BW_FILE_HEADERS);
        Ok(())
    }

    #[test]
    fn bad_timestamps() {
        assert!(matches!(BwFile::parse("", now()), Err(Error::EmptyFile)));
        assert!(matches!(
            BwFile::parse("not a time\n", now()),
            Err(Error::BadTimestamp(_))
        ));
        assert!(matches!(
            BwFile::parse(&format!("{}", T), now()),
            Err(Error::BadTimestamp(_))
        ));
        let late = from_unix_secs(T).unwrap() + MAX_MEASUREMENT_AGE + Duration::from_secs(1);
        assert!(matches!(
            BwFile::parse(&format!("{}\n", T), late),
            Err(Error::StaleFile(_))
        ));
    }

    #[test]
    fn unrepresentable_timestamp() {
        let mut cache = MeasuredBwCache::new();
        let r = read_measured_bandwidths(
            "18446744073709551615\n=====\n",
            now(),
            None,
            &mut cache,
        );
        assert!(matches!(r, Err(Error::BadTimestamp(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn truncated_last_line() -> Result<()> {
        let text = format!(
            "{}\n=====\nbw=10 node_id=$9C7E9C4E2D27B30B8B3C26E5D8D58EFDDC5C6E4E",
            T
        );
        let f = BwFile::parse(&text, now())?;
        assert!(f.lines().is_empty());
        assert_eq!(f.n_failed(), 1);
        Ok(())
    }
}
