//! Read whole bandwidth files and check what they do to a vote and cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tor_bwauth::{
    read_measured_bandwidths, read_measured_bandwidths_file, Error, FileLoader, MeasuredBwCache,
    Result, VoteRouterStatus, VoteRouterStatusSet, MAX_MEASUREMENT_AGE,
};
use tor_dircommon::time::from_unix_secs;
use tor_dircommon::RsaIdentity;

const FILE_TIME: u64 = 1_600_000_000;

fn id(b: u8) -> RsaIdentity {
    RsaIdentity::from_bytes(&[b; 20]).unwrap()
}

fn vote() -> VoteRouterStatusSet {
    VoteRouterStatusSet::new(vec![
        VoteRouterStatus::new("relayAA", id(0xAA), 100),
        VoteRouterStatus::new("relayBB", id(0xBB), 100),
        VoteRouterStatus::new("relayCC", id(0xCC), 100),
    ])
}

fn bwfile() -> String {
    format!(
        "{}
version=1.4.0
software=sbws
=====
bw=800 node_id=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA
bw=lots node_id=$BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB
bw=300 nick=relayCC
node_id=$DDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDD

bw=99 node_id=$EEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEEE unknown=token
",
        FILE_TIME
    )
}

#[derive(Default)]
struct MapLoader(HashMap<PathBuf, String>);

impl FileLoader for MapLoader {
    fn load(&self, path: &Path) -> Result<String> {
        self.0.get(path).cloned().ok_or_else(|| {
            Error::Io(
                path.display().to_string(),
                std::sync::Arc::new(std::io::ErrorKind::NotFound.into()),
            )
        })
    }
}

#[test]
fn read_and_apply() -> Result<()> {
    let now = from_unix_secs(FILE_TIME + 3600).unwrap();
    let mut rs = vote();
    let mut cache = MeasuredBwCache::new();

    let summary = read_measured_bandwidths(&bwfile(), now, Some(&mut rs), &mut cache)?;

    assert_eq!(summary.file_time, from_unix_secs(FILE_TIME).unwrap());
    assert_eq!(summary.headers.len(), 3);
    assert_eq!(summary.headers[0], format!("timestamp={}", FILE_TIME));
    assert_eq!(summary.n_parsed, 3);
    assert_eq!(summary.n_applied, 2);
    // Every parsed line ends up in the cache, including relays that
    // weren't in the vote.
    assert_eq!(summary.n_cached, 3);
    assert_eq!(summary.n_failed, 3);

    let aa = rs.get(&id(0xAA)).unwrap();
    assert!(aa.has_measured_bw);
    assert_eq!(aa.measured_bw_kb, 800);
    assert!(!rs.get(&id(0xBB)).unwrap().has_measured_bw);
    assert_eq!(rs.get(&id(0xCC)).unwrap().measured_bw_kb, 300);

    assert_eq!(cache.len(), 3);
    let m = cache.query(&id(0xAA), now).unwrap();
    assert_eq!(m.bw_kb, 800);
    assert_eq!(m.as_of, from_unix_secs(FILE_TIME).unwrap());
    assert_eq!(cache.query(&id(0xCC), now).unwrap().bw_kb, 300);
    assert_eq!(cache.query(&id(0xEE), now).unwrap().bw_kb, 99);
    assert!(cache.query(&id(0xBB), now).is_none());
    Ok(())
}

#[test]
fn cache_only() -> Result<()> {
    let now = from_unix_secs(FILE_TIME).unwrap();
    let mut cache = MeasuredBwCache::new();
    let summary = read_measured_bandwidths(&bwfile(), now, None, &mut cache)?;
    assert_eq!(summary.n_applied, 0);
    // The nickname-only line can't be cached without a vote to resolve it.
    assert_eq!(summary.n_cached, 2);
    assert!(cache.has_measurement(&id(0xAA), now));
    assert!(!cache.has_measurement(&id(0xCC), now));
    Ok(())
}

#[test]
fn stale_entries_expire() -> Result<()> {
    let mut cache = MeasuredBwCache::new();
    let old = from_unix_secs(FILE_TIME - 86400 * 4).unwrap();
    cache.insert(id(0x11), 5, old);

    let now = from_unix_secs(FILE_TIME + 60).unwrap();
    let summary = read_measured_bandwidths(&bwfile(), now, None, &mut cache)?;
    assert_eq!(summary.n_expired, 1);
    assert!(!cache.has_measurement(&id(0x11), now));

    // Three days later, the file's own entries stop being answers.
    let later = from_unix_secs(FILE_TIME).unwrap() + MAX_MEASUREMENT_AGE + Duration::from_secs(1);
    assert!(cache.query(&id(0xAA), later).is_none());
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.expire(later), 2);
    assert!(cache.is_empty());
    Ok(())
}

#[test]
fn stale_file_changes_nothing() {
    let mut rs = vote();
    let mut cache = MeasuredBwCache::new();
    let now: SystemTime =
        from_unix_secs(FILE_TIME).unwrap() + MAX_MEASUREMENT_AGE + Duration::from_secs(10);
    let r = read_measured_bandwidths(&bwfile(), now, Some(&mut rs), &mut cache);
    assert!(matches!(r, Err(Error::StaleFile(_))));
    assert!(cache.is_empty());
    assert!(rs.iter().all(|r| !r.has_measured_bw));
}

#[test]
fn read_through_loader() -> Result<()> {
    let mut loader = MapLoader::default();
    loader.0.insert("/var/lib/tor/bwfile".into(), bwfile());
    let now = from_unix_secs(FILE_TIME + 10).unwrap();
    let mut cache = MeasuredBwCache::new();

    let summary = read_measured_bandwidths_file(
        &loader,
        Path::new("/var/lib/tor/bwfile"),
        now,
        None,
        &mut cache,
    )?;
    assert_eq!(summary.n_parsed, 3);

    let r = read_measured_bandwidths_file(&loader, Path::new("/nope"), now, None, &mut cache);
    assert!(matches!(r, Err(Error::Io(_, _))));
    Ok(())
}
