//! Spool documents to several connections at once.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tor_dircommon::DocDigest;
use tor_dirspool::{
    request::parse_resource_key, DocKind, MemorySink, MemoryStore, SpoolProgress, SpoolQueue,
    SpoolSink, SpoolSource, SpooledResource, WriteSink,
};

fn t(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

/// Run `q` to completion against `sink`, draining the sink each time it
/// fills up.
fn run(q: &mut SpoolQueue, store: &MemoryStore, sink: &mut MemorySink) {
    while q.flushed_some(store, sink) == SpoolProgress::Blocked {
        let n = sink.queued_len();
        sink.drain(n);
    }
}

#[test]
fn shared_document_outlives_replacement() {
    let mut store = MemoryStore::new();
    let old: Vec<u8> = (0..100_000_u32).map(|i| (i % 200) as u8).collect();
    let dir = store.consensuses_mut().set("ns", old.clone(), t(1000));

    // Two connections start sending the same consensus.
    let mut q1 = SpoolQueue::new();
    let mut q2 = SpoolQueue::new();
    q1.push(SpooledResource::new(SpoolSource::NetworkStatus, &[]).unwrap());
    q2.push(SpooledResource::new(SpoolSource::NetworkStatus, &[]).unwrap());
    let mut s1 = MemorySink::new(false);
    let mut s2 = MemorySink::new(false);
    assert_eq!(q1.flushed_some(&store, &mut s1), SpoolProgress::Blocked);
    assert_eq!(q2.flushed_some(&store, &mut s2), SpoolProgress::Blocked);
    assert_eq!(Arc::strong_count(&dir), 4);

    // A new consensus arrives, and the old one is dropped from the store.
    store.consensuses_mut().set("ns", "newer", t(2000));
    assert_eq!(Arc::strong_count(&dir), 3);

    // The first connection closes early; the second finishes.
    q1.clear();
    assert_eq!(Arc::strong_count(&dir), 2);
    run(&mut q2, &store, &mut s2);
    assert!(s2.is_finished());
    assert_eq!(s2.data(), &old[..]);
    assert_eq!(Arc::strong_count(&dir), 1);
}

#[test]
fn descriptor_request() {
    let mut store = MemoryStore::new();
    for b in 1..=3_u8 {
        store.insert(
            DocKind::Server,
            DocDigest::from_slice_padded(&[b; 20]),
            None,
            format!("router r{}\n", b),
            Some(t(u64::from(b) * 1000)),
        );
    }

    let key = format!(
        "d/{}+{}+{}+{}",
        hex::encode([3_u8; 20]),
        hex::encode([1_u8; 20]),
        hex::encode([9_u8; 20]),
        hex::encode([2_u8; 20]),
    );
    let mut q = SpoolQueue::new();
    for r in parse_resource_key(&key, DocKind::Server).unwrap() {
        q.push(r);
    }
    q.sort();

    let est = q.remove_missing_and_guess_size(&store, Some(t(1500)), false);
    assert_eq!(est.n_missing, 1);
    assert_eq!(est.n_expired, 1);
    assert_eq!(est.estimated_size, 20);

    let mut sink = MemorySink::new(false);
    run(&mut q, &store, &mut sink);
    assert_eq!(sink.data(), b"router r2\nrouter r3\n");
    assert_eq!(q.n_missing(), 0);
}

#[test]
fn compressed_connection() {
    let mut store = MemoryStore::new();
    let body = "r relay AAAA 2021-01-01 00:00:00 1.2.3.4 9001 0\n".repeat(3000);
    store.consensuses_mut().set("ns", body.clone(), t(1));

    let mut q = SpoolQueue::new();
    q.push(SpooledResource::new(SpoolSource::NetworkStatus, &[]).unwrap());
    let est = q.remove_missing_and_guess_size(&store, None, true);
    assert!((est.estimated_size as usize) < body.len());

    let mut sink = MemorySink::new(true);
    run(&mut q, &store, &mut sink);
    assert_eq!(sink.data().len() as u64, est.estimated_size);
    let inflated = miniz_oxide::inflate::decompress_to_vec_zlib(sink.data()).unwrap();
    assert_eq!(inflated, body.as_bytes());
}

#[test]
fn write_through_consensus() {
    let mut store = MemoryStore::new();
    let body: Vec<u8> = (0..200_000_u32).map(|i| (i % 251) as u8).collect();
    store.consensuses_mut().set("ns", body.clone(), t(1000));

    let mut q = SpoolQueue::new();
    q.push(SpooledResource::new(SpoolSource::NetworkStatus, &[]).unwrap());
    let mut sink = WriteSink::new(Vec::new(), false);
    assert_eq!(q.flushed_some(&store, &mut sink), SpoolProgress::Finished);
    assert!(sink.is_finished());
    assert_eq!(sink.written(), body.len() as u64);
    assert_eq!(sink.into_inner().unwrap(), body);
}
