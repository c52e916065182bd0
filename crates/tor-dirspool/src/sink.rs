//! The connection side of spooling.

use std::io::{self, Write};

/// The output half of a directory connection, as seen by a spool queue.
pub trait SpoolSink {
    /// Return the number of bytes waiting to be flushed to the network.
    fn queued_len(&self) -> usize;

    /// Return true if this connection negotiated compression.
    fn is_compressed(&self) -> bool;

    /// Add `data` to the output, compressing it first if this connection
    /// is compressed.
    fn append(&mut self, data: &[u8]);

    /// Add `data` to the output exactly as given.
    ///
    /// Used for documents that are already in the connection's encoding.
    fn append_encoded(&mut self, data: &[u8]);

    /// Note that there is nothing more to send.
    fn finish(&mut self) {}
}

/// A [`SpoolSink`] that collects its output in memory.
///
/// In compressed mode, each call to [`append`](SpoolSink::append)
/// produces its own zlib stream.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    /// Everything written so far.
    data: Vec<u8>,
    /// How many bytes of `data` have been "flushed".
    flushed: usize,
    /// Whether this sink is compressed.
    compressed: bool,
    /// Whether `finish` has been called.
    finished: bool,
}

impl MemorySink {
    /// Construct a new empty sink.
    pub fn new(compressed: bool) -> Self {
        MemorySink {
            compressed,
            ..Default::default()
        }
    }

    /// Pretend that up to `n` queued bytes have been written to the
    /// network.
    pub fn drain(&mut self, n: usize) {
        self.flushed = self.flushed.saturating_add(n).min(self.data.len());
    }

    /// Return everything written to this sink.
    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    /// Consume this sink, and return everything written to it.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Return true if `finish` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl SpoolSink for MemorySink {
    fn queued_len(&self) -> usize {
        self.data.len() - self.flushed
    }
    fn is_compressed(&self) -> bool {
        self.compressed
    }
    fn append(&mut self, data: &[u8]) {
        if self.compressed {
            let z = miniz_oxide::deflate::compress_to_vec_zlib(data, 6);
            self.data.extend_from_slice(&z);
        } else {
            self.data.extend_from_slice(data);
        }
    }
    fn append_encoded(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }
    fn finish(&mut self) {
        self.finished = true;
    }
}

/// A [`SpoolSink`] that writes everything straight through to a
/// [`Write`].
///
/// Nothing is buffered here, so a spool queue feeding this sink holds at
/// most one chunk of output at a time.  After the first write error, the
/// sink discards further output; the error is returned by
/// [`into_inner`](Self::into_inner).
#[derive(Debug)]
pub struct WriteSink<W> {
    /// Where the output goes.
    out: W,
    /// Whether this sink is compressed.
    compressed: bool,
    /// How many bytes we've written.
    written: u64,
    /// The first error we got from `out`, if any.
    error: Option<io::Error>,
    /// Whether `finish` has been called.
    finished: bool,
}

impl<W: Write> WriteSink<W> {
    /// Construct a new sink that writes to `out`.
    pub fn new(out: W, compressed: bool) -> Self {
        WriteSink {
            out,
            compressed,
            written: 0,
            error: None,
            finished: false,
        }
    }

    /// Return the number of bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Return true if `finish` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Write `data` to the output, unless we've already failed.
    fn write_through(&mut self, data: &[u8]) {
        if self.error.is_some() {
            return;
        }
        match self.out.write_all(data) {
            Ok(()) => self.written += data.len() as u64,
            Err(e) => self.error = Some(e),
        }
    }

    /// Flush the output and give it back, or return the first error
    /// that happened while writing.
    pub fn into_inner(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> SpoolSink for WriteSink<W> {
    fn queued_len(&self) -> usize {
        0
    }
    fn is_compressed(&self) -> bool {
        self.compressed
    }
    fn append(&mut self, data: &[u8]) {
        if self.compressed {
            let z = miniz_oxide::deflate::compress_to_vec_zlib(data, 6);
            self.write_through(&z);
        } else {
            self.write_through(data);
        }
    }
    fn append_encoded(&mut self, data: &[u8]) {
        self.write_through(data);
    }
    fn finish(&mut self) {
        self.finished = true;
    }
}
