//! Multiplexer: reads N local source streams, tags each chunk with its
//! source's channel, writes a stream of tagged frames to one sink.
//!
//! Rather than a raw OS readiness primitive (epoll/kqueue) hand-rolled over
//! non-blocking fds, this gives each source its own dedicated blocking-read
//! thread — a portable fallback that trivially satisfies per-channel
//! ordering, since one thread owns one source end to end.

use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::codec;

/// Default ceiling on a single read from a source, applied uniformly unless
/// overridden by configuration.
pub const READ_CEILING: usize = 64 * 1024;

/// One source MUX reads from: a channel number, a label for logging, and the
/// `Read + Send` stream itself.
pub struct Source {
  pub channel: u16,
  pub label: &'static str,
  pub reader: Box<dyn Read + Send>,
}

/// A running multiplexer: `join` blocks until every source has reached EOF
/// (or errored) and its `active=0` frame has been written.
pub struct Mux {
  handles: Vec<JoinHandle<()>>,
}

impl Mux {
  /// Spawns one reader thread per source, all funneling framed output
  /// through `sink` under a shared lock so frames from different sources
  /// never interleave mid-frame. Each source is read in chunks no larger
  /// than `read_ceiling` bytes.
  pub fn start<W>(sources: Vec<Source>, sink: W, read_ceiling: usize) -> Mux
  where
    W: Write + Send + 'static,
  {
    let sink = Arc::new(Mutex::new(sink));
    let handles = sources
      .into_iter()
      .map(|source| {
        let sink = Arc::clone(&sink);
        thread::Builder::new()
          .name(format!("mux-{}", source.label))
          .spawn(move || run_source(source, sink, read_ceiling))
          .expect("spawn mux source thread")
      })
      .collect();
    Mux { handles }
  }

  /// Waits for every source thread to finish.
  pub fn join(self) {
    for handle in self.handles {
      let _ = handle.join();
    }
  }
}

fn run_source<W: Write + Send>(mut source: Source, sink: Arc<Mutex<W>>, read_ceiling: usize) {
  let mut buf = vec![0u8; read_ceiling];
  loop {
    match source.reader.read(&mut buf) {
      Ok(0) => {
        debug!(event = "mux_source_eof", channel = source.channel, label = source.label);
        let mut sink = sink.lock().unwrap();
        let _ = codec::write_eof(&mut *sink, source.channel);
        break;
      }
      Ok(n) => {
        debug!(event = "mux_source_read", channel = source.channel, bytes = n);
        let mut sink = sink.lock().unwrap();
        if codec::write_frame(&mut *sink, source.channel, Some(&buf[..n])).is_err() {
          // Sink is gone; nothing more this source can do.
          break;
        }
      }
      Err(error) => {
        // An OS I/O error on a data fd is treated as a premature EOF on
        // that channel, not a fatal protocol error.
        warn!(
          event = "mux_source_io_error",
          channel = source.channel,
          label = source.label,
          error = %error,
          "treating as premature EOF"
        );
        let mut sink = sink.lock().unwrap();
        let _ = codec::write_eof(&mut *sink, source.channel);
        break;
      }
    }
  }
}
