//! Wire format for both the handshake phase and the data phase.
//!
//! All integers are network byte order. Frames are not self-describing
//! beyond their own fixed header; there is no in-band escaping, so a short
//! read anywhere past a length field is always a protocol error.

use std::io::{self, Read, Write};

/// Maximum payload length a single data frame may carry (`length < 2^32`).
pub const MAX_FRAME_LEN: u64 = u32::MAX as u64;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("io error: {0}")]
  Io(#[from] io::Error),
  #[error("payload of {0} bytes exceeds the maximum frame length of {MAX_FRAME_LEN}")]
  PayloadTooLarge(usize),
  #[error("short read on a length-prefixed field: protocol violation")]
  ShortRead,
  #[error("duplicate EOF observed for channel {0}")]
  DuplicateEof(u16),
  #[error("frame received for unknown or already-closed channel {0}")]
  UnknownChannel(u16),
}

pub type Result<T> = std::result::Result<T, Error>;

/// One frame read off the data-phase stream: either a chunk of payload for a
/// channel, or that channel's EOF marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
  Data { channel: u16, payload: Vec<u8> },
  Eof { channel: u16 },
}

impl Frame {
  pub fn channel(&self) -> u16 {
    match self {
      Frame::Data { channel, .. } | Frame::Eof { channel } => *channel,
    }
  }
}

/// Confirms whether the remote side launched the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
  pub status: u16,
  pub errmsg: String,
}

/// Reads exactly `buf.len()` bytes, except that a *zero-byte* first read is
/// reported distinctly from a short read partway through. Used by
/// `read_confirmation` to special-case "no bytes at all" (domain
/// unreachable) from "started talking, then died" (protocol error).
fn read_exact_allow_empty<R: Read>(mut r: R, buf: &mut [u8]) -> Result<usize> {
  let mut filled = 0;
  while filled < buf.len() {
    match r.read(&mut buf[filled..])? {
      0 if filled == 0 => return Ok(0),
      0 => return Err(Error::ShortRead),
      n => filled += n,
    }
  }
  Ok(filled)
}

/// Writes a single data-phase frame carrying `payload`, or an EOF marker for
/// `channel` when `payload` is `None`. Always flushes before returning, so a
/// reader on the peer side never stalls on bytes the writer believes it
/// already sent.
pub fn write_frame<W: Write>(mut w: W, channel: u16, payload: Option<&[u8]>) -> Result<()> {
  w.write_all(&channel.to_be_bytes())?;
  match payload {
    Some(bytes) => {
      if bytes.len() as u64 > MAX_FRAME_LEN {
        return Err(Error::PayloadTooLarge(bytes.len()));
      }
      w.write_all(&[1u8])?;
      w.write_all(&(bytes.len() as u32).to_be_bytes())?;
      w.write_all(bytes)?;
    }
    None => {
      w.write_all(&[0u8])?;
    }
  }
  w.flush()?;
  Ok(())
}

/// Writes an `active=0` EOF frame for `channel`. Convenience wrapper over
/// [`write_frame`].
pub fn write_eof<W: Write>(w: W, channel: u16) -> Result<()> {
  write_frame(w, channel, None)
}

/// Reads one frame from the data-phase stream. Returns `Ok(None)` on a clean
/// transport-EOF observed before any new frame begins (no bytes read at all
/// for the channel header); any short read after that point is a protocol
/// violation.
pub fn read_frame<R: Read>(mut r: R) -> Result<Option<Frame>> {
  let mut channel_buf = [0u8; 2];
  if read_exact_allow_empty(&mut r, &mut channel_buf)? == 0 {
    return Ok(None);
  }
  let channel = u16::from_be_bytes(channel_buf);

  let mut active_buf = [0u8; 1];
  r.read_exact(&mut active_buf).map_err(|e| match e.kind() {
    io::ErrorKind::UnexpectedEof => Error::ShortRead,
    _ => Error::Io(e),
  })?;

  match active_buf[0] {
    0 => Ok(Some(Frame::Eof { channel })),
    1 => {
      let mut len_buf = [0u8; 4];
      r.read_exact(&mut len_buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::ShortRead,
        _ => Error::Io(e),
      })?;
      let len = u32::from_be_bytes(len_buf) as usize;
      let mut payload = vec![0u8; len];
      r.read_exact(&mut payload).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::ShortRead,
        _ => Error::Io(e),
      })?;
      Ok(Some(Frame::Data { channel, payload }))
    }
    _ => Err(Error::ShortRead),
  }
}

/// Writes the length-prefixed command request.
pub fn write_command<W: Write>(mut w: W, cmd_bytes: &[u8]) -> Result<()> {
  if cmd_bytes.len() as u64 > MAX_FRAME_LEN {
    return Err(Error::PayloadTooLarge(cmd_bytes.len()));
  }
  w.write_all(&(cmd_bytes.len() as u32).to_be_bytes())?;
  w.write_all(cmd_bytes)?;
  w.flush()?;
  Ok(())
}

/// Reads the length-prefixed command request.
pub fn read_command<R: Read>(mut r: R) -> Result<Vec<u8>> {
  let mut len_buf = [0u8; 4];
  r.read_exact(&mut len_buf).map_err(|_| Error::ShortRead)?;
  let len = u32::from_be_bytes(len_buf) as usize;
  let mut buf = vec![0u8; len];
  r.read_exact(&mut buf).map_err(|_| Error::ShortRead)?;
  Ok(buf)
}

/// Writes the launch confirmation.
pub fn write_confirmation<W: Write>(mut w: W, status: u16, errmsg: &str) -> Result<()> {
  let msg_bytes = errmsg.as_bytes();
  if msg_bytes.len() as u64 > MAX_FRAME_LEN {
    return Err(Error::PayloadTooLarge(msg_bytes.len()));
  }
  w.write_all(&status.to_be_bytes())?;
  w.write_all(&(msg_bytes.len() as u32).to_be_bytes())?;
  w.write_all(msg_bytes)?;
  w.flush()?;
  Ok(())
}

/// Reads the launch confirmation. If zero bytes are observed before the
/// status field, returns `(125, "domain does not exist")`; any short read
/// past that point is a protocol violation.
pub fn read_confirmation<R: Read>(mut r: R) -> Result<Confirmation> {
  let mut status_buf = [0u8; 2];
  if read_exact_allow_empty(&mut r, &mut status_buf)? == 0 {
    return Ok(Confirmation {
      status: 125,
      errmsg: "domain does not exist".to_string(),
    });
  }
  let status = u16::from_be_bytes(status_buf);

  let mut len_buf = [0u8; 4];
  r.read_exact(&mut len_buf).map_err(|_| Error::ShortRead)?;
  let len = u32::from_be_bytes(len_buf) as usize;
  let mut msg_buf = vec![0u8; len];
  r.read_exact(&mut msg_buf).map_err(|_| Error::ShortRead)?;
  let errmsg = String::from_utf8_lossy(&msg_buf).into_owned();

  Ok(Confirmation { status, errmsg })
}

/// Encodes an ordered sequence of command-argument strings into the opaque
/// payload carried by the command-request control frame. Joins arguments
/// with NUL, mirroring how `execve`'s own argv is laid out — simple, and
/// sidesteps escaping rules entirely since NUL cannot appear inside a
/// process argument.
pub fn encode_command(args: &[String]) -> Vec<u8> {
  args.join("\0").into_bytes()
}

/// Decodes the command-argument sequence written by [`encode_command`].
pub fn decode_command(bytes: &[u8]) -> Vec<String> {
  if bytes.is_empty() {
    return Vec::new();
  }
  String::from_utf8_lossy(bytes)
    .split('\0')
    .map(str::to_string)
    .collect()
}

/// Encodes the 2-byte signal event payload carried on channel 1.
pub fn encode_signal(signo: u16) -> [u8; 2] {
  signo.to_be_bytes()
}

/// Decodes a 2-byte signal event payload. A value of `0` is rejected by the
/// caller: the sentinel is internal to `SignalSender` and must never cross
/// the wire.
pub fn decode_signal(bytes: &[u8]) -> Option<u16> {
  if bytes.len() != 2 {
    return None;
  }
  Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}
