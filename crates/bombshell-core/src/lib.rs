//! Shared protocol, supervision, and ambient-stack pieces for the local and
//! remote bombshell peers.
//!
//! `codec` implements the wire format (frames, control frames). `mux`/`demux`
//! implement the stream multiplexer/demultiplexer. `signals` implements the
//! signal pipeline. `config`/`logging` are the ambient stack: on-disk
//! configuration and structured logging.

pub mod codec;
pub mod config;
pub mod demux;
pub mod error;
pub mod logging;
pub mod mux;
pub mod signals;

pub use error::ExitOutcome;
