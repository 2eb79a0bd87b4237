//! Worker wire protocol for the Amplifier playground bridge
//!
//! Workers receive one JSON object on stdin and answer on stdout with
//! newline-delimited text. Lines prefixed with [`STREAM_MARKER`] carry typed
//! progress events; everything else is free text (usually a final JSON
//! result). This crate frames raw output into lines, parses the `STREAM:`
//! sub-protocol and writes request payloads.

pub mod error;
pub mod framing;
pub mod protocol;
pub mod transport;

pub use error::IpcError;
pub use framing::{LineFramer, LineReader, DEFAULT_MAX_LINE_BYTES};
pub use protocol::{parse_line, WorkerEvent, WorkerLine, STREAM_MARKER};
pub use transport::write_payload;
