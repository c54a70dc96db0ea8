//! JSON codec for bridge messages.
//!
//! Decoding is strict: an unknown `name`, a missing field, or a mistyped
//! field is an explicit [`ProtocolError`], never a silent miscast. The
//! bridge endpoint decides what to do with a rejected message (log and
//! drop); this layer only reports it.

use crate::messages::{HostEvent, SurfaceCommand};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode any bridge message to its wire form.
pub fn encode<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a surface -> host command.
pub fn decode_command(raw: &str) -> Result<SurfaceCommand, ProtocolError> {
    Ok(serde_json::from_str(raw)?)
}

/// Decode a host -> surface event.
pub fn decode_event(raw: &str) -> Result<HostEvent, ProtocolError> {
    Ok(serde_json::from_str(raw)?)
}
