//! Message contract for the PageVox bridge
//!
//! The surface and the host communicate only through discrete, named,
//! structurally-typed messages. There is no request/response pairing and
//! no delivery-order guarantee across directions; within one direction
//! messages arrive in submission order. Correlation between a speak
//! command and its progress/completion events is carried entirely by the
//! fragment id inside the payload.
//!
//! Wire format is a JSON object discriminated by a `name` field, e.g.
//! `{"name":"ttsSpeak","id":3,"text":"Hello"}`.

pub mod codec;
pub mod messages;

pub use codec::{decode_command, decode_event, encode, ProtocolError};
pub use messages::{HostEvent, SurfaceCommand};
