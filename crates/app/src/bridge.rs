//! In-process message bridge.
//!
//! Two bounded channels of encoded JSON strings, one per direction. Each
//! direction preserves submission order; nothing is guaranteed across
//! directions, and there is no request/response pairing — correlation
//! lives in the fragment ids inside the payloads. A malformed message is
//! logged and dropped at the receiving endpoint; traffic behind it is
//! undisturbed.

use pagevox_foundation::BridgeError;
use pagevox_protocol::{codec, HostEvent, ProtocolError, SurfaceCommand};
use serde::Serialize;
use std::marker::PhantomData;
use tokio::sync::mpsc;
use tracing::warn;

pub struct BridgeSender<T: Serialize> {
    tx: mpsc::Sender<String>,
    direction: &'static str,
    _marker: PhantomData<T>,
}

impl<T: Serialize> BridgeSender<T> {
    pub async fn send(&self, message: &T) -> Result<(), BridgeError> {
        let raw = match codec::encode(message) {
            Ok(raw) => raw,
            Err(e) => {
                // Encoding our own enums cannot fail in practice; treat
                // it like a dropped message rather than a dead channel.
                warn!("Failed to encode {} message: {}", self.direction, e);
                return Ok(());
            }
        };
        self.tx
            .send(raw)
            .await
            .map_err(|_| BridgeError::ChannelClosed { direction: self.direction })
    }
}

pub struct BridgeReceiver<T> {
    rx: mpsc::Receiver<String>,
    decode: fn(&str) -> Result<T, ProtocolError>,
    direction: &'static str,
}

impl<T> BridgeReceiver<T> {
    /// Next well-formed message, or `None` once the peer is gone.
    /// Malformed traffic is logged and skipped.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            let raw = self.rx.recv().await?;
            match (self.decode)(&raw) {
                Ok(message) => return Some(message),
                Err(e) => warn!("Rejected {} message {:?}: {}", self.direction, raw, e),
            }
        }
    }
}

/// Surface side: sends commands, receives events.
pub struct SurfaceEndpoint {
    pub commands: BridgeSender<SurfaceCommand>,
    pub events: BridgeReceiver<HostEvent>,
}

/// Host side: receives commands, sends events.
pub struct HostEndpoint {
    pub commands: BridgeReceiver<SurfaceCommand>,
    pub events: BridgeSender<HostEvent>,
}

/// Build a connected endpoint pair.
pub fn bridge(capacity: usize) -> (SurfaceEndpoint, HostEndpoint) {
    let (command_tx, command_rx) = mpsc::channel(capacity);
    let (event_tx, event_rx) = mpsc::channel(capacity);
    (
        SurfaceEndpoint {
            commands: BridgeSender {
                tx: command_tx,
                direction: "surface->host",
                _marker: PhantomData,
            },
            events: BridgeReceiver {
                rx: event_rx,
                decode: codec::decode_event,
                direction: "host->surface",
            },
        },
        HostEndpoint {
            commands: BridgeReceiver {
                rx: command_rx,
                decode: codec::decode_command,
                direction: "surface->host",
            },
            events: BridgeSender {
                tx: event_tx,
                direction: "host->surface",
                _marker: PhantomData,
            },
        },
    )
}
