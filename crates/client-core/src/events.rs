//! Events flowing into and out of the session controller
//!
//! # Inbound
//!
//! The signaling engine reports everything that happens on the connection
//! as a [`SignalingEvent`] pushed through an [`EventSender`]. All events go
//! through one ordered channel, so the controller sees them exactly once and
//! in the order the engine produced them, whatever thread they came from.
//!
//! # Outbound
//!
//! The controller publishes [`SessionEvent`]s on a broadcast channel.
//! State transitions are always published; application-level messages
//! (notify, push, message, data channel) are only useful to a subscriber
//! and are dropped when nobody listens.
//!
//! ```rust
//! use vidlink_client_core::events::{event_channel, SignalingEvent};
//!
//! let (sender, mut receiver) = event_channel();
//! let worker = std::thread::spawn(move || {
//!     sender.send(SignalingEvent::OfferEstablished);
//! });
//! worker.join().unwrap();
//! assert!(matches!(receiver.try_recv(), Ok(SignalingEvent::OfferEstablished)));
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::client::types::SessionState;
use crate::error::ClientError;
use crate::media::{Receiver, TrackId, Transceiver};

/// Why the signaling connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectCode {
    /// Closed on request
    CloseSucceeded,
    /// Close was requested but did not complete cleanly
    CloseFailed,
    InternalError,
    InvalidParameter,
    WebSocketHandshakeFailed,
    WebSocketOnClose,
    WebSocketOnError,
    PeerConnectionStateFailed,
    IceFailed,
}

impl DisconnectCode {
    pub fn is_normal(self) -> bool {
        self == DisconnectCode::CloseSucceeded
    }
}

impl fmt::Display for DisconnectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisconnectCode::CloseSucceeded => "CLOSE_SUCCEEDED",
            DisconnectCode::CloseFailed => "CLOSE_FAILED",
            DisconnectCode::InternalError => "INTERNAL_ERROR",
            DisconnectCode::InvalidParameter => "INVALID_PARAMETER",
            DisconnectCode::WebSocketHandshakeFailed => "WEBSOCKET_HANDSHAKE_FAILED",
            DisconnectCode::WebSocketOnClose => "WEBSOCKET_ONCLOSE",
            DisconnectCode::WebSocketOnError => "WEBSOCKET_ONERROR",
            DisconnectCode::PeerConnectionStateFailed => "PEER_CONNECTION_STATE_FAILED",
            DisconnectCode::IceFailed => "ICE_FAILED",
        };
        f.write_str(name)
    }
}

/// Final outcome of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectReason {
    pub code: DisconnectCode,
    pub message: String,
}

impl DisconnectReason {
    pub fn new(code: DisconnectCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_normal(&self) -> bool {
        self.code.is_normal()
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Everything the signaling engine can report
#[derive(Debug, Clone)]
pub enum SignalingEvent {
    /// The offer was applied; local tracks may now be attached
    OfferEstablished,
    /// The connection is gone. Always the last event of a session.
    Disconnected { code: DisconnectCode, message: String },
    RemoteTrackAdded(Transceiver),
    RemoteTrackRemoved(Receiver),
    DataChannelOpened { label: String },
    Notify { text: String },
    Push { text: String },
    Message { label: String, data: String },
}

impl SignalingEvent {
    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            SignalingEvent::OfferEstablished => "offer-established",
            SignalingEvent::Disconnected { .. } => "disconnected",
            SignalingEvent::RemoteTrackAdded(_) => "remote-track-added",
            SignalingEvent::RemoteTrackRemoved(_) => "remote-track-removed",
            SignalingEvent::DataChannelOpened { .. } => "data-channel-opened",
            SignalingEvent::Notify { .. } => "notify",
            SignalingEvent::Push { .. } => "push",
            SignalingEvent::Message { .. } => "message",
        }
    }
}

/// Thread-safe handle the engine uses to report events.
///
/// Sending never blocks. Events sent after the controller has gone away are
/// discarded.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<SignalingEvent>,
}

impl EventSender {
    /// Queue an event. Returns `false` if the controller is gone.
    pub fn send(&self, event: SignalingEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create the ordered event channel between an engine and a controller
pub fn event_channel() -> (EventSender, mpsc::UnboundedReceiver<SignalingEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

/// Events published by the session controller
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged {
        previous: SessionState,
        current: SessionState,
        at: DateTime<Utc>,
    },
    /// A local track could not be attached; the session continues
    TrackAttachFailed { track_id: TrackId, error: ClientError },
    DataChannelOpened { label: String },
    Notify { text: String },
    Push { text: String },
    Message { label: String, data: String },
    /// The session ended; no further events follow
    Closed(DisconnectReason),
}
