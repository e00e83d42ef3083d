//! In-process signaling engine
//!
//! [`LoopbackEngine`] needs no server. It is used by the demo binary and
//! by tests:
//!
//! - `connect` immediately reports `OfferEstablished`
//! - every attached local track comes back as a remote track of the same
//!   kind (`RemoteTrackAdded`)
//! - `disconnect` removes the echoed tracks and then reports
//!   `Disconnected(CloseSucceeded)`
//!
//! A [`LoopbackProbe`] stays with the caller after the engine has been
//! handed to a controller. It counts calls and can inject arbitrary
//! events, e.g. a remote close.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::engine::{SignalingConfig, SignalingEngine};
use crate::error::{ClientError, ClientResult};
use crate::events::{DisconnectCode, EventSender, SignalingEvent};
use crate::media::{MediaKind, MediaTrack, Receiver, StreamId, TrackId, Transceiver};

/// A local track as the engine saw it
#[derive(Debug, Clone)]
pub struct AttachedTrack {
    pub track_id: TrackId,
    pub kind: MediaKind,
    pub stream_id: StreamId,
}

#[derive(Debug, Default)]
struct ProbeState {
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    add_tracks: AtomicUsize,
    attached: Mutex<Vec<AttachedTrack>>,
    last_config: Mutex<Option<SignalingConfig>>,
    sender: Mutex<Option<EventSender>>,
}

/// Observer for a [`LoopbackEngine`] that has been moved into a controller
#[derive(Debug, Clone, Default)]
pub struct LoopbackProbe {
    state: Arc<ProbeState>,
}

impl LoopbackProbe {
    pub fn connect_calls(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }

    pub fn add_track_calls(&self) -> usize {
        self.state.add_tracks.load(Ordering::SeqCst)
    }

    /// Tracks accepted by `add_track`, in call order
    pub fn attached(&self) -> Vec<AttachedTrack> {
        self.state.attached.lock().clone()
    }

    /// Configuration passed to the last `connect`
    pub fn last_config(&self) -> Option<SignalingConfig> {
        self.state.last_config.lock().clone()
    }

    /// Push an event as if the remote side had produced it. Returns `false`
    /// when the engine is not connected or the controller is gone.
    pub fn inject(&self, event: SignalingEvent) -> bool {
        match self.state.sender.lock().as_ref() {
            Some(sender) => sender.send(event),
            None => false,
        }
    }
}

#[derive(Debug)]
pub struct LoopbackEngine {
    probe: LoopbackProbe,
    fail_connect: Option<String>,
    reject_kind: Option<MediaKind>,
    echo: bool,
    greeting: Option<String>,
    echoed: Vec<Receiver>,
}

impl LoopbackEngine {
    pub fn new() -> Self {
        Self {
            probe: LoopbackProbe::default(),
            fail_connect: None,
            reject_kind: None,
            echo: true,
            greeting: None,
            echoed: Vec::new(),
        }
    }

    /// Make `connect` fail with a signaling error
    pub fn fail_connect(mut self, message: impl Into<String>) -> Self {
        self.fail_connect = Some(message.into());
        self
    }

    /// Refuse to attach tracks of `kind`
    pub fn reject_kind(mut self, kind: MediaKind) -> Self {
        self.reject_kind = Some(kind);
        self
    }

    /// Do not echo attached tracks back as remote tracks
    pub fn without_echo(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Send a notify message right after the offer is established
    pub fn with_greeting(mut self, text: impl Into<String>) -> Self {
        self.greeting = Some(text.into());
        self
    }

    pub fn probe(&self) -> LoopbackProbe {
        self.probe.clone()
    }

    fn emit(&self, event: SignalingEvent) {
        if let Some(sender) = self.probe.state.sender.lock().as_ref() {
            sender.send(event);
        }
    }
}

impl Default for LoopbackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingEngine for LoopbackEngine {
    fn connect(&mut self, config: &SignalingConfig, events: EventSender) -> ClientResult<()> {
        let state = &self.probe.state;
        state.connects.fetch_add(1, Ordering::SeqCst);
        *state.last_config.lock() = Some(config.clone());

        if let Some(message) = &self.fail_connect {
            return Err(ClientError::signaling(message.clone()));
        }

        info!(
            url = config.signaling_urls.first().map(String::as_str).unwrap_or_default(),
            channel_id = %config.channel_id,
            "loopback connection established"
        );
        *state.sender.lock() = Some(events);

        self.emit(SignalingEvent::OfferEstablished);
        if let Some(text) = self.greeting.clone() {
            self.emit(SignalingEvent::Notify { text });
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.probe.state.disconnects.fetch_add(1, Ordering::SeqCst);

        let Some(sender) = self.probe.state.sender.lock().take() else {
            debug!("loopback engine not connected, nothing to close");
            return;
        };
        for receiver in self.echoed.drain(..) {
            sender.send(SignalingEvent::RemoteTrackRemoved(receiver));
        }
        sender.send(SignalingEvent::Disconnected {
            code: DisconnectCode::CloseSucceeded,
            message: "closed".to_string(),
        });
    }

    fn add_track(&mut self, track: Arc<MediaTrack>, stream_id: &StreamId) -> ClientResult<()> {
        let state = &self.probe.state;
        state.add_tracks.fetch_add(1, Ordering::SeqCst);

        if self.reject_kind == Some(track.kind()) {
            return Err(ClientError::track_attach(
                track.id().clone(),
                format!("loopback engine rejects {} tracks", track.kind()),
            ));
        }

        state.attached.lock().push(AttachedTrack {
            track_id: track.id().clone(),
            kind: track.kind(),
            stream_id: stream_id.clone(),
        });

        if self.echo {
            let remote = MediaTrack::remote(TrackId::random(), track.kind());
            let receiver = Receiver::new(remote);
            let mid = self.echoed.len().to_string();
            self.echoed.push(receiver.clone());
            self.emit(SignalingEvent::RemoteTrackAdded(Transceiver::new(Some(mid), receiver)));
        }
        Ok(())
    }
}
