//! Session controller
//!
//! Owns one signaling connection from start to finish:
//!
//! 1. [`connect`](SessionController::connect) provisions local tracks
//!    (none for `recvonly`) and asks the engine to connect.
//! 2. [`run`](SessionController::run) is the session's single execution
//!    context. It waits on termination requests, renderer work dispatched
//!    through the bridge, and signaling events, handling one at a time.
//! 3. On `OfferEstablished` every local track is attached under one stream
//!    id. Remote video tracks are forwarded to the renderer through the
//!    dispatch bridge.
//! 4. A termination request (OS signal or [`SessionHandle::disconnect`])
//!    asks the engine to disconnect exactly once. The engine's
//!    `Disconnected` event tears everything down and `run` returns the
//!    reason.
//!
//! There is no reconnect. A controller runs one session and is then spent.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::dispatch::ExecutionContext;
use super::tracks::{LocalTrackSet, MediaSelection, TrackProvisioner};
use super::types::{SessionState, TerminationSource};
use crate::capture::CaptureLibrary;
use crate::engine::{SignalingConfig, SignalingEngine};
use crate::error::{ClientError, ClientResult};
use crate::events::{
    event_channel, DisconnectCode, DisconnectReason, EventSender, SessionEvent, SignalingEvent,
};
use crate::media::{MediaTrack, StreamId};
use crate::renderer::{RendererBridge, VideoRenderer};

/// Stream of [`SessionEvent`]s for UI integration
pub type EventStream = BroadcastStream<SessionEvent>;

/// Cloneable handle for observing and stopping a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    termination_tx: mpsc::UnboundedSender<TerminationSource>,
    state_rx: watch::Receiver<SessionState>,
}

impl SessionHandle {
    /// Ask the session to disconnect. Repeated requests are harmless.
    pub fn disconnect(&self) -> bool {
        self.request_termination(TerminationSource::Application)
    }

    /// Forward a termination request. Returns `false` once the controller
    /// is gone.
    pub fn request_termination(&self, source: TerminationSource) -> bool {
        self.termination_tx.send(source).is_ok()
    }

    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Wait until the session reaches `target` (or has already passed the
    /// point where it could). Returns the state observed last.
    pub async fn wait_for_state(&self, target: SessionState) -> SessionState {
        let mut rx = self.state_rx.clone();
        loop {
            let current = *rx.borrow_and_update();
            if current == target || current.is_terminal() {
                return current;
            }
            if rx.changed().await.is_err() {
                return *rx.borrow();
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.termination_tx.is_closed()
    }

    /// Resolves once the controller has been dropped
    pub async fn closed(&self) {
        self.termination_tx.closed().await
    }
}

pub struct SessionController {
    config: SessionConfig,
    signaling: SignalingConfig,
    engine: Box<dyn SignalingEngine>,
    provisioner: TrackProvisioner,
    renderer: Option<Box<dyn VideoRenderer>>,
    context: ExecutionContext<dyn VideoRenderer>,
    tracks: LocalTrackSet,
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    events_tx: broadcast::Sender<SessionEvent>,
    signal_tx: Option<EventSender>,
    signal_rx: mpsc::UnboundedReceiver<SignalingEvent>,
    termination_tx: mpsc::UnboundedSender<TerminationSource>,
    termination_rx: mpsc::UnboundedReceiver<TerminationSource>,
}

impl SessionController {
    pub(crate) fn new(
        config: SessionConfig,
        signaling: SignalingConfig,
        engine: Box<dyn SignalingEngine>,
        capture: Option<Arc<dyn CaptureLibrary>>,
        renderer: Option<Box<dyn VideoRenderer>>,
        event_capacity: usize,
    ) -> Self {
        let provisioner = TrackProvisioner::new(capture).with_media(MediaSelection {
            audio: config.audio,
            video: config.video,
        });
        let (signal_tx, signal_rx) = event_channel();
        let (termination_tx, termination_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(SessionState::Idle);
        let (events_tx, _) = broadcast::channel(event_capacity);

        Self {
            config,
            signaling,
            engine,
            provisioner,
            renderer,
            context: ExecutionContext::new(),
            tracks: LocalTrackSet::empty(),
            state: SessionState::Idle,
            state_tx,
            events_tx,
            signal_tx: Some(signal_tx),
            signal_rx,
            termination_tx,
            termination_rx,
        }
    }

    pub fn builder(config: SessionConfig) -> super::builder::SessionBuilder {
        super::builder::SessionBuilder::new(config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn local_tracks(&self) -> &LocalTrackSet {
        &self.tracks
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            termination_tx: self.termination_tx.clone(),
            state_rx: self.state_tx.subscribe(),
        }
    }

    /// Bridge onto this session's execution context
    pub fn dispatch_bridge(&self) -> RendererBridge {
        self.context.bridge()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub fn events(&self) -> EventStream {
        BroadcastStream::new(self.events_tx.subscribe())
    }

    /// Provision local tracks and start the signaling connection.
    ///
    /// On capture failure the session goes straight to `Disconnected`
    /// without the engine ever being contacted.
    pub fn connect(&mut self) -> ClientResult<()> {
        if self.state != SessionState::Idle {
            return Err(ClientError::invalid_state(format!(
                "connect called in state {}, a session can only be connected once",
                self.state
            )));
        }

        info!(
            role = %self.signaling.role,
            channel_id = %self.config.channel_id,
            "starting session"
        );

        self.tracks = match self.provisioner.provision(self.signaling.role, &self.config.capture) {
            Ok(tracks) => tracks,
            Err(e) => {
                error!("Failed to provision local tracks: {}", e);
                self.teardown();
                return Err(e);
            }
        };

        if self.renderer.is_some() {
            let bridge = self.context.bridge();
            let show_me = self.config.display.as_ref().map_or(false, |d| d.show_me);
            if let (true, Some(video)) = (show_me, self.tracks.video.clone()) {
                bridge.dispatch(move |renderer| renderer.add_track(video));
            }

            let target = bridge.clone();
            bridge.dispatch(move |renderer| renderer.set_dispatch_target(target));
        }

        let Some(sender) = self.signal_tx.take() else {
            return Err(ClientError::invalid_state("event sender already handed out"));
        };

        self.set_state(SessionState::Connecting);
        if let Err(e) = self.engine.connect(&self.signaling, sender) {
            error!("Signaling engine refused to connect: {}", e);
            self.teardown();
            return Err(e);
        }
        Ok(())
    }

    /// Drive the session to completion.
    ///
    /// Connects first if [`connect`](Self::connect) was not called. Returns
    /// the reason the engine reported when the connection closed.
    pub async fn run(mut self) -> ClientResult<DisconnectReason> {
        if self.state == SessionState::Idle {
            self.connect()?;
        }
        if self.state.is_terminal() {
            return Err(ClientError::invalid_state("session already finished"));
        }

        loop {
            tokio::select! {
                biased;

                Some(source) = self.termination_rx.recv() => {
                    self.on_termination(source);
                }

                Some(work) = self.context.next() => {
                    if let Some(renderer) = self.renderer.as_deref_mut() {
                        work(renderer);
                    }
                }

                event = self.signal_rx.recv() => {
                    let event = event.unwrap_or_else(|| {
                        warn!("signaling engine dropped its event sender");
                        SignalingEvent::Disconnected {
                            code: DisconnectCode::InternalError,
                            message: "signaling event channel closed".to_string(),
                        }
                    });
                    if let Some(reason) = self.on_event(event) {
                        return Ok(reason);
                    }
                }
            }
        }
    }

    fn on_termination(&mut self, source: TerminationSource) {
        if self.state.accepts_termination() {
            info!(%source, "termination requested, disconnecting");
            self.engine.disconnect();
            self.set_state(SessionState::Disconnecting);
        } else {
            debug!(%source, state = %self.state, "ignoring termination request");
        }
    }

    fn on_event(&mut self, event: SignalingEvent) -> Option<DisconnectReason> {
        debug!(event = event.name(), state = %self.state, "signaling event");

        match event {
            SignalingEvent::OfferEstablished => self.on_offer_established(),
            SignalingEvent::Disconnected { code, message } => {
                return Some(self.on_disconnected(DisconnectReason::new(code, message)));
            }
            SignalingEvent::RemoteTrackAdded(transceiver) => {
                let track = Arc::clone(transceiver.receiver().track());
                if let Some(bridge) = self.render_target(&track) {
                    bridge.dispatch(move |renderer| renderer.add_track(track));
                }
            }
            SignalingEvent::RemoteTrackRemoved(receiver) => {
                let track = Arc::clone(receiver.track());
                if let Some(bridge) = self.render_target(&track) {
                    bridge.dispatch(move |renderer| renderer.remove_track(&track));
                }
            }
            SignalingEvent::DataChannelOpened { label } => {
                self.publish(SessionEvent::DataChannelOpened { label });
            }
            SignalingEvent::Notify { text } => self.publish(SessionEvent::Notify { text }),
            SignalingEvent::Push { text } => self.publish(SessionEvent::Push { text }),
            SignalingEvent::Message { label, data } => {
                self.publish(SessionEvent::Message { label, data });
            }
        }
        None
    }

    fn on_offer_established(&mut self) {
        match self.state {
            SessionState::Connecting => {}
            SessionState::Running => {
                debug!("offer renegotiated, local tracks already attached");
                return;
            }
            state => {
                debug!(%state, "offer established while shutting down, not attaching tracks");
                return;
            }
        }

        let stream_id = StreamId::random();
        let tracks: Vec<Arc<MediaTrack>> = self.tracks.iter().cloned().collect();
        for track in tracks {
            let track_id = track.id().clone();
            let kind = track.kind();
            match self.engine.add_track(track, &stream_id) {
                Ok(()) => debug!(%track_id, %kind, %stream_id, "local track attached"),
                Err(e) => {
                    let error = match e {
                        ClientError::TrackAttach { .. } => e,
                        other => ClientError::track_attach(track_id.clone(), other.to_string()),
                    };
                    warn!(%track_id, %kind, "{}", error);
                    self.publish(SessionEvent::TrackAttachFailed { track_id, error });
                }
            }
        }

        self.set_state(SessionState::Running);
    }

    fn on_disconnected(&mut self, reason: DisconnectReason) -> DisconnectReason {
        if reason.is_normal() {
            info!("OnDisconnect: {}", reason);
        } else {
            warn!("OnDisconnect: {}", reason);
        }
        self.teardown();
        self.publish(SessionEvent::Closed(reason.clone()));
        reason
    }

    /// Bridge to use for a remote track, if it should be rendered at all
    fn render_target(&self, track: &MediaTrack) -> Option<RendererBridge> {
        if self.renderer.is_none() {
            return None;
        }
        if !track.is_video() {
            debug!(track_id = %track.id(), kind = %track.kind(), "not rendering non-video track");
            return None;
        }
        Some(self.context.bridge())
    }

    // Work dispatched before teardown still reaches the renderer once;
    // anything dispatched afterwards is dropped by the stopped context.
    fn teardown(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            let flushed = self.context.run_pending(renderer.as_mut());
            if flushed > 0 {
                debug!(flushed, "flushed pending renderer work before teardown");
            }
        }
        self.context.stop();
        self.tracks = LocalTrackSet::empty();
        self.set_state(SessionState::Disconnected);
    }

    fn set_state(&mut self, current: SessionState) {
        let previous = self.state;
        if previous == current {
            return;
        }
        self.state = current;
        self.state_tx.send_replace(current);
        info!(%previous, %current, "session state changed");
        self.publish(SessionEvent::StateChanged {
            previous,
            current,
            at: Utc::now(),
        });
    }

    // No subscribers is not an error.
    fn publish(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("role", &self.signaling.role)
            .field("local_tracks", &self.tracks.len())
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}
