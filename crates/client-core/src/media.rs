//! Media track handles shared between the controller, the engine and the renderer

use std::fmt;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::capture::CaptureSource;

/// Length of generated track and stream identifiers
pub const RANDOM_ID_LEN: usize = 16;

/// Random alphanumeric identifier. Unique in practice, not a secret.
pub fn random_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_ID_LEN)
        .map(char::from)
        .collect()
}

/// Identifier of a media track
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn random() -> Self {
        Self(random_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier grouping local tracks into one logical stream server-side
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(String);

impl StreamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn random() -> Self {
        Self(random_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => f.write_str("audio"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// Where a track's media comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOrigin {
    /// Captured on this machine
    Local,
    /// Announced by the signaling engine
    Remote,
}

/// Audio capture options. Only the platform defaults are used; there is no
/// device selection for audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioOptions {
    pub echo_cancellation: bool,
    pub auto_gain_control: bool,
    pub noise_suppression: bool,
    pub highpass_filter: bool,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            auto_gain_control: true,
            noise_suppression: true,
            highpass_filter: true,
        }
    }
}

/// A media track.
///
/// Always handled through `Arc<MediaTrack>`: after attachment the
/// signaling engine keeps its own reference for transmission. A local
/// video track owns its capture source, so the device is released when the
/// last reference is dropped.
pub struct MediaTrack {
    id: TrackId,
    kind: MediaKind,
    origin: TrackOrigin,
    video_source: Option<Box<dyn CaptureSource>>,
    audio_options: Option<AudioOptions>,
}

impl MediaTrack {
    pub fn local_video(id: TrackId, source: Box<dyn CaptureSource>) -> Arc<Self> {
        Arc::new(Self {
            id,
            kind: MediaKind::Video,
            origin: TrackOrigin::Local,
            video_source: Some(source),
            audio_options: None,
        })
    }

    pub fn local_audio(id: TrackId, options: AudioOptions) -> Arc<Self> {
        Arc::new(Self {
            id,
            kind: MediaKind::Audio,
            origin: TrackOrigin::Local,
            video_source: None,
            audio_options: Some(options),
        })
    }

    pub fn remote(id: TrackId, kind: MediaKind) -> Arc<Self> {
        Arc::new(Self {
            id,
            kind,
            origin: TrackOrigin::Remote,
            video_source: None,
            audio_options: None,
        })
    }

    pub fn id(&self) -> &TrackId {
        &self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn origin(&self) -> TrackOrigin {
        self.origin
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn video_source(&self) -> Option<&dyn CaptureSource> {
        self.video_source.as_deref()
    }

    pub fn audio_options(&self) -> Option<&AudioOptions> {
        self.audio_options.as_ref()
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .field("has_video_source", &self.video_source.is_some())
            .finish()
    }
}

/// Receiving half of a transceiver, as handed over on track removal
#[derive(Debug, Clone)]
pub struct Receiver {
    track: Arc<MediaTrack>,
}

impl Receiver {
    pub fn new(track: Arc<MediaTrack>) -> Self {
        Self { track }
    }

    pub fn track(&self) -> &Arc<MediaTrack> {
        &self.track
    }
}

/// Transceiver announced when a remote track arrives
#[derive(Debug, Clone)]
pub struct Transceiver {
    mid: Option<String>,
    receiver: Receiver,
}

impl Transceiver {
    pub fn new(mid: Option<String>, receiver: Receiver) -> Self {
        Self { mid, receiver }
    }

    pub fn mid(&self) -> Option<&str> {
        self.mid.as_deref()
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }
}
