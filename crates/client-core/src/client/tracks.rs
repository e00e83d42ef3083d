//! Local track provisioning
//!
//! Decides, from the role and the capture settings, which local tracks a
//! session sends. A `recvonly` session creates none and never touches the
//! capture library. Every other role opens the video capture source first
//! and fails fast if that is impossible, before any network I/O happens.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use super::config::{CaptureConfig, Role};
use crate::capture::{CaptureLibrary, CaptureRequest};
use crate::error::{ClientError, ClientResult};
use crate::media::{AudioOptions, MediaTrack, TrackId};
use crate::resolution;

/// Zero, one or two local tracks
#[derive(Debug, Default, Clone)]
pub struct LocalTrackSet {
    pub audio: Option<Arc<MediaTrack>>,
    pub video: Option<Arc<MediaTrack>>,
}

impl LocalTrackSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.video.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Tracks in attach order: audio first, then video
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MediaTrack>> {
        self.audio.iter().chain(self.video.iter())
    }
}

/// Which media the session wants to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaSelection {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaSelection {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

pub struct TrackProvisioner {
    capture: Option<Arc<dyn CaptureLibrary>>,
    media: MediaSelection,
}

impl TrackProvisioner {
    pub fn new(capture: Option<Arc<dyn CaptureLibrary>>) -> Self {
        Self {
            capture,
            media: MediaSelection::default(),
        }
    }

    /// Restrict provisioning to the enabled media kinds
    pub fn with_media(mut self, media: MediaSelection) -> Self {
        self.media = media;
        self
    }

    /// Create the local tracks for `role`.
    ///
    /// Fails with [`ClientError::CaptureDevice`] when the capture source
    /// cannot be opened; nothing else can fail.
    pub fn provision(&self, role: Role, capture: &CaptureConfig) -> ClientResult<LocalTrackSet> {
        if !role.sends_media() {
            debug!(%role, "role does not send media, no local tracks");
            return Ok(LocalTrackSet::empty());
        }

        let mut used_ids = HashSet::new();
        let mut tracks = LocalTrackSet::empty();

        if self.media.video {
            let library = self.capture.as_ref().ok_or_else(|| {
                ClientError::capture_device(format!("role {} needs a capture library", role))
            })?;

            let size = resolution::resolve(&capture.resolution);
            let request = CaptureRequest {
                width: size.width,
                height: size.height,
                fps: capture.fps,
                device_name: capture.device_name.clone(),
                use_native: capture.use_native,
            };

            let source = library.create_capture_source(&request).map_err(|e| {
                error!("Failed to create video source: {}", e);
                match e {
                    ClientError::CaptureDevice { .. } => e,
                    other => ClientError::capture_device(other.to_string()),
                }
            })?;
            info!(
                device = source.device_name(),
                resolution = %size,
                fps = capture.fps,
                "video capture source opened"
            );

            tracks.video = Some(MediaTrack::local_video(unique_id(&mut used_ids), source));
        }

        if self.media.audio {
            tracks.audio = Some(MediaTrack::local_audio(
                unique_id(&mut used_ids),
                AudioOptions::default(),
            ));
        }

        debug!(count = tracks.len(), "local tracks provisioned");
        Ok(tracks)
    }
}

fn unique_id(used: &mut HashSet<TrackId>) -> TrackId {
    loop {
        let id = TrackId::random();
        if used.insert(id.clone()) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureSource;
    use crate::media::MediaKind;
    use parking_lot::Mutex;

    struct FakeSource {
        name: String,
    }

    impl CaptureSource for FakeSource {
        fn device_name(&self) -> &str {
            &self.name
        }
    }

    #[derive(Default)]
    struct RecordingCapture {
        requests: Mutex<Vec<CaptureRequest>>,
        fail: bool,
    }

    impl CaptureLibrary for RecordingCapture {
        fn create_capture_source(&self, request: &CaptureRequest) -> ClientResult<Box<dyn CaptureSource>> {
            self.requests.lock().push(request.clone());
            if self.fail {
                return Err(ClientError::capture_device("device busy"));
            }
            Ok(Box::new(FakeSource { name: "fake-camera".into() }))
        }
    }

    #[test]
    fn test_recvonly_creates_nothing() {
        let capture = Arc::new(RecordingCapture::default());
        let provisioner = TrackProvisioner::new(Some(capture.clone()));

        let tracks = provisioner.provision(Role::RecvOnly, &CaptureConfig::default()).unwrap();
        assert!(tracks.is_empty());
        assert!(capture.requests.lock().is_empty(), "capture device must not be opened");
    }

    #[test]
    fn test_sendrecv_creates_audio_and_video() {
        let capture = Arc::new(RecordingCapture::default());
        let provisioner = TrackProvisioner::new(Some(capture.clone()));
        let config = CaptureConfig {
            resolution: "HD".into(),
            fps: 30,
            device_name: Some("front".into()),
            ..Default::default()
        };

        let tracks = provisioner.provision(Role::SendRecv, &config).unwrap();
        assert_eq!(tracks.len(), 2);

        let audio = tracks.audio.as_ref().unwrap();
        let video = tracks.video.as_ref().unwrap();
        assert_eq!(audio.kind(), MediaKind::Audio);
        assert_eq!(video.kind(), MediaKind::Video);
        assert_ne!(audio.id(), video.id());
        assert_eq!(audio.audio_options(), Some(&AudioOptions::default()));
        assert_eq!(video.video_source().map(|s| s.device_name()), Some("fake-camera"));

        let requests = capture.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0],
            CaptureRequest {
                width: 1280,
                height: 720,
                fps: 30,
                device_name: Some("front".into()),
                use_native: true,
            }
        );
    }

    #[test]
    fn test_sendonly_with_unparsable_resolution_uses_minimum() {
        let capture = Arc::new(RecordingCapture::default());
        let provisioner = TrackProvisioner::new(Some(capture.clone()));
        let config = CaptureConfig {
            resolution: "tiny".into(),
            ..Default::default()
        };

        provisioner.provision(Role::SendOnly, &config).unwrap();
        let requests = capture.requests.lock();
        assert_eq!((requests[0].width, requests[0].height), (16, 16));
    }

    #[test]
    fn test_capture_failure_is_fatal() {
        let capture = Arc::new(RecordingCapture {
            fail: true,
            ..Default::default()
        });
        let provisioner = TrackProvisioner::new(Some(capture));

        let err = provisioner
            .provision(Role::SendRecv, &CaptureConfig::default())
            .unwrap_err();
        assert!(matches!(err, ClientError::CaptureDevice { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_video_disabled_skips_capture() {
        let capture = Arc::new(RecordingCapture::default());
        let provisioner = TrackProvisioner::new(Some(capture.clone())).with_media(MediaSelection {
            audio: true,
            video: false,
        });

        let tracks = provisioner.provision(Role::SendRecv, &CaptureConfig::default()).unwrap();
        assert!(tracks.video.is_none());
        assert!(tracks.audio.is_some());
        assert!(capture.requests.lock().is_empty());
    }

    #[test]
    fn test_dropping_tracks_releases_source() {
        struct Tracked(Arc<()>);
        impl CaptureSource for Tracked {
            fn device_name(&self) -> &str {
                "tracked"
            }
        }
        struct TrackedCapture(Arc<()>);
        impl CaptureLibrary for TrackedCapture {
            fn create_capture_source(&self, _: &CaptureRequest) -> ClientResult<Box<dyn CaptureSource>> {
                Ok(Box::new(Tracked(Arc::clone(&self.0))))
            }
        }

        let device = Arc::new(());
        let provisioner = TrackProvisioner::new(Some(Arc::new(TrackedCapture(Arc::clone(&device)))));
        let tracks = provisioner.provision(Role::SendOnly, &CaptureConfig::default()).unwrap();
        assert_eq!(Arc::strong_count(&device), 3);

        drop(tracks);
        assert_eq!(Arc::strong_count(&device), 2);
    }
}
