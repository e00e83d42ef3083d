//! Stand-in collaborators for running without real devices
//!
//! The capture library offers a single synthetic test-pattern device. The
//! renderer keeps the list of tracks it has been asked to show and logs
//! every change instead of drawing.

use std::sync::Arc;

use tracing::{debug, info};
use vidlink_client_core::capture::{CaptureLibrary, CaptureRequest, CaptureSource};
use vidlink_client_core::client::config::DisplayConfig;
use vidlink_client_core::renderer::{RendererBridge, VideoRenderer};
use vidlink_client_core::{ClientError, ClientResult, MediaTrack, Resolution};

pub const TEST_PATTERN_DEVICE: &str = "test-pattern";

#[derive(Debug)]
struct TestPatternSource {
    size: Resolution,
    fps: u32,
}

impl CaptureSource for TestPatternSource {
    fn device_name(&self) -> &str {
        TEST_PATTERN_DEVICE
    }
}

impl Drop for TestPatternSource {
    fn drop(&mut self) {
        debug!(size = %self.size, fps = self.fps, "test pattern stopped");
    }
}

#[derive(Debug, Default)]
pub struct TestPatternLibrary;

impl CaptureLibrary for TestPatternLibrary {
    fn create_capture_source(&self, request: &CaptureRequest) -> ClientResult<Box<dyn CaptureSource>> {
        if let Some(name) = &request.device_name {
            if name != TEST_PATTERN_DEVICE {
                return Err(ClientError::capture_device(format!(
                    "video device '{}' not found (available: {})",
                    name, TEST_PATTERN_DEVICE
                )));
            }
        }
        let size = Resolution::new(request.width, request.height);
        info!(%size, fps = request.fps, "test pattern started");
        Ok(Box::new(TestPatternSource {
            size,
            fps: request.fps,
        }))
    }
}

/// Renderer that logs instead of drawing
pub struct LogRenderer {
    display: DisplayConfig,
    tracks: Vec<Arc<MediaTrack>>,
    bridge: Option<RendererBridge>,
}

impl LogRenderer {
    pub fn new(config: DisplayConfig) -> Self {
        info!(
            width = config.width,
            height = config.height,
            fullscreen = config.fullscreen,
            "renderer window created"
        );
        Self {
            display: config,
            tracks: Vec::new(),
            bridge: None,
        }
    }

    fn layout(&self) {
        let attached = self.bridge.as_ref().is_some_and(|bridge| !bridge.is_stopped());
        info!(
            tracks = self.tracks.len(),
            window = %Resolution::new(self.display.width, self.display.height),
            attached,
            "renderer layout updated"
        );
    }
}

impl VideoRenderer for LogRenderer {
    fn add_track(&mut self, track: Arc<MediaTrack>) {
        if self.tracks.iter().any(|t| t.id() == track.id()) {
            return;
        }
        info!(track_id = %track.id(), origin = ?track.origin(), "rendering track");
        self.tracks.push(track);
        self.layout();
    }

    fn remove_track(&mut self, track: &Arc<MediaTrack>) {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.id() != track.id());
        if self.tracks.len() != before {
            info!(track_id = %track.id(), "stopped rendering track");
            self.layout();
        }
    }

    fn set_dispatch_target(&mut self, bridge: RendererBridge) {
        debug!(stopped = bridge.is_stopped(), "renderer attached to session context");
        self.bridge = Some(bridge);
    }
}

impl Drop for LogRenderer {
    fn drop(&mut self) {
        info!(remaining = self.tracks.len(), "renderer window closed");
    }
}
