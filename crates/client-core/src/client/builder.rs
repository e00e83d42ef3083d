//! Builders for session configuration and session controllers
//!
//! [`SessionConfigBuilder`] assembles a [`SessionConfig`] and validates it
//! once, in [`build`](SessionConfigBuilder::build).
//! [`SessionBuilder`] wires a validated configuration to its collaborators
//! (signaling engine, capture library, optional renderer) and produces a
//! [`SessionController`].
//!
//! ```rust
//! use std::sync::Arc;
//! use vidlink_client_core::client::builder::SessionBuilder;
//! use vidlink_client_core::client::config::{Role, SessionConfig};
//! use vidlink_client_core::capture::{CaptureLibrary, CaptureRequest, CaptureSource};
//! use vidlink_client_core::loopback::LoopbackEngine;
//! use vidlink_client_core::ClientResult;
//!
//! struct NoCamera;
//!
//! impl CaptureLibrary for NoCamera {
//!     fn create_capture_source(&self, _: &CaptureRequest) -> ClientResult<Box<dyn CaptureSource>> {
//!         Err(vidlink_client_core::ClientError::capture_device("no camera"))
//!     }
//! }
//!
//! let config = SessionConfig::builder()
//!     .with_signaling_url("wss://example.com/signaling")
//!     .with_channel_id("room")
//!     .with_role(Role::RecvOnly)
//!     .build()
//!     .unwrap();
//!
//! let controller = SessionBuilder::new(config)
//!     .engine(LoopbackEngine::new())
//!     .capture(Arc::new(NoCamera))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

use super::config::{
    AudioCodec, CaptureConfig, DisplayConfig, ProxyConfig, Role, SessionConfig, VideoCodec,
};
use super::controller::SessionController;
use crate::capture::CaptureLibrary;
use crate::engine::{SignalingConfig, SignalingEngine};
use crate::error::{ClientError, ClientResult};
use crate::options::OptionalBool;
use crate::renderer::VideoRenderer;

/// Chainable construction of a [`SessionConfig`]
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. one loaded from a file
    pub fn from_config(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn with_signaling_url(mut self, url: impl Into<String>) -> Self {
        self.config.signaling_url = url.into();
        self
    }

    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.config.channel_id = channel_id.into();
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.config.role = Some(role);
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    pub fn with_video(mut self, enabled: bool) -> Self {
        self.config.video = enabled;
        self
    }

    pub fn with_audio(mut self, enabled: bool) -> Self {
        self.config.audio = enabled;
        self
    }

    pub fn with_video_codec(mut self, codec: Option<VideoCodec>) -> Self {
        self.config.video_codec_type = codec;
        self
    }

    pub fn with_audio_codec(mut self, codec: Option<AudioCodec>) -> Self {
        self.config.audio_codec_type = codec;
        self
    }

    pub fn with_video_bit_rate(mut self, kbps: u32) -> Self {
        self.config.video_bit_rate = kbps;
        self
    }

    pub fn with_audio_bit_rate(mut self, kbps: u32) -> Self {
        self.config.audio_bit_rate = kbps;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.config.metadata = Some(metadata);
        self
    }

    pub fn with_multistream(mut self, value: OptionalBool) -> Self {
        self.config.multistream = value;
        self
    }

    pub fn with_spotlight(mut self, value: OptionalBool) -> Self {
        self.config.spotlight = value;
        self
    }

    pub fn with_spotlight_number(mut self, number: u32) -> Self {
        self.config.spotlight_number = number;
        self
    }

    pub fn with_simulcast(mut self, value: OptionalBool) -> Self {
        self.config.simulcast = value;
        self
    }

    pub fn with_data_channel_signaling(mut self, value: OptionalBool) -> Self {
        self.config.data_channel_signaling = value;
        self
    }

    pub fn with_ignore_disconnect_websocket(mut self, value: OptionalBool) -> Self {
        self.config.ignore_disconnect_websocket = value;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = proxy;
        self
    }

    pub fn with_capture(mut self, capture: CaptureConfig) -> Self {
        self.config.capture = capture;
        self
    }

    pub fn with_resolution(mut self, token: impl Into<String>) -> Self {
        self.config.capture.resolution = token.into();
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.config.capture.fps = fps;
        self
    }

    pub fn with_video_device(mut self, device: impl Into<String>) -> Self {
        self.config.capture.device_name = Some(device.into());
        self
    }

    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.config.display = Some(display);
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> ClientResult<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Assembles a [`SessionController`] from its collaborators
pub struct SessionBuilder {
    config: SessionConfig,
    engine: Option<Box<dyn SignalingEngine>>,
    capture: Option<Arc<dyn CaptureLibrary>>,
    renderer: Option<Box<dyn VideoRenderer>>,
    event_capacity: usize,
}

impl SessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            engine: None,
            capture: None,
            renderer: None,
            event_capacity: 256,
        }
    }

    pub fn engine(mut self, engine: impl SignalingEngine + 'static) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    pub fn boxed_engine(mut self, engine: Box<dyn SignalingEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn capture(mut self, capture: Arc<dyn CaptureLibrary>) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Renderer for remote video. Ignored unless the configuration has a
    /// display section.
    pub fn renderer(mut self, renderer: impl VideoRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn boxed_renderer(mut self, renderer: Box<dyn VideoRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Capacity of the outbound [`SessionEvent`](crate::events::SessionEvent) channel
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> ClientResult<SessionController> {
        self.config.validate()?;

        let engine = self
            .engine
            .ok_or_else(|| ClientError::config("a signaling engine is required"))?;

        let signaling = SignalingConfig::try_from(&self.config)?;

        let capture = match self.capture {
            Some(capture) => Some(capture),
            None if signaling.role.sends_media() => {
                return Err(ClientError::config(format!(
                    "role {} requires a capture library",
                    signaling.role
                )));
            }
            None => None,
        };

        let renderer = if self.config.wants_renderer() {
            self.renderer
        } else {
            None
        };

        Ok(SessionController::new(
            self.config,
            signaling,
            engine,
            capture,
            renderer,
            self.event_capacity,
        ))
    }
}
