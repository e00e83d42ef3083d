//! Signaling engine interface
//!
//! The engine negotiates and maintains the peer connection (offer/answer,
//! ICE, SRTP). The controller drives it through three calls and learns
//! about everything else through [`SignalingEvent`](crate::events::SignalingEvent)s.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::config::{AudioCodec, ProxyConfig, Role, SessionConfig, VideoCodec};
use crate::error::{ClientError, ClientResult};
use crate::events::EventSender;
use crate::media::{MediaTrack, StreamId};
use crate::options::OptionalBool;

/// Agent string announced to HTTP proxies
pub const PROXY_AGENT: &str = "vidlink";

/// Everything the engine needs to open the connection.
///
/// Derived from [`SessionConfig`], which must carry a role; the metadata
/// blob is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalingConfig {
    pub signaling_urls: Vec<String>,
    pub channel_id: String,
    pub role: Role,
    pub client_id: Option<String>,
    pub video: bool,
    pub audio: bool,
    pub video_codec_type: Option<VideoCodec>,
    pub audio_codec_type: Option<AudioCodec>,
    pub video_bit_rate: u32,
    pub audio_bit_rate: u32,
    pub metadata: Option<serde_json::Value>,
    pub multistream: OptionalBool,
    pub spotlight: OptionalBool,
    pub spotlight_number: u32,
    pub simulcast: OptionalBool,
    pub data_channel_signaling: OptionalBool,
    pub ignore_disconnect_websocket: OptionalBool,
    pub proxy_agent: String,
    pub proxy: ProxyConfig,
}

impl TryFrom<&SessionConfig> for SignalingConfig {
    type Error = ClientError;

    fn try_from(config: &SessionConfig) -> ClientResult<Self> {
        Ok(Self {
            signaling_urls: vec![config.signaling_url.clone()],
            channel_id: config.channel_id.clone(),
            role: config.role()?,
            client_id: config.client_id.clone(),
            video: config.video,
            audio: config.audio,
            video_codec_type: config.video_codec_type,
            audio_codec_type: config.audio_codec_type,
            video_bit_rate: config.video_bit_rate,
            audio_bit_rate: config.audio_bit_rate,
            metadata: config.metadata.clone(),
            multistream: config.multistream,
            spotlight: config.spotlight,
            spotlight_number: config.spotlight_number,
            simulcast: config.simulcast,
            data_channel_signaling: config.data_channel_signaling,
            ignore_disconnect_websocket: config.ignore_disconnect_websocket,
            proxy_agent: PROXY_AGENT.to_string(),
            proxy: config.proxy.clone(),
        })
    }
}

/// A signaling/media engine the controller can drive.
///
/// None of these calls may block on network I/O. Results of the
/// asynchronous work come back as events through the [`EventSender`]
/// handed over in [`connect`](SignalingEngine::connect).
pub trait SignalingEngine: Send {
    /// Start connecting. Fails only when the attempt cannot even begin.
    fn connect(&mut self, config: &SignalingConfig, events: EventSender) -> ClientResult<()>;

    /// Ask the engine to close the connection. Completion is reported with
    /// a `Disconnected` event.
    fn disconnect(&mut self);

    /// Attach a local track for transmission under `stream_id`. The engine
    /// keeps its own reference to the track.
    fn add_track(&mut self, track: Arc<MediaTrack>, stream_id: &StreamId) -> ClientResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::config::SessionConfig;

    #[test]
    fn test_signaling_config_passes_metadata_through() {
        let metadata = serde_json::json!({ "token": "abc", "nested": { "n": [1, 2, 3] } });
        let config = SessionConfig::builder()
            .with_signaling_url("wss://example.com/signaling")
            .with_channel_id("room")
            .with_role(Role::SendRecv)
            .with_metadata(metadata.clone())
            .with_multistream(OptionalBool::True)
            .build()
            .unwrap();

        let signaling = SignalingConfig::try_from(&config).unwrap();
        assert_eq!(signaling.signaling_urls, vec!["wss://example.com/signaling".to_string()]);
        assert_eq!(signaling.metadata, Some(metadata));
        assert_eq!(signaling.multistream, OptionalBool::True);
        assert_eq!(signaling.simulcast, OptionalBool::Unset);
        assert_eq!(signaling.proxy_agent, PROXY_AGENT);
        assert_eq!(signaling.role, Role::SendRecv);
    }

    #[test]
    fn test_signaling_config_needs_role() {
        let config = SessionConfig {
            signaling_url: "wss://example.com/signaling".into(),
            channel_id: "room".into(),
            ..Default::default()
        };
        let err = SignalingConfig::try_from(&config).unwrap_err();
        assert!(err.is_config_error());
    }
}
