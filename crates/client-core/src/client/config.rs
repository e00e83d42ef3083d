//! Session configuration
//!
//! [`SessionConfig`] is assembled and validated before a session is
//! created and never changes afterwards. Most users go through
//! [`SessionConfig::builder`]:
//!
//! ```rust
//! use vidlink_client_core::client::config::{Role, SessionConfig};
//! use vidlink_client_core::OptionalBool;
//!
//! let config = SessionConfig::builder()
//!     .with_signaling_url("wss://media.example.com/signaling")
//!     .with_channel_id("lobby")
//!     .with_role(Role::SendRecv)
//!     .with_resolution("HD")
//!     .with_multistream(OptionalBool::True)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.capture.resolution, "HD");
//! assert!(config.role().unwrap().sends_media());
//! ```
//!
//! The struct is also `Deserialize`, so a base configuration can come from
//! a file; missing fields take their defaults and the result must still
//! pass [`SessionConfig::validate`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::builder::SessionConfigBuilder;
use crate::error::{ClientError, ClientResult};
use crate::options::OptionalBool;
use crate::resolution;

pub const MAX_FPS: u32 = 60;
pub const MAX_VIDEO_BIT_RATE: u32 = 30_000;
pub const MAX_AUDIO_BIT_RATE: u32 = 510;
pub const MAX_SPOTLIGHT_NUMBER: u32 = 8;

/// Direction of media for this client, fixed for the whole session.
/// There is no default role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    SendOnly,
    RecvOnly,
    SendRecv,
}

impl Role {
    /// Whether local tracks are created for this role
    pub fn sends_media(self) -> bool {
        self != Role::RecvOnly
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SendOnly => "sendonly",
            Role::RecvOnly => "recvonly",
            Role::SendRecv => "sendrecv",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sendonly" => Ok(Role::SendOnly),
            "recvonly" => Ok(Role::RecvOnly),
            "sendrecv" => Ok(Role::SendRecv),
            other => Err(ClientError::config(format!(
                "invalid role '{}': expected one of sendonly, recvonly, sendrecv",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VideoCodec {
    Vp8,
    Vp9,
    Av1,
    H264,
}

impl FromStr for VideoCodec {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VP8" => Ok(VideoCodec::Vp8),
            "VP9" => Ok(VideoCodec::Vp9),
            "AV1" => Ok(VideoCodec::Av1),
            "H264" => Ok(VideoCodec::H264),
            other => Err(ClientError::config(format!(
                "invalid video codec '{}': expected one of VP8, VP9, AV1, H264",
                other
            ))),
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VideoCodec::Vp8 => "VP8",
            VideoCodec::Vp9 => "VP9",
            VideoCodec::Av1 => "AV1",
            VideoCodec::H264 => "H264",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudioCodec {
    Opus,
}

impl FromStr for AudioCodec {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPUS" => Ok(AudioCodec::Opus),
            other => Err(ClientError::config(format!(
                "invalid audio codec '{}': expected OPUS",
                other
            ))),
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OPUS")
    }
}

/// HTTP proxy used for the signaling connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Local video capture settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Resolution token, see [`crate::resolution`]
    pub resolution: String,
    pub fps: u32,
    /// Capture device name; `None` opens the default device
    pub device_name: Option<String>,
    /// Use the platform's native capture path (e.g. hardware JPEG decode)
    pub use_native: bool,
    pub hardware_encoder: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            resolution: "VGA".to_string(),
            fps: 15,
            device_name: None,
            use_native: true,
            hardware_encoder: false,
        }
    }
}

/// On-screen display settings. Presence of this section enables the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    /// Also render the local video track
    pub show_me: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fullscreen: false,
            show_me: false,
        }
    }
}

/// Complete, immutable configuration of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub signaling_url: String,
    pub channel_id: String,
    /// Required, `validate` rejects a configuration without one
    pub role: Option<Role>,
    pub client_id: Option<String>,

    /// Send/receive video
    pub video: bool,
    /// Send/receive audio
    pub audio: bool,
    pub video_codec_type: Option<VideoCodec>,
    pub audio_codec_type: Option<AudioCodec>,
    /// Video bit rate cap in kbps, 0 lets the server decide
    pub video_bit_rate: u32,
    /// Audio bit rate cap in kbps, 0 lets the server decide
    pub audio_bit_rate: u32,

    /// Opaque blob forwarded to the server in the connect message
    pub metadata: Option<serde_json::Value>,

    pub multistream: OptionalBool,
    pub spotlight: OptionalBool,
    /// Streams delivered in spotlight mode, 0 lets the server decide
    pub spotlight_number: u32,
    pub simulcast: OptionalBool,
    pub data_channel_signaling: OptionalBool,
    /// Keep the session when the WebSocket drops while data channel
    /// signaling is in use
    pub ignore_disconnect_websocket: OptionalBool,

    pub proxy: ProxyConfig,
    pub capture: CaptureConfig,
    pub display: Option<DisplayConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            signaling_url: String::new(),
            channel_id: String::new(),
            role: None,
            client_id: None,
            video: true,
            audio: true,
            video_codec_type: None,
            audio_codec_type: None,
            video_bit_rate: 0,
            audio_bit_rate: 0,
            metadata: None,
            multistream: OptionalBool::Unset,
            spotlight: OptionalBool::Unset,
            spotlight_number: 0,
            simulcast: OptionalBool::Unset,
            data_channel_signaling: OptionalBool::Unset,
            ignore_disconnect_websocket: OptionalBool::Unset,
            proxy: ProxyConfig::default(),
            capture: CaptureConfig::default(),
            display: None,
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// The configured role
    pub fn role(&self) -> ClientResult<Role> {
        self.role.ok_or_else(|| ClientError::config("role is required"))
    }

    /// Check required fields and numeric ranges
    pub fn validate(&self) -> ClientResult<()> {
        if self.signaling_url.trim().is_empty() {
            return Err(ClientError::config("signaling URL is required"));
        }
        if self.channel_id.trim().is_empty() {
            return Err(ClientError::config("channel ID is required"));
        }
        self.role()?;
        if self.video_bit_rate > MAX_VIDEO_BIT_RATE {
            return Err(ClientError::config(format!(
                "video bit rate {} out of range 0..={}",
                self.video_bit_rate, MAX_VIDEO_BIT_RATE
            )));
        }
        if self.audio_bit_rate > MAX_AUDIO_BIT_RATE {
            return Err(ClientError::config(format!(
                "audio bit rate {} out of range 0..={}",
                self.audio_bit_rate, MAX_AUDIO_BIT_RATE
            )));
        }
        if self.spotlight_number > MAX_SPOTLIGHT_NUMBER {
            return Err(ClientError::config(format!(
                "spotlight number {} out of range 0..={}",
                self.spotlight_number, MAX_SPOTLIGHT_NUMBER
            )));
        }
        if !(1..=MAX_FPS).contains(&self.capture.fps) {
            return Err(ClientError::config(format!(
                "frame rate {} out of range 1..={}",
                self.capture.fps, MAX_FPS
            )));
        }
        resolution::validate_token(&self.capture.resolution)?;
        if let Some(display) = &self.display {
            if display.width == 0 || display.height == 0 {
                return Err(ClientError::config("window size must be non-zero"));
            }
        }
        Ok(())
    }

    /// Whether a renderer should be created for this session
    pub fn wants_renderer(&self) -> bool {
        self.display.is_some()
    }
}

/// Parse the metadata argument. An empty string means no metadata.
pub fn parse_metadata(input: &str) -> ClientResult<Option<serde_json::Value>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(input)
        .map(Some)
        .map_err(|e| ClientError::config(format!("Value {} is not JSON Value: {}", input, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SessionConfig {
        SessionConfig {
            signaling_url: "wss://example.com/signaling".into(),
            channel_id: "room".into(),
            role: Some(Role::SendRecv),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert!(config.video);
        assert!(config.audio);
        assert_eq!(config.capture.resolution, "VGA");
        assert_eq!(config.capture.fps, 15);
        assert!(config.capture.use_native);
        assert!(!config.wants_renderer());
        assert_eq!(config.simulcast, OptionalBool::Unset);
    }

    #[test]
    fn test_validate_required_fields() {
        assert!(valid().validate().is_ok());

        let missing_url = SessionConfig { signaling_url: "".into(), ..valid() };
        assert!(missing_url.validate().unwrap_err().is_config_error());

        let missing_channel = SessionConfig { channel_id: " ".into(), ..valid() };
        assert!(missing_channel.validate().is_err());
    }

    #[test]
    fn test_role_has_no_default() {
        let config = SessionConfig { role: None, ..valid() };
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("role is required"));
        assert!(SessionConfig::default().role.is_none());
    }

    #[test]
    fn test_deserialize_without_role_fails_validation() {
        let config: SessionConfig = serde_json::from_str(
            r#"{ "signaling_url": "wss://example.com/signaling", "channel_id": "room" }"#,
        )
        .unwrap();
        assert_eq!(config.role, None);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = valid();
        config.video_bit_rate = 30_000;
        config.audio_bit_rate = 510;
        config.spotlight_number = 8;
        assert!(config.validate().is_ok());

        assert!(SessionConfig { video_bit_rate: 30_001, ..valid() }.validate().is_err());
        assert!(SessionConfig { audio_bit_rate: 511, ..valid() }.validate().is_err());
        assert!(SessionConfig { spotlight_number: 9, ..valid() }.validate().is_err());

        let mut bad_fps = valid();
        bad_fps.capture.fps = 0;
        assert!(bad_fps.validate().is_err());
        bad_fps.capture.fps = 61;
        assert!(bad_fps.validate().is_err());

        let mut bad_resolution = valid();
        bad_resolution.capture.resolution = "0x0".into();
        assert!(bad_resolution.validate().is_err());
    }

    #[test]
    fn test_role_tokens() {
        assert_eq!("recvonly".parse::<Role>().unwrap(), Role::RecvOnly);
        assert_eq!("sendonly".parse::<Role>().unwrap(), Role::SendOnly);
        assert_eq!("sendrecv".parse::<Role>().unwrap(), Role::SendRecv);
        assert!("upstream".parse::<Role>().is_err());
        assert!(!Role::RecvOnly.sends_media());
        assert!(Role::SendOnly.sends_media());
    }

    #[test]
    fn test_codec_tokens() {
        assert_eq!("H264".parse::<VideoCodec>().unwrap(), VideoCodec::H264);
        assert_eq!(VideoCodec::Av1.to_string(), "AV1");
        assert!("h264".parse::<VideoCodec>().is_err());
        assert_eq!("OPUS".parse::<AudioCodec>().unwrap(), AudioCodec::Opus);
        assert_eq!(serde_json::to_string(&VideoCodec::Vp9).unwrap(), "\"VP9\"");
    }

    #[test]
    fn test_parse_metadata() {
        assert_eq!(parse_metadata("").unwrap(), None);
        assert_eq!(
            parse_metadata(r#"{"access_token":"xyz"}"#).unwrap(),
            Some(serde_json::json!({ "access_token": "xyz" }))
        );
        assert_eq!(parse_metadata("42").unwrap(), Some(serde_json::json!(42)));
        assert!(parse_metadata("{not json").unwrap_err().is_config_error());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: SessionConfig = serde_json::from_str(
            r#"{
                "signaling_url": "wss://example.com/signaling",
                "channel_id": "room",
                "role": "recvonly",
                "multistream": true,
                "display": { "show_me": true }
            }"#,
        )
        .unwrap();
        assert_eq!(config.role, Some(Role::RecvOnly));
        assert_eq!(config.multistream, OptionalBool::True);
        assert_eq!(config.spotlight, OptionalBool::Unset);
        assert_eq!(config.display.as_ref().map(|d| d.width), Some(640));
        assert!(config.validate().is_ok());
    }
}
