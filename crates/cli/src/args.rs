//! Command line arguments
//!
//! Every option can also come from a TOML file given with `--config`;
//! options on the command line win over values from the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use vidlink_client_core::client::config::{
    parse_metadata, AudioCodec, DisplayConfig, ProxyConfig, Role, SessionConfig, VideoCodec,
    MAX_AUDIO_BIT_RATE, MAX_FPS, MAX_SPOTLIGHT_NUMBER, MAX_VIDEO_BIT_RATE,
};
use vidlink_client_core::logging::{LogLevel, LoggingConfig};
use vidlink_client_core::resolution::validate_token;
use vidlink_client_core::{ClientError, OptionalBool, SessionConfigBuilder};

#[derive(Parser, Debug)]
#[command(name = "vidlink", author, version, about = "Join a video channel and exchange audio/video", long_about = None)]
pub struct Args {
    /// Base configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log severity level threshold: verbose, info, warning, error, none
    #[arg(long, default_value = "error")]
    pub log_level: LogLevel,

    /// Write logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Include source file and line in log lines
    #[arg(long)]
    pub log_file_info: bool,

    /// Log span enter and exit
    #[arg(long)]
    pub log_spans: bool,

    /// Signaling URL
    #[arg(long)]
    pub signaling_url: Option<String>,

    /// Channel ID
    #[arg(long)]
    pub channel_id: Option<String>,

    /// Role: sendonly, recvonly or sendrecv (required, here or in --config)
    #[arg(long)]
    pub role: Option<Role>,

    /// Client ID
    #[arg(long)]
    pub client_id: Option<String>,

    /// Send video (default: true)
    #[arg(long, value_name = "BOOL")]
    pub video: Option<bool>,

    /// Send audio (default: true)
    #[arg(long, value_name = "BOOL")]
    pub audio: Option<bool>,

    /// Video codec: VP8, VP9, AV1, H264 or empty for the server default
    #[arg(long, value_parser = parse_video_codec)]
    pub video_codec_type: Option<CodecChoice<VideoCodec>>,

    /// Audio codec: OPUS or empty for the server default
    #[arg(long, value_parser = parse_audio_codec)]
    pub audio_codec_type: Option<CodecChoice<AudioCodec>>,

    /// Video bit rate in kbps
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_VIDEO_BIT_RATE as i64))]
    pub video_bit_rate: Option<u32>,

    /// Audio bit rate in kbps
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_AUDIO_BIT_RATE as i64))]
    pub audio_bit_rate: Option<u32>,

    /// Signaling metadata (JSON)
    #[arg(long, value_parser = parse_metadata_arg)]
    pub metadata: Option<serde_json::Value>,

    /// Use multistream: true, false or none
    #[arg(long, value_name = "BOOL|none")]
    pub multistream: Option<OptionalBool>,

    /// Use spotlight: true, false or none
    #[arg(long, value_name = "BOOL|none")]
    pub spotlight: Option<OptionalBool>,

    /// Number of spotlight speakers
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_SPOTLIGHT_NUMBER as i64))]
    pub spotlight_number: Option<u32>,

    /// Use simulcast: true, false or none
    #[arg(long, value_name = "BOOL|none")]
    pub simulcast: Option<OptionalBool>,

    /// Use data channel signaling: true, false or none
    #[arg(long, value_name = "BOOL|none")]
    pub data_channel_signaling: Option<OptionalBool>,

    /// Ignore WebSocket disconnection if using data channel: true, false or none
    #[arg(long, value_name = "BOOL|none")]
    pub ignore_disconnect_websocket: Option<OptionalBool>,

    /// Proxy URL
    #[arg(long)]
    pub proxy_url: Option<String>,

    /// Proxy username
    #[arg(long)]
    pub proxy_username: Option<String>,

    /// Proxy password
    #[arg(long, env = "VIDLINK_PROXY_PASSWORD", hide_env_values = true)]
    pub proxy_password: Option<String>,

    /// Video capture device
    #[arg(long)]
    pub video_device: Option<String>,

    /// Video frame rate
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_FPS as i64))]
    pub fps: Option<u32>,

    /// Video resolution: QVGA, VGA, HD, FHD, 4K or [WIDTH]x[HEIGHT]
    #[arg(long, value_parser = parse_resolution)]
    pub resolution: Option<String>,

    /// Use the native capture path (default: true)
    #[arg(long, value_name = "BOOL")]
    pub native: Option<bool>,

    /// Use the hardware encoder (default: false)
    #[arg(long, value_name = "BOOL")]
    pub hardware_encoder: Option<bool>,

    /// Show remote video in a window
    #[arg(long)]
    pub use_sdl: bool,

    /// Window width
    #[arg(long)]
    pub window_width: Option<u32>,

    /// Window height
    #[arg(long)]
    pub window_height: Option<u32>,

    /// Fullscreen window
    #[arg(long)]
    pub fullscreen: bool,

    /// Show own video as well
    #[arg(long)]
    pub show_me: bool,
}

/// A codec argument where the empty string means "let the server decide"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecChoice<T>(pub Option<T>);

fn parse_codec<T>(s: &str) -> Result<CodecChoice<T>, ClientError>
where
    T: std::str::FromStr<Err = ClientError>,
{
    if s.is_empty() {
        return Ok(CodecChoice(None));
    }
    s.parse().map(|codec| CodecChoice(Some(codec)))
}

fn parse_video_codec(s: &str) -> Result<CodecChoice<VideoCodec>, ClientError> {
    parse_codec(s)
}

fn parse_audio_codec(s: &str) -> Result<CodecChoice<AudioCodec>, ClientError> {
    parse_codec(s)
}

fn parse_resolution(s: &str) -> Result<String, ClientError> {
    validate_token(s)?;
    Ok(s.to_string())
}

fn parse_metadata_arg(s: &str) -> Result<serde_json::Value, ClientError> {
    parse_metadata(s)?.ok_or_else(|| ClientError::config("metadata must not be empty"))
}

/// Read a base configuration from a TOML file
pub fn load_config_file(path: &Path) -> Result<SessionConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse config file {}", path.display()))
}

impl Args {
    pub fn logging_config(&self) -> LoggingConfig {
        let mut config = LoggingConfig::new(self.log_level, "vidlink");
        if self.log_json {
            config = config.with_json();
        }
        if self.log_file_info {
            config = config.with_file_info();
        }
        if self.log_spans {
            config = config.with_spans();
        }
        config
    }

    /// Merge the config file (if any) with the command line and validate
    pub fn session_config(&self) -> Result<SessionConfig> {
        let base = match &self.config {
            Some(path) => load_config_file(path)?,
            None => SessionConfig::default(),
        };
        self.apply(base).build().context("invalid configuration")
    }

    fn apply(&self, base: SessionConfig) -> SessionConfigBuilder {
        let mut capture = base.capture.clone();
        let mut proxy: ProxyConfig = base.proxy.clone();
        let mut display = base.display.clone();
        let mut builder = SessionConfigBuilder::from_config(base);

        if let Some(url) = &self.signaling_url {
            builder = builder.with_signaling_url(url);
        }
        if let Some(channel_id) = &self.channel_id {
            builder = builder.with_channel_id(channel_id);
        }
        if let Some(role) = self.role {
            builder = builder.with_role(role);
        }
        if let Some(client_id) = &self.client_id {
            builder = builder.with_client_id(client_id);
        }
        if let Some(video) = self.video {
            builder = builder.with_video(video);
        }
        if let Some(audio) = self.audio {
            builder = builder.with_audio(audio);
        }
        if let Some(CodecChoice(codec)) = self.video_codec_type {
            builder = builder.with_video_codec(codec);
        }
        if let Some(CodecChoice(codec)) = self.audio_codec_type {
            builder = builder.with_audio_codec(codec);
        }
        if let Some(kbps) = self.video_bit_rate {
            builder = builder.with_video_bit_rate(kbps);
        }
        if let Some(kbps) = self.audio_bit_rate {
            builder = builder.with_audio_bit_rate(kbps);
        }
        if let Some(metadata) = &self.metadata {
            builder = builder.with_metadata(metadata.clone());
        }
        if let Some(value) = self.multistream {
            builder = builder.with_multistream(value);
        }
        if let Some(value) = self.spotlight {
            builder = builder.with_spotlight(value);
        }
        if let Some(number) = self.spotlight_number {
            builder = builder.with_spotlight_number(number);
        }
        if let Some(value) = self.simulcast {
            builder = builder.with_simulcast(value);
        }
        if let Some(value) = self.data_channel_signaling {
            builder = builder.with_data_channel_signaling(value);
        }
        if let Some(value) = self.ignore_disconnect_websocket {
            builder = builder.with_ignore_disconnect_websocket(value);
        }

        if self.proxy_url.is_some() {
            proxy.url = self.proxy_url.clone();
        }
        if self.proxy_username.is_some() {
            proxy.username = self.proxy_username.clone();
        }
        if self.proxy_password.is_some() {
            proxy.password = self.proxy_password.clone();
        }
        builder = builder.with_proxy(proxy);

        if self.video_device.is_some() {
            capture.device_name = self.video_device.clone();
        }
        if let Some(fps) = self.fps {
            capture.fps = fps;
        }
        if let Some(resolution) = &self.resolution {
            capture.resolution = resolution.clone();
        }
        if let Some(native) = self.native {
            capture.use_native = native;
        }
        if let Some(hardware_encoder) = self.hardware_encoder {
            capture.hardware_encoder = hardware_encoder;
        }
        builder = builder.with_capture(capture);

        if self.use_sdl && display.is_none() {
            display = Some(DisplayConfig::default());
        }
        if let Some(display) = display.as_mut() {
            if let Some(width) = self.window_width {
                display.width = width;
            }
            if let Some(height) = self.window_height {
                display.height = height;
            }
            display.fullscreen |= self.fullscreen;
            display.show_me |= self.show_me;
        }
        if let Some(display) = display {
            builder = builder.with_display(display);
        }

        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec![
            "vidlink",
            "--signaling-url",
            "wss://example.com/signaling",
            "--channel-id",
            "room",
            "--role",
            "sendrecv",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_minimal_arguments() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.log_level, LogLevel::Error);
        let config = args.session_config().unwrap();
        assert_eq!(config.role, Some(Role::SendRecv));
        assert_eq!(config.capture.resolution, "VGA");
        assert!(config.display.is_none());
    }

    #[test]
    fn test_logging_flags() {
        let config = parse(&[]).unwrap().logging_config();
        assert_eq!(config.level, LogLevel::Error);
        assert!(!config.json && !config.file_info && !config.log_spans);

        let config = parse(&["--log-level", "info", "--log-json", "--log-file-info", "--log-spans"])
            .unwrap()
            .logging_config();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.app_name, "vidlink");
        assert!(config.json);
        assert!(config.file_info);
        assert!(config.log_spans);
    }

    #[test]
    fn test_range_checks() {
        assert!(parse(&["--fps", "0"]).is_err());
        assert!(parse(&["--fps", "61"]).is_err());
        assert!(parse(&["--video-bit-rate", "30001"]).is_err());
        assert!(parse(&["--audio-bit-rate", "511"]).is_err());
        assert!(parse(&["--spotlight-number", "9"]).is_err());
        assert!(parse(&["--fps", "60", "--spotlight-number", "8"]).is_ok());
    }

    #[test]
    fn test_token_validation() {
        assert!(parse(&["--resolution", "1280x720"]).is_ok());
        assert!(parse(&["--resolution", "0x0"]).is_err());
        assert!(parse(&["--role", "viewer"]).is_err());
        assert!(parse(&["--multistream", "maybe"]).is_err());
        assert!(parse(&["--metadata", "{broken"]).is_err());
        assert!(parse(&["--video-codec-type", "H265"]).is_err());
        assert!(parse(&["--log-level", "warn"]).is_err());
    }

    #[test]
    fn test_empty_codec_means_default() {
        let args = parse(&["--video-codec-type", "", "--audio-codec-type", "OPUS"]).unwrap();
        let config = args.session_config().unwrap();
        assert_eq!(config.video_codec_type, None);
        assert_eq!(config.audio_codec_type, Some(AudioCodec::Opus));
    }

    #[test]
    fn test_tristate_and_display_options() {
        let args = parse(&[
            "--multistream",
            "true",
            "--spotlight",
            "none",
            "--use-sdl",
            "--window-width",
            "1280",
            "--show-me",
        ])
        .unwrap();
        let config = args.session_config().unwrap();
        assert_eq!(config.multistream, OptionalBool::True);
        assert_eq!(config.spotlight, OptionalBool::Unset);

        let display = config.display.unwrap();
        assert_eq!((display.width, display.height), (1280, 480));
        assert!(display.show_me);
        assert!(!display.fullscreen);
    }

    #[test]
    fn test_window_options_without_sdl_are_ignored() {
        let args = parse(&["--window-width", "1280", "--fullscreen"]).unwrap();
        assert!(args.session_config().unwrap().display.is_none());
    }

    #[test]
    fn test_config_file_is_overridden_by_flags() {
        let path = std::env::temp_dir().join(format!("vidlink-args-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
signaling_url = "wss://file.example.com/signaling"
channel_id = "from-file"
role = "recvonly"
video_bit_rate = 800

[capture]
fps = 30
"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "vidlink",
            "--config",
            path.to_str().unwrap(),
            "--channel-id",
            "from-flag",
        ])
        .unwrap();
        let config = args.session_config().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.signaling_url, "wss://file.example.com/signaling");
        assert_eq!(config.channel_id, "from-flag");
        assert_eq!(config.role, Some(Role::RecvOnly));
        assert_eq!(config.video_bit_rate, 800);
        assert_eq!(config.capture.fps, 30);
        assert_eq!(config.capture.resolution, "VGA");
    }

    #[test]
    fn test_missing_required_values() {
        let args = Args::try_parse_from(["vidlink", "--channel-id", "room"]).unwrap();
        assert!(args.session_config().is_err());
    }

    #[test]
    fn test_missing_role_is_rejected() {
        let args = Args::try_parse_from([
            "vidlink",
            "--signaling-url",
            "wss://example.com/signaling",
            "--channel-id",
            "room",
        ])
        .unwrap();
        let err = args.session_config().unwrap_err();
        assert!(format!("{:#}", err).contains("role is required"));
    }

    #[test]
    fn test_config_file_without_role_is_rejected() {
        let path = std::env::temp_dir().join(format!("vidlink-norole-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
signaling_url = "wss://file.example.com/signaling"
channel_id = "from-file"
"#,
        )
        .unwrap();

        let args = Args::try_parse_from(["vidlink", "--config", path.to_str().unwrap()]).unwrap();
        let result = args.session_config();
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
