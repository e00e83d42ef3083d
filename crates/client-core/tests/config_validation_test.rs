//! Configuration is rejected before a session can be created

use vidlink_client_core::client::config::{parse_metadata, MAX_FPS};
use vidlink_client_core::loopback::LoopbackEngine;
use vidlink_client_core::resolution::{resolve, validate_token};
use vidlink_client_core::{OptionalBool, Resolution, Role, SessionConfig, SessionController};

fn base() -> vidlink_client_core::SessionConfigBuilder {
    SessionConfig::builder()
        .with_signaling_url("wss://example.com/signaling")
        .with_channel_id("room")
        .with_role(Role::RecvOnly)
}

#[test]
fn test_resolution_tokens() {
    assert_eq!(resolve("4K"), Resolution::new(3840, 2160));
    assert_eq!(resolve("800x600"), Resolution::new(800, 600));
    assert_eq!(resolve("4x4"), Resolution::new(16, 16));
    assert_eq!(resolve("garbage"), Resolution::new(16, 16));

    assert!(validate_token("FHD").is_ok());
    assert!(validate_token("800x600").is_ok());
    for bad in ["0x0", "x10", "abc", "010x20", "hd"] {
        let err = validate_token(bad).unwrap_err();
        assert!(err.is_config_error(), "{} should be rejected", bad);
    }
}

#[test]
fn test_out_of_range_values_rejected() {
    assert!(base().with_fps(MAX_FPS + 1).build().is_err());
    assert!(base().with_fps(0).build().is_err());
    assert!(base().with_video_bit_rate(30_001).build().is_err());
    assert!(base().with_audio_bit_rate(511).build().is_err());
    assert!(base().with_spotlight_number(9).build().is_err());
    assert!(base().with_resolution("0x0").build().is_err());
}

#[test]
fn test_metadata_must_be_json() {
    assert_eq!(parse_metadata("").unwrap(), None);
    let value = parse_metadata(r#"{"access_token":"secret"}"#).unwrap().unwrap();
    assert_eq!(value["access_token"], "secret");
    assert!(parse_metadata("{not json").unwrap_err().is_config_error());
}

#[test]
fn test_tristate_tokens() {
    assert_eq!("true".parse::<OptionalBool>().unwrap(), OptionalBool::True);
    assert_eq!("none".parse::<OptionalBool>().unwrap().get(), None);
    assert!("yes".parse::<OptionalBool>().is_err());
}

#[test]
fn test_sending_role_requires_capture_library() {
    let config = base().with_role(Role::SendOnly).build().unwrap();
    let err = SessionController::builder(config)
        .engine(LoopbackEngine::new())
        .build()
        .unwrap_err();
    assert!(err.is_config_error());

    let config = base().with_role(Role::RecvOnly).build().unwrap();
    assert!(SessionController::builder(config)
        .engine(LoopbackEngine::new())
        .build()
        .is_ok());
}

#[test]
fn test_role_is_required() {
    let err = SessionConfig::builder()
        .with_signaling_url("wss://example.com/signaling")
        .with_channel_id("room")
        .build()
        .unwrap_err();
    assert!(err.is_config_error());
}

#[test]
fn test_engine_is_required() {
    let config = base().build().unwrap();
    let err = SessionController::builder(config).build().unwrap_err();
    assert!(err.is_config_error());
}
