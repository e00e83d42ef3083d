//! End-to-end session tests through the public API

use std::sync::Arc;
use std::time::Duration;

use tokio_stream::StreamExt;
use vidlink_client_core::capture::{CaptureLibrary, CaptureRequest, CaptureSource};
use vidlink_client_core::client::{spawn_signal_listener, DisplayConfig};
use vidlink_client_core::loopback::LoopbackEngine;
use vidlink_client_core::renderer::{RendererBridge, VideoRenderer};
use vidlink_client_core::{
    ClientResult, DisconnectCode, MediaTrack, Role, SessionConfig, SessionController,
    SessionEvent, SessionState, SignalingEvent,
};

struct TestPattern;

impl CaptureSource for TestPattern {
    fn device_name(&self) -> &str {
        "test-pattern"
    }
}

struct TestPatternLibrary;

impl CaptureLibrary for TestPatternLibrary {
    fn create_capture_source(&self, request: &CaptureRequest) -> ClientResult<Box<dyn CaptureSource>> {
        assert_eq!((request.width, request.height), (320, 240));
        Ok(Box::new(TestPattern))
    }
}

#[derive(Default)]
struct CountingRenderer {
    shown: Arc<parking_lot::Mutex<usize>>,
}

impl VideoRenderer for CountingRenderer {
    fn add_track(&mut self, _track: Arc<MediaTrack>) {
        *self.shown.lock() += 1;
    }

    fn remove_track(&mut self, _track: &Arc<MediaTrack>) {
        *self.shown.lock() -= 1;
    }

    fn set_dispatch_target(&mut self, _bridge: RendererBridge) {}
}

fn sendrecv_config() -> SessionConfig {
    SessionConfig::builder()
        .with_signaling_url("wss://example.com/signaling")
        .with_channel_id("integration")
        .with_role(Role::SendRecv)
        .with_resolution("QVGA")
        .with_display(DisplayConfig::default())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_loopback_session_round_trip() {
    let shown = Arc::new(parking_lot::Mutex::new(0));
    let controller = SessionController::builder(sendrecv_config())
        .engine(LoopbackEngine::new())
        .capture(Arc::new(TestPatternLibrary))
        .renderer(CountingRenderer {
            shown: Arc::clone(&shown),
        })
        .build()
        .unwrap();
    let handle = controller.handle();
    let mut events = controller.events();

    let task = tokio::spawn(controller.run());
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        handle.wait_for_state(SessionState::Running),
    )
    .await
    .unwrap();
    assert_eq!(state, SessionState::Running);

    handle.disconnect();
    let reason = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(reason.code, DisconnectCode::CloseSucceeded);

    // the echoed remote video was shown and then removed again
    assert_eq!(*shown.lock(), 0);

    let mut closed = false;
    while let Some(event) = events.next().await {
        if let Ok(SessionEvent::Closed(reason)) = event {
            assert!(reason.is_normal());
            closed = true;
        }
    }
    assert!(closed, "stream ends after the Closed event");
}

#[tokio::test]
async fn test_remote_failure_reported_to_caller() {
    let engine = LoopbackEngine::new();
    let probe = engine.probe();
    let controller = SessionController::builder(sendrecv_config())
        .engine(engine)
        .capture(Arc::new(TestPatternLibrary))
        .build()
        .unwrap();
    let handle = controller.handle();

    let task = tokio::spawn(controller.run());
    handle.wait_for_state(SessionState::Running).await;
    probe.inject(SignalingEvent::Disconnected {
        code: DisconnectCode::IceFailed,
        message: "ICE failed".into(),
    });

    let reason = task.await.unwrap().unwrap();
    assert!(!reason.is_normal());
    assert_eq!(reason.to_string(), "ICE_FAILED: ICE failed");
}

#[tokio::test]
async fn test_signal_listener_exits_with_session() {
    let controller = SessionController::builder(sendrecv_config())
        .engine(LoopbackEngine::new())
        .capture(Arc::new(TestPatternLibrary))
        .build()
        .unwrap();
    let handle = controller.handle();
    let listener = spawn_signal_listener(controller.handle());

    let task = tokio::spawn(controller.run());
    handle.wait_for_state(SessionState::Running).await;
    handle.disconnect();
    task.await.unwrap().unwrap();

    tokio::time::timeout(Duration::from_secs(5), listener)
        .await
        .expect("listener should stop once the controller is gone")
        .unwrap();
}
