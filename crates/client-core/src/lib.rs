//! # vidlink client core
//!
//! Session controller for a real-time audio/video signaling client. The
//! crate does not speak any wire protocol itself. It drives an external
//! signaling engine, decides which local tracks to send, and forwards
//! remote video tracks to a renderer on the session's own execution
//! context.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vidlink_client_core::capture::{CaptureLibrary, CaptureRequest, CaptureSource};
//! use vidlink_client_core::client::spawn_signal_listener;
//! use vidlink_client_core::loopback::LoopbackEngine;
//! use vidlink_client_core::{ClientResult, Role, SessionConfig, SessionController};
//!
//! struct Camera;
//!
//! impl CaptureSource for Camera {
//!     fn device_name(&self) -> &str {
//!         "camera"
//!     }
//! }
//!
//! struct Cameras;
//!
//! impl CaptureLibrary for Cameras {
//!     fn create_capture_source(&self, _: &CaptureRequest) -> ClientResult<Box<dyn CaptureSource>> {
//!         Ok(Box::new(Camera))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::builder()
//!         .with_signaling_url("wss://media.example.com/signaling")
//!         .with_channel_id("lobby")
//!         .with_role(Role::SendRecv)
//!         .build()?;
//!
//!     let controller = SessionController::builder(config)
//!         .engine(LoopbackEngine::new())
//!         .capture(Arc::new(Cameras))
//!         .build()?;
//!
//!     // Ctrl-C / SIGTERM end the session cleanly
//!     spawn_signal_listener(controller.handle());
//!
//!     let reason = controller.run().await?;
//!     println!("session closed: {}", reason);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`client::config`] and [`client::builder`]: validated, immutable
//!   session configuration
//! - [`client::tracks`]: local track provisioning from role and capture
//!   settings
//! - [`client::controller`]: the lifecycle state machine
//!   (`Idle → Connecting → Running → Disconnecting → Disconnected`)
//! - [`client::dispatch`]: cross-thread handoff of work to the execution
//!   context that owns the renderer
//! - [`engine`], [`capture`], [`renderer`]: the seams to external
//!   collaborators
//! - [`loopback`]: an in-process engine for demos and tests

pub mod capture;
pub mod client;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod loopback;
pub mod media;
pub mod options;
pub mod platform;
pub mod renderer;
pub mod resolution;

// Re-export main types
pub use client::{
    DispatchBridge, Role, SessionBuilder, SessionConfig, SessionConfigBuilder,
    SessionController, SessionHandle, SessionState,
};
pub use engine::{SignalingConfig, SignalingEngine};
pub use error::{ClientError, ClientResult};
pub use events::{DisconnectCode, DisconnectReason, SessionEvent, SignalingEvent};
pub use media::{MediaKind, MediaTrack, StreamId, TrackId};
pub use options::OptionalBool;
pub use resolution::Resolution;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
