//! Session lifecycle: configuration, the controller state machine and the
//! plumbing it runs on.

pub mod builder;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod signals;
pub mod tracks;
pub mod types;


pub use builder::{SessionBuilder, SessionConfigBuilder};
pub use config::{
    AudioCodec, CaptureConfig, DisplayConfig, ProxyConfig, Role, SessionConfig, VideoCodec,
};
pub use controller::{EventStream, SessionController, SessionHandle};
pub use dispatch::{DispatchBridge, ExecutionContext};
pub use signals::spawn_signal_listener;
pub use tracks::{LocalTrackSet, MediaSelection, TrackProvisioner};
pub use types::{SessionState, TerminationSource};
