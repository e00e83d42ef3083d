//! Renderer interface
//!
//! The renderer draws video tracks on screen. Its state belongs to the
//! session's execution context: the controller never calls it directly
//! from an event handler, it dispatches work through a
//! [`DispatchBridge`](crate::client::dispatch::DispatchBridge) instead.

use std::sync::Arc;

use crate::client::dispatch::DispatchBridge;
use crate::media::MediaTrack;

/// Bridge type handed to renderers
pub type RendererBridge = DispatchBridge<dyn VideoRenderer>;

pub trait VideoRenderer: Send {
    /// Start showing a video track
    fn add_track(&mut self, track: Arc<MediaTrack>);

    /// Stop showing a video track previously added
    fn remove_track(&mut self, track: &Arc<MediaTrack>);

    /// Receive the bridge used to schedule the renderer's own work (frame
    /// updates from sink threads) back onto the owning context.
    fn set_dispatch_target(&mut self, bridge: RendererBridge);
}
