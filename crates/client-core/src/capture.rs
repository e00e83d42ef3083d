//! Capture library interface
//!
//! The capture library enumerates devices and produces frames. Only the
//! narrow surface the track provisioner needs is modelled here.

use std::fmt;

use crate::error::ClientResult;

/// Parameters for opening a video capture source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Device to open; `None` picks the first available one
    pub device_name: Option<String>,
    /// Prefer the platform's native (hardware accelerated) capture path
    pub use_native: bool,
}

/// An open video capture source.
///
/// Holds exclusive access to the capture device; implementations release
/// it on drop.
pub trait CaptureSource: Send + Sync {
    /// Human readable name of the device backing this source
    fn device_name(&self) -> &str;
}

impl fmt::Debug for dyn CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSource")
            .field("device", &self.device_name())
            .finish()
    }
}

/// Factory for capture sources
pub trait CaptureLibrary: Send + Sync {
    /// Open a video capture source.
    ///
    /// Returns [`ClientError::CaptureDevice`](crate::ClientError::CaptureDevice)
    /// when the requested device cannot be opened.
    fn create_capture_source(&self, request: &CaptureRequest) -> ClientResult<Box<dyn CaptureSource>>;
}
