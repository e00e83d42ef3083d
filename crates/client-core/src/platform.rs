//! Process-wide platform initialization
//!
//! On Windows the capture and rendering stacks need COM initialized in the
//! multithreaded apartment before anything else runs. Everywhere else this
//! is a no-op. Acquire the guard once in `main` and keep it alive for the
//! lifetime of the process.

use tracing::debug;

use crate::error::ClientResult;

#[derive(Debug)]
pub struct PlatformGuard {
    #[cfg(windows)]
    initialized: bool,
}

impl PlatformGuard {
    #[cfg(windows)]
    pub fn acquire() -> ClientResult<Self> {
        use winapi::shared::winerror::{RPC_E_CHANGED_MODE, SUCCEEDED};
        use winapi::um::combaseapi::CoInitializeEx;
        use winapi::um::objbase::COINIT_MULTITHREADED;

        // SAFETY: reserved pointer must be null; balanced by CoUninitialize in Drop.
        let hr = unsafe { CoInitializeEx(std::ptr::null_mut(), COINIT_MULTITHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            debug!("COM already initialized in a different apartment");
            return Ok(Self { initialized: false });
        }
        if !SUCCEEDED(hr) {
            return Err(crate::error::ClientError::platform(format!(
                "CoInitializeEx failed: 0x{:08x}",
                hr
            )));
        }
        debug!("COM initialized (multithreaded apartment)");
        Ok(Self { initialized: true })
    }

    #[cfg(not(windows))]
    pub fn acquire() -> ClientResult<Self> {
        debug!("no platform initialization required");
        Ok(Self {})
    }
}

#[cfg(windows)]
impl Drop for PlatformGuard {
    fn drop(&mut self) {
        if self.initialized {
            // SAFETY: paired with the successful CoInitializeEx in acquire.
            unsafe { winapi::um::combaseapi::CoUninitialize() };
        }
    }
}
