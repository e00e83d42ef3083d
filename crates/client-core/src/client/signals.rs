//! OS termination signals
//!
//! Ctrl-C (SIGINT) and, on unix, SIGTERM are turned into termination
//! requests on a [`SessionHandle`]. Every signal is forwarded; the
//! controller itself ignores requests once it is already disconnecting.

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::controller::SessionHandle;
use super::types::TerminationSource;

/// Forward OS termination signals to `handle` until the session is gone.
pub fn spawn_signal_listener(handle: SessionHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut signals = match Signals::new() {
            Ok(signals) => signals,
            Err(e) => {
                warn!("Failed to install signal handlers: {}", e);
                return;
            }
        };

        loop {
            let source = tokio::select! {
                source = signals.recv() => source,
                _ = handle.closed() => return,
            };
            let Some(source) = source else {
                return;
            };
            debug!(%source, "termination signal received");
            if !handle.request_termination(source) {
                return;
            }
        }
    })
}

#[cfg(unix)]
struct Signals {
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> Option<TerminationSource> {
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.ok().map(|_| TerminationSource::Interrupt),
            received = self.terminate.recv() => received.map(|_| TerminationSource::Terminate),
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> Option<TerminationSource> {
        tokio::signal::ctrl_c()
            .await
            .ok()
            .map(|_| TerminationSource::Interrupt)
    }
}
