//! Dispatch bridge
//!
//! Lets any thread hand a unit of work to the single execution context
//! that owns some state (the renderer, in practice). Work runs on the
//! owning context with `&mut` access to that state, so the state itself
//! needs no locking.
//!
//! Guarantees:
//!
//! - Work dispatched through bridges of one context runs in submission
//!   order.
//! - Once the context is stopped (or dropped), [`DispatchBridge::dispatch`]
//!   silently drops the work. It is not queued for later and not retried.
//!   Work still queued at that moment is discarded too.
//! - `dispatch` never blocks and never panics.
//!
//! ```rust
//! use vidlink_client_core::client::dispatch::ExecutionContext;
//!
//! let mut context = ExecutionContext::<Vec<u32>>::new();
//! let bridge = context.bridge();
//!
//! std::thread::spawn(move || bridge.dispatch(|log| log.push(1)))
//!     .join()
//!     .unwrap();
//!
//! let mut log = Vec::new();
//! assert_eq!(context.run_pending(&mut log), 1);
//! assert_eq!(log, vec![1]);
//!
//! context.stop();
//! context.bridge().dispatch(|log| log.push(2));
//! assert_eq!(context.run_pending(&mut log), 0);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::trace;

/// A unit of work for the owning context
pub type Work<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

/// Cloneable, thread-safe handle for scheduling work onto an [`ExecutionContext`]
pub struct DispatchBridge<T: ?Sized> {
    tx: mpsc::UnboundedSender<Work<T>>,
    stopped: Arc<AtomicBool>,
}

impl<T: ?Sized> Clone for DispatchBridge<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            stopped: Arc::clone(&self.stopped),
        }
    }
}

impl<T: ?Sized> fmt::Debug for DispatchBridge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchBridge")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl<T: ?Sized + 'static> DispatchBridge<T> {
    /// Schedule `work` on the owning context, or drop it if the context
    /// has been stopped.
    pub fn dispatch<F>(&self, work: F)
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        if self.stopped.load(Ordering::Acquire) {
            trace!("execution context stopped, dropping dispatched work");
            return;
        }
        if self.tx.send(Box::new(work)).is_err() {
            trace!("execution context gone, dropping dispatched work");
        }
    }
}

impl<T: ?Sized> DispatchBridge<T> {
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire) || self.tx.is_closed()
    }
}

/// The receiving end: a FIFO of work owned by one task.
pub struct ExecutionContext<T: ?Sized> {
    tx: mpsc::UnboundedSender<Work<T>>,
    rx: mpsc::UnboundedReceiver<Work<T>>,
    stopped: Arc<AtomicBool>,
}

impl<T: ?Sized + 'static> ExecutionContext<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A new bridge into this context
    pub fn bridge(&self) -> DispatchBridge<T> {
        DispatchBridge {
            tx: self.tx.clone(),
            stopped: Arc::clone(&self.stopped),
        }
    }

    /// Wait for the next unit of work. Returns `None` once stopped.
    pub async fn next(&mut self) -> Option<Work<T>> {
        if self.is_stopped() {
            return None;
        }
        self.rx.recv().await
    }

    /// Run everything queued right now against `target`, without waiting.
    /// Returns the number of work items executed.
    pub fn run_pending(&mut self, target: &mut T) -> usize {
        let mut executed = 0;
        while !self.is_stopped() {
            match self.rx.try_recv() {
                Ok(work) => {
                    work(&mut *target);
                    executed += 1;
                }
                Err(_) => break,
            }
        }
        executed
    }

    /// Stop accepting work and discard whatever is still queued
    pub fn stop(&mut self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.rx.close();
        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            trace!(discarded, "discarded queued work on stop");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl<T: ?Sized + 'static> Default for ExecutionContext<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Drop for ExecutionContext<T> {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_fifo_order_across_threads() {
        let mut context = ExecutionContext::<Vec<usize>>::new();
        let bridge = context.bridge();

        let worker = std::thread::spawn(move || {
            for i in 0..100 {
                bridge.dispatch(move |log| log.push(i));
            }
        });
        worker.join().unwrap();

        let mut log = Vec::new();
        assert_eq!(context.run_pending(&mut log), 100);
        assert_eq!(log, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_dispatch_after_stop_is_dropped() {
        let mut context = ExecutionContext::<u32>::new();
        let bridge = context.bridge();
        let ran = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&ran);
        bridge.dispatch(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        context.stop();
        assert!(bridge.is_stopped());

        let counter = Arc::clone(&ran);
        bridge.dispatch(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut target = 0;
        assert_eq!(context.run_pending(&mut target), 0);
        // the item queued before stop was discarded as well
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_debug_reports_stopped_state() {
        let mut context = ExecutionContext::<u32>::new();
        let bridge = context.bridge();
        assert_eq!(format!("{:?}", bridge), "DispatchBridge { stopped: false }");
        context.stop();
        assert_eq!(format!("{:?}", bridge), "DispatchBridge { stopped: true }");
    }

    #[test]
    fn test_dispatch_after_context_dropped() {
        let context = ExecutionContext::<u32>::new();
        let bridge = context.bridge();
        drop(context);
        assert!(bridge.is_stopped());
        bridge.dispatch(|value| *value += 1);
    }

    #[test]
    fn test_dropped_work_releases_captures() {
        let mut context = ExecutionContext::<u32>::new();
        let bridge = context.bridge();
        let payload = Arc::new(());
        context.stop();

        let captured = Arc::clone(&payload);
        bridge.dispatch(move |_| drop(captured));
        assert_eq!(Arc::strong_count(&payload), 1);
    }

    #[tokio::test]
    async fn test_next_waits_for_work() {
        let mut context = ExecutionContext::<String>::new();
        let bridge = context.bridge();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            bridge.dispatch(|s| s.push_str("done"));
        });

        let work = tokio::time::timeout(Duration::from_secs(1), context.next())
            .await
            .expect("timed out waiting for work")
            .expect("context stopped");
        let mut target = String::new();
        work(&mut target);
        assert_eq!(target, "done");

        context.stop();
        assert!(context.next().await.is_none());
    }
}
