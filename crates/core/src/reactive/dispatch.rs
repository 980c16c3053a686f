//! Marshalling between background workers and the graph's owning context.
//!
//! Background jobs never touch graph nodes. They run on a [`WorkerPool`] and
//! report back by sending plain messages through a [`DispatchSender`]; the
//! context that owns the graph drains its [`Dispatcher`] and applies each
//! message to its observables.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::errors::{Error, Result};

/// Default number of concurrent background jobs.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Cloneable, `Send` handle used by background jobs to post results.
pub struct DispatchSender<M> {
    tx: mpsc::UnboundedSender<M>,
}

impl<M> Clone for DispatchSender<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M: Send + 'static> DispatchSender<M> {
    /// Posts a message. Returns false if the owning context is gone.
    pub fn send(&self, message: M) -> bool {
        if self.tx.send(message).is_err() {
            log::debug!("Dispatcher dropped; discarding background result");
            return false;
        }
        true
    }
}

/// Receiving side, owned by the graph's sequencing context.
pub struct Dispatcher<M> {
    tx: mpsc::UnboundedSender<M>,
    rx: mpsc::UnboundedReceiver<M>,
}

impl<M: Send + 'static> Dispatcher<M> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> DispatchSender<M> {
        DispatchSender {
            tx: self.tx.clone(),
        }
    }

    /// Returns the next queued message without waiting.
    pub fn try_next(&mut self) -> Option<M> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next message.
    ///
    /// The dispatcher keeps a sender of its own, so this only resolves once a
    /// message actually arrives.
    pub async fn next(&mut self) -> Option<M> {
        self.rx.recv().await
    }
}

impl<M: Send + 'static> Default for Dispatcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-size pool for fetches and store writes.
///
/// Jobs are tokio tasks gated by a semaphore, so at most `size` of them make
/// progress at once regardless of how many are queued.
#[derive(Clone)]
pub struct WorkerPool {
    handle: Handle,
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Creates a pool on the current tokio runtime.
    pub fn new(size: usize) -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;
        Ok(Self::with_handle(handle, size))
    }

    pub fn with_handle(handle: Handle, size: usize) -> Self {
        let size = size.max(1);
        Self {
            handle,
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn spawn<F, T>(&self, job: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.handle.spawn(async move {
            // The semaphore is never closed, so acquire only fails if it is.
            let _permit = permits.acquire_owned().await.ok();
            job.await
        })
    }
}
