//! Reactive derived-state graph.
//!
//! - [`Observable`]: a mutable value that notifies subscribers synchronously.
//! - [`DerivedView`]: a value recomputed from the current values of its
//!   upstreams whenever any of them changes.
//! - [`Subscription`]: RAII guard; dropping it unsubscribes.
//! - [`Dispatcher`] / [`WorkerPool`]: background jobs and the channel that
//!   carries their results back to the context owning the graph.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order, before the outermost
//!    `set` returns.
//! 2. Subscribing replays the current value immediately.
//! 3. The graph is a DAG; attaching an upstream that would close a cycle
//!    fails with [`GraphError`] and leaves the graph unchanged.
//! 4. A view recomputes only after every upstream reached by the same write
//!    has settled, so it never combines a new value with a stale sibling.
//! 5. Graph handles are `!Send`, so all writes and recomputes stay on the
//!    context that built them.

mod derived;
mod dispatch;
mod node;
mod observable;
mod scheduler;

pub use derived::{DerivedView, GraphError};
pub use dispatch::{DispatchSender, Dispatcher, WorkerPool, DEFAULT_WORKER_COUNT};
pub use node::{NodeId, Signal, Source};
pub use observable::{Observable, Subscription};
