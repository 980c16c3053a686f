//! Ordered propagation of changes through derived views.
//!
//! A write does not recompute downstream views inline. Each affected view is
//! queued under its rank (longest path from a plain value), and the queue is
//! drained lowest rank first once the outermost write has finished notifying.
//! A view therefore recomputes after every upstream that the same change
//! touches has settled, and at most once per wave.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Weak;

use super::node::NodeId;

/// A node that can be recomputed by the scheduler.
pub(crate) trait Recompute {
    fn rank(&self) -> u32;
    fn recompute(&self);
}

#[derive(Default)]
struct Scheduler {
    depth: Cell<usize>,
    flushing: Cell<bool>,
    queue: RefCell<BTreeMap<(u32, NodeId), Weak<dyn Recompute>>>,
}

thread_local! {
    static SCHEDULER: Scheduler = Scheduler::default();
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        SCHEDULER.with(|s| s.depth.set(s.depth.get() + 1));
        DepthGuard
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        SCHEDULER.with(|s| s.depth.set(s.depth.get().saturating_sub(1)));
    }
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        SCHEDULER.with(|s| {
            s.flushing.set(false);
            // A panicking compute must not leave stale work for the next write.
            if std::thread::panicking() {
                s.queue.borrow_mut().clear();
            }
        });
    }
}

fn idle() -> bool {
    SCHEDULER.with(|s| s.depth.get() == 0 && !s.flushing.get())
}

/// Runs `notify` as one change wave and drains the queue afterwards, unless
/// an enclosing wave or drain is already in progress.
pub(crate) fn batch<R>(notify: impl FnOnce() -> R) -> R {
    let out = {
        let _depth = DepthGuard::enter();
        notify()
    };
    if idle() {
        flush();
    }
    out
}

/// Queues `node` for recompute. Queuing the same node twice in one wave is a
/// no-op.
pub(crate) fn schedule(rank: u32, id: NodeId, node: Weak<dyn Recompute>) {
    SCHEDULER.with(|s| {
        s.queue.borrow_mut().insert((rank, id), node);
    });
    if idle() {
        flush();
    }
}

fn flush() {
    SCHEDULER.with(|s| s.flushing.set(true));
    let _flushing = FlushGuard;
    loop {
        let next = SCHEDULER.with(|s| s.queue.borrow_mut().pop_first());
        let Some((_, node)) = next else {
            break;
        };
        if let Some(node) = node.upgrade() {
            node.recompute();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct Recorder {
        rank: u32,
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Recompute for Recorder {
        fn rank(&self) -> u32 {
            self.rank
        }

        fn recompute(&self) {
            self.log.borrow_mut().push(self.name);
        }
    }

    fn node(rank: u32, name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Rc<Recorder> {
        Rc::new(Recorder {
            rank,
            name,
            log: Rc::clone(log),
        })
    }

    fn queue(id: NodeId, node: &Rc<Recorder>) {
        let weak: Weak<dyn Recompute> = Rc::downgrade(node) as Weak<dyn Recompute>;
        schedule(node.rank(), id, weak);
    }

    #[test]
    fn test_batch_drains_in_rank_order_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let low = node(1, "low", &log);
        let high = node(2, "high", &log);

        batch(|| {
            queue(20, &high);
            queue(10, &low);
            queue(20, &high);
        });
        assert_eq!(*log.borrow(), vec!["low", "high"]);
    }

    #[test]
    fn test_schedule_outside_a_batch_runs_immediately() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let only = node(1, "only", &log);
        queue(30, &only);
        assert_eq!(*log.borrow(), vec!["only"]);
    }

    #[test]
    fn test_dropped_nodes_are_skipped() {
        let log = Rc::new(RefCell::new(Vec::new()));
        batch(|| {
            let gone = node(1, "gone", &log);
            queue(40, &gone);
        });
        assert!(log.borrow().is_empty());
    }
}
