//! Node identity and the traits every graph participant implements.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::observable::Subscription;

/// Process-unique identifier of a graph node.
pub type NodeId = u64;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Type-erased view of a node, used for wiring and cycle detection.
pub trait Source {
    fn node_id(&self) -> NodeId;

    /// Direct upstream nodes. Empty for plain observable values.
    fn upstreams(&self) -> Vec<Rc<dyn Source>>;

    /// Registers a change callback without replaying the current value.
    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription;

    fn as_source(&self) -> Rc<dyn Source>;
}

/// A readable node: an [`Observable`](super::Observable) or a
/// [`DerivedView`](super::DerivedView).
pub trait Signal<T>: Source {
    /// Current value.
    fn get(&self) -> T;

    /// Subscribes with replay-latest semantics.
    fn subscribe(&self, callback: Box<dyn Fn(&T)>) -> Subscription;
}

/// Returns true when `target` is `start` or is reachable through its upstreams.
pub(crate) fn reaches(start: &Rc<dyn Source>, target: NodeId) -> bool {
    let mut stack = vec![Rc::clone(start)];
    let mut visited = Vec::new();
    while let Some(node) = stack.pop() {
        let id = node.node_id();
        if id == target {
            return true;
        }
        if visited.contains(&id) {
            continue;
        }
        visited.push(id);
        stack.extend(node.upstreams());
    }
    false
}

/// Longest path from a plain value to `node`. Plain values have rank 0.
pub(crate) fn rank_of(node: &Rc<dyn Source>) -> u32 {
    fn walk(node: &Rc<dyn Source>, memo: &mut HashMap<NodeId, u32>) -> u32 {
        if let Some(rank) = memo.get(&node.node_id()) {
            return *rank;
        }
        let rank = node
            .upstreams()
            .iter()
            .map(|up| walk(up, memo) + 1)
            .max()
            .unwrap_or(0);
        memo.insert(node.node_id(), rank);
        rank
    }
    walk(node, &mut HashMap::new())
}
