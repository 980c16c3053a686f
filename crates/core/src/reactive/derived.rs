//! Computed nodes that recompute whenever any upstream changes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use thiserror::Error;

use super::node::{next_node_id, rank_of, reaches, NodeId, Signal, Source};
use super::observable::{SubscriberList, Subscription};
use super::scheduler::{self, Recompute};

/// Structural errors raised while wiring the graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Attaching the upstream would make the view depend on itself.
    #[error("Dependency cycle: node {node} is reachable from its new upstream {upstream}")]
    Cycle { node: NodeId, upstream: NodeId },

    #[error("Node {upstream} is already an upstream of node {node}")]
    DuplicateSource { node: NodeId, upstream: NodeId },
}

struct DerivedInner<T> {
    id: NodeId,
    compute: Box<dyn Fn() -> T>,
    value: RefCell<T>,
    version: Cell<u64>,
    sources: RefCell<Vec<Rc<dyn Source>>>,
    watches: RefCell<Vec<Subscription>>,
    subscribers: SubscriberList<T>,
    recomputing: Cell<bool>,
}

impl<T: Clone + 'static> Recompute for DerivedInner<T> {
    fn rank(&self) -> u32 {
        self.sources
            .borrow()
            .iter()
            .map(|source| rank_of(source) + 1)
            .max()
            .unwrap_or(0)
    }

    fn recompute(&self) {
        if self.recomputing.replace(true) {
            log::warn!(
                "Derived view {} was asked to recompute from inside its own compute; ignoring",
                self.id
            );
            return;
        }
        let next = (self.compute)();
        self.recomputing.set(false);

        *self.value.borrow_mut() = next;
        self.version.set(self.version.get() + 1);
        let current = self.value.borrow().clone();
        self.subscribers.notify(&current);
    }
}

/// A value computed from one or more upstream nodes.
///
/// The compute closure reads its inputs itself (it captures handles to them),
/// so every recompute sees the current value of every input rather than only
/// the one whose change triggered it. The declared sources decide *when* the
/// view recomputes and are what cycle detection walks.
///
/// Recomputes are ordered by rank: when one write reaches a view through
/// several paths, the view recomputes once, after every upstream on those
/// paths has.
pub struct DerivedView<T> {
    inner: Rc<DerivedInner<T>>,
}

impl<T> Clone for DerivedView<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> DerivedView<T> {
    /// Builds a view over `sources`. The initial value is computed eagerly.
    pub fn new(
        sources: Vec<Rc<dyn Source>>,
        compute: impl Fn() -> T + 'static,
    ) -> Result<Self, GraphError> {
        let view = Self::detached(compute);
        for source in sources {
            view.check_source(&source)?;
            view.wire(source);
        }
        Ok(view)
    }

    /// Single-upstream convenience: `f` receives the upstream's current value.
    pub fn map<V, S>(upstream: &S, f: impl Fn(V) -> T + 'static) -> Self
    where
        S: Signal<V> + Clone + 'static,
    {
        let input = upstream.clone();
        let view = Self::detached(move || f(input.get()));
        // A fresh node cannot be reachable from anything, so no check is needed.
        view.wire(upstream.as_source());
        view
    }

    fn detached(compute: impl Fn() -> T + 'static) -> Self {
        let initial = compute();
        Self {
            inner: Rc::new(DerivedInner {
                id: next_node_id(),
                compute: Box::new(compute),
                value: RefCell::new(initial),
                version: Cell::new(0),
                sources: RefCell::new(Vec::new()),
                watches: RefCell::new(Vec::new()),
                subscribers: SubscriberList::new(),
                recomputing: Cell::new(false),
            }),
        }
    }

    fn check_source(&self, source: &Rc<dyn Source>) -> Result<(), GraphError> {
        let upstream = source.node_id();
        if self
            .inner
            .sources
            .borrow()
            .iter()
            .any(|existing| existing.node_id() == upstream)
        {
            return Err(GraphError::DuplicateSource {
                node: self.inner.id,
                upstream,
            });
        }
        if reaches(source, self.inner.id) {
            return Err(GraphError::Cycle {
                node: self.inner.id,
                upstream,
            });
        }
        Ok(())
    }

    fn wire(&self, source: Rc<dyn Source>) {
        let weak: Weak<DerivedInner<T>> = Rc::downgrade(&self.inner);
        let watch = source.watch(Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                let node: Weak<dyn Recompute> = Rc::downgrade(&inner) as Weak<dyn Recompute>;
                scheduler::schedule(inner.rank(), inner.id, node);
            }
        }));
        self.inner.watches.borrow_mut().push(watch);
        self.inner.sources.borrow_mut().push(source);
    }

    /// Attaches another upstream after construction and recomputes.
    ///
    /// Fails with [`GraphError::Cycle`] if this view is reachable from
    /// `source`, leaving the graph unchanged.
    pub fn add_source(&self, source: Rc<dyn Source>) -> Result<(), GraphError> {
        self.check_source(&source)?;
        self.wire(source);
        scheduler::batch(|| self.inner.recompute());
        Ok(())
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Number of recomputes since construction.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Registers `callback` and immediately replays the current value to it.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let current = self.get();
        callback(&current);
        let id = self.inner.subscribers.add(Rc::new(callback));
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.remove(id);
            }
        })
    }
}

impl<T: Clone + 'static> Source for DerivedView<T> {
    fn node_id(&self) -> NodeId {
        self.inner.id
    }

    fn upstreams(&self) -> Vec<Rc<dyn Source>> {
        self.inner.sources.borrow().clone()
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        let id = self.inner.subscribers.add(Rc::new(move |_: &T| on_change()));
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.remove(id);
            }
        })
    }

    fn as_source(&self) -> Rc<dyn Source> {
        Rc::new(self.clone())
    }
}

impl<T: Clone + 'static> Signal<T> for DerivedView<T> {
    fn get(&self) -> T {
        DerivedView::get(self)
    }

    fn subscribe(&self, callback: Box<dyn Fn(&T)>) -> Subscription {
        DerivedView::subscribe(self, move |value: &T| callback(value))
    }
}

impl<T: fmt::Debug> fmt::Debug for DerivedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedView")
            .field("id", &self.inner.id)
            .field("value", &self.inner.value.borrow())
            .field("sources", &self.inner.sources.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Observable;

    fn sum_view(a: &Observable<i32>, b: &Observable<i32>) -> DerivedView<i32> {
        let (x, y) = (a.clone(), b.clone());
        DerivedView::new(vec![a.as_source(), b.as_source()], move || x.get() + y.get())
            .unwrap()
    }

    #[test]
    fn test_recomputes_on_any_upstream_change() {
        let a = Observable::new(1);
        let b = Observable::new(2);
        let sum = sum_view(&a, &b);
        assert_eq!(sum.get(), 3);

        a.set(10);
        assert_eq!(sum.get(), 12);
        b.set(5);
        assert_eq!(sum.get(), 15);
        assert_eq!(sum.version(), 2);
    }

    #[test]
    fn test_recompute_reads_every_sibling_current_value() {
        let a = Observable::new(1);
        let b = Observable::new(1);
        let sum = sum_view(&a, &b);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = sum.subscribe(move |v| sink.borrow_mut().push(*v));

        // b is written from inside a's notification; the last publish sees both.
        let b_handle = b.clone();
        let _link = a.subscribe(move |v| b_handle.set(*v));
        a.set(4);

        assert_eq!(sum.get(), 8);
        assert_eq!(*seen.borrow().last().unwrap(), 8);
    }

    #[test]
    fn test_diamond_publishes_only_settled_values() {
        let a = Observable::new(1);
        let left = DerivedView::map(&a, |v: i32| v);
        let right = DerivedView::map(&a, |v: i32| v);
        let (l, r) = (left.clone(), right.clone());
        let joined = DerivedView::new(vec![left.as_source(), right.as_source()], move || {
            (l.get(), r.get())
        })
        .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = joined.subscribe(move |v| sink.borrow_mut().push(*v));

        a.set(2);
        assert_eq!(*seen.borrow(), vec![(1, 1), (2, 2)]);
        assert_eq!(joined.version(), 1);
    }

    #[test]
    fn test_uneven_paths_wait_for_the_longer_branch() {
        let a = Observable::new(1);
        let doubled = DerivedView::map(&a, |v: i32| v * 2);
        let quadrupled = DerivedView::map(&doubled, |v: i32| v * 2);
        let (x, y) = (a.clone(), quadrupled.clone());
        let ratio = DerivedView::new(vec![a.as_source(), quadrupled.as_source()], move || {
            y.get() / x.get()
        })
        .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = ratio.subscribe(move |v| sink.borrow_mut().push(*v));

        a.set(3);
        a.set(5);
        assert_eq!(*seen.borrow(), vec![4, 4, 4]);
    }

    #[test]
    fn test_late_source_raises_rank() {
        let a = Observable::new(1);
        let b = Observable::new(10);
        let slow = DerivedView::map(&b, |v: i32| v + 1);
        let slower = DerivedView::map(&slow, |v: i32| v + 1);

        // `fast` starts at rank 1 and is re-ranked when `slower` is attached.
        let (x, y) = (a.clone(), slower.clone());
        let fast = DerivedView::new(vec![a.as_source()], move || x.get() + y.get()).unwrap();
        fast.add_source(slower.as_source()).unwrap();

        let (f, s) = (fast.clone(), slower.clone());
        let gap = DerivedView::new(vec![fast.as_source(), slower.as_source()], move || {
            f.get() - s.get()
        })
        .unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = gap.subscribe(move |v| sink.borrow_mut().push(*v));

        b.set(20);
        a.set(2);
        assert_eq!(*seen.borrow(), vec![1, 1, 2]);
    }

    #[test]
    fn test_new_subscriber_gets_current_value_without_upstream_change() {
        let a = Observable::new(2);
        let doubled = DerivedView::map(&a, |v: i32| v * 2);
        a.set(21);

        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        let _sub = doubled.subscribe(move |v| sink.set(*v));
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn test_adding_transitive_upstream_is_a_cycle() {
        let a = Observable::new(1);
        let first = DerivedView::map(&a, |v: i32| v + 1);
        let second = DerivedView::map(&first, |v: i32| v * 2);

        let err = first.add_source(second.as_source()).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle {
                node: first.node_id(),
                upstream: second.node_id(),
            }
        );
        // Graph unchanged and still live.
        a.set(2);
        assert_eq!(second.get(), 6);
    }

    #[test]
    fn test_self_source_is_a_cycle() {
        let a = Observable::new(1);
        let view = DerivedView::map(&a, |v: i32| v);
        assert!(matches!(
            view.add_source(view.as_source()),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn test_duplicate_source_is_rejected() {
        let a = Observable::new(1);
        let result = DerivedView::new(vec![a.as_source(), a.as_source()], || 0);
        assert!(matches!(result, Err(GraphError::DuplicateSource { .. })));
    }

    #[test]
    fn test_dropping_view_detaches_from_upstream() {
        let a = Observable::new(1);
        let view = DerivedView::map(&a, |v: i32| v);
        assert_eq!(a.subscriber_count(), 1);
        drop(view);
        assert_eq!(a.subscriber_count(), 0);
    }

    #[test]
    fn test_late_source_triggers_recompute() {
        let a = Observable::new(1);
        let trigger = Observable::new(false);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let input = a.clone();
        let view = DerivedView::new(vec![a.as_source()], move || {
            counter.set(counter.get() + 1);
            input.get()
        })
        .unwrap();

        view.add_source(trigger.as_source()).unwrap();
        trigger.set(true);
        assert_eq!(calls.get(), 3);
        assert_eq!(view.upstreams().len(), 2);
    }
}
