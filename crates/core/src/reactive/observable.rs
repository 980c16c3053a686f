//! Mutable source values with synchronous change notification.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::node::{next_node_id, NodeId, Signal, Source};
use super::scheduler;

type Callback<T> = Rc<dyn Fn(&T)>;

/// Ordered subscriber list shared by observables and derived views.
pub(crate) struct SubscriberList<T> {
    entries: RefCell<Vec<(u64, Callback<T>)>>,
    next_id: Cell<u64>,
}

impl<T> SubscriberList<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub(crate) fn add(&self, callback: Callback<T>) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, callback));
        id
    }

    pub(crate) fn remove(&self, id: u64) {
        self.entries.borrow_mut().retain(|(entry_id, _)| *entry_id != id);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Delivers `value` to every subscriber registered at call time, in
    /// registration order. The list is snapshotted first so callbacks may
    /// subscribe, unsubscribe or write without hitting a borrow conflict.
    pub(crate) fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in snapshot {
            callback(value);
        }
    }
}

/// RAII guard returned by `subscribe`; the callback is removed on drop.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribes now instead of waiting for drop.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

struct ObservableInner<T> {
    id: NodeId,
    value: RefCell<T>,
    version: Cell<u64>,
    subscribers: SubscriberList<T>,
}

/// A mutable value that notifies its subscribers synchronously on every write.
///
/// Cloning an `Observable` yields another handle to the same value.
/// Handles are `!Send`: every write happens on the context that created it.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                id: next_node_id(),
                value: RefCell::new(value),
                version: Cell::new(0),
                subscribers: SubscriberList::new(),
            }),
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Runs `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replaces the value and notifies every subscriber before returning.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.publish();
    }

    /// Mutates the value in place, then notifies.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.publish();
    }

    /// Number of writes since creation.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Registers `callback` and immediately replays the current value to it.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback: Callback<T> = Rc::new(callback);
        let current = self.get();
        callback(&current);
        self.register(callback)
    }

    fn register(&self, callback: Callback<T>) -> Subscription {
        let id = self.inner.subscribers.add(callback);
        let weak: Weak<ObservableInner<T>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.remove(id);
            }
        })
    }

    fn publish(&self) {
        self.inner.version.set(self.inner.version.get() + 1);
        // Clone before notifying so callbacks can write back into this value.
        let current = self.get();
        scheduler::batch(|| self.inner.subscribers.notify(&current));
    }
}

impl<T: Clone + 'static> Source for Observable<T> {
    fn node_id(&self) -> NodeId {
        self.inner.id
    }

    fn upstreams(&self) -> Vec<Rc<dyn Source>> {
        Vec::new()
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.register(Rc::new(move |_: &T| on_change()))
    }

    fn as_source(&self) -> Rc<dyn Source> {
        Rc::new(self.clone())
    }
}

impl<T: Clone + 'static> Signal<T> for Observable<T> {
    fn get(&self) -> T {
        Observable::get(self)
    }

    fn subscribe(&self, callback: Box<dyn Fn(&T)>) -> Subscription {
        Observable::subscribe(self, move |value: &T| callback(value))
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("id", &self.inner.id)
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_replays_current_value() {
        let value = Observable::new(7);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = value.subscribe(move |v| sink.borrow_mut().push(*v));
        assert_eq!(*seen.borrow(), vec![7]);
    }

    #[test]
    fn test_set_notifies_in_subscription_order() {
        let value = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&log);
        let _a = value.subscribe(move |v| first.borrow_mut().push(format!("a{}", v)));
        let second = Rc::clone(&log);
        let _b = value.subscribe(move |v| second.borrow_mut().push(format!("b{}", v)));

        log.borrow_mut().clear();
        value.set(1);
        value.set(2);
        assert_eq!(*log.borrow(), vec!["a1", "b1", "a2", "b2"]);
        assert_eq!(value.version(), 2);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let value = Observable::new(String::from("x"));
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let sub = value.subscribe(move |_| counter.set(counter.get() + 1));
        assert_eq!(value.subscriber_count(), 1);

        drop(sub);
        value.set("y".to_string());
        assert_eq!(count.get(), 1);
        assert_eq!(value.subscriber_count(), 0);
    }

    #[test]
    fn test_write_from_inside_callback_does_not_panic() {
        let value = Observable::new(0);
        let mirror = Observable::new(0);
        let target = mirror.clone();
        let _sub = value.subscribe(move |v| target.set(*v * 10));

        value.set(3);
        assert_eq!(mirror.get(), 30);
    }

    #[test]
    fn test_update_mutates_in_place() {
        let list = Observable::new(vec![1, 2]);
        list.update(|items| items.push(3));
        assert_eq!(list.get(), vec![1, 2, 3]);
        assert!(list.with(|items| items.contains(&3)));
    }
}
