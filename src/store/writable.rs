//! Single-threaded reactive cells
//!
//! A `Writable<T>` holds a value and a list of subscribers. Every update
//! that reports a change notifies each live subscriber exactly once, after
//! the update has been fully applied. `subscribe` delivers the current
//! value right away.
//!
//! Updates issued while the cell is busy (from inside an update closure or
//! a subscriber callback) are queued and applied in order once the current
//! round completes, so callbacks never re-enter themselves.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Box<dyn FnMut(&T)>;
type Deferred<T> = Box<dyn FnOnce(&mut T) -> bool>;

struct Subscriber<T> {
    id: u64,
    active: Cell<bool>,
    callback: RefCell<Callback<T>>,
}

struct Inner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Rc<Subscriber<T>>>>,
    next_id: Cell<u64>,
    busy: Cell<bool>,
    pending: RefCell<VecDeque<Deferred<T>>>,
}

impl<T> Inner<T> {
    fn remove(&self, id: u64) {
        let mut subscribers = self.subscribers.borrow_mut();
        if let Some(pos) = subscribers.iter().position(|s| s.id == id) {
            subscribers.remove(pos).active.set(false);
        }
    }
}

/// What happened to an `update_if` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// Applied and subscribers were notified
    Changed,
    /// Applied, reported no change
    Unchanged,
    /// Cell was busy; the update runs once the current round completes
    Queued,
}

/// Raises a flag for the guard's lifetime, restoring the previous value
struct BusyGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> BusyGuard<'a> {
    fn raise(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// Shared, mutable, observable value
pub struct Writable<T: 'static> {
    inner: Rc<Inner<T>>,
}

impl<T: 'static> Clone for Writable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Writable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                busy: Cell::new(false),
                pending: RefCell::new(VecDeque::new()),
            }),
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Read the value in place. Must not be called from inside an update
    /// closure of the same cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    pub fn set(&self, value: T) {
        self.update(move |current| *current = value);
    }

    pub fn update(&self, f: impl FnOnce(&mut T) + 'static) -> Update {
        self.update_if(move |current| {
            f(current);
            true
        })
    }

    /// Apply `f`; subscribers are notified only if it returns `true`
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool + 'static) -> Update {
        if self.inner.busy.get() {
            log::trace!("Deferring re-entrant store update");
            self.inner.pending.borrow_mut().push_back(Box::new(f));
            return Update::Queued;
        }

        let changed = {
            let _busy = BusyGuard::raise(&self.inner.busy);
            self.apply(Box::new(f))
        };
        self.drain();
        if changed {
            Update::Changed
        } else {
            Update::Unchanged
        }
    }

    /// Register `callback`, invoking it immediately with the current value
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let subscriber = Rc::new(Subscriber {
            id,
            active: Cell::new(true),
            callback: RefCell::new(Box::new(callback)),
        });
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::clone(&subscriber));

        let outermost = !self.inner.busy.get();
        {
            let _busy = BusyGuard::raise(&self.inner.busy);
            let value = self.inner.value.borrow();
            let mut callback = subscriber.callback.borrow_mut();
            (callback.as_mut())(&*value);
        }
        if outermost {
            self.drain();
        }

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove(id);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Read-only view sharing this cell
    pub fn readable(&self) -> Readable<T> {
        Readable(self.clone())
    }

    fn apply(&self, f: Deferred<T>) -> bool {
        let changed = f(&mut *self.inner.value.borrow_mut());
        if changed {
            self.notify();
        }
        changed
    }

    fn notify(&self) {
        // Snapshot so callbacks may subscribe/unsubscribe freely
        let subscribers: Vec<_> = self.inner.subscribers.borrow().iter().cloned().collect();
        let value = self.inner.value.borrow();
        for subscriber in &subscribers {
            if subscriber.active.get() {
                let mut callback = subscriber.callback.borrow_mut();
                (callback.as_mut())(&*value);
            }
        }
    }

    fn drain(&self) {
        loop {
            let Some(next) = self.inner.pending.borrow_mut().pop_front() else {
                break;
            };
            let _busy = BusyGuard::raise(&self.inner.busy);
            self.apply(next);
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Writable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writable")
            .field("value", &self.inner.value.try_borrow().ok())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Read/subscribe half of a `Writable`
pub struct Readable<T: 'static>(Writable<T>);

impl<T: 'static> Clone for Readable<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: 'static> Readable<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.with(f)
    }

    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        self.0.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subscriber_count()
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Readable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Live subscription; unsubscribes when dropped
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
