//! A small synchronous state container with change listeners.
//!
//! Readers take snapshots through [`Store::with_state`] or [`Store::snapshot`];
//! writers go through [`Store::set_state`], which notifies every subscriber
//! after the mutation has been applied. Listeners are invoked without any
//! internal borrow held, so a listener may read the store or subscribe and
//! unsubscribe freely.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

type StoreListener = Rc<dyn Fn()>;

struct StoreInner<S> {
    state: RefCell<S>,
    listeners: RefCell<Vec<(u64, StoreListener)>>,
    next_id: Cell<u64>,
}

/// Shared handle to a state container.
pub struct Store<S> {
    inner: Rc<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: 'static> Store<S> {
    pub fn new(state: S) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(state),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
            }),
        }
    }

    /// Read the current state.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Clone the current state.
    pub fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.inner.state.borrow().clone()
    }

    /// Mutate the state and notify subscribers.
    pub fn set_state(&self, f: impl FnOnce(&mut S)) {
        f(&mut self.inner.state.borrow_mut());
        let listeners: Vec<(u64, StoreListener)> = self.inner.listeners.borrow().clone();
        for (id, l) in listeners {
            // Skip listeners removed by an earlier listener in this round.
            let live = self.inner.listeners.borrow().iter().any(|(i, _)| *i == id);
            if live {
                l();
            }
        }
    }

    /// Register a listener called after every state change.
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Unsubscribe {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        let weak: Weak<StoreInner<S>> = Rc::downgrade(&self.inner);
        Unsubscribe {
            release: Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.listeners.borrow_mut().retain(|(i, _)| *i != id);
                }
            }),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.inner.state.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

/// Token returned by [`Store::subscribe`]; consuming it removes the listener.
#[must_use = "dropping an Unsubscribe leaves the listener registered"]
pub struct Unsubscribe {
    release: Box<dyn FnOnce()>,
}

impl Unsubscribe {
    pub fn unsubscribe(self) {
        (self.release)();
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifies_after_mutation() {
        let store = Store::new(0u32);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (s, st) = (seen.clone(), store.clone());
        let unsub = store.subscribe(move || s.borrow_mut().push(st.snapshot()));
        store.set_state(|v| *v = 3);
        store.set_state(|v| *v += 1);
        assert_eq!(*seen.borrow(), vec![3, 4]);

        unsub.unsubscribe();
        store.set_state(|v| *v = 10);
        assert_eq!(*seen.borrow(), vec![3, 4]);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn listener_may_unsubscribe_others() {
        let store = Store::new(0u32);
        let slot: Rc<RefCell<Option<Unsubscribe>>> = Rc::new(RefCell::new(None));
        let s = slot.clone();
        let first = store.subscribe(move || {
            if let Some(u) = s.borrow_mut().take() {
                u.unsubscribe();
            }
        });
        *slot.borrow_mut() = Some(store.subscribe(|| {}));
        assert_eq!(store.listener_count(), 2);
        store.set_state(|v| *v = 1);
        assert_eq!(store.listener_count(), 1);
        first.unsubscribe();
    }
}
