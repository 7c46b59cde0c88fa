use std::{
    cell::RefCell,
    collections::BTreeSet,
    fmt,
    rc::{Rc, Weak},
};

use crate::runtime::{NodeId, Source, with_runtime};

/// Shared storage behind a signal's read and write halves.
struct SignalInner<T> {
    value: RefCell<T>,
    subscribers: RefCell<BTreeSet<NodeId>>,
}

impl<T> Source for SignalInner<T> {
    fn unsubscribe(&self, node: NodeId) {
        self.subscribers.borrow_mut().remove(&node);
    }
}

impl<T: 'static> SignalInner<T> {
    fn track(self: &Rc<Self>) {
        let weak: Weak<dyn Source> = Rc::downgrade(self) as Weak<dyn Source>;
        with_runtime(|rt| rt.track(weak, |node| self.subscribers.borrow_mut().insert(node)));
    }

    fn notify(&self) {
        let subscribers: Vec<NodeId> = self.subscribers.borrow().iter().copied().collect();
        if !subscribers.is_empty() {
            with_runtime(|rt| rt.notify(subscribers));
        }
    }
}

/// The read half of a signal. Reads inside an effect or memo subscribe it.
pub struct ReadSignal<T> {
    inner: Rc<SignalInner<T>>,
}

/// The write half of a signal. Every write notifies subscribers.
pub struct WriteSignal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Create a signal holding `value`.
pub fn create_signal<T: 'static>(value: T) -> (ReadSignal<T>, WriteSignal<T>) {
    let inner = Rc::new(SignalInner {
        value: RefCell::new(value),
        subscribers: RefCell::new(BTreeSet::new()),
    });
    (
        ReadSignal {
            inner: inner.clone(),
        },
        WriteSignal { inner },
    )
}

impl<T: 'static> ReadSignal<T> {
    /// Clone the current value, subscribing the running computation.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Borrow the current value, subscribing the running computation.
    ///
    /// Writing the same signal from inside `f` panics.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.track();
        f(&self.inner.value.borrow())
    }

    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.with_untracked(T::clone)
    }

    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Number of computations currently subscribed.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T: 'static> WriteSignal<T> {
    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.inner.notify();
    }

    /// Mutate the value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.inner.notify();
    }

    /// Replace the value only if it differs; returns whether it changed.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        if *self.inner.value.borrow() == value {
            return false;
        }
        self.set(value);
        true
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadSignal")
            .field(&self.inner.value.borrow())
            .finish()
    }
}

impl<T: fmt::Debug> fmt::Debug for WriteSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WriteSignal")
            .field(&self.inner.value.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{create_effect, create_root};

    #[test]
    fn untracked_reads_and_writes() {
        let (read, write) = create_signal(1);
        assert_eq!(read.get(), 1);
        write.set(2);
        write.update(|v| *v += 1);
        assert_eq!(read.get_untracked(), 3);
        assert!(!write.set_if_changed(3));
        assert!(write.set_if_changed(4));
        assert_eq!(read.subscriber_count(), 0);
    }

    #[test]
    fn every_write_notifies() {
        create_root(|root| {
            let (read, write) = create_signal(String::from("a"));
            let runs = Rc::new(Cell::new(0));
            let r = runs.clone();
            create_effect(move || {
                read.with(|_| ());
                r.set(r.get() + 1);
            });
            write.set("a".into());
            write.set_if_changed("a".into());
            assert_eq!(runs.get(), 2);
            root.dispose();
        });
    }
}
