use std::{fmt, rc::Rc};

use crate::{
    ReadSignal, create_signal,
    runtime::{NodeKind, with_runtime},
};

/// Run `f` now and again whenever a signal it read changes.
///
/// Each run first disposes what the previous run owned and runs the cleanups
/// it registered with [`on_cleanup`](crate::on_cleanup). Signal writes made by
/// `f` are applied after the run returns.
pub fn create_effect(f: impl Fn() + 'static) {
    with_runtime(|rt| {
        let node = rt.create_node(NodeKind::Effect, rt.owner(), Some(Rc::new(f)));
        rt.batch(|| rt.run_node(node));
    });
}

/// A derived value, recomputed when its inputs change. Readers are notified
/// only when the value actually changes.
pub struct Memo<T> {
    signal: ReadSignal<T>,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

/// Create a memo computing `f`. The first computation happens immediately.
pub fn create_memo<T>(f: impl Fn() -> T + 'static) -> Memo<T>
where
    T: PartialEq + 'static,
{
    with_runtime(|rt| {
        let node = rt.create_node(NodeKind::Memo, rt.owner(), None);
        let initial = rt.run_tracked(node, &f);
        let (read, write) = create_signal(initial);
        rt.set_body(
            node,
            Rc::new(move || {
                write.set_if_changed(f());
            }),
        );
        Memo { signal: read }
    })
}

impl<T: 'static> Memo<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.signal.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.signal.get_untracked()
    }
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Memo").field(&self.signal).finish()
    }
}
