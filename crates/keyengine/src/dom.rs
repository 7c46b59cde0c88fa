//! Minimal event-target tree for keyboard events.
//!
//! A target is a node with an optional parent. Dispatching an event on a
//! target walks the path from the root down to the target (capture phase) and
//! back up (bubble phase), invoking listeners registered for each phase until
//! a listener stops propagation. The per-thread [`document`] is the default
//! root; it can be removed with [`set_document`] to model an environment
//! without one.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use tracing::trace;

use crate::KeyboardEvent;

/// Listener callback type.
type ListenerFn = Rc<dyn Fn(&KeyboardEvent)>;

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
    static DOCUMENT: RefCell<Option<EventTarget>> = RefCell::new(Some(EventTarget::root("document")));
}

fn next_id() -> u64 {
    NEXT_ID.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    })
}

/// The current document, if this environment has one.
pub fn document() -> Option<EventTarget> {
    DOCUMENT.with(|d| d.borrow().clone())
}

/// Replace the current document, returning the previous one.
pub fn set_document(doc: Option<EventTarget>) -> Option<EventTarget> {
    DOCUMENT.with(|d| d.replace(doc))
}

/// Identifies a listener on one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    capture: bool,
    callback: ListenerFn,
}

struct TargetNode {
    id: u64,
    label: String,
    parent: Option<EventTarget>,
    listeners: RefCell<Vec<Listener>>,
}

/// A node that keyboard events can be dispatched on.
#[derive(Clone)]
pub struct EventTarget {
    node: Rc<TargetNode>,
}

impl EventTarget {
    /// A new parentless target.
    pub fn root(label: &str) -> Self {
        Self::with_parent(label, None)
    }

    /// A new child target of `self`.
    pub fn element(&self, label: &str) -> Self {
        Self::with_parent(label, Some(self.clone()))
    }

    fn with_parent(label: &str, parent: Option<Self>) -> Self {
        Self {
            node: Rc::new(TargetNode {
                id: next_id(),
                label: label.to_string(),
                parent,
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.node.id
    }

    pub fn label(&self) -> &str {
        &self.node.label
    }

    pub fn parent(&self) -> Option<&Self> {
        self.node.parent.as_ref()
    }

    /// Register a listener for the capture (`capture = true`) or bubble phase.
    pub fn add_listener(
        &self,
        capture: bool,
        callback: impl Fn(&KeyboardEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(next_id());
        self.node.listeners.borrow_mut().push(Listener {
            id,
            capture,
            callback: Rc::new(callback),
        });
        id
    }

    /// Remove a listener. Returns false when it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.node.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.node.listeners.borrow().len()
    }

    fn has_listener(&self, id: ListenerId) -> bool {
        self.node.listeners.borrow().iter().any(|l| l.id == id)
    }

    /// Dispatch `event` with this node as the event target.
    pub fn dispatch(&self, event: &KeyboardEvent) {
        let mut path = vec![self.clone()];
        while let Some(parent) = path.last().and_then(|t| t.parent().cloned()) {
            path.push(parent);
        }
        trace!(target_label = self.label(), key = %event.key, kind = ?event.kind, "dispatch");
        for t in path.iter().rev() {
            if event.propagation_stopped() {
                return;
            }
            t.invoke(event, true);
        }
        for t in &path {
            if event.propagation_stopped() {
                return;
            }
            t.invoke(event, false);
        }
    }

    /// Run this node's listeners for one phase. Listeners removed by an earlier
    /// listener during the same dispatch are skipped.
    fn invoke(&self, event: &KeyboardEvent, capture: bool) {
        let snapshot: Vec<(ListenerId, ListenerFn)> = self
            .node
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.capture == capture)
            .map(|l| (l.id, l.callback.clone()))
            .collect();
        for (id, cb) in snapshot {
            if self.has_listener(id) {
                cb(event);
            }
        }
    }
}

impl PartialEq for EventTarget {
    fn eq(&self, other: &Self) -> bool {
        self.node.id == other.node.id
    }
}

impl Eq for EventTarget {}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTarget")
            .field("id", &self.node.id)
            .field("label", &self.node.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_then_bubble_order() {
        let root = EventTarget::root("root");
        let child = root.element("child");
        let log = Rc::new(RefCell::new(Vec::new()));
        for (t, name) in [(&root, "root"), (&child, "child")] {
            let l = log.clone();
            t.add_listener(true, move |_| l.borrow_mut().push(format!("{name}:capture")));
            let l = log.clone();
            t.add_listener(false, move |_| l.borrow_mut().push(format!("{name}:bubble")));
        }
        child.dispatch(&KeyboardEvent::key_down("a"));
        assert_eq!(
            *log.borrow(),
            vec!["root:capture", "child:capture", "child:bubble", "root:bubble"]
        );
    }

    #[test]
    fn events_do_not_reach_descendants() {
        let root = EventTarget::root("root");
        let child = root.element("child");
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        child.add_listener(false, move |_| h.set(h.get() + 1));
        root.dispatch(&KeyboardEvent::key_down("a"));
        assert_eq!(hits.get(), 0);
        child.dispatch(&KeyboardEvent::key_down("a"));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn stop_propagation_halts_path() {
        let root = EventTarget::root("root");
        let child = root.element("child");
        let hits = Rc::new(Cell::new(0));
        child.add_listener(false, |e| e.stop_propagation());
        let h = hits.clone();
        root.add_listener(false, move |_| h.set(h.get() + 1));
        child.dispatch(&KeyboardEvent::key_down("a"));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let root = EventTarget::root("root");
        let hits = Rc::new(Cell::new(0));
        let second: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let (r, s) = (root.clone(), second.clone());
        root.add_listener(false, move |_| {
            if let Some(id) = s.get() {
                r.remove_listener(id);
            }
        });
        let h = hits.clone();
        second.set(Some(root.add_listener(false, move |_| h.set(h.get() + 1))));
        root.dispatch(&KeyboardEvent::key_down("a"));
        assert_eq!(hits.get(), 0);
        assert_eq!(root.listener_count(), 1);
    }

    #[test]
    fn document_can_be_removed_and_restored() {
        let prev = set_document(None);
        assert!(document().is_none());
        set_document(prev.clone());
        assert_eq!(document(), prev);
    }
}
