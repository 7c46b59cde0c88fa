//! The per-thread reactive runtime: the owner tree and the effect queue.
//!
//! Every computation (effect or memo) and every scope is a node in an owner
//! tree. A node owns the nodes created while it runs, the cleanups registered
//! while it runs, and the contexts provided while it runs. Re-running a node
//! first disposes what its previous run owned; disposing a node disposes its
//! children, then runs its cleanups, then unsubscribes it from its sources.
//!
//! No runtime borrow is held while user code runs, so bodies and cleanups may
//! freely create, read, write and dispose.

use std::{
    any::{Any, TypeId},
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    fmt,
    mem,
    rc::{Rc, Weak},
};

use tracing::trace;

/// Identifies a node in the owner tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(u64);

/// Something a computation can read from and later unsubscribe from.
pub(crate) trait Source {
    /// Forget `node` as a subscriber.
    fn unsubscribe(&self, node: NodeId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// A plain scope: roots and child scopes.
    Scope,
    Effect,
    /// Memos run before effects when both are queued.
    Memo,
}

/// One node of the owner tree.
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    cleanups: Vec<Box<dyn FnOnce()>>,
    contexts: HashMap<TypeId, Rc<dyn Any>>,
    sources: Vec<Weak<dyn Source>>,
    body: Option<Rc<dyn Fn()>>,
}

/// Runtime state for one thread.
pub(crate) struct Runtime {
    nodes: RefCell<HashMap<NodeId, Node>>,
    observer: Cell<Option<NodeId>>,
    owner: Cell<Option<NodeId>>,
    batch_depth: Cell<usize>,
    queue: RefCell<VecDeque<NodeId>>,
    flushing: Cell<bool>,
    next_id: Cell<u64>,
}

thread_local! {
    static RUNTIME: Runtime = Runtime::new();
}

/// Run `f` against this thread's runtime.
pub(crate) fn with_runtime<R>(f: impl FnOnce(&Runtime) -> R) -> R {
    RUNTIME.with(f)
}

impl Runtime {
    fn new() -> Self {
        Self {
            nodes: RefCell::new(HashMap::new()),
            observer: Cell::new(None),
            owner: Cell::new(None),
            batch_depth: Cell::new(0),
            queue: RefCell::new(VecDeque::new()),
            flushing: Cell::new(false),
            next_id: Cell::new(1),
        }
    }

    /// Create a node owned by `parent`.
    pub(crate) fn create_node(
        &self,
        kind: NodeKind,
        parent: Option<NodeId>,
        body: Option<Rc<dyn Fn()>>,
    ) -> NodeId {
        let id = NodeId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let mut nodes = self.nodes.borrow_mut();
        if let Some(p) = parent.and_then(|p| nodes.get_mut(&p)) {
            p.children.push(id);
        }
        nodes.insert(
            id,
            Node {
                kind,
                parent,
                children: Vec::new(),
                cleanups: Vec::new(),
                contexts: HashMap::new(),
                sources: Vec::new(),
                body,
            },
        );
        id
    }

    pub(crate) fn set_body(&self, id: NodeId, body: Rc<dyn Fn()>) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(&id) {
            n.body = Some(body);
        }
    }

    pub(crate) fn owner(&self) -> Option<NodeId> {
        self.owner.get()
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.nodes.borrow().contains_key(&id)
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Run `f` with the given owner and observer, restoring both afterwards.
    pub(crate) fn scoped<R>(
        &self,
        owner: Option<NodeId>,
        observer: Option<NodeId>,
        f: impl FnOnce() -> R,
    ) -> R {
        let prev_owner = self.owner.replace(owner);
        let prev_observer = self.observer.replace(observer);
        let r = f();
        self.owner.set(prev_owner);
        self.observer.set(prev_observer);
        r
    }

    /// Record that the current observer read `source`.
    pub(crate) fn track(&self, source: Weak<dyn Source>, subscribe: impl FnOnce(NodeId) -> bool) {
        let Some(observer) = self.observer.get() else {
            return;
        };
        if subscribe(observer)
            && let Some(n) = self.nodes.borrow_mut().get_mut(&observer)
        {
            n.sources.push(source);
        }
    }

    /// Queue `subscribers` to re-run and flush unless batching.
    pub(crate) fn notify(&self, subscribers: impl IntoIterator<Item = NodeId>) {
        {
            let mut q = self.queue.borrow_mut();
            for id in subscribers {
                if !q.contains(&id) {
                    q.push_back(id);
                }
            }
        }
        if self.batch_depth.get() == 0 {
            self.flush();
        }
    }

    pub(crate) fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.batch_depth.set(self.batch_depth.get() + 1);
        let r = f();
        self.batch_depth.set(self.batch_depth.get() - 1);
        if self.batch_depth.get() == 0 {
            self.flush();
        }
        r
    }

    fn flush(&self) {
        if self.flushing.replace(true) {
            return;
        }
        while let Some(id) = self.next_queued() {
            self.run_node(id);
        }
        self.flushing.set(false);
    }

    /// Next node to run: queued memos first, then effects in queue order.
    fn next_queued(&self) -> Option<NodeId> {
        let mut q = self.queue.borrow_mut();
        let nodes = self.nodes.borrow();
        let memo = q
            .iter()
            .position(|id| nodes.get(id).is_some_and(|n| n.kind == NodeKind::Memo));
        match memo {
            Some(i) => q.remove(i),
            None => q.pop_front(),
        }
    }

    /// Re-run a computation's body under tracking.
    pub(crate) fn run_node(&self, id: NodeId) {
        let body = self.nodes.borrow().get(&id).and_then(|n| n.body.clone());
        if let Some(body) = body {
            self.run_tracked(id, || body());
        }
    }

    /// Clean `id`, then run `f` with `id` as owner and observer.
    pub(crate) fn run_tracked<R>(&self, id: NodeId, f: impl FnOnce() -> R) -> R {
        self.clean(id);
        self.scoped(Some(id), Some(id), f)
    }

    /// Dispose what the last run of `id` owned: children first, then
    /// cleanups in registration order, then source subscriptions.
    fn clean(&self, id: NodeId) {
        let (children, cleanups, sources) = {
            let mut nodes = self.nodes.borrow_mut();
            let Some(n) = nodes.get_mut(&id) else {
                return;
            };
            n.contexts.clear();
            (
                mem::take(&mut n.children),
                mem::take(&mut n.cleanups),
                mem::take(&mut n.sources),
            )
        };
        for child in children.into_iter().rev() {
            self.dispose_node(child);
        }
        self.scoped(self.owner.get(), None, || {
            for cleanup in cleanups {
                cleanup();
            }
        });
        for s in sources.iter().filter_map(Weak::upgrade) {
            s.unsubscribe(id);
        }
    }

    /// Dispose `id` and everything it owns. Unknown ids are ignored.
    pub(crate) fn dispose_node(&self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        trace!(node = id.0, "node_disposed");
        self.clean(id);
        let removed = self.nodes.borrow_mut().remove(&id);
        if let Some(parent) = removed.and_then(|n| n.parent)
            && let Some(p) = self.nodes.borrow_mut().get_mut(&parent)
        {
            p.children.retain(|c| *c != id);
        }
    }

    /// Register a cleanup on the current owner. Returns false without one.
    pub(crate) fn on_cleanup(&self, f: Box<dyn FnOnce()>) -> bool {
        let Some(owner) = self.owner.get() else {
            return false;
        };
        match self.nodes.borrow_mut().get_mut(&owner) {
            Some(n) => {
                n.cleanups.push(f);
                true
            }
            None => false,
        }
    }

    pub(crate) fn provide_context(&self, value: Rc<dyn Any>, type_id: TypeId) -> bool {
        let Some(owner) = self.owner.get() else {
            return false;
        };
        match self.nodes.borrow_mut().get_mut(&owner) {
            Some(n) => {
                n.contexts.insert(type_id, value);
                true
            }
            None => false,
        }
    }

    /// Find the nearest context of `type_id`, walking from the current owner up.
    pub(crate) fn lookup_context(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        let nodes = self.nodes.borrow();
        let mut cursor = self.owner.get();
        while let Some(id) = cursor {
            let n = nodes.get(&id)?;
            if let Some(v) = n.contexts.get(&type_id) {
                return Some(v.clone());
            }
            cursor = n.parent;
        }
        None
    }
}

/// Disposes one scope and everything it owns.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Disposer {
    node: NodeId,
}

impl Disposer {
    /// Dispose the scope. Safe to call more than once.
    pub fn dispose(&self) {
        with_runtime(|rt| rt.dispose_node(self.node));
    }

    /// True until the scope has been disposed.
    pub fn is_live(&self) -> bool {
        with_runtime(|rt| rt.contains(self.node))
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("node", &self.node)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Create a detached root scope and run `f` inside it.
///
/// The root lives until its [`Disposer`] is called; it is not owned by the
/// enclosing scope, if any.
pub fn create_root<R>(f: impl FnOnce(Disposer) -> R) -> R {
    with_runtime(|rt| {
        let node = rt.create_node(NodeKind::Scope, None, None);
        rt.scoped(Some(node), None, || f(Disposer { node }))
    })
}

/// Run `f` in a new scope owned by the current owner.
///
/// The scope is disposed with its owner or through the returned [`Disposer`].
/// Reads inside `f` are not tracked.
pub fn with_child_scope<R>(f: impl FnOnce() -> R) -> (R, Disposer) {
    with_runtime(|rt| {
        let node = rt.create_node(NodeKind::Scope, rt.owner(), None);
        let r = rt.scoped(Some(node), None, f);
        (r, Disposer { node })
    })
}

/// Register `f` to run when the current scope is disposed or re-run.
///
/// Outside any scope the cleanup can never run and is dropped.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    let registered = with_runtime(|rt| rt.on_cleanup(Box::new(f)));
    if !registered {
        trace!("on_cleanup_without_owner");
    }
}

/// Run `f` without tracking reads.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    with_runtime(|rt| rt.scoped(rt.owner(), None, f))
}

/// Run `f`, deferring effect re-runs until it returns.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    with_runtime(|rt| rt.batch(f))
}

/// True when called inside a scope.
pub fn has_owner() -> bool {
    with_runtime(|rt| rt.owner().is_some())
}

/// Number of live scopes and computations on this thread.
pub fn live_node_count() -> usize {
    with_runtime(Runtime::node_count)
}
