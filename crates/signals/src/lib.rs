//! signals: a small single-threaded reactive runtime.
//!
//! - [`create_signal`] makes a value whose reads are tracked.
//! - [`create_effect`] runs a closure and re-runs it when a tracked read changes.
//! - [`create_memo`] derives a value and only notifies readers when it changes.
//! - [`create_root`] and [`with_child_scope`] create scopes that own effects,
//!   memos, [`on_cleanup`] handlers and contexts ([`provide_context`],
//!   [`use_context`]). Disposing a scope releases everything it owns.
//!
//! The runtime is per thread. Nothing here is `Send`.

mod runtime;
pub use runtime::{
    Disposer, batch, create_root, has_owner, live_node_count, on_cleanup, untrack,
    with_child_scope,
};

mod signal;
pub use signal::{ReadSignal, WriteSignal, create_signal};

mod effect;
pub use effect::{Memo, create_effect, create_memo};

mod context;
pub use context::{provide_context, use_context};
