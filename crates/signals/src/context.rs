use std::{any::TypeId, rc::Rc};

use tracing::trace;

use crate::runtime::with_runtime;

/// Attach `value` to the current scope. Scopes created below it see the value
/// through [`use_context`] until a nearer scope provides another value of the
/// same type.
pub fn provide_context<T: 'static>(value: T) {
    let provided = with_runtime(|rt| rt.provide_context(Rc::new(value), TypeId::of::<T>()));
    if !provided {
        trace!(ty = std::any::type_name::<T>(), "provide_context_without_owner");
    }
}

/// The value of type `T` provided by the nearest enclosing scope.
pub fn use_context<T: Clone + 'static>() -> Option<T> {
    with_runtime(|rt| rt.lookup_context(TypeId::of::<T>()))
        .and_then(|v| v.downcast_ref::<T>().cloned())
}
