use std::{collections::BTreeMap, rc::Rc};

use keyengine::{KeyState, Store, get_key_state_tracker};
use signals::{ReadSignal, create_effect, create_signal, on_cleanup};

/// Mirror a projection of `store` into a signal for the lifetime of the
/// current scope.
///
/// The subscription is made first and the current state pushed right after, so
/// no change between creation and subscription is missed. Every notification
/// pushes a fresh projection; the store's own state is never handed out.
pub fn store_signal<S, T>(store: &Store<S>, project: impl Fn(&S) -> T + 'static) -> ReadSignal<T>
where
    S: 'static,
    T: 'static,
{
    let (read, write) = create_signal(store.with_state(&project));
    let project = Rc::new(project);
    let store = store.clone();
    create_effect(move || {
        let unsubscribe = {
            let (store, write, project) = (store.clone(), write.clone(), project.clone());
            store
                .clone()
                .subscribe(move || write.set(store.with_state(|s| project(s))))
        };
        write.set(store.with_state(|s| project(s)));
        on_cleanup(move || unsubscribe.unsubscribe());
    });
    read
}

fn key_state() -> Store<KeyState> {
    get_key_state_tracker().store()
}

/// Names of the keys currently held, in press order.
pub fn held_keys() -> ReadSignal<Vec<String>> {
    store_signal(&key_state(), |s| s.held_keys.clone())
}

/// Physical code of each held key, by key name. Distinguishes left and right
/// variants of the same key.
pub fn held_key_codes() -> ReadSignal<BTreeMap<String, String>> {
    store_signal(&key_state(), |s| s.held_codes.clone())
}
