use signals::{Memo, create_memo};

use crate::{MaybeAccessor, held_keys};

/// True while `key` is held. Comparison is case-insensitive; `key` may be an
/// accessor.
pub fn key_held(key: impl Into<MaybeAccessor<String>>) -> Memo<bool> {
    let key = key.into();
    let held = held_keys();
    create_memo(move || {
        let wanted = key.get().to_lowercase();
        held.with(|keys| keys.iter().any(|k| k.to_lowercase() == wanted))
    })
}
