use std::{cell::Cell, rc::Rc};

use keyengine::{
    HotkeyCallback, HotkeyCallbackContext, KeyboardEvent, Result, get_sequence_manager,
};
use signals::{create_effect, on_cleanup};
use tracing::{error, trace};

use crate::{MaybeAccessor, SequenceBindOptions, resolve_sequence, use_default_hotkeys_options};

/// Bind a multi-key sequence ("G G", "D I W") for the lifetime of the current scope.
///
/// Every change of an accessor input tears the registration down and
/// registers again. A disabled binding or an empty sequence registers nothing.
/// Error handling follows [`bind_hotkey`](crate::bind_hotkey).
pub fn bind_sequence(
    sequence: impl Into<MaybeAccessor<Vec<String>>>,
    callback: impl Fn(&KeyboardEvent, &HotkeyCallbackContext) + 'static,
    options: impl Into<MaybeAccessor<SequenceBindOptions>>,
) -> Result<()> {
    let sequence = sequence.into();
    let options = options.into();
    let defaults = use_default_hotkeys_options().sequence;
    let callback: HotkeyCallback = Rc::new(callback);
    let bind_error = Rc::new(Cell::new(None));
    let first_run = Rc::new(Cell::new(true));

    let err_slot = bind_error.clone();
    create_effect(move || {
        let steps = sequence.get();
        let resolved = resolve_sequence(&defaults, options.get());
        let initial = first_run.replace(false);
        if !resolved.enabled || steps.is_empty() {
            trace!(steps = steps.len(), enabled = resolved.enabled, "sequence_skipped");
            return;
        }
        match get_sequence_manager().register(&steps, callback.clone(), resolved.options) {
            Ok(token) => on_cleanup(move || token.unregister()),
            Err(err) if initial => err_slot.set(Some(err)),
            Err(err) => error!(error = %err, "sequence_rebind_failed"),
        }
    });

    match bind_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
