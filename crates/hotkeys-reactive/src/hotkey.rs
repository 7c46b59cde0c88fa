use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use keyengine::{
    HotkeyCallback, HotkeyCallbackContext, HotkeyManager, HotkeyOptions, HotkeyRegistrationHandle,
    KeyboardEvent, Result, get_hotkey_manager,
};
use keyspec::RegisterableHotkey;
use signals::{create_effect, on_cleanup};
use tracing::{error, trace};

use crate::{MaybeAccessor, ResolvedHotkey, resolve_hotkey, use_default_hotkeys_options};

/// Owns at most one engine registration for one binding.
struct HotkeyController {
    manager: HotkeyManager,
    callback: HotkeyCallback,
    registration: RefCell<Option<HotkeyRegistrationHandle>>,
}

impl HotkeyController {
    /// Bring the engine registration in line with `resolved`. The previous
    /// registration is removed before the new one is created.
    fn reconcile(&self, resolved: ResolvedHotkey) -> Result<()> {
        let Some(target) = resolved.target else {
            trace!(hotkey = %resolved.hotkey, "hotkey_skipped_no_target");
            return Ok(());
        };
        self.release();
        let handle = self.manager.register(
            &resolved.hotkey,
            self.callback.clone(),
            HotkeyOptions {
                target: Some(target),
                ..resolved.options.clone()
            },
        )?;
        if handle.is_active() {
            handle.set_callback(self.callback.clone());
            handle.set_options(resolved.options);
        }
        *self.registration.borrow_mut() = Some(handle);
        Ok(())
    }

    /// Unregister the current registration, if it is still active.
    fn release(&self) {
        let handle = self.registration.borrow_mut().take();
        if let Some(h) = handle.filter(HotkeyRegistrationHandle::is_active) {
            h.unregister();
        }
    }
}

/// Bind `hotkey` to `callback` for the lifetime of the current scope.
///
/// `hotkey` and `options` may be literals or accessors; when an accessor's
/// inputs change the registration is replaced. Options fall back to the
/// nearest [`hotkeys_provider`](crate::hotkeys_provider) defaults key by key,
/// then to the engine defaults. Without a target (no explicit target and no
/// document) nothing is registered.
///
/// Errors from the engine at bind time are returned; errors from later
/// re-evaluations are logged and leave the binding unregistered.
pub fn bind_hotkey(
    hotkey: impl Into<MaybeAccessor<RegisterableHotkey>>,
    callback: impl Fn(&KeyboardEvent, &HotkeyCallbackContext) + 'static,
    options: impl Into<MaybeAccessor<HotkeyOptions>>,
) -> Result<()> {
    let hotkey = hotkey.into();
    let options = options.into();
    let defaults = use_default_hotkeys_options().hotkey;
    let controller = Rc::new(HotkeyController {
        manager: get_hotkey_manager(),
        callback: Rc::new(callback),
        registration: RefCell::new(None),
    });
    let bind_error = Rc::new(Cell::new(None));
    let first_run = Rc::new(Cell::new(true));

    let err_slot = bind_error.clone();
    create_effect(move || {
        let resolved = resolve_hotkey(&defaults, options.get(), &hotkey.get());
        let initial = first_run.replace(false);
        match controller.reconcile(resolved) {
            Ok(()) => {}
            Err(err) if initial => err_slot.set(Some(err)),
            Err(err) => error!(error = %err, "hotkey_rebind_failed"),
        }
        let controller = controller.clone();
        on_cleanup(move || controller.release());
    });

    match bind_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
