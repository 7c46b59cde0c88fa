//! Hotkey registrations and dispatch.
//!
//! One [`HotkeyManager`] exists per thread (see [`get_hotkey_manager`]).
//! Registrations are grouped by target: the manager installs a single bubble
//! phase listener on each target that has at least one registration, and
//! removes it when the last registration on that target goes away.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    fmt,
    rc::{Rc, Weak},
};

use keyspec::{ParsedHotkey, Platform, detect_platform, parse_hotkey};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    EventKind, EventTarget, KeyboardEvent, ListenerId, Result, document,
    matcher::{key_matches, matches_event},
    policy::{self, Resolved},
};

/// Callback invoked when a hotkey fires.
pub type HotkeyCallback = Rc<dyn Fn(&KeyboardEvent, &HotkeyCallbackContext)>;

/// Context passed to a [`HotkeyCallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyCallbackContext {
    /// The hotkey string the registration was made with.
    pub hotkey: String,
    /// The parsed form of `hotkey`.
    pub parsed: ParsedHotkey,
}

/// Registration options. Absent fields take the engine defaults:
/// enabled, key down, prevent default, stop propagation, no reset requirement,
/// detected platform, document target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyOptions {
    pub enabled: Option<bool>,
    pub event_type: Option<EventKind>,
    pub prevent_default: Option<bool>,
    pub stop_propagation: Option<bool>,
    /// Fire once, then wait for the key to be released before firing again.
    pub require_reset: Option<bool>,
    pub platform: Option<Platform>,
    #[serde(skip)]
    pub target: Option<EventTarget>,
}

impl HotkeyOptions {
    /// Key-by-key merge: fields present in `over` replace fields in `self`.
    pub fn overlay(self, over: Self) -> Self {
        Self {
            enabled: over.enabled.or(self.enabled),
            event_type: over.event_type.or(self.event_type),
            prevent_default: over.prevent_default.or(self.prevent_default),
            stop_propagation: over.stop_propagation.or(self.stop_propagation),
            require_reset: over.require_reset.or(self.require_reset),
            platform: over.platform.or(self.platform),
            target: over.target.or(self.target),
        }
    }

    fn resolve(&self) -> Resolved {
        Resolved {
            enabled: self.enabled.unwrap_or(true),
            event_type: self.event_type.unwrap_or(EventKind::KeyDown),
            prevent_default: self.prevent_default.unwrap_or(true),
            stop_propagation: self.stop_propagation.unwrap_or(true),
            require_reset: self.require_reset.unwrap_or(false),
        }
    }
}

struct Registration {
    hotkey: String,
    parsed: ParsedHotkey,
    callback: HotkeyCallback,
    /// Current options, without the target.
    options: HotkeyOptions,
    target: EventTarget,
    awaiting_reset: bool,
}

/// Listener bookkeeping for one target.
struct TargetBinding {
    target: EventTarget,
    listener: ListenerId,
    count: usize,
}

struct ManagerInner {
    registrations: RefCell<BTreeMap<u64, Registration>>,
    targets: RefCell<HashMap<u64, TargetBinding>>,
    next_id: Cell<u64>,
}

/// Shared handle to the hotkey registry.
#[derive(Clone)]
pub struct HotkeyManager {
    inner: Rc<ManagerInner>,
}

thread_local! {
    static MANAGER: HotkeyManager = HotkeyManager::new();
}

/// The hotkey manager shared by everything on this thread.
pub fn get_hotkey_manager() -> HotkeyManager {
    MANAGER.with(Clone::clone)
}

impl Default for HotkeyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeyManager {
    /// Create an independent manager. Most callers want [`get_hotkey_manager`].
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ManagerInner {
                registrations: RefCell::new(BTreeMap::new()),
                targets: RefCell::new(HashMap::new()),
                next_id: Cell::new(1),
            }),
        }
    }

    /// Register `hotkey` on the options' target (or the document).
    ///
    /// Fails when the hotkey string does not parse or when there is neither an
    /// explicit target nor a document.
    pub fn register(
        &self,
        hotkey: &str,
        callback: HotkeyCallback,
        mut options: HotkeyOptions,
    ) -> Result<HotkeyRegistrationHandle> {
        let platform = options.platform.unwrap_or_else(detect_platform);
        let parsed = parse_hotkey(hotkey, platform)?;
        let target = options
            .target
            .take()
            .or_else(document)
            .ok_or(crate::Error::NoTarget)?;

        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.attach(&target);
        debug!(id, hotkey, target = target.label(), "hotkey_registered");
        self.inner.registrations.borrow_mut().insert(
            id,
            Registration {
                hotkey: hotkey.to_string(),
                parsed,
                callback,
                options,
                target,
                awaiting_reset: false,
            },
        );
        Ok(HotkeyRegistrationHandle {
            id,
            hotkey: hotkey.to_string(),
            manager: Rc::downgrade(&self.inner),
        })
    }

    /// Number of live registrations.
    pub fn registration_count(&self) -> usize {
        self.inner.registrations.borrow().len()
    }

    /// Snapshot live registrations as sorted (hotkey, target label) pairs.
    pub fn registrations_snapshot(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .inner
            .registrations
            .borrow()
            .values()
            .map(|r| (r.hotkey.clone(), r.target.label().to_string()))
            .collect();
        pairs.sort();
        pairs
    }

    /// Remove every registration and listener.
    pub fn unregister_all(&self) {
        let ids: Vec<u64> = self.inner.registrations.borrow().keys().copied().collect();
        for id in ids {
            unregister(&self.inner, id);
        }
    }

    fn attach(&self, target: &EventTarget) {
        let mut targets = self.inner.targets.borrow_mut();
        if let Some(binding) = targets.get_mut(&target.id()) {
            binding.count += 1;
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let target_id = target.id();
        let listener = target.add_listener(false, move |event| {
            if let Some(inner) = weak.upgrade() {
                handle_event(&inner, target_id, event);
            }
        });
        trace!(target = target.label(), "manager_listener_attached");
        targets.insert(
            target_id,
            TargetBinding {
                target: target.clone(),
                listener,
                count: 1,
            },
        );
    }
}

impl fmt::Debug for HotkeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyManager")
            .field("registrations", &self.registration_count())
            .finish_non_exhaustive()
    }
}

/// Remove one registration; detaches the target listener when it was the last.
fn unregister(inner: &ManagerInner, id: u64) -> bool {
    let Some(reg) = inner.registrations.borrow_mut().remove(&id) else {
        return false;
    };
    let target_id = reg.target.id();
    let mut targets = inner.targets.borrow_mut();
    if let Some(binding) = targets.get_mut(&target_id) {
        binding.count -= 1;
        if binding.count == 0 {
            binding.target.remove_listener(binding.listener);
            targets.remove(&target_id);
            trace!(target = reg.target.label(), "manager_listener_detached");
        }
    }
    debug!(id, hotkey = %reg.hotkey, "hotkey_unregistered");
    true
}

fn handle_event(inner: &ManagerInner, target_id: u64, event: &KeyboardEvent) {
    let mut to_fire: Vec<(u64, HotkeyCallback, HotkeyCallbackContext)> = Vec::new();
    {
        let mut regs = inner.registrations.borrow_mut();
        for (id, reg) in regs.iter_mut().filter(|(_, r)| r.target.id() == target_id) {
            if reg.awaiting_reset
                && event.kind == EventKind::KeyUp
                && key_matches(&reg.parsed, event)
            {
                reg.awaiting_reset = false;
            }
            let opts = reg.options.resolve();
            let matched = matches_event(&reg.parsed, event);
            let d = policy::classify(&opts, matched, event.kind, reg.awaiting_reset);
            if !d.fire {
                continue;
            }
            if opts.require_reset {
                reg.awaiting_reset = true;
            }
            if d.prevent_default {
                event.prevent_default();
            }
            if d.stop_propagation {
                event.stop_propagation();
            }
            to_fire.push((
                *id,
                reg.callback.clone(),
                HotkeyCallbackContext {
                    hotkey: reg.hotkey.clone(),
                    parsed: reg.parsed.clone(),
                },
            ));
        }
    }
    for (id, callback, ctx) in to_fire {
        // An earlier callback may have unregistered this one.
        if !inner.registrations.borrow().contains_key(&id) {
            continue;
        }
        trace!(id, hotkey = %ctx.hotkey, "hotkey_fired");
        callback(event, &ctx);
    }
}

/// Handle to one registration, returned by [`HotkeyManager::register`].
///
/// The handle is the only way to change or remove the registration. All
/// operations are no-ops once the registration is gone.
pub struct HotkeyRegistrationHandle {
    id: u64,
    hotkey: String,
    manager: Weak<ManagerInner>,
}

impl HotkeyRegistrationHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn hotkey(&self) -> &str {
        &self.hotkey
    }

    /// True while the registration exists.
    pub fn is_active(&self) -> bool {
        self.manager
            .upgrade()
            .is_some_and(|m| m.registrations.borrow().contains_key(&self.id))
    }

    /// Replace the callback.
    pub fn set_callback(&self, callback: HotkeyCallback) {
        self.with_registration(|reg| reg.callback = callback);
    }

    /// Merge `options` into the current options. The target cannot change.
    pub fn set_options(&self, mut options: HotkeyOptions) {
        options.target = None;
        self.with_registration(|reg| {
            reg.options = std::mem::take(&mut reg.options).overlay(options);
        });
    }

    /// Remove the registration.
    pub fn unregister(&self) {
        if let Some(m) = self.manager.upgrade() {
            unregister(&m, self.id);
        }
    }

    fn with_registration(&self, f: impl FnOnce(&mut Registration)) {
        if let Some(m) = self.manager.upgrade()
            && let Some(reg) = m.registrations.borrow_mut().get_mut(&self.id)
        {
            f(reg);
        }
    }
}

impl fmt::Debug for HotkeyRegistrationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyRegistrationHandle")
            .field("id", &self.id)
            .field("hotkey", &self.hotkey)
            .field("active", &self.is_active())
            .finish()
    }
}
