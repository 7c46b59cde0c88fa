use signals::{provide_context, use_context, with_child_scope};

use crate::HotkeysDefaults;

/// Value provided by [`hotkeys_provider`].
#[derive(Debug, Clone, Default)]
pub struct HotkeysContext {
    pub default_options: HotkeysDefaults,
}

/// Run `children` in a new scope whose bindings default to `defaults`.
///
/// Lookups resolve to the nearest provider only: an inner provider hides the
/// outer one entirely, it does not merge with it.
pub fn hotkeys_provider<R>(defaults: HotkeysDefaults, children: impl FnOnce() -> R) -> R {
    let (out, _scope) = with_child_scope(|| {
        provide_context(HotkeysContext {
            default_options: defaults,
        });
        children()
    });
    out
}

/// The nearest provider's context, if any.
pub fn use_hotkeys_context() -> Option<HotkeysContext> {
    use_context::<HotkeysContext>()
}

/// The nearest provider's defaults, or empty defaults without a provider.
pub fn use_default_hotkeys_options() -> HotkeysDefaults {
    use_hotkeys_context()
        .map(|c| c.default_options)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use keyengine::HotkeyOptions;
    use signals::create_root;

    use super::*;
    use crate::SequenceBindOptions;

    fn with_timeout(ms: u64) -> HotkeysDefaults {
        HotkeysDefaults {
            sequence: SequenceBindOptions {
                timeout_ms: Some(ms),
                ..SequenceBindOptions::default()
            },
            ..HotkeysDefaults::default()
        }
    }

    #[test]
    fn no_provider_means_empty_defaults() {
        create_root(|root| {
            assert!(use_hotkeys_context().is_none());
            let d = use_default_hotkeys_options();
            assert_eq!(d.hotkey, HotkeyOptions::default());
            assert_eq!(d.sequence, SequenceBindOptions::default());
            root.dispose();
        });
    }

    #[test]
    fn nested_providers_shadow_without_merging() {
        create_root(|root| {
            let outer = HotkeysDefaults {
                hotkey: HotkeyOptions {
                    prevent_default: Some(false),
                    ..HotkeyOptions::default()
                },
                ..with_timeout(100)
            };
            let (seen_outer, seen_inner) = hotkeys_provider(outer, || {
                let o = use_default_hotkeys_options();
                let i = hotkeys_provider(with_timeout(200), use_default_hotkeys_options);
                (o, i)
            });
            assert_eq!(seen_outer.sequence.timeout_ms, Some(100));
            assert_eq!(seen_outer.hotkey.prevent_default, Some(false));
            assert_eq!(seen_inner.sequence.timeout_ms, Some(200));
            assert_eq!(seen_inner.hotkey.prevent_default, None);
            assert!(use_hotkeys_context().is_none());
            root.dispose();
        });
    }
}
