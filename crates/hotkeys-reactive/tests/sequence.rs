//! Integration tests for `bind_sequence`.

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use hotkeys_reactive::{
        HotkeyCallbackContext, HotkeysDefaults, KeyboardEvent, SequenceBindOptions,
        bind_sequence, document,
        engine::{Error, get_sequence_manager},
        hotkeys_provider,
        signals::{create_root, create_signal},
    };

    fn counter() -> (
        Rc<Cell<u32>>,
        impl Fn(&KeyboardEvent, &HotkeyCallbackContext) + 'static,
    ) {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        (hits, move |_: &KeyboardEvent, _: &HotkeyCallbackContext| {
            h.set(h.get() + 1)
        })
    }

    fn press(key: &str, millis: u64) {
        document()
            .expect("document")
            .dispatch(&KeyboardEvent::key_down(key).at(millis));
    }

    #[test]
    fn full_sequence_fires_once() {
        let (hits, cb) = counter();
        create_root(|root| {
            bind_sequence(["G", "G"], cb, SequenceBindOptions::default()).expect("bind");
            press("g", 10);
            assert_eq!(hits.get(), 0);
            press("g", 20);
            assert_eq!(hits.get(), 1);
            press("g", 30);
            assert_eq!(hits.get(), 1);
            root.dispose();
        });
    }

    #[test]
    fn slow_typing_restarts_progress() {
        let (hits, cb) = counter();
        create_root(|root| {
            bind_sequence(
                ["D", "I", "W"],
                cb,
                SequenceBindOptions {
                    timeout_ms: Some(100),
                    ..SequenceBindOptions::default()
                },
            )
            .expect("bind");
            press("d", 1_000);
            press("i", 1_050);
            press("w", 1_500);
            assert_eq!(hits.get(), 0);
            press("d", 2_000);
            press("i", 2_050);
            press("w", 2_100);
            assert_eq!(hits.get(), 1);
            root.dispose();
        });
    }

    #[test]
    fn disabled_or_empty_registers_nothing() {
        let before = get_sequence_manager().registration_count();
        let (hits, cb) = counter();
        let cb = Rc::new(cb);
        create_root(|root| {
            let c = cb.clone();
            bind_sequence(
                ["G", "G"],
                move |e, ctx| c(e, ctx),
                SequenceBindOptions {
                    enabled: Some(false),
                    ..SequenceBindOptions::default()
                },
            )
            .expect("bind");
            let c = cb.clone();
            bind_sequence(
                Vec::<String>::new(),
                move |e, ctx| c(e, ctx),
                SequenceBindOptions::default(),
            )
            .expect("bind");
            assert_eq!(get_sequence_manager().registration_count(), before);
            press("g", 10);
            press("g", 20);
            assert_eq!(hits.get(), 0);
            root.dispose();
        });
    }

    #[test]
    fn disposal_unregisters() {
        let before = get_sequence_manager().registration_count();
        let (hits, cb) = counter();
        create_root(|root| {
            bind_sequence(["G", "G"], cb, SequenceBindOptions::default()).expect("bind");
            assert_eq!(get_sequence_manager().registration_count(), before + 1);
            root.dispose();
        });
        assert_eq!(get_sequence_manager().registration_count(), before);
        press("g", 10);
        press("g", 20);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn reactive_steps_replace_registration() {
        let before = get_sequence_manager().registration_count();
        let (hits, cb) = counter();
        create_root(|root| {
            let (steps, set_steps) = create_signal(vec!["G".to_string(), "G".to_string()]);
            bind_sequence(steps, cb, SequenceBindOptions::default()).expect("bind");
            press("g", 10);
            set_steps.set(vec!["Z".to_string(), "Z".to_string()]);
            assert_eq!(get_sequence_manager().registration_count(), before + 1);
            press("g", 20);
            assert_eq!(hits.get(), 0);
            press("z", 30);
            press("z", 40);
            assert_eq!(hits.get(), 1);
            root.dispose();
        });
        assert_eq!(get_sequence_manager().registration_count(), before);
    }

    #[test]
    fn provider_timeout_applies() {
        let (hits, cb) = counter();
        create_root(|root| {
            let defaults = HotkeysDefaults::from_ron("(sequence: (timeout_ms: Some(50)))")
                .expect("defaults");
            hotkeys_provider(defaults, || {
                bind_sequence(["G", "G"], cb, SequenceBindOptions::default()).expect("bind");
            });
            press("g", 100);
            press("g", 400);
            assert_eq!(hits.get(), 0);
            press("g", 420);
            assert_eq!(hits.get(), 1);
            root.dispose();
        });
    }

    #[test]
    fn invalid_step_error_is_returned() {
        create_root(|root| {
            let err = bind_sequence(["G", "Hyper+G"], |_, _| {}, SequenceBindOptions::default())
                .expect_err("bad step");
            assert!(matches!(err, Error::SequenceStep { index: 1, .. }));
            root.dispose();
        });
    }
}
