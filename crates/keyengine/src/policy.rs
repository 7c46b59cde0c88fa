use crate::EventKind;

/// Effective options of one registration, with engine defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub enabled: bool,
    pub event_type: EventKind,
    pub prevent_default: bool,
    pub stop_propagation: bool,
    pub require_reset: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub fire: bool,
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

const NOTHING: Decision = Decision {
    fire: false,
    prevent_default: false,
    stop_propagation: false,
};

/// Classify how a registration handles an event that reached its target.
///
/// - If disabled, nothing happens.
/// - If the event did not match, or is of the other kind, nothing happens.
/// - If the registration is waiting for its key to be released, nothing happens.
/// - Otherwise the callback fires; default/propagation handling follow the options.
pub fn classify(opts: &Resolved, matched: bool, kind: EventKind, awaiting_reset: bool) -> Decision {
    if !opts.enabled || !matched || kind != opts.event_type || awaiting_reset {
        return NOTHING;
    }
    Decision {
        fire: true,
        prevent_default: opts.prevent_default,
        stop_propagation: opts.stop_propagation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWN: Resolved = Resolved {
        enabled: true,
        event_type: EventKind::KeyDown,
        prevent_default: true,
        stop_propagation: false,
        require_reset: false,
    };

    #[test]
    fn disabled_ignores_everything() {
        let opts = Resolved {
            enabled: false,
            ..DOWN
        };
        assert_eq!(classify(&opts, true, EventKind::KeyDown, false), NOTHING);
    }

    #[test]
    fn non_match_does_nothing() {
        assert_eq!(classify(&DOWN, false, EventKind::KeyDown, false), NOTHING);
    }

    #[test]
    fn wrong_kind_does_nothing() {
        assert_eq!(classify(&DOWN, true, EventKind::KeyUp, false), NOTHING);
    }

    #[test]
    fn awaiting_reset_suppresses() {
        assert_eq!(classify(&DOWN, true, EventKind::KeyDown, true), NOTHING);
    }

    #[test]
    fn match_fires_and_flags_track_options() {
        let d = classify(&DOWN, true, EventKind::KeyDown, false);
        assert!(d.fire);
        assert!(d.prevent_default);
        assert!(!d.stop_propagation);
    }
}
