//! Link state machine
//!
//! Tracks whether the keyboard is linked to the dongle and switches the host
//! layout on every real change. Repeated reports of the same state do nothing,
//! which matters because the dongle re-sends its status periodically.

use std::fmt;

use dongle_transport::{InboundEvent, LinkSignal};
use tracing::{debug, info, warn};

use crate::layout::LayoutSwitcher;

/// Link between keyboard and dongle as last confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// No confirmation yet (startup, or after the dongle was removed)
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Unknown => f.write_str("unknown"),
            LinkState::Connected => f.write_str("connected"),
            LinkState::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// A state change that was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: LinkState,
    pub to: LinkState,
    /// Layout requested for the new state
    pub layout: String,
}

/// State plus the side effect attached to each transition
pub struct LinkStateMachine {
    state: LinkState,
    primary: String,
    fallback: String,
    switcher: Box<dyn LayoutSwitcher>,
}

impl LinkStateMachine {
    /// `primary` is used while linked, `fallback` while not
    pub fn new(
        primary: impl Into<String>,
        fallback: impl Into<String>,
        switcher: Box<dyn LayoutSwitcher>,
    ) -> Self {
        Self {
            state: LinkState::Unknown,
            primary: primary.into(),
            fallback: fallback.into(),
            switcher,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Apply a classified inbound event
    pub fn handle(&mut self, event: InboundEvent) -> Option<Transition> {
        let InboundEvent::StatusEvent(code) = event else {
            return None;
        };
        match LinkSignal::from_code(code) {
            Some(LinkSignal::Up) => self.enter(LinkState::Connected),
            Some(LinkSignal::Down) => self.enter(LinkState::Disconnected),
            None => {
                debug!("Ignoring link status code 0x{code:02X}");
                None
            }
        }
    }

    /// Settle the state after a liveness probe
    ///
    /// Only acts while the state is still `Unknown`; a status report seen
    /// during the probe takes precedence.
    pub fn resolve_initial(&mut self, pong_seen: bool) -> Option<Transition> {
        if self.state != LinkState::Unknown {
            return None;
        }
        let to = if pong_seen {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        };
        info!(
            "Initial link state: {to} ({})",
            if pong_seen { "ping answered" } else { "no ping reply" }
        );
        self.enter(to)
    }

    /// Forget the state without touching the layout (dongle removed)
    pub fn reset(&mut self) {
        if self.state != LinkState::Unknown {
            debug!("Link state {} -> unknown", self.state);
        }
        self.state = LinkState::Unknown;
    }

    fn enter(&mut self, to: LinkState) -> Option<Transition> {
        if self.state == to {
            return None;
        }
        let from = self.state;
        self.state = to;

        let layout = match to {
            LinkState::Connected => self.primary.clone(),
            _ => self.fallback.clone(),
        };
        info!("Keyboard {to} (was {from}), switching layout to {layout}");

        // The state stands even if the OS refuses the layout
        if let Err(e) = self.switcher.switch_to(&layout) {
            warn!("{e}");
        }

        Some(Transition { from, to, layout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WatcherError;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl LayoutSwitcher for Recorder {
        fn switch_to(&mut self, layout: &str) -> Result<(), WatcherError> {
            self.calls.lock().unwrap().push(layout.to_string());
            if self.fail {
                return Err(WatcherError::LayoutSwitch {
                    layout: layout.to_string(),
                    reason: "refused".to_string(),
                });
            }
            Ok(())
        }
    }

    fn machine() -> (LinkStateMachine, Arc<Mutex<Vec<String>>>) {
        let recorder = Recorder::default();
        let calls = recorder.calls.clone();
        (
            LinkStateMachine::new("0409", "0816", Box::new(recorder)),
            calls,
        )
    }

    #[test]
    fn test_link_up_is_idempotent() {
        let (mut sm, calls) = machine();
        assert!(sm.handle(InboundEvent::StatusEvent(0x01)).is_some());
        assert!(sm.handle(InboundEvent::StatusEvent(0x01)).is_none());
        assert!(sm.handle(InboundEvent::StatusEvent(0x01)).is_none());
        assert_eq!(sm.state(), LinkState::Connected);
        assert_eq!(*calls.lock().unwrap(), vec!["0409"]);
    }

    #[test]
    fn test_up_down_up() {
        let (mut sm, calls) = machine();
        sm.handle(InboundEvent::StatusEvent(0x01));
        let t = sm.handle(InboundEvent::StatusEvent(0x02)).unwrap();
        assert_eq!(t.from, LinkState::Connected);
        assert_eq!(t.to, LinkState::Disconnected);
        assert_eq!(t.layout, "0816");
        sm.handle(InboundEvent::StatusEvent(0x02));
        sm.handle(InboundEvent::StatusEvent(0x01));
        assert_eq!(*calls.lock().unwrap(), vec!["0409", "0816", "0409"]);
    }

    #[test]
    fn test_other_events_ignored() {
        let (mut sm, calls) = machine();
        assert!(sm.handle(InboundEvent::StatusEvent(0x00)).is_none());
        assert!(sm.handle(InboundEvent::StatusEvent(0x7F)).is_none());
        assert!(sm.handle(InboundEvent::LivenessReply).is_none());
        assert!(sm.handle(InboundEvent::Ignore).is_none());
        assert_eq!(sm.state(), LinkState::Unknown);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_initial() {
        let (mut sm, calls) = machine();
        let t = sm.resolve_initial(true).unwrap();
        assert_eq!(t.to, LinkState::Connected);

        let (mut sm2, calls2) = machine();
        sm2.resolve_initial(false);
        assert_eq!(sm2.state(), LinkState::Disconnected);

        assert_eq!(*calls.lock().unwrap(), vec!["0409"]);
        assert_eq!(*calls2.lock().unwrap(), vec!["0816"]);
    }

    #[test]
    fn test_resolve_initial_only_from_unknown() {
        let (mut sm, calls) = machine();
        sm.handle(InboundEvent::StatusEvent(0x02));
        assert!(sm.resolve_initial(true).is_none());
        assert_eq!(sm.state(), LinkState::Disconnected);
        assert_eq!(*calls.lock().unwrap(), vec!["0816"]);
    }

    #[test]
    fn test_reset_has_no_side_effect() {
        let (mut sm, calls) = machine();
        sm.handle(InboundEvent::StatusEvent(0x01));
        sm.reset();
        assert_eq!(sm.state(), LinkState::Unknown);
        assert_eq!(calls.lock().unwrap().len(), 1);

        // Same state as before removal still fires after reset
        sm.handle(InboundEvent::StatusEvent(0x01));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_switch_keeps_state() {
        let recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let calls = recorder.calls.clone();
        let mut sm = LinkStateMachine::new("0409", "0816", Box::new(recorder));
        assert!(sm.handle(InboundEvent::StatusEvent(0x01)).is_some());
        assert_eq!(sm.state(), LinkState::Connected);
        // No retry on the duplicate
        assert!(sm.handle(InboundEvent::StatusEvent(0x01)).is_none());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }
}
