//! Two-phase confirm controls
//!
//! A first press arms the control; a second press within the disarm
//! window performs the confirmed action. The disarm timer is a stored
//! deadline rather than a spawned task: pressing while armed replaces
//! the deadline, and the owning event loop wakes at the earliest
//! deadline to apply the silent disarm.

use super::Hooks;
use crate::spec::{ConfirmButtonSpec, ConfirmSwitchSpec};
use serde_json::json;
use std::time::{Duration, Instant};

/// Window during which a second press confirms
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmState {
    Idle,
    Armed { deadline: Instant },
}

impl ConfirmState {
    fn is_armed_at(self, now: Instant) -> bool {
        matches!(self, ConfirmState::Armed { deadline } if now < deadline)
    }
}

/// Momentary action requiring confirmation; no persisted value
///
/// Emits `false` when armed and `true` when confirmed.
#[derive(Debug)]
pub struct ConfirmButton {
    pub spec: ConfirmButtonSpec,
    state: ConfirmState,
    pub hooks: Hooks,
}

impl ConfirmButton {
    pub fn new(spec: ConfirmButtonSpec) -> Self {
        Self {
            spec,
            state: ConfirmState::Idle,
            hooks: Hooks::default(),
        }
    }

    pub fn awaiting_confirmation(&self) -> bool {
        self.state.is_armed_at(Instant::now())
    }

    pub fn press(&mut self) {
        self.press_at(Instant::now());
    }

    /// Press with an explicit clock, for deterministic timing
    pub fn press_at(&mut self, now: Instant) {
        self.hooks.touch();
        if self.state.is_armed_at(now) {
            self.state = ConfirmState::Idle;
            self.hooks.update(&json!(true));
        } else {
            // an expired armed state counts as idle: silent disarm already due
            self.state = ConfirmState::Armed {
                deadline: now + CONFIRM_TIMEOUT,
            };
            self.hooks.update(&json!(false));
        }
    }

    /// Force idle unconditionally, with no emission
    pub fn cancel(&mut self) {
        self.state = ConfirmState::Idle;
    }

    /// Deadline at which the armed state silently disarms, if armed
    pub fn disarm_deadline(&self) -> Option<Instant> {
        match self.state {
            ConfirmState::Armed { deadline } => Some(deadline),
            ConfirmState::Idle => None,
        }
    }

    /// Disarm silently if the deadline has passed; idempotent
    pub fn expire_at(&mut self, now: Instant) {
        if let ConfirmState::Armed { deadline } = self.state {
            if now >= deadline {
                self.state = ConfirmState::Idle;
            }
        }
    }
}

/// Toggle requiring confirmation
///
/// Arming emits nothing; confirmation toggles the boolean and emits
/// the new value.
#[derive(Debug)]
pub struct ConfirmSwitch {
    pub spec: ConfirmSwitchSpec,
    on: bool,
    state: ConfirmState,
    pub hooks: Hooks,
}

impl ConfirmSwitch {
    pub fn new(spec: ConfirmSwitchSpec) -> Self {
        let on = spec.initially_on;
        Self {
            spec,
            on,
            state: ConfirmState::Idle,
            hooks: Hooks::default(),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn awaiting_confirmation(&self) -> bool {
        self.state.is_armed_at(Instant::now())
    }

    pub fn press(&mut self) {
        self.press_at(Instant::now());
    }

    pub fn press_at(&mut self, now: Instant) {
        self.hooks.touch();
        if self.state.is_armed_at(now) {
            self.state = ConfirmState::Idle;
            self.on = !self.on;
            self.hooks.update(&json!(self.on));
        } else {
            self.state = ConfirmState::Armed {
                deadline: now + CONFIRM_TIMEOUT,
            };
        }
    }

    pub fn cancel(&mut self) {
        self.state = ConfirmState::Idle;
    }

    pub fn disarm_deadline(&self) -> Option<Instant> {
        match self.state {
            ConfirmState::Armed { deadline } => Some(deadline),
            ConfirmState::Idle => None,
        }
    }

    pub fn expire_at(&mut self, now: Instant) {
        if let ConfirmState::Armed { deadline } = self.state {
            if now >= deadline {
                self.state = ConfirmState::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecBase;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    fn base(name: &str) -> SpecBase {
        SpecBase {
            name: name.to_string(),
            x: 0.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
            color: "#888888".to_string(),
        }
    }

    fn button() -> (ConfirmButton, Arc<Mutex<Vec<Value>>>) {
        let mut b = ConfirmButton::new(ConfirmButtonSpec { base: base("reset") });
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        b.hooks.set_on_update(move |p| sink.lock().unwrap().push(p.clone()));
        (b, log)
    }

    #[test]
    fn test_press_press_confirms_once() {
        let (mut b, log) = button();
        let t0 = Instant::now();

        b.press_at(t0);
        assert!(b.disarm_deadline().is_some());
        b.press_at(t0 + Duration::from_secs(2));
        assert_eq!(b.disarm_deadline(), None);

        assert_eq!(*log.lock().unwrap(), vec![json!(false), json!(true)]);
    }

    #[test]
    fn test_expired_window_rearms_instead_of_confirming() {
        let (mut b, log) = button();
        let t0 = Instant::now();

        b.press_at(t0);
        // second press after the window: arms again, never confirms
        b.press_at(t0 + CONFIRM_TIMEOUT + Duration::from_millis(1));
        assert!(b.disarm_deadline().is_some());

        assert_eq!(*log.lock().unwrap(), vec![json!(false), json!(false)]);
    }

    #[test]
    fn test_rearm_replaces_deadline_rather_than_stacking() {
        let (mut b, _log) = button();
        let t0 = Instant::now();

        b.press_at(t0);
        b.press_at(t0 + Duration::from_secs(2)); // confirm, back to idle
        b.press_at(t0 + Duration::from_secs(3)); // re-arm

        // the old t0 + 4s deadline is gone; only t0 + 7s remains
        assert_eq!(b.disarm_deadline(), Some(t0 + Duration::from_secs(7)));
        b.expire_at(t0 + Duration::from_secs(5));
        assert!(b.disarm_deadline().is_some());
    }

    #[test]
    fn test_timer_fire_is_silent_and_idempotent() {
        let (mut b, log) = button();
        let t0 = Instant::now();

        b.press_at(t0);
        let fire = t0 + CONFIRM_TIMEOUT;
        b.expire_at(fire);
        assert_eq!(b.disarm_deadline(), None);
        b.expire_at(fire); // already idle: no-op
        assert_eq!(b.disarm_deadline(), None);

        assert_eq!(*log.lock().unwrap(), vec![json!(false)]);
    }

    #[test]
    fn test_cancel_forces_idle() {
        let (mut b, log) = button();
        b.press_at(Instant::now());
        b.cancel();
        assert_eq!(b.disarm_deadline(), None);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    fn switch(initially_on: bool) -> (ConfirmSwitch, Arc<Mutex<Vec<Value>>>) {
        let mut s = ConfirmSwitch::new(ConfirmSwitchSpec {
            base: base("live"),
            initially_on,
        });
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        s.hooks.set_on_update(move |p| sink.lock().unwrap().push(p.clone()));
        (s, log)
    }

    #[test]
    fn test_switch_arm_is_silent_and_confirm_toggles() {
        let (mut s, log) = switch(false);
        let t0 = Instant::now();

        s.press_at(t0);
        assert!(log.lock().unwrap().is_empty());
        assert!(!s.is_on());

        s.press_at(t0 + Duration::from_secs(1));
        assert!(s.is_on());
        assert_eq!(*log.lock().unwrap(), vec![json!(true)]);
    }

    #[test]
    fn test_switch_silent_disarm_keeps_value() {
        let (mut s, log) = switch(true);
        let t0 = Instant::now();

        s.press_at(t0);
        s.expire_at(t0 + CONFIRM_TIMEOUT);
        assert!(s.is_on());
        assert!(log.lock().unwrap().is_empty());
    }
}
