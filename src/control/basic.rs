//! Simple control variants: Fader, Pad, Switch, Selector, Label, Cake, Letterbox

use super::Hooks;
use crate::signal::SourceId;
use crate::spec::{CakeSpec, FaderSpec, LabelSpec, LetterboxSpec, PadSpec, SelectorSpec, SwitchSpec};
use serde_json::{json, Value};
use tracing::warn;

/// Continuous value in [min, max]
#[derive(Debug)]
pub struct Fader {
    pub spec: FaderSpec,
    value: f64,
    pub hooks: Hooks,
    pub(crate) sources: Vec<SourceId>,
}

impl Fader {
    pub fn new(spec: FaderSpec) -> Self {
        let value = clamp(spec.initial_value, spec.min, spec.max);
        Self {
            spec,
            value,
            hooks: Hooks::default(),
            sources: Vec::new(),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the raw value, clamped into [min, max]
    pub fn set_value(&mut self, value: f64) {
        self.hooks.touch();
        self.value = clamp(value, self.spec.min, self.spec.max);
        self.hooks.update(&json!(self.value));
    }

    /// Map n in [0, 1] linearly onto [min, max]
    pub fn set_norm_value(&mut self, norm: f64) {
        let mapped = norm * (self.spec.max - self.spec.min) + self.spec.min;
        self.set_value(mapped);
    }

    pub fn norm_value(&self) -> f64 {
        (self.value - self.spec.min) / (self.spec.max - self.spec.min)
    }

    /// Restore from snapshot without firing hooks
    pub(crate) fn set_state_value(&mut self, value: f64) {
        self.value = clamp(value, self.spec.min, self.spec.max);
    }
}

/// Pressed/released pad with velocity
#[derive(Debug)]
pub struct Pad {
    pub spec: PadSpec,
    pressed: bool,
    pub hooks: Hooks,
    pub(crate) sources: Vec<SourceId>,
}

impl Pad {
    pub fn new(spec: PadSpec) -> Self {
        Self {
            spec,
            pressed: false,
            hooks: Hooks::default(),
            sources: Vec::new(),
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn press(&mut self, velocity: f64) {
        self.hooks.touch();
        self.pressed = true;
        self.hooks.update(&json!({ "press": true, "velocity": velocity }));
    }

    pub fn release(&mut self) {
        self.pressed = false;
        self.hooks.update(&json!({ "press": false }));
    }
}

/// On/off toggle
#[derive(Debug)]
pub struct Switch {
    pub spec: SwitchSpec,
    on: bool,
    pub hooks: Hooks,
}

impl Switch {
    pub fn new(spec: SwitchSpec) -> Self {
        let on = spec.initially_on;
        Self {
            spec,
            on,
            hooks: Hooks::default(),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn toggle(&mut self) {
        self.hooks.touch();
        self.on = !self.on;
        self.hooks.update(&json!(self.on));
    }

    pub(crate) fn set_state_on(&mut self, on: bool) {
        self.on = on;
    }
}

/// Index into a fixed option list, wrapping on increment/decrement
#[derive(Debug)]
pub struct Selector {
    pub spec: SelectorSpec,
    index: usize,
    pub hooks: Hooks,
}

impl Selector {
    pub fn new(spec: SelectorSpec) -> Self {
        let index = spec.initial_index.min(spec.options.len().saturating_sub(1));
        Self {
            spec,
            index,
            hooks: Hooks::default(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn select(&mut self, index: usize) {
        if index >= self.spec.options.len() {
            warn!(
                "selector '{}': index {} out of range ({} options)",
                self.spec.base.name,
                index,
                self.spec.options.len()
            );
            return;
        }
        self.hooks.touch();
        self.index = index;
        self.hooks.update(&json!(self.index as u64));
    }

    pub fn increment(&mut self) {
        if self.spec.options.is_empty() {
            return;
        }
        let next = (self.index + 1) % self.spec.options.len();
        self.select(next);
    }

    pub fn decrement(&mut self) {
        let count = self.spec.options.len();
        if count == 0 {
            return;
        }
        let prev = (self.index + count - 1) % count;
        self.select(prev);
    }

    pub(crate) fn set_state_index(&mut self, index: usize) {
        if index < self.spec.options.len() {
            self.index = index;
        }
    }
}

/// Static text, no runtime state
#[derive(Debug)]
pub struct Label {
    pub spec: LabelSpec,
    pub hooks: Hooks,
}

impl Label {
    pub fn new(spec: LabelSpec) -> Self {
        Self {
            spec,
            hooks: Hooks::default(),
        }
    }
}

/// Display-only meter driven by external updates, never by user gesture
#[derive(Debug)]
pub struct Cake {
    pub spec: CakeSpec,
    value: f64,
    pub hooks: Hooks,
}

impl Cake {
    pub fn new(spec: CakeSpec) -> Self {
        let value = spec.initial_value;
        Self {
            spec,
            value,
            hooks: Hooks::default(),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Accepts a numeric payload; anything else is ignored
    pub fn display_update(&mut self, payload: &Value) {
        if let Some(v) = payload.as_f64() {
            self.value = v;
        }
    }
}

/// Stateless relay: forwards any message verbatim through `on_update`
#[derive(Debug)]
pub struct Letterbox {
    pub spec: LetterboxSpec,
    pub hooks: Hooks,
}

impl Letterbox {
    pub fn new(spec: LetterboxSpec) -> Self {
        Self {
            spec,
            hooks: Hooks::default(),
        }
    }

    pub fn send(&mut self, message: &Value) {
        self.hooks.update(message);
    }
}

/// Clamp that tolerates inverted bounds instead of panicking
fn clamp(v: f64, min: f64, max: f64) -> f64 {
    v.max(min).min(max)
}
