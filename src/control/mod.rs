//! Control model - the closed set of virtual control variants
//!
//! Each variant owns its spec (read-only), its runtime state, and two
//! callback slots (`on_update`, `on_touch`) through which the outside
//! world observes mutations. Dispatch is by pattern matching on the
//! `Control` enum rather than a trait object hierarchy.

mod basic;
mod composite;
mod confirm;
mod preset;

pub use basic::{Cake, Fader, Label, Letterbox, Pad, Selector, Switch};
pub use composite::{Group, TabbedPages};
pub use confirm::{ConfirmButton, ConfirmSwitch, CONFIRM_TIMEOUT};
pub use preset::PresetButton;

use crate::signal::SourceId;
use crate::spec::{ControlSpec, SpecBase};
use serde_json::Value;
use std::fmt;
use std::time::Instant;
use tracing::warn;

/// What kind of hardware input a control can be driven by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Accepts continuous 7-bit values (CC sources)
    Continuous,
    /// Accepts press/release events (key sources)
    Press,
}

type UpdateFn = Box<dyn FnMut(&Value) + Send>;
type TouchFn = Box<dyn FnMut() + Send>;

/// The two externally assignable callback slots every control carries
///
/// Unset slots are no-ops. Both callbacks are invoked synchronously
/// from the mutator that triggered them.
#[derive(Default)]
pub struct Hooks {
    on_update: Option<UpdateFn>,
    on_touch: Option<TouchFn>,
}

impl Hooks {
    pub fn set_on_update<F>(&mut self, f: F)
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.on_update = Some(Box::new(f));
    }

    pub fn set_on_touch<F>(&mut self, f: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.on_touch = Some(Box::new(f));
    }

    pub(crate) fn update(&mut self, payload: &Value) {
        if let Some(f) = self.on_update.as_mut() {
            f(payload);
        }
    }

    pub(crate) fn touch(&mut self) {
        if let Some(f) = self.on_touch.as_mut() {
            f();
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_update", &self.on_update.is_some())
            .field("on_touch", &self.on_touch.is_some())
            .finish()
    }
}

/// A virtual control: one of the closed set of variants
#[derive(Debug)]
pub enum Control {
    Fader(Fader),
    Pad(Pad),
    Switch(Switch),
    Selector(Selector),
    ConfirmButton(ConfirmButton),
    ConfirmSwitch(ConfirmSwitch),
    Label(Label),
    Cake(Cake),
    Group(Group),
    TabbedPages(TabbedPages),
    PresetButton(PresetButton),
    Letterbox(Letterbox),
}

impl Control {
    /// Build a control from its externally supplied spec
    pub fn from_spec(spec: ControlSpec) -> Self {
        match spec {
            ControlSpec::Fader(s) => Control::Fader(Fader::new(s)),
            ControlSpec::Pad(s) => Control::Pad(Pad::new(s)),
            ControlSpec::Switch(s) => Control::Switch(Switch::new(s)),
            ControlSpec::Selector(s) => Control::Selector(Selector::new(s)),
            ControlSpec::ConfirmButton(s) => Control::ConfirmButton(ConfirmButton::new(s)),
            ControlSpec::ConfirmSwitch(s) => Control::ConfirmSwitch(ConfirmSwitch::new(s)),
            ControlSpec::Label(s) => Control::Label(Label::new(s)),
            ControlSpec::Cake(s) => Control::Cake(Cake::new(s)),
            ControlSpec::Group(s) => Control::Group(Group::new(s)),
            ControlSpec::TabbedPages(s) => Control::TabbedPages(TabbedPages::new(s)),
            ControlSpec::PresetButton(s) => Control::PresetButton(PresetButton::new(s)),
            ControlSpec::Letterbox(s) => Control::Letterbox(Letterbox::new(s)),
        }
    }

    /// Shared spec fields (name, position, display metadata)
    pub fn base(&self) -> &SpecBase {
        match self {
            Control::Fader(c) => &c.spec.base,
            Control::Pad(c) => &c.spec.base,
            Control::Switch(c) => &c.spec.base,
            Control::Selector(c) => &c.spec.base,
            Control::ConfirmButton(c) => &c.spec.base,
            Control::ConfirmSwitch(c) => &c.spec.base,
            Control::Label(c) => &c.spec.base,
            Control::Cake(c) => &c.spec.base,
            Control::Group(c) => &c.base,
            Control::TabbedPages(c) => &c.base,
            Control::PresetButton(c) => &c.spec.base,
            Control::Letterbox(c) => &c.spec.base,
        }
    }

    /// Stable focus-traversal index derived from the spec position
    pub fn tab_index(&self) -> i32 {
        self.base().tab_index()
    }

    /// The control's callback slots
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        match self {
            Control::Fader(c) => &mut c.hooks,
            Control::Pad(c) => &mut c.hooks,
            Control::Switch(c) => &mut c.hooks,
            Control::Selector(c) => &mut c.hooks,
            Control::ConfirmButton(c) => &mut c.hooks,
            Control::ConfirmSwitch(c) => &mut c.hooks,
            Control::Label(c) => &mut c.hooks,
            Control::Cake(c) => &mut c.hooks,
            Control::Group(c) => &mut c.hooks,
            Control::TabbedPages(c) => &mut c.hooks,
            Control::PresetButton(c) => &mut c.hooks,
            Control::Letterbox(c) => &mut c.hooks,
        }
    }

    /// Which hardware input kind this control accepts, if any
    ///
    /// Replaces runtime type checks in the registry's compatibility
    /// matrix: cc sources need `Continuous`, key sources need `Press`.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Control::Fader(_) => Some(Capability::Continuous),
            Control::Pad(_) => Some(Capability::Press),
            _ => None,
        }
    }

    /// Source ids currently bound to this control
    ///
    /// Only mappable controls carry back-references; everything else
    /// reports an empty list.
    pub fn bound_sources(&self) -> &[SourceId] {
        match self {
            Control::Fader(c) => &c.sources,
            Control::Pad(c) => &c.sources,
            _ => &[],
        }
    }

    pub(crate) fn add_source(&mut self, id: SourceId) {
        match self {
            Control::Fader(c) => c.sources.push(id),
            Control::Pad(c) => c.sources.push(id),
            _ => warn!("attempt to bind source {} to unmappable control", id),
        }
    }

    pub(crate) fn remove_source(&mut self, id: &SourceId) {
        match self {
            Control::Fader(c) => c.sources.retain(|s| s != id),
            Control::Pad(c) => c.sources.retain(|s| s != id),
            _ => {}
        }
    }

    /// Detach all bound sources and return them (unmap-by-control)
    pub(crate) fn take_sources(&mut self) -> Vec<SourceId> {
        match self {
            Control::Fader(c) => std::mem::take(&mut c.sources),
            Control::Pad(c) => std::mem::take(&mut c.sources),
            _ => Vec::new(),
        }
    }

    /// Snapshot state for persistence/undo
    ///
    /// Fader → number, Switch → boolean, Selector → index; controls
    /// without meaningful state report `None`.
    pub fn get_state(&self) -> Option<Value> {
        match self {
            Control::Fader(c) => Some(Value::from(c.value())),
            Control::Switch(c) => Some(Value::from(c.is_on())),
            Control::Selector(c) => Some(Value::from(c.index() as u64)),
            _ => None,
        }
    }

    /// Restore state from a snapshot value, silently, without firing hooks
    pub fn set_state(&mut self, state: &Value) {
        match self {
            Control::Fader(c) => {
                if let Some(v) = state.as_f64() {
                    c.set_state_value(v);
                }
            }
            Control::Switch(c) => {
                if let Some(on) = state.as_bool() {
                    c.set_state_on(on);
                }
            }
            Control::Selector(c) => {
                if let Some(i) = state.as_u64() {
                    c.set_state_index(i as usize);
                }
            }
            _ => {}
        }
    }

    /// Externally driven mutation, routed by a structured path
    ///
    /// The empty path targets this control itself; composites forward
    /// to children by key segments. Callers supply full key paths.
    pub fn update(&mut self, payload: &Value, path: &[String]) {
        match self {
            Control::Group(g) => g.update(payload, path),
            Control::TabbedPages(t) => t.update(payload, path),
            Control::Cake(c) if path.is_empty() => c.display_update(payload),
            Control::PresetButton(p) if path.is_empty() => p.update(payload),
            _ => {
                // updates for non-composite controls default to no-op
            }
        }
    }

    /// Descend into composites to find a nested control by path
    ///
    /// The empty path resolves to this control. TabbedPages consumes
    /// two segments (page, control).
    pub fn find_mut(&mut self, path: &[String]) -> Option<&mut Control> {
        if path.is_empty() {
            return Some(self);
        }
        match self {
            Control::Group(g) => g.child_mut(&path[0])?.find_mut(&path[1..]),
            Control::TabbedPages(t) => {
                if path.len() < 2 {
                    return None;
                }
                t.page_control_mut(&path[0], &path[1])?.find_mut(&path[2..])
            }
            _ => None,
        }
    }

    /// Earliest pending confirm-disarm deadline, including nested controls
    pub fn next_disarm_deadline(&self) -> Option<Instant> {
        match self {
            Control::ConfirmButton(c) => c.disarm_deadline(),
            Control::ConfirmSwitch(c) => c.disarm_deadline(),
            Control::Group(g) => g.controls().filter_map(|c| c.next_disarm_deadline()).min(),
            Control::TabbedPages(t) => t.controls().filter_map(|c| c.next_disarm_deadline()).min(),
            _ => None,
        }
    }

    /// Silently disarm any confirm control whose deadline has passed
    pub fn expire_disarms(&mut self, now: Instant) {
        match self {
            Control::ConfirmButton(c) => c.expire_at(now),
            Control::ConfirmSwitch(c) => c.expire_at(now),
            Control::Group(g) => {
                for c in g.controls_mut() {
                    c.expire_disarms(now);
                }
            }
            Control::TabbedPages(t) => {
                for c in t.controls_mut() {
                    c.expire_disarms(now);
                }
            }
            _ => {}
        }
    }
}
