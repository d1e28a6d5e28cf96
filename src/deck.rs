//! Deck - the owned table of top-level controls
//!
//! The deck is the single owner of all control state. Everything else
//! (mapping registry, CLI, transport loop) addresses controls through
//! it by structured path, keeping mutation confined to the owning
//! event-loop thread.

use crate::control::Control;
use crate::spec::ControlSpec;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Instant;
use tracing::warn;

/// Keyed table of top-level controls
#[derive(Debug, Default)]
pub struct Deck {
    controls: HashMap<String, Control>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a deck from externally supplied, already-validated specs
    pub fn from_specs(specs: HashMap<String, ControlSpec>) -> Self {
        let controls = specs
            .into_iter()
            .map(|(id, spec)| (id, Control::from_spec(spec)))
            .collect();
        Self { controls }
    }

    pub fn insert(&mut self, id: impl Into<String>, control: Control) {
        self.controls.insert(id.into(), control);
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.controls.keys().map(String::as_str)
    }

    /// Resolve a control by full key path, descending into composites
    pub fn control_mut(&mut self, path: &[String]) -> Option<&mut Control> {
        let (head, rest) = path.split_first()?;
        self.controls.get_mut(head)?.find_mut(rest)
    }

    pub fn control(&self, id: &str) -> Option<&Control> {
        self.controls.get(id)
    }

    /// Route an externally driven update by full key path
    pub fn update(&mut self, payload: &Value, path: &[String]) {
        let Some((head, rest)) = path.split_first() else {
            return;
        };
        match self.controls.get_mut(head) {
            Some(control) => control.update(payload, rest),
            None => warn!("deck: no control '{}'", head),
        }
    }

    /// Top-level control ids in focus-traversal order
    pub fn tab_order(&self) -> Vec<&str> {
        let mut ids: Vec<(&str, i32)> = self
            .controls
            .iter()
            .map(|(id, c)| (id.as_str(), c.tab_index()))
            .collect();
        ids.sort_by_key(|&(id, index)| (index, id));
        ids.into_iter().map(|(id, _)| id).collect()
    }

    /// Snapshot the state of every stateful top-level control
    ///
    /// The result is the flat keyed shape any persistence/undo layer
    /// relies on; stateless controls are omitted.
    pub fn snapshot(&self) -> Value {
        let mut doc = Map::new();
        for (id, control) in &self.controls {
            if let Some(state) = control.get_state() {
                doc.insert(id.clone(), state);
            }
        }
        Value::Object(doc)
    }

    /// Restore control state from a snapshot, silently
    ///
    /// Ids with no matching control are skipped with a diagnostic.
    pub fn restore(&mut self, snapshot: &Value) {
        let Some(entries) = snapshot.as_object() else {
            warn!("deck: snapshot is not a keyed object, ignoring");
            return;
        };
        for (id, state) in entries {
            match self.controls.get_mut(id) {
                Some(control) => control.set_state(state),
                None => warn!("deck: snapshot id '{}' has no control", id),
            }
        }
    }

    /// Earliest pending confirm-disarm deadline across the whole deck
    pub fn next_disarm_deadline(&self) -> Option<Instant> {
        self.controls
            .values()
            .filter_map(|c| c.next_disarm_deadline())
            .min()
    }

    /// Silently disarm every confirm control whose deadline has passed
    pub fn expire_disarms(&mut self, now: Instant) {
        for control in self.controls.values_mut() {
            control.expire_disarms(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{
        ConfirmButtonSpec, ControlSpec, FaderSpec, GroupSpec, SelectorSpec, SpecBase, SwitchSpec,
    };
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn base(name: &str, x: f32, y: f32) -> SpecBase {
        SpecBase {
            name: name.to_string(),
            x,
            y,
            w: 10.0,
            h: 10.0,
            color: "#888888".to_string(),
        }
    }

    fn fader_spec(name: &str, x: f32, y: f32) -> ControlSpec {
        ControlSpec::Fader(FaderSpec {
            base: base(name, x, y),
            min: 0.0,
            max: 100.0,
            initial_value: 50.0,
            decimal_places: 1,
        })
    }

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn sample_deck() -> Deck {
        let mut specs = HashMap::new();
        specs.insert("vol".to_string(), fader_spec("volume", 0.0, 0.0));
        specs.insert(
            "muted".to_string(),
            ControlSpec::Switch(SwitchSpec {
                base: base("muted", 1.0, 0.0),
                initially_on: false,
            }),
        );
        specs.insert(
            "scene".to_string(),
            ControlSpec::Selector(SelectorSpec {
                base: base("scene", 2.0, 0.0),
                options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                initial_index: 1,
            }),
        );
        let mut group_children = HashMap::new();
        group_children.insert("inner".to_string(), fader_spec("inner", 0.0, 0.0));
        group_children.insert(
            "reset".to_string(),
            ControlSpec::ConfirmButton(ConfirmButtonSpec {
                base: base("reset", 0.0, 1.0),
            }),
        );
        specs.insert(
            "grp".to_string(),
            ControlSpec::Group(GroupSpec {
                base: base("group", 3.0, 0.0),
                controls: group_children,
            }),
        );
        Deck::from_specs(specs)
    }

    #[test]
    fn test_path_resolution_descends_composites() {
        let mut deck = sample_deck();
        assert!(deck.control_mut(&path(&["vol"])).is_some());
        assert!(deck.control_mut(&path(&["grp", "inner"])).is_some());
        assert!(deck.control_mut(&path(&["grp", "missing"])).is_none());
        assert!(deck.control_mut(&path(&["missing"])).is_none());
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut deck = sample_deck();
        if let Some(Control::Fader(f)) = deck.control_mut(&path(&["vol"])) {
            f.set_value(80.0);
        }
        if let Some(Control::Switch(s)) = deck.control_mut(&path(&["muted"])) {
            s.toggle();
        }
        let snapshot = deck.snapshot();
        assert_eq!(snapshot["vol"], json!(80.0));
        assert_eq!(snapshot["muted"], json!(true));
        assert_eq!(snapshot["scene"], json!(1));
        // composites carry no state of their own
        assert!(snapshot.get("grp").is_none());

        let mut restored = sample_deck();
        restored.restore(&snapshot);
        match restored.control_mut(&path(&["vol"])) {
            Some(Control::Fader(f)) => assert_eq!(f.value(), 80.0),
            _ => unreachable!(),
        }
        match restored.control_mut(&path(&["muted"])) {
            Some(Control::Switch(s)) => assert!(s.is_on()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_restore_skips_unknown_ids() {
        let mut deck = sample_deck();
        deck.restore(&json!({ "ghost": 1, "vol": 10.0 }));
        match deck.control_mut(&path(&["vol"])) {
            Some(Control::Fader(f)) => assert_eq!(f.value(), 10.0),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_tab_order_is_position_derived() {
        let deck = sample_deck();
        assert_eq!(deck.tab_order(), vec!["vol", "muted", "scene", "grp"]);
    }

    #[test]
    fn test_disarm_deadline_scans_nested_controls() {
        let mut deck = sample_deck();
        assert_eq!(deck.next_disarm_deadline(), None);

        let t0 = Instant::now();
        match deck.control_mut(&path(&["grp", "reset"])) {
            Some(Control::ConfirmButton(b)) => b.press_at(t0),
            _ => unreachable!(),
        }
        let deadline = deck.next_disarm_deadline().unwrap();
        assert_eq!(deadline, t0 + crate::control::CONFIRM_TIMEOUT);

        deck.expire_disarms(deadline + Duration::from_millis(1));
        assert_eq!(deck.next_disarm_deadline(), None);
    }

    #[test]
    fn test_update_routes_by_full_path() {
        let mut deck = sample_deck();
        // leaf controls ignore generic updates; composites forward them
        deck.update(&json!(5.0), &path(&["grp", "inner"]));
        match deck.control_mut(&path(&["grp", "inner"])) {
            Some(Control::Fader(f)) => assert_eq!(f.value(), 50.0),
            _ => unreachable!(),
        }
    }
}
