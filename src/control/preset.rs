//! Preset subsystem
//!
//! Named opaque snapshots kept inside one PresetButton, with
//! sequential and randomized selection. Random selection never repeats
//! the last-loaded preset when at least two presets exist.

use super::Hooks;
use crate::spec::PresetButtonSpec;
use rand::Rng;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset document is not a flat keyed object")]
    NotAnObject,
}

/// Named snapshot table with a last-loaded cursor
#[derive(Debug)]
pub struct PresetButton {
    pub spec: PresetButtonSpec,
    /// Preset ids in insertion order ("next in row" semantics)
    order: Vec<String>,
    table: std::collections::HashMap<String, Value>,
    last_loaded: Option<String>,
    pub hooks: Hooks,
}

impl PresetButton {
    pub fn new(spec: PresetButtonSpec) -> Self {
        Self {
            spec,
            order: Vec::new(),
            table: std::collections::HashMap::new(),
            last_loaded: None,
            hooks: Hooks::default(),
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn last_loaded(&self) -> Option<&str> {
        self.last_loaded.as_deref()
    }

    /// Store a snapshot under the given id
    ///
    /// An existing id keeps its position in the row; a new id is
    /// appended.
    pub fn save(&mut self, id: &str, snapshot: Value) {
        if !self.table.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.table.insert(id.to_string(), snapshot);
    }

    /// Load a preset: records the cursor and emits the snapshot
    ///
    /// Unknown ids are a no-op with no diagnostic.
    pub fn load(&mut self, id: &str) {
        let Some(snapshot) = self.table.get(id) else {
            return;
        };
        let payload = snapshot.clone();
        self.last_loaded = Some(id.to_string());
        self.hooks.update(&payload);
    }

    pub fn delete(&mut self, id: &str) {
        if self.table.remove(id).is_some() {
            self.order.retain(|existing| existing != id);
            if self.last_loaded.as_deref() == Some(id) {
                self.last_loaded = None;
            }
        }
    }

    /// Load the preset after the last-loaded one, wrapping at the end
    ///
    /// With nothing loaded yet (or the cursor deleted), starts at the
    /// first preset. No-op when the table is empty.
    pub fn next_in_row(&mut self) {
        if self.order.is_empty() {
            return;
        }
        let next = match self.cursor_index() {
            Some(i) => (i + 1) % self.order.len(),
            None => 0,
        };
        let id = self.order[next].clone();
        self.load(&id);
    }

    /// Load a uniformly random preset, avoiding an immediate repeat
    ///
    /// Draws over all ids when none is loaded; otherwise over the
    /// remaining ids, skipping the cursor. A single preset reloads
    /// itself (a repeat cannot be avoided). No-op when empty.
    pub fn random(&mut self) {
        let count = self.order.len();
        if count == 0 {
            return;
        }
        let mut rng = rand::thread_rng();
        let pick = match self.cursor_index() {
            None => rng.gen_range(0..count),
            Some(_) if count == 1 => 0,
            Some(prev) => {
                let draw = rng.gen_range(0..count - 1);
                if draw >= prev {
                    draw + 1
                } else {
                    draw
                }
            }
        };
        let id = self.order[pick].clone();
        self.load(&id);
    }

    /// Export all presets as a flat keyed document
    pub fn export(&self) -> Value {
        let mut doc = Map::new();
        for id in &self.order {
            if let Some(snapshot) = self.table.get(id) {
                doc.insert(id.clone(), snapshot.clone());
            }
        }
        Value::Object(doc)
    }

    /// Merge a flat keyed document into the table
    ///
    /// Collisions overwrite in place (last merge wins); new ids are
    /// appended in document order. Returns the number of merged ids.
    pub fn import(&mut self, document: &Value) -> Result<usize, PresetError> {
        let Some(entries) = document.as_object() else {
            return Err(PresetError::NotAnObject);
        };
        for (id, snapshot) in entries {
            if !self.table.contains_key(id) {
                self.order.push(id.clone());
            }
            self.table.insert(id.clone(), snapshot.clone());
        }
        debug!("merged {} presets into '{}'", entries.len(), self.spec.base.name);
        Ok(entries.len())
    }

    /// Generic update payloads: only `{"action": "next" | "random"}`
    /// is handled, everything else is silently ignored.
    pub fn update(&mut self, payload: &Value) {
        match payload.get("action").and_then(Value::as_str) {
            Some("next") => self.next_in_row(),
            Some("random") => self.random(),
            _ => {}
        }
    }

    fn cursor_index(&self) -> Option<usize> {
        let last = self.last_loaded.as_deref()?;
        self.order.iter().position(|id| id == last)
    }
}
