//! Mapping layer - routing table and the interactive learn protocol
//!
//! A `Mapping` binds one hardware source id to one control path and
//! translates matching signals into the control's mutator. The
//! `MappingRegistry` owns the table, the pending learn state, and the
//! unmap-by-control protocol. At most one mapping exists per source id
//! at any time; learning a duplicate replaces the old one.

use crate::control::{Capability, Control};
use crate::deck::Deck;
use crate::signal::{Signal, SourceId, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A hardware source awaiting or holding a binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiSource {
    pub id: SourceId,
    pub kind: SourceKind,
}

impl MidiSource {
    pub fn from_signal(signal: &Signal) -> Self {
        Self {
            id: signal.source_id(),
            kind: signal.source_kind(),
        }
    }
}

/// Signal-to-mutator translation attached to a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    /// Control change drives a fader's normalized value
    CcToFader,
    /// Note on/off drives a pad's press/release
    KeyToPad,
}

impl MappingKind {
    fn for_source(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Cc => MappingKind::CcToFader,
            SourceKind::Key => MappingKind::KeyToPad,
        }
    }

    fn required_capability(self) -> Capability {
        match self {
            MappingKind::CcToFader => Capability::Continuous,
            MappingKind::KeyToPad => Capability::Press,
        }
    }
}

/// Binding from one source id to one control path
#[derive(Debug, Clone)]
pub struct Mapping {
    pub source: MidiSource,
    pub target: Vec<String>,
    pub kind: MappingKind,
}

impl Mapping {
    /// Drive the target control from a matching signal
    ///
    /// Signal kinds the mapping does not react to are ignored, as are
    /// signals arriving at a control of the wrong variant (possible
    /// only if the deck was rebuilt under an old table).
    pub fn handle_signal(&self, signal: &Signal, control: &mut Control) {
        match self.kind {
            MappingKind::CcToFader => {
                if let (Signal::ControlChange { value, .. }, Control::Fader(fader)) =
                    (signal, control)
                {
                    fader.set_norm_value(*value as f64 / 127.0);
                }
            }
            MappingKind::KeyToPad => {
                if let Control::Pad(pad) = control {
                    match signal {
                        Signal::NoteOn { velocity, .. } => pad.press(*velocity as f64 / 127.0),
                        Signal::NoteOff { .. } => pad.release(),
                        Signal::ControlChange { .. } => {}
                    }
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum LearnError {
    #[error("no control at path '{0}'")]
    UnknownControl(String),
    #[error("control '{path}' does not accept {kind} input")]
    Incompatible { path: String, kind: SourceKind },
}

/// Source-id keyed routing table plus the learn/unmap protocol state
#[derive(Debug, Default)]
pub struct MappingRegistry {
    table: HashMap<SourceId, Mapping>,
    /// Source waiting to be bound by the next qualifying interaction
    pending: Option<MidiSource>,
    /// The next interaction removes all of that control's bindings
    unbind_armed: bool,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, id: &SourceId) -> Option<&Mapping> {
        self.table.get(id)
    }

    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.table.values()
    }

    /// Enter learn mode: the next qualifying control interaction binds
    /// this source. Replaces any previously pending source.
    pub fn begin_learn(&mut self, source: MidiSource) {
        info!("learn: waiting to bind {} ({})", source.id, source.kind);
        self.pending = Some(source);
    }

    pub fn pending(&self) -> Option<&MidiSource> {
        self.pending.as_ref()
    }

    pub fn cancel_learn(&mut self) {
        self.pending = None;
    }

    /// Arm unmap mode: the next control interaction removes all of
    /// that control's bindings.
    pub fn arm_unbind(&mut self) {
        self.unbind_armed = true;
    }

    pub fn unbind_armed(&self) -> bool {
        self.unbind_armed
    }

    pub fn cancel_unbind(&mut self) {
        self.unbind_armed = false;
    }

    /// A control was interacted with: complete whichever interactive
    /// mode is active
    ///
    /// Unmap mode is consumed by the interaction. A learn-mode type
    /// mismatch is logged and leaves the pending source active for
    /// another try.
    pub fn touch(&mut self, deck: &mut Deck, path: &[String]) {
        if self.unbind_armed {
            self.unbind_armed = false;
            self.remove_for_control(deck, path);
            return;
        }
        let Some(source) = self.pending.clone() else {
            return;
        };
        match self.bind(deck, path, source) {
            Ok(()) => {
                self.pending = None;
            }
            Err(err) => {
                // pending stays active so the user may retry on
                // another control
                warn!("learn: {}", err);
            }
        }
    }

    /// Create a binding, replacing any prior mapping for the source
    pub fn bind(
        &mut self,
        deck: &mut Deck,
        path: &[String],
        source: MidiSource,
    ) -> Result<(), LearnError> {
        let kind = MappingKind::for_source(source.kind);
        {
            let control = deck
                .control_mut(path)
                .ok_or_else(|| LearnError::UnknownControl(path.join("/")))?;
            if control.capability() != Some(kind.required_capability()) {
                return Err(LearnError::Incompatible {
                    path: path.join("/"),
                    kind: source.kind,
                });
            }
        }

        // a source binds at most one control: clear the old binding's
        // back-reference before replacing the table entry
        if let Some(old) = self.table.remove(&source.id) {
            if let Some(old_control) = deck.control_mut(&old.target) {
                old_control.remove_source(&source.id);
            }
        }

        let control = deck.control_mut(path).expect("path resolved above");
        control.add_source(source.id.clone());
        info!("learn: bound {} -> {}", source.id, path.join("/"));
        self.table.insert(
            source.id.clone(),
            Mapping {
                source,
                target: path.to_vec(),
                kind,
            },
        );
        Ok(())
    }

    /// Remove every mapping attached to the control at `path`
    ///
    /// Table entries are deleted by identity match: same source id and
    /// same target path.
    pub fn remove_for_control(&mut self, deck: &mut Deck, path: &[String]) {
        let Some(control) = deck.control_mut(path) else {
            warn!("unmap: no control at path '{}'", path.join("/"));
            return;
        };
        let detached = control.take_sources();
        for id in &detached {
            let matches = self
                .table
                .get(id)
                .map(|m| m.target == path)
                .unwrap_or(false);
            if matches {
                self.table.remove(id);
            }
        }
        info!("unmap: removed {} binding(s) from {}", detached.len(), path.join("/"));
    }

    /// Route a decoded signal to its bound control, if any
    ///
    /// Signals with no matching source id are dropped silently; most
    /// hardware signals are not mapped.
    pub fn dispatch(&self, deck: &mut Deck, signal: &Signal) {
        let Some(mapping) = self.table.get(&signal.source_id()) else {
            return;
        };
        match deck.control_mut(&mapping.target) {
            Some(control) => mapping.handle_signal(signal, control),
            None => warn!(
                "dispatch: mapping {} targets missing control '{}'",
                mapping.source.id,
                mapping.target.join("/")
            ),
        }
        debug!("dispatch: {} -> {}", signal, mapping.target.join("/"));
    }
}
