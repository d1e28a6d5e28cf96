//! MIDI transport layer
//!
//! Owns the midir input connection and feeds raw 3-byte frames into the
//! signal bus from the driver callback. Everything downstream of the bus
//! is hardware-agnostic.

use crate::bus::SignalBus;
use anyhow::{Context, Result};
use midir::{MidiInput, MidiInputConnection};
use tracing::{debug, info, trace, warn};

/// Active MIDI input connection
///
/// Dropping the transport closes the connection.
pub struct MidiTransport {
    port_name: String,
    _conn: MidiInputConnection<()>,
}

impl MidiTransport {
    /// List available MIDI input ports
    pub fn list_input_ports() -> Result<Vec<String>> {
        let midi_in = MidiInput::new("av-deck-scanner").context("Failed to create MIDI input")?;
        let mut names = Vec::new();
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Find an input port by substring match (Windows-friendly)
    fn find_input_port(
        midi_in: &MidiInput,
        pattern: &str,
    ) -> Option<(midir::MidiInputPort, String)> {
        let ports = midi_in.ports();
        for port in ports {
            if let Ok(name) = midi_in.port_name(&port) {
                // Case-insensitive substring match
                if name.to_lowercase().contains(&pattern.to_lowercase()) {
                    debug!("Found port '{}' matching pattern '{}'", name, pattern);
                    return Some((port, name));
                }
            }
        }
        None
    }

    /// Connect to the input port matching `pattern` and pump frames into `bus`
    pub fn connect(pattern: &str, bus: SignalBus) -> Result<Self> {
        let midi_in = MidiInput::new("av-deck-input").context("Failed to create MIDI input")?;

        debug!("Found {} MIDI input ports", midi_in.port_count());

        let (in_port, port_name) = Self::find_input_port(&midi_in, pattern)
            .ok_or_else(|| anyhow::anyhow!("Input port '{}' not found", pattern))?;

        info!("Connecting to input port: {}", port_name);

        let conn = midi_in
            .connect(
                &in_port,
                "av-deck",
                move |_timestamp, data, _| {
                    // Channel voice messages only; anything shorter than a
                    // full 3-byte frame (clock, active sensing) is dropped.
                    if data.len() < 3 {
                        trace!("Skipping short MIDI message ({} bytes)", data.len());
                        return;
                    }
                    if data.len() > 3 {
                        warn!("Truncating {}-byte MIDI message to 3 bytes", data.len());
                    }
                    bus.publish_frame([data[0], data[1], data[2]]);
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("Failed to connect to input port: {}", e))?;

        Ok(Self {
            port_name,
            _conn: conn,
        })
    }

    /// Name of the connected port
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}
