//! MIDI signal decoding and source identities
//!
//! Turns raw 3-byte frames into typed signals and derives the stable
//! source id used as the join key between hardware and mappings.

use std::fmt;

/// Decoded MIDI signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Note On: channel (0-15), key (0-127), velocity (0-127)
    NoteOn { channel: u8, key: u8, velocity: u8 },

    /// Note Off: channel (0-15), key (0-127)
    NoteOff { channel: u8, key: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },
}

/// Kind of hardware source a signal originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Note On/Off (pads, keys, buttons)
    Key,
    /// Control Change (knobs, faders, encoders)
    Cc,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Key => write!(f, "key"),
            SourceKind::Cc => write!(f, "cc"),
        }
    }
}

/// Stable identity of a hardware source: kind + channel + key-or-cc
///
/// Two signals from the same physical knob or pad always derive the
/// same id, which is what the mapping table is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Signal {
    /// Derive the stable source id for this signal
    pub fn source_id(&self) -> SourceId {
        match *self {
            Signal::NoteOn { channel, key, .. } | Signal::NoteOff { channel, key } => {
                SourceId(format!("key-{}-{}", channel, key))
            }
            Signal::ControlChange { channel, cc, .. } => {
                SourceId(format!("cc-{}-{}", channel, cc))
            }
        }
    }

    /// Kind of source this signal originates from
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Signal::NoteOn { .. } | Signal::NoteOff { .. } => SourceKind::Key,
            Signal::ControlChange { .. } => SourceKind::Cc,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            Signal::NoteOn { channel, .. }
            | Signal::NoteOff { channel, .. }
            | Signal::ControlChange { channel, .. } => channel,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Signal::NoteOn { channel, key, velocity } => {
                write!(f, "NoteOn ch:{} key:{} vel:{}", channel, key, velocity)
            }
            Signal::NoteOff { channel, key } => {
                write!(f, "NoteOff ch:{} key:{}", channel, key)
            }
            Signal::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel, cc, value)
            }
        }
    }
}

/// Decode a raw 3-byte frame into a signal
///
/// Pure and total over the input space: status nibbles other than
/// Note Off (0x8), Note On (0x9) and Control Change (0xB) decode to
/// `None` and are not an error. Data bytes are masked to 7 bits.
pub fn decode(frame: [u8; 3]) -> Option<Signal> {
    let status = (frame[0] & 0xF0) >> 4;
    let channel = frame[0] & 0x0F;

    match status {
        0x8 => Some(Signal::NoteOff {
            channel,
            key: frame[1] & 0x7F,
        }),
        0x9 => Some(Signal::NoteOn {
            channel,
            key: frame[1] & 0x7F,
            velocity: frame[2] & 0x7F,
        }),
        0xB => Some(Signal::ControlChange {
            channel,
            cc: frame[1] & 0x7F,
            value: frame[2] & 0x7F,
        }),
        _ => None,
    }
}

/// Format a frame as hex for diagnostics
pub fn format_hex(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_note_on_decoding() {
        let signal = decode([0x90, 0x40, 0x7F]).unwrap();
        assert_eq!(
            signal,
            Signal::NoteOn {
                channel: 0,
                key: 64,
                velocity: 127,
            }
        );
    }

    #[test]
    fn test_note_off_decoding() {
        let signal = decode([0x83, 60, 0]).unwrap();
        assert_eq!(signal, Signal::NoteOff { channel: 3, key: 60 });
    }

    #[test]
    fn test_control_change_decoding() {
        let signal = decode([0xB2, 0x07, 0x40]).unwrap();
        assert_eq!(
            signal,
            Signal::ControlChange {
                channel: 2,
                cc: 7,
                value: 64,
            }
        );
    }

    #[test]
    fn test_note_on_velocity_zero_stays_note_on() {
        // Velocity 0 is delivered verbatim; pads release on Note Off only
        let signal = decode([0x90, 60, 0]).unwrap();
        assert_eq!(
            signal,
            Signal::NoteOn {
                channel: 0,
                key: 60,
                velocity: 0,
            }
        );
    }

    #[test]
    fn test_unsupported_status_dropped() {
        assert_eq!(decode([0xA0, 60, 100]), None); // poly pressure
        assert_eq!(decode([0xC0, 1, 0]), None); // program change
        assert_eq!(decode([0xE0, 0x00, 0x40]), None); // pitch bend
        assert_eq!(decode([0xF8, 0, 0]), None); // clock
        assert_eq!(decode([0x00, 0, 0]), None); // running status
    }

    #[test]
    fn test_source_ids() {
        let on = decode([0x90, 64, 100]).unwrap();
        let off = decode([0x80, 64, 0]).unwrap();
        assert_eq!(on.source_id(), off.source_id());
        assert_eq!(on.source_id().as_str(), "key-0-64");

        let cc = decode([0xB2, 7, 10]).unwrap();
        assert_eq!(cc.source_id().as_str(), "cc-2-7");
        assert_eq!(cc.source_kind(), SourceKind::Cc);
    }

    proptest! {
        /// Total over the 3-byte input space; only the three supported
        /// status nibbles ever produce a signal.
        #[test]
        fn decode_is_total(b0: u8, b1: u8, b2: u8) {
            let status = (b0 & 0xF0) >> 4;
            let decoded = decode([b0, b1, b2]);
            let ok = match status {
                0x8 => matches!(decoded, Some(Signal::NoteOff { .. })),
                0x9 => matches!(decoded, Some(Signal::NoteOn { .. })),
                0xB => matches!(decoded, Some(Signal::ControlChange { .. })),
                _ => decoded.is_none(),
            };
            prop_assert!(ok, "status {:X} decoded to {:?}", status, decoded);
        }

        /// Decoded values always land in the 7-bit domain.
        #[test]
        fn decoded_values_are_seven_bit(b0: u8, b1: u8, b2: u8) {
            if let Some(signal) = decode([b0, b1, b2]) {
                prop_assert!(signal.channel() <= 15);
                match signal {
                    Signal::NoteOn { key, velocity, .. } => {
                        prop_assert!(key <= 127 && velocity <= 127);
                    }
                    Signal::NoteOff { key, .. } => prop_assert!(key <= 127),
                    Signal::ControlChange { cc, value, .. } => {
                        prop_assert!(cc <= 127 && value <= 127);
                    }
                }
            }
        }
    }
}
