//! av-deck - MIDI controller binding engine
//!
//! Maps hardware MIDI controllers onto a deck of virtual controls:
//! faders, pads, switches, selectors, confirm buttons, composite
//! containers and a preset store. Hardware frames are decoded into
//! signals, published on a bus, and routed to controls through a
//! learnable mapping registry.

pub mod bus;
pub mod cli;
pub mod config;
pub mod control;
pub mod deck;
pub mod mapping;
pub mod signal;
pub mod spec;
pub mod transport;
