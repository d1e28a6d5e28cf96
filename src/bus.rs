//! Signal bus - process-wide fan-out of decoded signals
//!
//! One producer (the transport decode loop) publishes every decoded
//! signal; all subscribed listeners receive it synchronously, in
//! subscription order. The bus does no error isolation: listeners are
//! expected not to panic.

use crate::signal::Signal;
use std::sync::{Arc, RwLock};

type ListenerFn = Arc<dyn Fn(&Signal) + Send + Sync>;

/// Synchronous signal dispatcher with a subscriber list
#[derive(Clone, Default)]
pub struct SignalBus {
    listeners: Arc<RwLock<Vec<ListenerFn>>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all published signals
    ///
    /// Returns the subscriber index (stable, listeners are never removed).
    pub fn subscribe<F>(&self, listener: F) -> usize
    where
        F: Fn(&Signal) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write().unwrap();
        listeners.push(Arc::new(listener));
        listeners.len() - 1
    }

    /// Publish a signal to every listener, in subscription order
    pub fn publish(&self, signal: &Signal) {
        let listeners = self.listeners.read().unwrap();
        for listener in listeners.iter() {
            listener(signal);
        }
    }

    /// Decode a raw frame and publish it if it decodes to a signal
    ///
    /// Unrecognized frames are dropped silently per the decode contract.
    pub fn publish_frame(&self, frame: [u8; 3]) {
        if let Some(signal) = crate::signal::decode(frame) {
            self.publish(&signal);
        }
    }
}
