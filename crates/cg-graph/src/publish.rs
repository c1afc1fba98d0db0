//! Republishing hook for node outputs.
//!
//! A publishing collaborator (a network table, a logger, a recorder) receives
//! named node values after each tick. The graph only hands out plain floats
//! keyed by name.

use cg_core::Epoch;

/// Receives named node outputs after a tick.
pub trait Publisher {
    fn publish(&mut self, name: &str, epoch: Epoch, value: f64);
}

/// Publishes into a vector, one `(name, epoch, value)` entry per call.
impl Publisher for Vec<(String, Epoch, f64)> {
    fn publish(&mut self, name: &str, epoch: Epoch, value: f64) {
        self.push((name.to_string(), epoch, value));
    }
}
