//! Per-trigger debounce gate.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Outcome of a debounce check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceDecision {
    Allowed,
    /// The trigger fired `elapsed` ago, inside its `required` window.
    TooSoon { elapsed: Duration, required: Duration },
}

impl DebounceDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, DebounceDecision::Allowed)
    }
}

/// Tracks the last successful fire of every trigger name.
///
/// Entries are created on first fire and overwritten on later ones; they are
/// never removed because a stale timestamp only ever allows.
#[derive(Debug, Default)]
pub struct DebounceGate {
    last_fire: HashMap<String, Instant>,
}

impl DebounceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `trigger_name` at `now`, recording `now` when allowed.
    ///
    /// A zero window always allows.
    pub fn allow(&mut self, trigger_name: &str, now: Instant, window: Duration) -> DebounceDecision {
        if !window.is_zero() {
            if let Some(last) = self.last_fire.get(trigger_name) {
                let elapsed = now.saturating_duration_since(*last);
                if elapsed < window {
                    return DebounceDecision::TooSoon { elapsed, required: window };
                }
            }
        }

        self.last_fire.insert(trigger_name.to_string(), now);
        DebounceDecision::Allowed
    }

    pub fn last_fire(&self, trigger_name: &str) -> Option<Instant> {
        self.last_fire.get(trigger_name).copied()
    }

    pub fn clear(&mut self) {
        self.last_fire.clear();
    }
}
