//! Live, swappable views of the configuration read on every event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::schema::Mapping;

/// Snapshot store for the mapping table.
///
/// Readers take an immutable `Arc` snapshot per event; writers replace the
/// whole table atomically, so an event never observes a half-applied edit.
#[derive(Clone)]
pub struct MappingTable {
    inner: Arc<ArcSwap<Vec<Mapping>>>,
}

impl MappingTable {
    pub fn new(mappings: Vec<Mapping>) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(mappings)),
        }
    }

    /// Current mapping set.
    pub fn snapshot(&self) -> Arc<Vec<Mapping>> {
        self.inner.load_full()
    }

    /// Replace the mapping set, returning the previous one.
    pub fn replace(&self, mappings: Vec<Mapping>) -> Arc<Vec<Mapping>> {
        self.inner.swap(Arc::new(mappings))
    }

    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Global UDP-enabled flag shared between the router and whoever toggles it.
#[derive(Clone, Debug)]
pub struct UdpSwitch {
    enabled: Arc<AtomicBool>,
}

impl UdpSwitch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Set the flag, returning the previous value.
    pub fn set(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::AcqRel)
    }
}

impl Default for UdpSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}
