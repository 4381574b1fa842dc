//! Monitor Registry: the published result of the last enumeration.
//!
//! A [`RegistrySnapshot`] is immutable.  Refreshing builds a new snapshot and
//! swaps it in atomically, so a reader holding an `Arc<RegistrySnapshot>`
//! never sees a half-updated list and can keep using it after a refresh (it
//! just becomes stale).

use std::sync::{Arc, RwLock};

use monswitch_core::{Generation, Monitor, MonitorHandle};

use super::port::DiscoveredMonitor;

/// The monitors of one enumeration, in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    generation: Generation,
    monitors: Vec<Monitor>,
}

impl RegistrySnapshot {
    /// Builds a snapshot; each monitor's handle is `(generation, position)`.
    pub fn from_discovered(discovered: Vec<DiscoveredMonitor>, generation: Generation) -> Self {
        let monitors = discovered
            .into_iter()
            .enumerate()
            .map(|(index, d)| {
                Monitor::from_parts(
                    d.id,
                    d.model_name,
                    d.manufacturer_id,
                    MonitorHandle::new(generation, index as u32),
                )
            })
            .collect();
        Self {
            generation,
            monitors,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// First monitor with `id`, in enumeration order.
    ///
    /// Ids are not unique (monitors without one all share `"unknown"`); use
    /// [`find_all_by_id`](Self::find_all_by_id) when that matters.
    pub fn find_by_id(&self, id: &str) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.id == id)
    }

    pub fn find_all_by_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Monitor> + 'a {
        self.monitors.iter().filter(move |m| m.id == id)
    }

    /// The monitor `handle` addresses, if it was issued by this snapshot.
    pub fn resolve(&self, handle: MonitorHandle) -> Option<&Monitor> {
        if handle.generation != self.generation {
            return None;
        }
        self.monitors.get(handle.index as usize)
    }

    /// Resolves a user-facing reference: an exact id, else a 1-based position.
    pub fn lookup(&self, reference: &str) -> Option<&Monitor> {
        self.find_by_id(reference).or_else(|| {
            reference
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.monitors.get(i))
        })
    }
}

/// Holder of the current snapshot.
#[derive(Debug, Default)]
pub struct MonitorRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current snapshot and returns the new one.
    pub fn publish(
        &self,
        discovered: Vec<DiscoveredMonitor>,
        generation: Generation,
    ) -> Arc<RegistrySnapshot> {
        let snapshot = Arc::new(RegistrySnapshot::from_discovered(discovered, generation));
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Arc::clone(&snapshot);
        snapshot
    }

    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(|e| e.into_inner()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
