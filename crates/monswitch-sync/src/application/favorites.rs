//! Favourites Index: listing, toggling and quick-switch resolution.
//!
//! Favourites are keyed by monitor id, not by handle, so they survive
//! re-enumeration and stay stored while their monitor is unplugged.  The
//! quick-switch list resolves them against a snapshot and simply leaves out
//! the ones with no attached monitor.

use monswitch_core::{Favorite, InputSource, Monitor};
use serde::Serialize;
use tracing::debug;

use super::catalog;
use super::port::MonitorControlPort;
use super::registry::RegistrySnapshot;
use super::{ControlError, Operation};

/// A favourite resolved to an attached monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickSwitchEntry {
    pub monitor: Monitor,
    pub input: InputSource,
    /// Alias or static name of the input.
    pub label: String,
    /// Whether the monitor is currently showing `input`.
    pub is_current: bool,
}

/// All stored favourites in stored order.
pub fn list_favorites(port: &dyn MonitorControlPort) -> Vec<Favorite> {
    port.favorites()
}

/// Favourites whose monitor is in `snapshot`, in stored order.
///
/// When several attached monitors share an id, the first in enumeration
/// order is used.
pub fn quick_switch(port: &dyn MonitorControlPort, snapshot: &RegistrySnapshot) -> Vec<QuickSwitchEntry> {
    port.favorites()
        .into_iter()
        .filter_map(|favorite| {
            let Some(monitor) = snapshot.find_by_id(&favorite.monitor_id) else {
                debug!(monitor = %favorite.monitor_id, "favourite monitor not attached");
                return None;
            };
            Some(QuickSwitchEntry {
                label: catalog::display_name(port, &monitor.id, favorite.input),
                is_current: port.current_input(monitor.handle.index) == favorite.input,
                input: favorite.input,
                monitor: monitor.clone(),
            })
        })
        .collect()
}

/// Flips the favourite flag and returns the new state.
///
/// Not atomic at the library level: the read and the write are two separate
/// calls, so a concurrent external edit between them can win.
pub fn toggle(port: &dyn MonitorControlPort, monitor_id: &str, input: InputSource) -> Result<bool, ControlError> {
    if port.is_favorite(monitor_id, input) {
        if port.remove_favorite(monitor_id, input) {
            Ok(false)
        } else {
            Err(ControlError::Rejected(Operation::RemoveFavorite))
        }
    } else if port.add_favorite(monitor_id, input) {
        Ok(true)
    } else {
        Err(ControlError::Rejected(Operation::AddFavorite))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
