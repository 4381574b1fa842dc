//! Input Catalog: per-monitor input queries, display names and switching.
//!
//! Every function takes the snapshot the caller validated against; a handle
//! from any other generation is treated as stale and never reaches the
//! library.

use monswitch_core::{InputSource, MonitorHandle};
use serde::Serialize;
use tracing::{debug, warn};

use super::port::MonitorControlPort;
use super::registry::RegistrySnapshot;
use super::{ControlError, Operation};

/// One row of a monitor's input list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputEntry {
    pub input: InputSource,
    /// Alias if set, else the static name.
    pub name: String,
    pub is_current: bool,
    pub is_favorite: bool,
}

/// The active input, or `InputSource::UNKNOWN` for a stale handle or a
/// failed read.
pub fn current_input(
    port: &dyn MonitorControlPort,
    snapshot: &RegistrySnapshot,
    handle: MonitorHandle,
) -> InputSource {
    match snapshot.resolve(handle) {
        Some(_) => port.current_input(handle.index),
        None => {
            debug!(?handle, "current input requested with stale handle");
            InputSource::UNKNOWN
        }
    }
}

/// The inputs the monitor offers, in hardware order; empty for a stale handle.
pub fn available_inputs(
    port: &dyn MonitorControlPort,
    snapshot: &RegistrySnapshot,
    handle: MonitorHandle,
) -> Vec<InputSource> {
    match snapshot.resolve(handle) {
        Some(_) => port.available_inputs(handle.index),
        None => {
            debug!(?handle, "available inputs requested with stale handle");
            Vec::new()
        }
    }
}

/// The alias for `(monitor_id, input)` if one is set, else the static name
/// (`"Unknown"` for unrecognised codes).
pub fn display_name(port: &dyn MonitorControlPort, monitor_id: &str, input: InputSource) -> String {
    port.alias(monitor_id, input)
        .unwrap_or_else(|| input.name().to_string())
}

/// Switches the monitor to `input`.
pub fn set_input(
    port: &dyn MonitorControlPort,
    snapshot: &RegistrySnapshot,
    handle: MonitorHandle,
    input: InputSource,
) -> Result<(), ControlError> {
    let monitor = snapshot
        .resolve(handle)
        .ok_or(ControlError::StaleHandle(handle))?;
    if port.set_input(handle.index, input) {
        debug!(monitor = %monitor.id, %input, "input switched");
        Ok(())
    } else {
        warn!(monitor = %monitor.id, %input, "input switch rejected");
        Err(ControlError::Rejected(Operation::SetInput))
    }
}

/// The monitor's inputs with names and current / favourite flags.
pub fn input_entries(
    port: &dyn MonitorControlPort,
    snapshot: &RegistrySnapshot,
    handle: MonitorHandle,
) -> Vec<InputEntry> {
    let Some(monitor) = snapshot.resolve(handle) else {
        return Vec::new();
    };
    let current = port.current_input(handle.index);
    port.available_inputs(handle.index)
        .into_iter()
        .map(|input| InputEntry {
            input,
            name: display_name(port, &monitor.id, input),
            is_current: input == current,
            is_favorite: port.is_favorite(&monitor.id, input),
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
