//! Enumerated monitors and the handles used to address them.
//!
//! # Indices are not identities (for beginners)
//!
//! The native library addresses a monitor by its *position* in the most recent
//! enumeration.  When a monitor is unplugged or a new one is attached, the next
//! enumeration may return the monitors in a different order, so "index 1" can
//! suddenly refer to a different physical screen.
//!
//! To make that failure mode detectable, every [`Monitor`] carries a
//! [`MonitorHandle`]: the index *plus* the [`Generation`] of the enumeration
//! that produced it.  Operations compare the handle's generation against the
//! live registry and refuse to act on a mismatch.
//!
//! The monitor `id` is the durable identity used for aliases and favourites,
//! but it is not guaranteed unique: monitors that report no identity all share
//! the [`UNKNOWN_MONITOR_ID`] sentinel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity given to monitors whose hardware reported no id string.
pub const UNKNOWN_MONITOR_ID: &str = "unknown";

/// A monotonically increasing version token.
///
/// The synchronization layer bumps it on every change that can invalidate a
/// cached view (refresh, config reload, input switch, preference edit).  UI
/// surfaces compare the value they rendered with against the current one to
/// decide whether to re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    /// The value at process start, before anything has been enumerated.
    pub const INITIAL: Self = Self(0);

    /// Returns the following generation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Addresses one monitor within one enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorHandle {
    /// Generation at which the enumeration that produced `index` was published.
    pub generation: Generation,
    /// Position in that enumeration (`0..count`).
    pub index: u32,
}

impl MonitorHandle {
    pub const fn new(generation: Generation, index: u32) -> Self {
        Self { generation, index }
    }
}

/// One monitor as reported by the most recent enumeration.
///
/// Created by enumeration and replaced wholesale on every refresh; never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    /// Stable hardware identity, or [`UNKNOWN_MONITOR_ID`].
    pub id: String,
    /// Model name from the EDID, if the library reported one.
    pub model_name: Option<String>,
    /// Three-letter PNP manufacturer id, if the library reported one.
    pub manufacturer_id: Option<String>,
    /// How to address this monitor in per-monitor calls.
    pub handle: MonitorHandle,
}

impl Monitor {
    /// Builds a monitor from the optional strings the library reported.
    ///
    /// A missing id becomes [`UNKNOWN_MONITOR_ID`].
    pub fn from_parts(
        id: Option<String>,
        model_name: Option<String>,
        manufacturer_id: Option<String>,
        handle: MonitorHandle,
    ) -> Self {
        Self {
            id: id.unwrap_or_else(|| UNKNOWN_MONITOR_ID.to_string()),
            model_name,
            manufacturer_id,
            handle,
        }
    }

    /// Returns `true` if the hardware reported no identity for this monitor.
    pub fn has_unknown_id(&self) -> bool {
        self.id == UNKNOWN_MONITOR_ID
    }

    /// Human-readable name: the model name, else the manufacturer id, else
    /// `"Monitor N"` with a 1-based position.
    pub fn display_name(&self) -> String {
        self.model_name
            .clone()
            .or_else(|| self.manufacturer_id.clone())
            .unwrap_or_else(|| format!("Monitor {}", self.handle.index + 1))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(index: u32) -> MonitorHandle {
        MonitorHandle::new(Generation::INITIAL.next(), index)
    }

    #[test]
    fn test_generation_next_increments() {
        let g = Generation::INITIAL;
        assert_eq!(g.next().value(), 1);
        assert_eq!(g.next().next().value(), 2);
        assert!(g.next() > g);
    }

    #[test]
    fn test_missing_id_becomes_unknown_sentinel() {
        let monitor = Monitor::from_parts(None, None, None, handle(0));
        assert_eq!(monitor.id, "unknown");
        assert!(monitor.has_unknown_id());
    }

    #[test]
    fn test_display_name_prefers_model_name() {
        let monitor = Monitor::from_parts(
            Some("ACME123".into()),
            Some("UltraView 27".into()),
            Some("ACM".into()),
            handle(0),
        );
        assert_eq!(monitor.display_name(), "UltraView 27");
    }

    #[test]
    fn test_display_name_falls_back_to_manufacturer() {
        let monitor = Monitor::from_parts(Some("ACME123".into()), None, Some("ACM".into()), handle(0));
        assert_eq!(monitor.display_name(), "ACM");
    }

    #[test]
    fn test_display_name_falls_back_to_one_based_position() {
        let monitor = Monitor::from_parts(Some("ACME123".into()), None, None, handle(2));
        assert_eq!(monitor.display_name(), "Monitor 3");
    }

    #[test]
    fn test_handles_differ_by_generation() {
        let a = MonitorHandle::new(Generation::INITIAL, 0);
        let b = MonitorHandle::new(Generation::INITIAL.next(), 0);
        assert_ne!(a, b);
    }
}
