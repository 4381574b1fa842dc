//! # monswitch-core
//!
//! Shared domain values for Monitor Switch.
//!
//! This crate is used by both the native control library (`monswitch-native`)
//! and the synchronization layer (`monswitch-sync`).  It has zero dependencies
//! on OS APIs, UI frameworks, or the C function boundary.
//!
//! # Architecture overview (for beginners)
//!
//! Monitor Switch lets a user flip a monitor between its video inputs (HDMI,
//! DisplayPort, USB-C, ...) from a menu-bar item.  The actual hardware
//! commands are issued by a native library reached through a C-compatible
//! function boundary; everything above that boundary works with the plain
//! values defined here:
//!
//! - **`InputSource`** – a hardware input-selector code plus its static
//!   human-readable name table.
//!
//! - **`Monitor` / `MonitorHandle` / `Generation`** – one enumerated monitor
//!   and the `(generation, index)` pair used to address it.  An index is only
//!   meaningful for the enumeration that produced it; the generation lets us
//!   detect when it has gone stale.
//!
//! - **`Favorite` / `normalize_alias`** – the user preferences overlaid on
//!   top of the hardware state.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `monswitch_core::InputSource` instead of the full module path.
pub use domain::input_source::{InputParseError, InputSource};
pub use domain::monitor::{Generation, Monitor, MonitorHandle, UNKNOWN_MONITOR_ID};
pub use domain::preferences::{normalize_alias, Favorite};
