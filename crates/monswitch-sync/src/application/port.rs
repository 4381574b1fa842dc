//! The native library as seen by the application layer.
//!
//! Same operations as the C contract, but with owned Rust values: no buffers
//! to release, no nullable pointers.  `OwnershipBridge` is the production
//! implementation.

use monswitch_core::{Favorite, InputSource};

/// One enumeration entry, copied out of the native buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredMonitor {
    pub id: Option<String>,
    pub model_name: Option<String>,
    pub manufacturer_id: Option<String>,
}

/// Safe access to the native control library.
///
/// Indices refer to the most recent [`enumerate`](Self::enumerate) call.
/// Mutations return the library's success flag unchanged.
pub trait MonitorControlPort: Send {
    fn init(&self);
    fn enumerate(&self) -> Vec<DiscoveredMonitor>;

    /// `InputSource::UNKNOWN` when the library cannot answer.
    fn current_input(&self, index: u32) -> InputSource;
    fn set_input(&self, index: u32, input: InputSource) -> bool;
    /// Hardware order; may be empty.
    fn available_inputs(&self, index: u32) -> Vec<InputSource>;

    fn alias(&self, monitor_id: &str, input: InputSource) -> Option<String>;
    fn set_alias(&self, monitor_id: &str, input: InputSource, alias: &str) -> bool;
    fn remove_alias(&self, monitor_id: &str, input: InputSource) -> bool;
    fn reload_config(&self);

    fn is_favorite(&self, monitor_id: &str, input: InputSource) -> bool;
    fn add_favorite(&self, monitor_id: &str, input: InputSource) -> bool;
    fn remove_favorite(&self, monitor_id: &str, input: InputSource) -> bool;
    /// Stored order, entries without a monitor id already dropped.
    fn favorites(&self) -> Vec<Favorite>;
}
