//! # monswitch-sync
//!
//! The synchronization layer between the native control library and the UI
//! surfaces of Monitor Switch.
//!
//! # Layers (for beginners)
//!
//! ```text
//!   menu bar / settings window / CLI
//!              │
//!   infrastructure::ui_bridge   (commands, view models, async dispatch)
//!              │
//!   application::control        (MonitorControl facade, generation counter)
//!     ├── registry              (immutable snapshots of the monitor list)
//!     ├── catalog               (inputs, names, switching)
//!     └── favorites             (favourites, quick switch)
//!              │  MonitorControlPort
//!   infrastructure::bridge      (OwnershipBridge: raw buffers → owned values)
//!              │  NativeApi
//!   monswitch-native C ABI      (LinkedNative)  or  MockNative in tests
//! ```
//!
//! Typical host setup:
//!
//! ```no_run
//! use monswitch_sync::application::control::MonitorControl;
//! use monswitch_sync::infrastructure::bridge::{LinkedNative, OwnershipBridge};
//!
//! let native = LinkedNative::acquire().expect("first owner");
//! let control = MonitorControl::start(OwnershipBridge::new(native));
//! for monitor in control.monitors() {
//!     println!("{} is on {}", monitor.display_name(), control.current_input(monitor.handle));
//! }
//! ```

pub mod application;
pub mod infrastructure;
