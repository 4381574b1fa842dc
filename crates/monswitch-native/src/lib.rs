//! # monswitch-native
//!
//! The native control library behind Monitor Switch.
//!
//! Everything a host application needs from the hardware side is exposed
//! through a small C-compatible function boundary (see [`abi`]).  Hosts written
//! in other languages link the `cdylib`; the Rust synchronization layer links
//! the `rlib` and goes through exactly the same `extern "C"` functions.
//!
//! # Ownership rules at the boundary (for beginners)
//!
//! Every list or string returned by this library is allocated by *this*
//! library's allocator.  The caller copies out what it needs and hands the
//! buffer back through the matching release function:
//!
//! | Returned by                    | Release with               |
//! |--------------------------------|----------------------------|
//! | `monitor_enumerate`            | `monitor_list_free`        |
//! | `monitor_get_available_inputs` | `input_source_list_free`   |
//! | `config_get_favorites`         | `favorite_list_free`       |
//! | `config_get_alias`             | `string_free`              |
//!
//! The release functions are not interchangeable.
//!
//! # Modules
//!
//! - **`abi`** – `#[repr(C)]` buffer types and the exported functions.
//! - **`backend`** – the [`DisplayBackend`] seam where the hardware protocol
//!   plugs in, plus a [`NullBackend`] and a [`SimulatedBackend`].
//! - **`store`** – the TOML-persisted alias/favourite store.
//! - **`state`** – the process-wide library state and the Rust-side
//!   [`install`] hook used to pick a backend and preference file.

pub mod abi;
pub mod backend;
pub mod state;
pub mod store;

pub use backend::{
    BackendError, DisplayBackend, DisplayDescriptor, NullBackend, SimulatedBackend,
    SimulatedDisplay,
};
pub use state::{install, NativeSetup};
pub use store::{PreferenceStore, PreferencesFile, StoreError};
