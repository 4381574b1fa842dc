//! Infrastructure layer: adapters around the application layer.
//!
//! - `bridge` owns every raw pointer from the native control library.
//! - `ui_bridge` exposes the facade to UI surfaces and the CLI.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `monswitch_core`, but MUST NOT be imported by the `application` layer
//! (tests excepted).

pub mod bridge;
pub mod ui_bridge;
