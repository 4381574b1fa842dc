//! Domain values for Monitor Switch.
//!
//! This module contains pure data types with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of the application is called the **domain**.  Domain
//! code has no imports from OS APIs, FFI bindings, or UI frameworks, so it can
//! be compiled and tested on any machine without a monitor attached.
//!
//! Code in outer layers (the native library, the synchronization layer, the
//! CLI) depends on the domain, but the domain never depends on them.

/// Hardware input-selector codes and their display names.
pub mod input_source;

/// Enumerated monitors and the handles used to address them.
pub mod monitor;

/// User preferences: aliases and favourites.
pub mod preferences;
