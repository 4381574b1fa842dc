//! Application layer: the use cases of the synchronization layer.
//!
//! Everything here talks to the native library through the
//! [`port::MonitorControlPort`] trait only, never through raw pointers.  That
//! keeps the logic testable against `MockNative` and keeps every `unsafe`
//! block inside `infrastructure::bridge`.
//!
//! | Module      | Responsibility                                             |
//! |-------------|------------------------------------------------------------|
//! | `port`      | Safe, owned-value view of the native library               |
//! | `registry`  | Immutable snapshots of the last enumeration                |
//! | `catalog`   | Per-monitor input queries, names and switching             |
//! | `favorites` | Favourite listing, toggling and quick-switch resolution    |
//! | `control`   | The facade UI surfaces call; owns the generation counter   |

use std::fmt;

use monswitch_core::MonitorHandle;
use thiserror::Error;

pub mod catalog;
pub mod control;
pub mod favorites;
pub mod port;
pub mod registry;

/// A mutating operation, named in [`ControlError::Rejected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SetInput,
    SetAlias,
    RemoveAlias,
    AddFavorite,
    RemoveFavorite,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::SetInput => "input switch",
            Operation::SetAlias => "alias update",
            Operation::RemoveAlias => "alias removal",
            Operation::AddFavorite => "favourite add",
            Operation::RemoveFavorite => "favourite removal",
        })
    }
}

/// Errors surfaced by the synchronization layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The handle was issued by an enumeration that has since been replaced.
    #[error("monitor handle {} #{} is stale; refresh the monitor list", .0.generation, .0.index)]
    StaleHandle(MonitorHandle),

    /// The native library reported failure.
    #[error("{0} was rejected by the native control library")]
    Rejected(Operation),

    /// A background task running a blocking call failed to complete.
    #[error("background dispatch failed: {0}")]
    Dispatch(String),
}
