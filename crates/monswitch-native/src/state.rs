//! Process-wide library state.
//!
//! The C functions are free functions with no context argument, so the
//! backend, the preference store, and the size of the last enumeration live in
//! one `static` behind a mutex.  Every exported function takes the lock for
//! the duration of its call, which serialises hardware access.
//!
//! Hosts written in Rust call [`install`] before `monitor_core_init` to choose
//! the backend and the preference file.  Hosts that only see the C ABI get the
//! default setup: a [`NullBackend`] and the platform preference path.

use std::path::PathBuf;
use std::sync::Mutex;

use tracing::info;

use crate::backend::{DisplayBackend, NullBackend};
use crate::store::PreferenceStore;

/// What the library runs against.
pub struct NativeSetup {
    pub backend: Box<dyn DisplayBackend>,
    /// Preference file; `None` resolves the default location.
    pub config_path: Option<PathBuf>,
}

impl Default for NativeSetup {
    fn default() -> Self {
        Self {
            backend: Box::new(NullBackend),
            config_path: None,
        }
    }
}

pub(crate) struct NativeState {
    pub(crate) backend: Box<dyn DisplayBackend>,
    pub(crate) store: PreferenceStore,
    /// Number of monitors returned by the most recent `monitor_enumerate`.
    /// Per-monitor calls with an index at or above this are refused.
    pub(crate) enumerated: usize,
    pub(crate) initialized: bool,
}

impl NativeState {
    fn from_setup(setup: NativeSetup) -> Self {
        Self {
            backend: setup.backend,
            store: PreferenceStore::open(setup.config_path),
            enumerated: 0,
            initialized: false,
        }
    }
}

static STATE: Mutex<Option<NativeState>> = Mutex::new(None);

/// Replaces the library state with a fresh one built from `setup`.
///
/// Any previous enumeration is forgotten, so indices handed out before the
/// call are no longer accepted.
pub fn install(setup: NativeSetup) {
    let state = NativeState::from_setup(setup);
    info!(
        config = ?state.store.path(),
        "native control library configured"
    );
    let mut guard = STATE.lock().unwrap_or_else(|e| e.into_inner());
    *guard = Some(state);
}

/// Runs `f` with exclusive access to the library state, creating the default
/// state on first use.
///
/// Lock poisoning is recovered rather than propagated: a panic must never
/// cross the C boundary, and one failed call must not disable the library.
pub(crate) fn with_state<R>(f: impl FnOnce(&mut NativeState) -> R) -> R {
    let mut guard = STATE.lock().unwrap_or_else(|e| e.into_inner());
    let state = guard.get_or_insert_with(|| NativeState::from_setup(NativeSetup::default()));
    f(state)
}
