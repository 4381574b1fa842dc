//! Synchronization Facade: the single entry point UI surfaces use.
//!
//! # Consistency model (for beginners)
//!
//! The menu-bar item, the settings window, and the CLI all read and change
//! the same monitors and preferences.  Three rules keep them in agreement:
//!
//! 1. **One writer.**  Every call into the native library goes through the
//!    port mutex, so two surfaces can never interleave foreign calls, and a
//!    handle is validated against the registry while holding the same lock
//!    that protects the library's "last enumeration".
//!
//! 2. **Snapshots, not live lists.**  The registry publishes an immutable
//!    `Arc<RegistrySnapshot>`.  A surface can render from an old snapshot
//!    safely; handles from it are simply refused once stale.
//!
//! 3. **A generation counter.**  Every successful change (refresh, reload,
//!    input switch, alias or favourite edit) bumps a [`Generation`] published
//!    on a `tokio::sync::watch` channel.  A surface compares the generation
//!    it rendered with against the current one and re-reads when they differ.
//!    Bumps happen under the port mutex, and a refresh publishes its snapshot
//!    before its generation, so a reader never sees a generation whose data
//!    is not yet visible.
//!
//! Views that combine several reads (the menu, the settings table) use
//! [`MonitorControl::read`], which holds the port mutex once and hands out a
//! [`ControlView`] whose data and generation belong together.
//!
//! Blocking foreign calls run on the caller's thread.  Async callers should
//! go through `infrastructure::ui_bridge::AsyncMonitorControl`, which moves
//! them onto the blocking thread pool.

use std::sync::{Arc, Mutex, MutexGuard};

use monswitch_core::{normalize_alias, Favorite, Generation, InputSource, Monitor, MonitorHandle};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::catalog::{self, InputEntry};
use super::favorites::{self, QuickSwitchEntry};
use super::port::MonitorControlPort;
use super::registry::{MonitorRegistry, RegistrySnapshot};
use super::{ControlError, Operation};

pub struct MonitorControl<P: MonitorControlPort> {
    port: Mutex<P>,
    registry: MonitorRegistry,
    generation: watch::Sender<Generation>,
}

impl<P: MonitorControlPort> MonitorControl<P> {
    /// Initialises the library through `port` and performs the first
    /// enumeration.
    pub fn start(port: P) -> Arc<Self> {
        port.init();
        let (generation, _) = watch::channel(Generation::INITIAL);
        let control = Arc::new(Self {
            port: Mutex::new(port),
            registry: MonitorRegistry::new(),
            generation,
        });
        control.refresh_monitors();
        control
    }

    fn port(&self) -> MutexGuard<'_, P> {
        self.port.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Takes the port guard so bumps are serialised with the foreign calls
    /// they describe.
    fn bump(&self, _writer: &MutexGuard<'_, P>) -> Generation {
        let mut bumped = Generation::INITIAL;
        self.generation.send_modify(|g| {
            *g = g.next();
            bumped = *g;
        });
        bumped
    }

    /// Runs `read` against one consistent state: the port lock is held
    /// throughout, and the snapshot and generation are taken under it.
    pub fn read<T>(&self, read: impl FnOnce(&ControlView<'_>) -> T) -> T {
        let port = self.port();
        let view = ControlView {
            port: &*port,
            snapshot: self.registry.snapshot(),
            generation: self.generation(),
        };
        read(&view)
    }

    // ── Registry ──────────────────────────────────────────────────────────────

    /// Re-enumerates and publishes a new snapshot.  Handles from every earlier
    /// snapshot become stale.
    pub fn refresh_monitors(&self) -> Arc<RegistrySnapshot> {
        let port = self.port();
        let discovered = port.enumerate();
        let generation = self.generation().next();
        let snapshot = self.registry.publish(discovered, generation);
        self.generation.send_replace(generation);
        drop(port);
        info!(%generation, monitors = snapshot.len(), "monitor list refreshed");
        snapshot
    }

    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.registry.snapshot()
    }

    pub fn monitors(&self) -> Vec<Monitor> {
        self.snapshot().monitors().to_vec()
    }

    pub fn generation(&self) -> Generation {
        *self.generation.borrow()
    }

    /// Receives every generation bump from now on.
    pub fn subscribe(&self) -> watch::Receiver<Generation> {
        self.generation.subscribe()
    }

    // ── Inputs ────────────────────────────────────────────────────────────────

    pub fn current_input(&self, handle: MonitorHandle) -> InputSource {
        let port = self.port();
        catalog::current_input(&*port, &self.snapshot(), handle)
    }

    pub fn available_inputs(&self, handle: MonitorHandle) -> Vec<InputSource> {
        let port = self.port();
        catalog::available_inputs(&*port, &self.snapshot(), handle)
    }

    pub fn input_entries(&self, handle: MonitorHandle) -> Vec<InputEntry> {
        let port = self.port();
        catalog::input_entries(&*port, &self.snapshot(), handle)
    }

    pub fn set_input(&self, handle: MonitorHandle, input: InputSource) -> Result<(), ControlError> {
        let port = self.port();
        catalog::set_input(&*port, &self.snapshot(), handle, input)?;
        let generation = self.bump(&port);
        info!(%generation, index = handle.index, %input, "input switched");
        Ok(())
    }

    // ── Aliases ───────────────────────────────────────────────────────────────

    pub fn display_name(&self, monitor_id: &str, input: InputSource) -> String {
        catalog::display_name(&*self.port(), monitor_id, input)
    }

    pub fn alias(&self, monitor_id: &str, input: InputSource) -> Option<String> {
        self.port().alias(monitor_id, input)
    }

    /// Sets an alias.  Empty or whitespace-only text removes it instead.
    pub fn set_alias(&self, monitor_id: &str, input: InputSource, alias: &str) -> Result<(), ControlError> {
        let Some(alias) = normalize_alias(alias) else {
            debug!(monitor = monitor_id, %input, "empty alias, removing instead");
            return self.remove_alias(monitor_id, input);
        };
        let port = self.port();
        if !port.set_alias(monitor_id, input, alias) {
            warn!(monitor = monitor_id, %input, "alias update rejected");
            return Err(ControlError::Rejected(Operation::SetAlias));
        }
        let generation = self.bump(&port);
        info!(%generation, monitor = monitor_id, %input, alias, "alias set");
        Ok(())
    }

    pub fn remove_alias(&self, monitor_id: &str, input: InputSource) -> Result<(), ControlError> {
        let port = self.port();
        if !port.remove_alias(monitor_id, input) {
            warn!(monitor = monitor_id, %input, "alias removal rejected");
            return Err(ControlError::Rejected(Operation::RemoveAlias));
        }
        let generation = self.bump(&port);
        info!(%generation, monitor = monitor_id, %input, "alias removed");
        Ok(())
    }

    /// Re-reads the preference file; picks up edits made by other processes.
    pub fn reload_config(&self) -> Generation {
        let port = self.port();
        port.reload_config();
        let generation = self.bump(&port);
        info!(%generation, "preferences reloaded");
        generation
    }

    // ── Favourites ────────────────────────────────────────────────────────────

    pub fn is_favorite(&self, monitor_id: &str, input: InputSource) -> bool {
        self.port().is_favorite(monitor_id, input)
    }

    pub fn add_favorite(&self, monitor_id: &str, input: InputSource) -> Result<(), ControlError> {
        let port = self.port();
        if !port.add_favorite(monitor_id, input) {
            return Err(ControlError::Rejected(Operation::AddFavorite));
        }
        let generation = self.bump(&port);
        info!(%generation, monitor = monitor_id, %input, "favourite added");
        Ok(())
    }

    pub fn remove_favorite(&self, monitor_id: &str, input: InputSource) -> Result<(), ControlError> {
        let port = self.port();
        if !port.remove_favorite(monitor_id, input) {
            return Err(ControlError::Rejected(Operation::RemoveFavorite));
        }
        let generation = self.bump(&port);
        info!(%generation, monitor = monitor_id, %input, "favourite removed");
        Ok(())
    }

    /// Flips the favourite flag; returns whether it is now a favourite.
    pub fn toggle_favorite(&self, monitor_id: &str, input: InputSource) -> Result<bool, ControlError> {
        let port = self.port();
        let now_favorite = favorites::toggle(&*port, monitor_id, input)?;
        let generation = self.bump(&port);
        info!(%generation, monitor = monitor_id, %input, now_favorite, "favourite toggled");
        Ok(now_favorite)
    }

    pub fn favorites(&self) -> Vec<Favorite> {
        favorites::list_favorites(&*self.port())
    }

    pub fn quick_switch(&self) -> Vec<QuickSwitchEntry> {
        let port = self.port();
        favorites::quick_switch(&*port, &self.snapshot())
    }
}

// ── Consistent reads ──────────────────────────────────────────────────────────

/// Read-only access to the facade while its port lock is held.
///
/// Every answer comes from the same snapshot and the same preference state,
/// and [`ControlView::generation`] is the generation of exactly that state.
pub struct ControlView<'a> {
    port: &'a dyn MonitorControlPort,
    snapshot: Arc<RegistrySnapshot>,
    generation: Generation,
}

impl ControlView<'_> {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn snapshot(&self) -> &RegistrySnapshot {
        &self.snapshot
    }

    pub fn available_inputs(&self, handle: MonitorHandle) -> Vec<InputSource> {
        catalog::available_inputs(self.port, &self.snapshot, handle)
    }

    pub fn input_entries(&self, handle: MonitorHandle) -> Vec<InputEntry> {
        catalog::input_entries(self.port, &self.snapshot, handle)
    }

    pub fn alias(&self, monitor_id: &str, input: InputSource) -> Option<String> {
        self.port.alias(monitor_id, input)
    }

    pub fn is_favorite(&self, monitor_id: &str, input: InputSource) -> bool {
        self.port.is_favorite(monitor_id, input)
    }

    pub fn quick_switch(&self) -> Vec<QuickSwitchEntry> {
        favorites::quick_switch(self.port, &self.snapshot)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
