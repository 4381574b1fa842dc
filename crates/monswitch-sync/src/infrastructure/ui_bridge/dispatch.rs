//! Async front end for [`MonitorControl`].
//!
//! Native calls block (DDC/CI round-trips take tens of milliseconds), so
//! running them directly on a Tokio worker would stall other tasks.  Every
//! method here moves the call onto the blocking pool with
//! `tokio::task::spawn_blocking` and awaits the result.

use std::sync::Arc;

use monswitch_core::{Generation, InputSource, MonitorHandle};
use tokio::sync::watch;

use super::views::{build_menu, build_settings, MenuView, SettingsTable};
use crate::application::control::MonitorControl;
use crate::application::port::MonitorControlPort;
use crate::application::registry::RegistrySnapshot;
use crate::application::ControlError;

pub struct AsyncMonitorControl<P: MonitorControlPort + 'static> {
    control: Arc<MonitorControl<P>>,
}

impl<P: MonitorControlPort + 'static> Clone for AsyncMonitorControl<P> {
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
        }
    }
}

impl<P: MonitorControlPort + 'static> AsyncMonitorControl<P> {
    pub fn new(control: Arc<MonitorControl<P>>) -> Self {
        Self { control }
    }

    pub fn control(&self) -> &Arc<MonitorControl<P>> {
        &self.control
    }

    async fn run<T, F>(&self, f: F) -> Result<T, ControlError>
    where
        T: Send + 'static,
        F: FnOnce(&MonitorControl<P>) -> T + Send + 'static,
    {
        let control = Arc::clone(&self.control);
        tokio::task::spawn_blocking(move || f(&control))
            .await
            .map_err(|e| ControlError::Dispatch(e.to_string()))
    }

    pub fn generation(&self) -> Generation {
        self.control.generation()
    }

    pub fn subscribe(&self) -> watch::Receiver<Generation> {
        self.control.subscribe()
    }

    pub async fn refresh_monitors(&self) -> Result<Arc<RegistrySnapshot>, ControlError> {
        self.run(|c| c.refresh_monitors()).await
    }

    pub async fn reload_config(&self) -> Result<Generation, ControlError> {
        self.run(|c| c.reload_config()).await
    }

    pub async fn set_input(&self, handle: MonitorHandle, input: InputSource) -> Result<(), ControlError> {
        self.run(move |c| c.set_input(handle, input)).await?
    }

    pub async fn set_alias(
        &self,
        monitor_id: String,
        input: InputSource,
        alias: String,
    ) -> Result<(), ControlError> {
        self.run(move |c| c.set_alias(&monitor_id, input, &alias)).await?
    }

    pub async fn remove_alias(&self, monitor_id: String, input: InputSource) -> Result<(), ControlError> {
        self.run(move |c| c.remove_alias(&monitor_id, input)).await?
    }

    pub async fn add_favorite(&self, monitor_id: String, input: InputSource) -> Result<(), ControlError> {
        self.run(move |c| c.add_favorite(&monitor_id, input)).await?
    }

    pub async fn remove_favorite(&self, monitor_id: String, input: InputSource) -> Result<(), ControlError> {
        self.run(move |c| c.remove_favorite(&monitor_id, input)).await?
    }

    pub async fn toggle_favorite(&self, monitor_id: String, input: InputSource) -> Result<bool, ControlError> {
        self.run(move |c| c.toggle_favorite(&monitor_id, input)).await?
    }

    pub async fn menu(&self) -> Result<MenuView, ControlError> {
        self.run(build_menu).await
    }

    pub async fn settings(&self) -> Result<SettingsTable, ControlError> {
        self.run(build_settings).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
