//! UI command bridge: what the menu-bar item, the settings window and the CLI
//! call.
//!
//! Every command takes an [`AsyncMonitorControl`] and returns a
//! [`CommandResult<T>`], so each response has the same JSON shape:
//! `{ success: bool, data: T | null, error: string | null }`.  A surface can
//! always read `success` without handling a Rust error type.
//!
//! # Referring to monitors and inputs
//!
//! Commands accept user-facing text:
//!
//! - a monitor is given by its id (`"ACME123"`) or its 1-based position in
//!   the current monitor list (`"2"`);
//! - an input is given by code (`"17"`, `"0x11"`) or name (`"HDMI 1"`,
//!   `"usb-c1"`).
//!
//! Preference commands also accept the id of a monitor that is not attached,
//! since aliases and favourites are kept for disconnected monitors.

use monswitch_core::{InputSource, MonitorHandle};
use serde::{Deserialize, Serialize};

use crate::application::port::MonitorControlPort;

pub mod dispatch;
pub mod views;

pub use dispatch::AsyncMonitorControl;
pub use views::{build_menu, build_settings, MenuItem, MenuSection, MenuView, SettingsRow, SettingsTable, ViewCache};

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Result of a successful input switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchDto {
    pub monitor_id: String,
    pub monitor_name: String,
    pub handle: MonitorHandle,
    pub input: InputSource,
    /// Alias or static name of the new input.
    pub input_name: String,
}

/// Preference state of one `(monitor, input)` pair after an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceDto {
    pub monitor_id: String,
    pub input: InputSource,
    pub display_name: String,
    pub alias: Option<String>,
    pub favorite: bool,
}

/// Unified response wrapper used by every command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

macro_rules! try_command {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => return CommandResult::err(e.to_string()),
        }
    };
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn get_menu<P: MonitorControlPort + 'static>(
    dispatch: &AsyncMonitorControl<P>,
) -> CommandResult<MenuView> {
    CommandResult::ok(try_command!(dispatch.menu().await))
}

pub async fn get_settings<P: MonitorControlPort + 'static>(
    dispatch: &AsyncMonitorControl<P>,
) -> CommandResult<SettingsTable> {
    CommandResult::ok(try_command!(dispatch.settings().await))
}

/// Re-enumerates, then returns the fresh menu.
pub async fn refresh<P: MonitorControlPort + 'static>(
    dispatch: &AsyncMonitorControl<P>,
) -> CommandResult<MenuView> {
    try_command!(dispatch.refresh_monitors().await);
    get_menu(dispatch).await
}

/// Re-reads the preference file, then returns the fresh menu.
pub async fn reload<P: MonitorControlPort + 'static>(
    dispatch: &AsyncMonitorControl<P>,
) -> CommandResult<MenuView> {
    try_command!(dispatch.reload_config().await);
    get_menu(dispatch).await
}

pub async fn switch_input<P: MonitorControlPort + 'static>(
    dispatch: &AsyncMonitorControl<P>,
    monitor: &str,
    input: &str,
) -> CommandResult<SwitchDto> {
    let input = try_command!(input.parse::<InputSource>());
    let snapshot = dispatch.control().snapshot();
    let Some(target) = snapshot.lookup(monitor).cloned() else {
        return CommandResult::err(format!("no attached monitor matches {monitor:?}"));
    };
    try_command!(dispatch.set_input(target.handle, input).await);
    let input_name = dispatch.control().display_name(&target.id, input);
    CommandResult::ok(SwitchDto {
        monitor_name: target.display_name(),
        monitor_id: target.id,
        handle: target.handle,
        input,
        input_name,
    })
}

/// What a preference command changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceEdit {
    SetAlias(String),
    RemoveAlias,
    AddFavorite,
    RemoveFavorite,
    ToggleFavorite,
}

pub async fn edit_preference<P: MonitorControlPort + 'static>(
    dispatch: &AsyncMonitorControl<P>,
    monitor: &str,
    input: &str,
    edit: PreferenceEdit,
) -> CommandResult<PreferenceDto> {
    let input = try_command!(input.parse::<InputSource>());
    let monitor_id = resolve_monitor_id(dispatch, monitor);
    let outcome = match edit {
        PreferenceEdit::SetAlias(alias) => dispatch.set_alias(monitor_id.clone(), input, alias).await,
        PreferenceEdit::RemoveAlias => dispatch.remove_alias(monitor_id.clone(), input).await,
        PreferenceEdit::AddFavorite => dispatch.add_favorite(monitor_id.clone(), input).await,
        PreferenceEdit::RemoveFavorite => dispatch.remove_favorite(monitor_id.clone(), input).await,
        PreferenceEdit::ToggleFavorite => dispatch
            .toggle_favorite(monitor_id.clone(), input)
            .await
            .map(|_| ()),
    };
    try_command!(outcome);

    let control = dispatch.control();
    CommandResult::ok(PreferenceDto {
        display_name: control.display_name(&monitor_id, input),
        alias: control.alias(&monitor_id, input),
        favorite: control.is_favorite(&monitor_id, input),
        monitor_id,
        input,
    })
}

/// An attached monitor's id when `reference` names one (by id or position),
/// otherwise `reference` itself taken as an id.
fn resolve_monitor_id<P: MonitorControlPort + 'static>(dispatch: &AsyncMonitorControl<P>, reference: &str) -> String {
    dispatch
        .control()
        .snapshot()
        .lookup(reference)
        .map_or_else(|| reference.to_string(), |m| m.id.clone())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::control::MonitorControl;
    use crate::infrastructure::bridge::mock::{MockMonitor, MockNative};
    use crate::infrastructure::bridge::OwnershipBridge;

    fn make_dispatch() -> (AsyncMonitorControl<OwnershipBridge<MockNative>>, MockNative) {
        let native = MockNative::with_monitors(vec![
            MockMonitor::new("ACME123", &[InputSource::HDMI1, InputSource::USB_C1]),
            MockMonitor::new("OTHER", &[InputSource::DISPLAY_PORT1, InputSource::HDMI2]),
        ]);
        let control = MonitorControl::start(OwnershipBridge::new(native.clone()));
        (AsyncMonitorControl::new(control), native)
    }

    #[tokio::test]
    async fn test_switch_input_by_position_and_name() {
        // Arrange
        let (dispatch, native) = make_dispatch();

        // Act
        let result = switch_input(&dispatch, "2", "hdmi 2").await;

        // Assert
        assert!(result.success, "{:?}", result.error);
        let dto = result.data.expect("data");
        assert_eq!(dto.monitor_id, "OTHER");
        assert_eq!(dto.input_name, "HDMI 2");
        assert_eq!(native.current_input_of("OTHER"), Some(InputSource::HDMI2));
    }

    #[tokio::test]
    async fn test_switch_input_reports_unknown_monitor() {
        let (dispatch, _native) = make_dispatch();

        let result = switch_input(&dispatch, "MISSING", "17").await;

        assert!(!result.success);
        assert!(result.data.is_none());
        assert!(result.error.unwrap_or_default().contains("MISSING"));
    }

    #[tokio::test]
    async fn test_switch_input_reports_unparsable_input() {
        let (dispatch, _native) = make_dispatch();

        let result = switch_input(&dispatch, "1", "thunderbolt").await;

        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_switch_input_reports_rejection() {
        let (dispatch, _native) = make_dispatch();

        let result = switch_input(&dispatch, "ACME123", "DisplayPort 1").await;

        assert!(!result.success);
        assert!(result.error.unwrap_or_default().contains("rejected"));
    }

    #[tokio::test]
    async fn test_edit_preference_for_disconnected_monitor_keeps_raw_id() {
        let (dispatch, _native) = make_dispatch();

        let result = edit_preference(&dispatch, "UNPLUGGED", "21", PreferenceEdit::ToggleFavorite).await;

        let dto = result.data.expect("data");
        assert_eq!(dto.monitor_id, "UNPLUGGED");
        assert!(dto.favorite);
    }

    #[tokio::test]
    async fn test_edit_preference_alias_round_trip() {
        // Arrange
        let (dispatch, _native) = make_dispatch();

        // Act
        let set = edit_preference(&dispatch, "1", "USB-C 1", PreferenceEdit::SetAlias("Laptop".into())).await;
        let cleared = edit_preference(&dispatch, "1", "USB-C 1", PreferenceEdit::SetAlias("  ".into())).await;

        // Assert
        let set = set.data.expect("set");
        assert_eq!(set.monitor_id, "ACME123");
        assert_eq!(set.display_name, "Laptop");
        let cleared = cleared.data.expect("cleared");
        assert_eq!(cleared.alias, None);
        assert_eq!(cleared.display_name, "USB-C 1");
    }

    #[tokio::test]
    async fn test_command_result_serialises_uniform_shape() {
        let (dispatch, _native) = make_dispatch();

        let json = serde_json::to_value(get_menu(&dispatch).await).expect("serialise");

        assert_eq!(json["success"], true);
        assert!(json["error"].is_null());
        assert_eq!(json["data"]["sections"].as_array().map(Vec::len), Some(2));
    }
}
