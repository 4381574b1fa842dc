//! Display backends: where the hardware protocol plugs in.
//!
//! The C ABI in [`crate::abi`] never talks to hardware directly.  It asks a
//! [`DisplayBackend`] to enumerate monitors and to read or change their input
//! selection.  A production build supplies a DDC/CI implementation; this crate
//! ships two backends that need no hardware:
//!
//! | Backend             | Behaviour                                              |
//! |---------------------|--------------------------------------------------------|
//! | [`NullBackend`]     | Reports zero monitors.  Installed by default.          |
//! | [`SimulatedBackend`]| In-memory monitors; shared handle so tests can hot-plug|
//!
//! # Index semantics
//!
//! `index` arguments refer to the position in the backend's *current* list.
//! The library only forwards indices below the count of its most recent
//! enumeration; if the list changed in between (hot-plug), the index may land
//! on a different monitor.  Guarding against that is the caller's job (see the
//! generation-tagged handles in `monswitch-sync`).

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use monswitch_core::InputSource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for backend operations.
///
/// These never cross the C boundary; the ABI layer collapses them to
/// `false` / null / `0xFF` and logs them.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The index does not address a monitor.
    #[error("no monitor at index {0}")]
    NoSuchMonitor(usize),

    /// The monitor refused the command or did not answer.
    #[error("monitor rejected the command: {0}")]
    Rejected(String),

    /// The monitor does not offer the requested input.
    #[error("input {0} is not available on this monitor")]
    Unsupported(InputSource),

    /// A simulated-display fixture could not be read or parsed.
    #[error("invalid display fixture: {0}")]
    Fixture(String),
}

/// One monitor as reported by a backend's enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayDescriptor {
    pub id: Option<String>,
    pub model_name: Option<String>,
    pub manufacturer_id: Option<String>,
}

/// Hardware access used by the C ABI.
///
/// Implementations are driven from a single thread at a time (the library
/// state lives behind a mutex) but must be `Send` so the state can be stored
/// in a `static`.
#[cfg_attr(test, mockall::automock)]
pub trait DisplayBackend: Send {
    /// Returns the connected monitors in a stable order.
    fn enumerate(&mut self) -> Result<Vec<DisplayDescriptor>, BackendError>;

    /// Reads the active input of the monitor at `index`.
    fn current_input(&mut self, index: usize) -> Result<InputSource, BackendError>;

    /// Switches the monitor at `index` to `input`.
    fn set_input(&mut self, index: usize, input: InputSource) -> Result<(), BackendError>;

    /// Lists the inputs the monitor at `index` offers, in hardware order.
    fn available_inputs(&mut self, index: usize) -> Result<Vec<InputSource>, BackendError>;
}

// ── Null backend ──────────────────────────────────────────────────────────────

/// A backend with no monitors.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl DisplayBackend for NullBackend {
    fn enumerate(&mut self) -> Result<Vec<DisplayDescriptor>, BackendError> {
        Ok(Vec::new())
    }

    fn current_input(&mut self, index: usize) -> Result<InputSource, BackendError> {
        Err(BackendError::NoSuchMonitor(index))
    }

    fn set_input(&mut self, index: usize, _input: InputSource) -> Result<(), BackendError> {
        Err(BackendError::NoSuchMonitor(index))
    }

    fn available_inputs(&mut self, index: usize) -> Result<Vec<InputSource>, BackendError> {
        Err(BackendError::NoSuchMonitor(index))
    }
}

// ── Simulated backend ─────────────────────────────────────────────────────────

/// One in-memory monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedDisplay {
    /// `None` simulates a monitor that reports no identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer_id: Option<String>,
    /// Inputs offered, in hardware order.
    #[serde(default)]
    pub inputs: Vec<InputSource>,
    /// Currently active input.
    #[serde(default)]
    pub current: InputSource,
    /// When `true`, every `set_input` is rejected.
    #[serde(default)]
    pub read_only: bool,
}

impl SimulatedDisplay {
    /// A monitor with an id, a model name, the given inputs, and the first
    /// input active.
    pub fn new(id: &str, model_name: &str, inputs: &[InputSource]) -> Self {
        Self {
            id: Some(id.to_string()),
            model_name: Some(model_name.to_string()),
            manufacturer_id: None,
            inputs: inputs.to_vec(),
            current: inputs.first().copied().unwrap_or_default(),
            read_only: false,
        }
    }

    #[must_use]
    pub fn with_current(mut self, input: InputSource) -> Self {
        self.current = input;
        self
    }
}

/// On-disk layout of a simulated-display fixture.
///
/// ```toml
/// [[displays]]
/// id = "ACME123"
/// model_name = "UltraView 27"
/// inputs = [17, 21]
/// current = 17
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
struct Fixture {
    #[serde(default)]
    displays: Vec<SimulatedDisplay>,
}

/// In-memory backend.
///
/// Cloning yields another handle to the *same* displays, so a test can keep a
/// clone after installing the backend and hot-plug, reorder, or inspect the
/// monitors while the library is running.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    displays: Arc<Mutex<Vec<SimulatedDisplay>>>,
}

impl SimulatedBackend {
    pub fn new(displays: Vec<SimulatedDisplay>) -> Self {
        Self {
            displays: Arc::new(Mutex::new(displays)),
        }
    }

    /// Parses a TOML fixture (see [`Fixture`] for the layout).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Fixture`] if the TOML is malformed.
    pub fn from_toml_str(text: &str) -> Result<Self, BackendError> {
        let fixture: Fixture =
            toml::from_str(text).map_err(|e| BackendError::Fixture(e.to_string()))?;
        Ok(Self::new(fixture.displays))
    }

    /// Reads and parses a TOML fixture file.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Fixture`] if the file cannot be read or parsed.
    pub fn from_fixture(path: &Path) -> Result<Self, BackendError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BackendError::Fixture(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Replaces the connected monitors (simulates hot-plug or reordering).
    pub fn set_displays(&self, displays: Vec<SimulatedDisplay>) {
        *self.lock() = displays;
    }

    /// Returns a copy of the connected monitors.
    pub fn displays(&self) -> Vec<SimulatedDisplay> {
        self.lock().clone()
    }

    /// Returns the active input of the first monitor with the given id.
    pub fn current_input_of(&self, id: &str) -> Option<InputSource> {
        self.lock()
            .iter()
            .find(|d| d.id.as_deref() == Some(id))
            .map(|d| d.current)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SimulatedDisplay>> {
        self.displays.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DisplayBackend for SimulatedBackend {
    fn enumerate(&mut self) -> Result<Vec<DisplayDescriptor>, BackendError> {
        Ok(self
            .lock()
            .iter()
            .map(|d| DisplayDescriptor {
                id: d.id.clone(),
                model_name: d.model_name.clone(),
                manufacturer_id: d.manufacturer_id.clone(),
            })
            .collect())
    }

    fn current_input(&mut self, index: usize) -> Result<InputSource, BackendError> {
        self.lock()
            .get(index)
            .map(|d| d.current)
            .ok_or(BackendError::NoSuchMonitor(index))
    }

    fn set_input(&mut self, index: usize, input: InputSource) -> Result<(), BackendError> {
        let mut displays = self.lock();
        let display = displays
            .get_mut(index)
            .ok_or(BackendError::NoSuchMonitor(index))?;
        if display.read_only {
            return Err(BackendError::Rejected("display is read-only".to_string()));
        }
        if !display.inputs.contains(&input) {
            return Err(BackendError::Unsupported(input));
        }
        display.current = input;
        Ok(())
    }

    fn available_inputs(&mut self, index: usize) -> Result<Vec<InputSource>, BackendError> {
        self.lock()
            .get(index)
            .map(|d| d.inputs.clone())
            .ok_or(BackendError::NoSuchMonitor(index))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> SimulatedDisplay {
        SimulatedDisplay::new("ACME123", "UltraView 27", &[InputSource::HDMI1, InputSource::USB_C1])
    }

    #[test]
    fn test_null_backend_reports_no_monitors() {
        let mut backend = NullBackend;
        assert!(backend.enumerate().expect("enumerate").is_empty());
        assert!(matches!(
            backend.current_input(0),
            Err(BackendError::NoSuchMonitor(0))
        ));
    }

    #[test]
    fn test_simulated_enumerate_preserves_order() {
        // Arrange
        let other = SimulatedDisplay::new("OTHER", "Side", &[InputSource::DISPLAY_PORT1]);
        let mut backend = SimulatedBackend::new(vec![acme(), other]);

        // Act
        let found = backend.enumerate().expect("enumerate");

        // Assert
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id.as_deref(), Some("ACME123"));
        assert_eq!(found[1].id.as_deref(), Some("OTHER"));
    }

    #[test]
    fn test_simulated_set_input_changes_current() {
        let mut backend = SimulatedBackend::new(vec![acme()]);

        backend.set_input(0, InputSource::USB_C1).expect("switch");

        assert_eq!(backend.current_input(0).expect("read"), InputSource::USB_C1);
    }

    #[test]
    fn test_simulated_set_input_rejects_unsupported_input() {
        let mut backend = SimulatedBackend::new(vec![acme()]);

        let result = backend.set_input(0, InputSource::VGA1);

        assert!(matches!(result, Err(BackendError::Unsupported(_))));
        assert_eq!(backend.current_input(0).expect("read"), InputSource::HDMI1);
    }

    #[test]
    fn test_simulated_read_only_display_rejects_switch() {
        let mut display = acme();
        display.read_only = true;
        let mut backend = SimulatedBackend::new(vec![display]);

        assert!(matches!(
            backend.set_input(0, InputSource::USB_C1),
            Err(BackendError::Rejected(_))
        ));
    }

    #[test]
    fn test_clones_share_displays() {
        let backend = SimulatedBackend::new(vec![acme()]);
        let mut installed = backend.clone();

        backend.set_displays(Vec::new());

        assert!(installed.enumerate().expect("enumerate").is_empty());
    }

    #[test]
    fn test_fixture_parses_displays() {
        let text = r#"
[[displays]]
id = "ACME123"
model_name = "UltraView 27"
inputs = [17, 21]
current = 21

[[displays]]
inputs = [15]
"#;

        let backend = SimulatedBackend::from_toml_str(text).expect("fixture");
        let displays = backend.displays();

        assert_eq!(displays.len(), 2);
        assert_eq!(displays[0].current, InputSource::USB_C1);
        assert_eq!(displays[1].id, None);
        assert_eq!(displays[1].current, InputSource::UNKNOWN);
    }

    #[test]
    fn test_fixture_with_bad_toml_is_an_error() {
        assert!(matches!(
            SimulatedBackend::from_toml_str("[[displays"),
            Err(BackendError::Fixture(_))
        ));
    }
}
