//! The facade running over the real C functions of `monswitch-native`.
//!
//! The native library keeps process-wide state and `LinkedNative` can only be
//! acquired once per process, so every test shares one `MonitorControl` and
//! runs `#[serial]`.  Each test installs a fresh simulated backend and
//! preference file, then refreshes.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use monswitch_core::InputSource;
use monswitch_native::store::{load_preferences, save_preferences};
use monswitch_native::{install, NativeSetup, SimulatedBackend, SimulatedDisplay};
use monswitch_sync::application::control::MonitorControl;
use monswitch_sync::application::ControlError;
use monswitch_sync::infrastructure::bridge::{BridgeError, LinkedNative, OwnershipBridge};
use serial_test::serial;
use uuid::Uuid;

type Control = Arc<MonitorControl<OwnershipBridge<LinkedNative>>>;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn shared() -> &'static Control {
    static CONTROL: OnceLock<Control> = OnceLock::new();
    CONTROL.get_or_init(|| {
        // Never touch the real preference file, even before the first `fresh`.
        let scratch = std::env::temp_dir()
            .join(format!("monswitch_linked_{}", Uuid::new_v4()))
            .join("config.toml");
        let native = LinkedNative::acquire_with(NativeSetup {
            backend: Box::new(SimulatedBackend::default()),
            config_path: Some(scratch),
        })
        .expect("first acquisition in this process");
        MonitorControl::start(OwnershipBridge::new(native))
    })
}

struct Fixture {
    control: &'static Control,
    backend: SimulatedBackend,
    dir: PathBuf,
    config: PathBuf,
}

impl Drop for Fixture {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}

fn fresh(displays: Vec<SimulatedDisplay>) -> Fixture {
    let control = shared();
    let dir = std::env::temp_dir().join(format!("monswitch_linked_{}", Uuid::new_v4()));
    let config = dir.join("config.toml");
    let backend = SimulatedBackend::new(displays);
    install(NativeSetup {
        backend: Box::new(backend.clone()),
        config_path: Some(config.clone()),
    });
    control.refresh_monitors();
    Fixture {
        control,
        backend,
        dir,
        config,
    }
}

fn acme() -> SimulatedDisplay {
    SimulatedDisplay::new("ACME123", "UltraView 27", &[InputSource::HDMI1, InputSource::USB_C1])
        .with_current(InputSource::HDMI1)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
#[serial]
fn test_second_acquisition_is_refused() {
    shared();

    assert_eq!(LinkedNative::acquire().err(), Some(BridgeError::AlreadyInitialized));
    assert!(LinkedNative::acquire_with(NativeSetup::default()).is_err());
}

#[test]
#[serial]
fn test_acme_scenario_through_the_c_functions() {
    // Arrange
    let fx = fresh(vec![acme()]);
    let monitor = fx.control.monitors()[0].clone();
    assert_eq!(monitor.display_name(), "UltraView 27");

    // Act
    fx.control
        .set_alias("ACME123", InputSource::USB_C1, "Laptop")
        .expect("alias");

    // Assert
    assert_eq!(fx.control.display_name("ACME123", InputSource::USB_C1), "Laptop");
    assert_eq!(fx.control.current_input(monitor.handle), InputSource::HDMI1);
    assert_eq!(
        fx.control.available_inputs(monitor.handle),
        vec![InputSource::HDMI1, InputSource::USB_C1]
    );

    fx.control
        .set_input(monitor.handle, InputSource::USB_C1)
        .expect("switch");
    assert_eq!(fx.control.current_input(monitor.handle), InputSource::USB_C1);
    assert_eq!(fx.backend.current_input_of("ACME123"), Some(InputSource::USB_C1));
}

#[test]
#[serial]
fn test_unsupported_input_is_rejected_by_the_library() {
    let fx = fresh(vec![acme()]);
    let handle = fx.control.monitors()[0].handle;

    let result = fx.control.set_input(handle, InputSource::VGA1);

    assert!(matches!(result, Err(ControlError::Rejected(_))));
    assert_eq!(fx.control.current_input(handle), InputSource::HDMI1);
}

#[test]
#[serial]
fn test_favourite_survives_unplug_and_is_persisted() {
    // Arrange
    let fx = fresh(vec![acme()]);
    fx.control
        .add_favorite("ACME123", InputSource::USB_C1)
        .expect("favourite");

    // Act
    fx.backend.set_displays(Vec::new());
    fx.control.refresh_monitors();

    // Assert
    assert!(fx.control.monitors().is_empty());
    assert!(fx.control.quick_switch().is_empty());
    assert!(fx.control.is_favorite("ACME123", InputSource::USB_C1));
    let on_disk = load_preferences(&fx.config).expect("written through");
    assert!(on_disk.is_favorite("ACME123", InputSource::USB_C1));
}

#[test]
#[serial]
fn test_hot_plug_reorder_makes_handles_stale() {
    // Arrange
    let left = SimulatedDisplay::new("LEFT", "Left", &[InputSource::HDMI1, InputSource::HDMI2]);
    let right = SimulatedDisplay::new("RIGHT", "Right", &[InputSource::HDMI1, InputSource::HDMI2]);
    let fx = fresh(vec![left.clone(), right.clone()]);
    let stale = fx.control.monitors()[0].handle;

    // Act
    fx.backend.set_displays(vec![right, left]);
    fx.control.refresh_monitors();

    // Assert
    assert_eq!(
        fx.control.set_input(stale, InputSource::HDMI2),
        Err(ControlError::StaleHandle(stale))
    );
    assert_eq!(fx.backend.current_input_of("RIGHT"), Some(InputSource::HDMI1));
}

#[test]
#[serial]
fn test_reload_picks_up_edits_made_by_another_process() {
    // Arrange
    let fx = fresh(vec![acme()]);
    fx.control
        .set_alias("ACME123", InputSource::HDMI1, "Desktop")
        .expect("alias creates the file");
    let mut prefs = load_preferences(&fx.config).expect("load");
    prefs.add_favorite("ACME123", InputSource::HDMI1);
    prefs.set_alias("ACME123", InputSource::HDMI1, "Work PC");
    save_preferences(&fx.config, &prefs).expect("external write");

    // Act
    let before = fx.control.display_name("ACME123", InputSource::HDMI1);
    fx.control.reload_config();

    // Assert
    assert_eq!(before, "Desktop");
    assert_eq!(fx.control.display_name("ACME123", InputSource::HDMI1), "Work PC");
    assert_eq!(fx.control.quick_switch().len(), 1);
}

#[test]
#[serial]
fn test_monitor_without_identity_is_addressable_as_unknown() {
    let mut anonymous = SimulatedDisplay::new("ignored", "Generic", &[InputSource::VGA1]);
    anonymous.id = None;
    let fx = fresh(vec![anonymous]);

    let monitors = fx.control.monitors();

    assert_eq!(monitors.len(), 1);
    assert!(monitors[0].has_unknown_id());
    assert_eq!(fx.control.current_input(monitors[0].handle), InputSource::VGA1);
}
