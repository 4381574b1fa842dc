//! [`NativeApi`] backed by the `extern "C"` functions of `monswitch-native`.
//!
//! The library keeps its state in a process-wide static, so only one
//! `LinkedNative` may exist per process.  [`LinkedNative::acquire`] enforces
//! that: the first call succeeds, every later call returns
//! [`BridgeError::AlreadyInitialized`].

use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::atomic::{AtomicBool, Ordering};

use monswitch_native::abi::{self, FavoriteList, InputSourceList, MonitorList};
use monswitch_native::NativeSetup;
use tracing::info;

use super::{BridgeError, NativeApi};

static ACQUIRED: AtomicBool = AtomicBool::new(false);

/// The process's single handle on the linked native library.
#[derive(Debug)]
pub struct LinkedNative {
    _private: (),
}

impl LinkedNative {
    /// Claims the library with whatever setup it already has (the default
    /// setup if nobody called `monswitch_native::install`).
    pub fn acquire() -> Result<Self, BridgeError> {
        if ACQUIRED.swap(true, Ordering::SeqCst) {
            return Err(BridgeError::AlreadyInitialized);
        }
        info!("native control library acquired");
        Ok(Self { _private: () })
    }

    /// Claims the library and installs `setup` into it.
    ///
    /// The setup is only installed if the claim succeeds, so a losing caller
    /// cannot reset the state under the winner.
    pub fn acquire_with(setup: NativeSetup) -> Result<Self, BridgeError> {
        let linked = Self::acquire()?;
        monswitch_native::install(setup);
        Ok(linked)
    }
}

impl NativeApi for LinkedNative {
    fn init(&self) {
        abi::monitor_core_init();
    }

    fn enumerate(&self) -> MonitorList {
        abi::monitor_enumerate()
    }

    unsafe fn free_monitor_list(&self, list: MonitorList) {
        abi::monitor_list_free(list);
    }

    fn current_input(&self, index: usize) -> u16 {
        abi::monitor_get_current_input(index)
    }

    fn set_input(&self, index: usize, input: u16) -> bool {
        abi::monitor_set_input(index, input)
    }

    fn available_inputs(&self, index: usize) -> InputSourceList {
        abi::monitor_get_available_inputs(index)
    }

    unsafe fn free_input_list(&self, list: InputSourceList) {
        abi::input_source_list_free(list);
    }

    fn get_alias(&self, monitor_id: &CStr, input: u16) -> *mut c_char {
        // SAFETY: `monitor_id` is a valid NUL-terminated string for the call.
        unsafe { abi::config_get_alias(monitor_id.as_ptr(), input) }
    }

    unsafe fn free_string(&self, s: *mut c_char) {
        abi::string_free(s);
    }

    fn set_alias(&self, monitor_id: &CStr, input: u16, alias: &CStr) -> bool {
        // SAFETY: both strings are valid and NUL-terminated for the call.
        unsafe { abi::config_set_alias(monitor_id.as_ptr(), input, alias.as_ptr()) }
    }

    fn remove_alias(&self, monitor_id: &CStr, input: u16) -> bool {
        unsafe { abi::config_remove_alias(monitor_id.as_ptr(), input) }
    }

    fn reload_config(&self) {
        abi::config_reload();
    }

    fn is_favorite(&self, monitor_id: &CStr, input: u16) -> bool {
        unsafe { abi::config_is_favorite(monitor_id.as_ptr(), input) }
    }

    fn add_favorite(&self, monitor_id: &CStr, input: u16) -> bool {
        unsafe { abi::config_add_favorite(monitor_id.as_ptr(), input) }
    }

    fn remove_favorite(&self, monitor_id: &CStr, input: u16) -> bool {
        unsafe { abi::config_remove_favorite(monitor_id.as_ptr(), input) }
    }

    fn favorites(&self) -> FavoriteList {
        abi::config_get_favorites()
    }

    unsafe fn free_favorite_list(&self, list: FavoriteList) {
        abi::favorite_list_free(list);
    }
}
