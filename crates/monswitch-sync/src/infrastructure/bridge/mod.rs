//! Ownership Bridge: the only code that touches raw pointers from the native
//! control library.
//!
//! # Why a bridge? (for beginners)
//!
//! Every list or string the native library returns lives in memory owned by
//! *the library's* allocator.  If we forget to hand a buffer back it leaks; if
//! we hand it back twice, or through the wrong release function, the process
//! may crash; if we read it after handing it back we read freed memory.
//!
//! The bridge makes those mistakes impossible for the rest of the crate:
//!
//! 1. Each returned buffer is immediately wrapped in a guard
//!    ([`ListGuard`] or [`StringGuard`]).
//! 2. The guard's `Drop` calls the matching release function exactly once,
//!    on every exit path (normal return, early return, or unwinding).
//! 3. Borrowed views of the buffer are tied to the guard's lifetime, so the
//!    compiler rejects any read after release.
//! 4. Data is copied into owned Rust values (`String`, `Vec`) before the guard
//!    goes out of scope; no raw pointer escapes this module.
//!
//! # `NativeApi` vs `OwnershipBridge`
//!
//! [`NativeApi`] mirrors the C functions one-to-one and still deals in raw
//! buffers.  Two implementations exist:
//!
//! | Type           | Backed by                                               |
//! |----------------|---------------------------------------------------------|
//! | `LinkedNative` | The `extern "C"` functions of `monswitch-native`        |
//! | `MockNative`   | An in-memory simulation with an allocation ledger       |
//!
//! [`OwnershipBridge`] wraps either one and implements the application
//! layer's [`MonitorControlPort`] with safe, owned values.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use monswitch_core::{Favorite, InputSource};
use monswitch_native::abi::{FavoriteInfo, FavoriteList, InputSourceList, MonitorInfo, MonitorList};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::port::{DiscoveredMonitor, MonitorControlPort};

pub mod linked;
pub mod mock;

pub use linked::LinkedNative;
pub use mock::MockNative;

/// Error type for bridge construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The linked native library has already been claimed (and initialised)
    /// by another owner in this process.
    #[error("native control library is already initialised in this process")]
    AlreadyInitialized,
}

// ── Raw function contract ─────────────────────────────────────────────────────

/// One method per function of the native library's C contract.
///
/// Buffer-returning methods hand over ownership of the buffer; the matching
/// `free_*` method takes it back.  The release methods are `unsafe` because
/// the compiler cannot check that the buffer came from the matching call.
pub trait NativeApi: Send {
    fn init(&self);

    fn enumerate(&self) -> MonitorList;
    /// # Safety
    /// `list` must come from [`NativeApi::enumerate`] on this API and must not
    /// have been released already.
    unsafe fn free_monitor_list(&self, list: MonitorList);

    fn current_input(&self, index: usize) -> u16;
    fn set_input(&self, index: usize, input: u16) -> bool;

    fn available_inputs(&self, index: usize) -> InputSourceList;
    /// # Safety
    /// `list` must come from [`NativeApi::available_inputs`] on this API and
    /// must not have been released already.
    unsafe fn free_input_list(&self, list: InputSourceList);

    fn get_alias(&self, monitor_id: &CStr, input: u16) -> *mut c_char;
    /// # Safety
    /// `s` must come from [`NativeApi::get_alias`] on this API and must not
    /// have been released already.
    unsafe fn free_string(&self, s: *mut c_char);
    fn set_alias(&self, monitor_id: &CStr, input: u16, alias: &CStr) -> bool;
    fn remove_alias(&self, monitor_id: &CStr, input: u16) -> bool;
    fn reload_config(&self);

    fn is_favorite(&self, monitor_id: &CStr, input: u16) -> bool;
    fn add_favorite(&self, monitor_id: &CStr, input: u16) -> bool;
    fn remove_favorite(&self, monitor_id: &CStr, input: u16) -> bool;
    fn favorites(&self) -> FavoriteList;
    /// # Safety
    /// `list` must come from [`NativeApi::favorites`] on this API and must not
    /// have been released already.
    unsafe fn free_favorite_list(&self, list: FavoriteList);
}

// ── Scoped guards ─────────────────────────────────────────────────────────────

/// A list buffer returned by the library, paired with its release function.
pub trait ListBuffer {
    type Item;

    /// Pointer to the first element (may be null) and element count.
    fn raw_parts(&self) -> (*const Self::Item, usize);

    /// Hands the buffer back through its matching release function.
    ///
    /// # Safety
    /// `self` must come from the matching allocation call on `api`.
    unsafe fn release<N: NativeApi + ?Sized>(self, api: &N);
}

impl ListBuffer for MonitorList {
    type Item = MonitorInfo;

    fn raw_parts(&self) -> (*const MonitorInfo, usize) {
        (self.monitors, self.count)
    }

    unsafe fn release<N: NativeApi + ?Sized>(self, api: &N) {
        api.free_monitor_list(self);
    }
}

impl ListBuffer for InputSourceList {
    type Item = u16;

    fn raw_parts(&self) -> (*const u16, usize) {
        (self.inputs, self.count)
    }

    unsafe fn release<N: NativeApi + ?Sized>(self, api: &N) {
        api.free_input_list(self);
    }
}

impl ListBuffer for FavoriteList {
    type Item = FavoriteInfo;

    fn raw_parts(&self) -> (*const FavoriteInfo, usize) {
        (self.favorites, self.count)
    }

    unsafe fn release<N: NativeApi + ?Sized>(self, api: &N) {
        api.free_favorite_list(self);
    }
}

/// Owns a list buffer until dropped, then releases it exactly once.
///
/// Only the bridge creates guards, from buffers the library just returned.
/// Code outside this crate cannot wrap a pointer of its own:
///
/// ```compile_fail
/// use monswitch_native::abi::MonitorList;
/// use monswitch_sync::infrastructure::bridge::mock::MockNative;
/// use monswitch_sync::infrastructure::bridge::ListGuard;
///
/// let mut fake = [0u8; 64];
/// let native = MockNative::default();
/// let list = MonitorList { monitors: fake.as_mut_ptr().cast(), count: 1 };
/// let guard = ListGuard::new(&native, list);
/// ```
pub struct ListGuard<'a, N: NativeApi + ?Sized, L: ListBuffer> {
    api: &'a N,
    list: Option<L>,
}

impl<'a, N: NativeApi + ?Sized, L: ListBuffer> ListGuard<'a, N, L> {
    /// # Safety
    ///
    /// `list` must have been returned by `api` and not released yet; the
    /// guard reads it through `items()` and releases it on drop.
    pub(crate) unsafe fn new(api: &'a N, list: L) -> Self {
        Self {
            api,
            list: Some(list),
        }
    }

    /// Borrows the elements.  A null pointer or zero count is an empty slice.
    pub fn items(&self) -> &[L::Item] {
        let Some(list) = self.list.as_ref() else {
            return &[];
        };
        let (ptr, count) = list.raw_parts();
        if ptr.is_null() || count == 0 {
            return &[];
        }
        // SAFETY: the library guarantees `count` initialised elements at `ptr`
        // until the buffer is released, which only happens in `drop`.
        unsafe { std::slice::from_raw_parts(ptr, count) }
    }
}

impl<N: NativeApi + ?Sized, L: ListBuffer> Drop for ListGuard<'_, N, L> {
    fn drop(&mut self) {
        if let Some(list) = self.list.take() {
            // SAFETY: `list` came from the matching call on `self.api` and
            // `take()` guarantees this runs once.
            unsafe { list.release(self.api) };
        }
    }
}

/// Owns a single string returned by the library (null = absent).
pub struct StringGuard<'a, N: NativeApi + ?Sized> {
    api: &'a N,
    ptr: *mut c_char,
}

impl<'a, N: NativeApi + ?Sized> StringGuard<'a, N> {
    /// # Safety
    ///
    /// `ptr` must be null or a string returned by `api` and not released yet.
    pub(crate) unsafe fn new(api: &'a N, ptr: *mut c_char) -> Self {
        Self { api, ptr }
    }

    /// Copies the string out, or `None` when the library returned null.
    pub fn to_owned_string(&self) -> Option<String> {
        // SAFETY: `ptr` is null or a live NUL-terminated string until drop.
        unsafe { copy_c_string(self.ptr) }
    }
}

impl<N: NativeApi + ?Sized> Drop for StringGuard<'_, N> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            let ptr = std::mem::replace(&mut self.ptr, std::ptr::null_mut());
            // SAFETY: non-null pointer from `get_alias`, released once.
            unsafe { self.api.free_string(ptr) };
        }
    }
}

/// Copies a nullable C string into an owned `String` (lossy UTF-8).
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn copy_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Converts an outgoing string, refusing ones the C side cannot represent.
fn outgoing(value: &str) -> Option<CString> {
    match CString::new(value) {
        Ok(s) => Some(s),
        Err(_) => {
            warn!("refusing string with interior NUL: {value:?}");
            None
        }
    }
}

/// Widens a registry index to the C `size_t` parameter type.
fn to_native_index(index: u32) -> usize {
    index as usize
}

// ── Bridge ────────────────────────────────────────────────────────────────────

/// Safe, owning wrapper around a [`NativeApi`].
pub struct OwnershipBridge<N: NativeApi> {
    api: N,
}

impl<N: NativeApi> OwnershipBridge<N> {
    pub fn new(api: N) -> Self {
        Self { api }
    }

    /// Borrows the wrapped API (tests use this to inspect a `MockNative`).
    pub fn api(&self) -> &N {
        &self.api
    }
}

impl<N: NativeApi> MonitorControlPort for OwnershipBridge<N> {
    fn init(&self) {
        self.api.init();
    }

    fn enumerate(&self) -> Vec<DiscoveredMonitor> {
        // SAFETY: fresh buffer from `enumerate`, owned by nobody else.
        let guard = unsafe { ListGuard::new(&self.api, self.api.enumerate()) };
        guard
            .items()
            .iter()
            .map(|info| {
                // SAFETY: each pointer is null or a string owned by the list,
                // which `guard` keeps alive for this closure.
                unsafe {
                    DiscoveredMonitor {
                        id: copy_c_string(info.id),
                        model_name: copy_c_string(info.model_name),
                        manufacturer_id: copy_c_string(info.manufacturer_id),
                    }
                }
            })
            .collect()
    }

    fn current_input(&self, index: u32) -> InputSource {
        InputSource::from_code(self.api.current_input(to_native_index(index)))
    }

    fn set_input(&self, index: u32, input: InputSource) -> bool {
        self.api.set_input(to_native_index(index), input.code())
    }

    fn available_inputs(&self, index: u32) -> Vec<InputSource> {
        // SAFETY: fresh buffer from `available_inputs`.
        let guard = unsafe { ListGuard::new(&self.api, self.api.available_inputs(to_native_index(index))) };
        guard
            .items()
            .iter()
            .copied()
            .map(InputSource::from_code)
            .collect()
    }

    fn alias(&self, monitor_id: &str, input: InputSource) -> Option<String> {
        let id = outgoing(monitor_id)?;
        // SAFETY: null or a fresh string from `get_alias`.
        let guard = unsafe { StringGuard::new(&self.api, self.api.get_alias(&id, input.code())) };
        guard.to_owned_string()
    }

    fn set_alias(&self, monitor_id: &str, input: InputSource, alias: &str) -> bool {
        let (Some(id), Some(alias)) = (outgoing(monitor_id), outgoing(alias)) else {
            return false;
        };
        self.api.set_alias(&id, input.code(), &alias)
    }

    fn remove_alias(&self, monitor_id: &str, input: InputSource) -> bool {
        outgoing(monitor_id).is_some_and(|id| self.api.remove_alias(&id, input.code()))
    }

    fn reload_config(&self) {
        self.api.reload_config();
    }

    fn is_favorite(&self, monitor_id: &str, input: InputSource) -> bool {
        outgoing(monitor_id).is_some_and(|id| self.api.is_favorite(&id, input.code()))
    }

    fn add_favorite(&self, monitor_id: &str, input: InputSource) -> bool {
        outgoing(monitor_id).is_some_and(|id| self.api.add_favorite(&id, input.code()))
    }

    fn remove_favorite(&self, monitor_id: &str, input: InputSource) -> bool {
        outgoing(monitor_id).is_some_and(|id| self.api.remove_favorite(&id, input.code()))
    }

    fn favorites(&self) -> Vec<Favorite> {
        // SAFETY: fresh buffer from `favorites`.
        let guard = unsafe { ListGuard::new(&self.api, self.api.favorites()) };
        guard
            .items()
            .iter()
            .filter_map(|info| {
                // SAFETY: null or a string owned by the list kept alive by `guard`.
                match unsafe { copy_c_string(info.monitor_id) } {
                    Some(id) => Some(Favorite::new(id, InputSource::from_code(info.input_value))),
                    None => {
                        debug!(input = info.input_value, "skipping favourite without monitor id");
                        None
                    }
                }
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bridge::mock::{BufferKind, MockMonitor};

    fn acme() -> MockMonitor {
        MockMonitor::new("ACME123", &[InputSource::HDMI1, InputSource::USB_C1])
    }

    fn bridge_with(monitors: Vec<MockMonitor>) -> (OwnershipBridge<MockNative>, MockNative) {
        let native = MockNative::with_monitors(monitors);
        (OwnershipBridge::new(native.clone()), native)
    }

    #[test]
    fn test_enumerate_copies_optional_strings_and_releases_list_once() {
        // Arrange
        let mut anonymous = MockMonitor::new("ignored", &[InputSource::VGA1]);
        anonymous.id = None;
        anonymous.model_name = None;
        let (bridge, native) = bridge_with(vec![acme(), anonymous]);

        // Act
        let found = bridge.enumerate();

        // Assert
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id.as_deref(), Some("ACME123"));
        assert_eq!(found[0].model_name.as_deref(), Some("ACME123 Display"));
        assert_eq!(found[1].id, None);
        assert_eq!(found[1].model_name, None);
        assert_eq!(native.releases_of(BufferKind::MonitorList), 1);
        assert!(native.is_balanced(), "violations: {:?}", native.violations());
    }

    #[test]
    fn test_enumerate_with_no_monitors_allocates_nothing() {
        let (bridge, native) = bridge_with(Vec::new());

        assert!(bridge.enumerate().is_empty());
        assert_eq!(native.allocations(), 0);
        assert!(native.is_balanced());
    }

    #[test]
    fn test_available_inputs_preserves_hardware_order() {
        let (bridge, native) = bridge_with(vec![MockMonitor::new(
            "ACME123",
            &[InputSource::USB_C1, InputSource::HDMI1, InputSource::DISPLAY_PORT1],
        )]);
        bridge.enumerate();

        let inputs = bridge.available_inputs(0);

        assert_eq!(
            inputs,
            vec![InputSource::USB_C1, InputSource::HDMI1, InputSource::DISPLAY_PORT1]
        );
        assert_eq!(native.releases_of(BufferKind::InputList), 1);
        assert!(native.is_balanced());
    }

    #[test]
    fn test_alias_lookup_releases_string_through_string_free() {
        // Arrange
        let (bridge, native) = bridge_with(vec![acme()]);
        assert!(bridge.set_alias("ACME123", InputSource::USB_C1, "Laptop"));

        // Act
        let alias = bridge.alias("ACME123", InputSource::USB_C1);
        let missing = bridge.alias("ACME123", InputSource::HDMI1);

        // Assert
        assert_eq!(alias.as_deref(), Some("Laptop"));
        assert_eq!(missing, None);
        assert_eq!(native.releases_of(BufferKind::String), 1, "null result is not released");
        assert!(native.is_balanced());
    }

    #[test]
    fn test_favorites_skip_entries_without_monitor_id() {
        // Arrange
        let (bridge, native) = bridge_with(vec![acme()]);
        assert!(bridge.add_favorite("ACME123", InputSource::USB_C1));
        native.inject_malformed_favorite(InputSource::HDMI2);
        assert!(bridge.add_favorite("OTHER", InputSource::HDMI1));

        // Act
        let favorites = bridge.favorites();

        // Assert
        assert_eq!(
            favorites,
            vec![
                Favorite::new("ACME123", InputSource::USB_C1),
                Favorite::new("OTHER", InputSource::HDMI1),
            ]
        );
        assert_eq!(native.releases_of(BufferKind::FavoriteList), 1);
        assert!(native.is_balanced());
    }

    #[test]
    fn test_mutation_results_are_surfaced_unchanged() {
        let (bridge, native) = bridge_with(vec![acme()]);
        bridge.enumerate();
        native.reject_mutations(true);

        assert!(!bridge.set_input(0, InputSource::USB_C1));
        assert!(!bridge.set_alias("ACME123", InputSource::USB_C1, "Laptop"));
        assert!(!bridge.add_favorite("ACME123", InputSource::USB_C1));
        assert!(!bridge.remove_favorite("ACME123", InputSource::USB_C1));
        assert!(!bridge.remove_alias("ACME123", InputSource::USB_C1));
    }

    #[test]
    fn test_strings_with_interior_nul_never_reach_the_library() {
        let (bridge, native) = bridge_with(vec![acme()]);

        assert!(!bridge.set_alias("ACME\0123", InputSource::USB_C1, "Laptop"));
        assert!(!bridge.set_alias("ACME123", InputSource::USB_C1, "Lap\0top"));
        assert_eq!(bridge.alias("ACME\0123", InputSource::USB_C1), None);
        assert!(!bridge.is_favorite("bad\0id", InputSource::USB_C1));
        assert_eq!(native.store_calls(), 0);
    }

    #[test]
    fn test_guard_releases_on_early_exit() {
        // Arrange
        let native = MockNative::with_monitors(vec![acme()]);

        // Act: drop the guard without reading it, as an early return would.
        {
            let _guard = unsafe { ListGuard::new(&native, native.enumerate()) };
        }

        // Assert
        assert_eq!(native.releases_of(BufferKind::MonitorList), 1);
        assert!(native.is_balanced());
    }

    #[test]
    fn test_guard_releases_while_unwinding() {
        let native = MockNative::with_monitors(vec![acme()]);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let guard = unsafe { ListGuard::new(&native, native.enumerate()) };
            assert_eq!(guard.items().len(), 1);
            panic!("simulated failure while copying");
        }));

        assert!(result.is_err());
        assert_eq!(native.releases_of(BufferKind::MonitorList), 1);
        assert!(native.is_balanced());
    }
}
