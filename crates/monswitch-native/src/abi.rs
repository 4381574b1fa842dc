//! The C-compatible function boundary.
//!
//! Every function here is `#[no_mangle] extern "C"` so hosts in any language
//! can call it, and every buffer type is `#[repr(C)]` so its layout is fixed.
//!
//! # Allocation scheme
//!
//! Lists are allocated as a boxed slice (`Box<[T]>`) and handed out as a
//! `(pointer, count)` pair; the matching `*_free` function rebuilds the box
//! from exactly that pair and drops it.  Strings are `CString::into_raw`
//! pointers released by rebuilding the `CString`.  An empty list is a null
//! pointer with `count == 0`.
//!
//! Strings *inside* a list (monitor ids, model names) are owned by the list and
//! released by the list-level free function; callers must not free them
//! individually.
//!
//! # Failure reporting
//!
//! Nothing here panics or returns an error object.  Failures collapse to the
//! neutral value of the return type (`false`, null, an empty list, or
//! [`InputSource::UNKNOWN`]) and are logged through `tracing`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::sync::OnceLock;

use monswitch_core::InputSource;
use tracing::{debug, info, warn};

use crate::backend::DisplayDescriptor;
use crate::state::with_state;

// ── Buffer types ──────────────────────────────────────────────────────────────

/// One enumerated monitor.  Each pointer may be null ("not reported").
#[repr(C)]
#[derive(Debug)]
pub struct MonitorInfo {
    pub id: *mut c_char,
    pub model_name: *mut c_char,
    pub manufacturer_id: *mut c_char,
}

/// Result of [`monitor_enumerate`]; release with [`monitor_list_free`].
#[repr(C)]
#[derive(Debug)]
pub struct MonitorList {
    pub monitors: *mut MonitorInfo,
    pub count: usize,
}

/// Result of [`monitor_get_available_inputs`]; release with
/// [`input_source_list_free`].
#[repr(C)]
#[derive(Debug)]
pub struct InputSourceList {
    pub inputs: *mut u16,
    pub count: usize,
}

/// One favourite.  A null `monitor_id` marks a malformed entry.
#[repr(C)]
#[derive(Debug)]
pub struct FavoriteInfo {
    pub monitor_id: *mut c_char,
    pub input_value: u16,
}

/// Result of [`config_get_favorites`]; release with [`favorite_list_free`].
#[repr(C)]
#[derive(Debug)]
pub struct FavoriteList {
    pub favorites: *mut FavoriteInfo,
    pub count: usize,
}

impl MonitorList {
    pub const fn empty() -> Self {
        Self {
            monitors: ptr::null_mut(),
            count: 0,
        }
    }
}

impl InputSourceList {
    pub const fn empty() -> Self {
        Self {
            inputs: ptr::null_mut(),
            count: 0,
        }
    }
}

impl FavoriteList {
    pub const fn empty() -> Self {
        Self {
            favorites: ptr::null_mut(),
            count: 0,
        }
    }
}

// ── Allocation helpers ────────────────────────────────────────────────────────

/// Leaks `items` as a boxed slice and returns its `(pointer, count)`.
fn into_raw_list<T>(items: Vec<T>) -> (*mut T, usize) {
    if items.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let boxed = items.into_boxed_slice();
    let count = boxed.len();
    (Box::into_raw(boxed) as *mut T, count)
}

/// Rebuilds a boxed slice leaked by [`into_raw_list`].
///
/// # Safety
///
/// `(items, count)` must come from one call to [`into_raw_list`] and must not
/// have been rebuilt before.
unsafe fn from_raw_list<T>(items: *mut T, count: usize) -> Option<Box<[T]>> {
    if items.is_null() || count == 0 {
        return None;
    }
    Some(Box::from_raw(ptr::slice_from_raw_parts_mut(items, count)))
}

/// Converts an optional Rust string into an owned C string pointer.
///
/// Strings with an interior NUL cannot be represented and become null.
fn to_c_string(value: Option<&str>) -> *mut c_char {
    let Some(value) = value else {
        return ptr::null_mut();
    };
    match CString::new(value) {
        Ok(s) => s.into_raw(),
        Err(_) => {
            warn!("dropping string with interior NUL at the C boundary");
            ptr::null_mut()
        }
    }
}

/// Releases a pointer produced by [`to_c_string`].
///
/// # Safety
///
/// `s` must be null or come from `CString::into_raw` and not be released twice.
unsafe fn release_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Borrows a caller-supplied C string as UTF-8.
///
/// # Safety
///
/// `s` must be null or point to a NUL-terminated string that stays valid for
/// the returned lifetime.
unsafe fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

/// One-time setup.  Must be called before any other function.
#[no_mangle]
pub extern "C" fn monitor_core_init() {
    with_state(|state| {
        if state.initialized {
            warn!("monitor_core_init called more than once");
        }
        state.initialized = true;
    });
    info!("native control library initialised");
}

// ── Monitors ──────────────────────────────────────────────────────────────────

/// Enumerates connected monitors.  Release the result with
/// [`monitor_list_free`].
///
/// Indices passed to the per-monitor functions refer to this enumeration until
/// the next call.  A backend failure yields an empty list.
#[no_mangle]
pub extern "C" fn monitor_enumerate() -> MonitorList {
    let descriptors: Vec<DisplayDescriptor> = with_state(|state| {
        let found = state.backend.enumerate().unwrap_or_else(|e| {
            warn!("monitor enumeration failed: {e}");
            Vec::new()
        });
        state.enumerated = found.len();
        found
    });
    debug!(count = descriptors.len(), "monitors enumerated");

    let infos: Vec<MonitorInfo> = descriptors
        .iter()
        .map(|d| MonitorInfo {
            id: to_c_string(d.id.as_deref()),
            model_name: to_c_string(d.model_name.as_deref()),
            manufacturer_id: to_c_string(d.manufacturer_id.as_deref()),
        })
        .collect();
    let (monitors, count) = into_raw_list(infos);
    MonitorList { monitors, count }
}

/// Releases a list returned by [`monitor_enumerate`], including every string
/// it owns.
///
/// # Safety
///
/// `list` must come from [`monitor_enumerate`] and must not be released twice.
#[no_mangle]
pub unsafe extern "C" fn monitor_list_free(list: MonitorList) {
    if let Some(infos) = from_raw_list(list.monitors, list.count) {
        for info in infos.iter() {
            release_c_string(info.id);
            release_c_string(info.model_name);
            release_c_string(info.manufacturer_id);
        }
    }
}

/// Reads the active input of the monitor at `index`.
///
/// Returns [`InputSource::UNKNOWN`] (`0xFF`) when the index is out of range or
/// the monitor did not answer.
#[no_mangle]
pub extern "C" fn monitor_get_current_input(index: usize) -> u16 {
    with_state(|state| {
        if index >= state.enumerated {
            return InputSource::UNKNOWN;
        }
        state.backend.current_input(index).unwrap_or_else(|e| {
            warn!(index, "reading current input failed: {e}");
            InputSource::UNKNOWN
        })
    })
    .code()
}

/// Switches the monitor at `index` to `input`.  Returns `false` if the index
/// is out of range or the monitor rejected the command.
#[no_mangle]
pub extern "C" fn monitor_set_input(index: usize, input: u16) -> bool {
    let input = InputSource::from_code(input);
    with_state(|state| {
        if index >= state.enumerated {
            warn!(index, "set_input refused: index outside last enumeration");
            return false;
        }
        match state.backend.set_input(index, input) {
            Ok(()) => {
                info!(index, %input, "input switched");
                true
            }
            Err(e) => {
                warn!(index, %input, "input switch failed: {e}");
                false
            }
        }
    })
}

/// Lists the inputs offered by the monitor at `index`, in hardware order.
/// Release the result with [`input_source_list_free`].
#[no_mangle]
pub extern "C" fn monitor_get_available_inputs(index: usize) -> InputSourceList {
    let codes: Vec<u16> = with_state(|state| {
        if index >= state.enumerated {
            return Vec::new();
        }
        match state.backend.available_inputs(index) {
            Ok(inputs) => inputs.into_iter().map(InputSource::code).collect(),
            Err(e) => {
                warn!(index, "listing inputs failed: {e}");
                Vec::new()
            }
        }
    });
    let (inputs, count) = into_raw_list(codes);
    InputSourceList { inputs, count }
}

/// Releases a list returned by [`monitor_get_available_inputs`].
///
/// # Safety
///
/// `list` must come from [`monitor_get_available_inputs`] and must not be
/// released twice.
#[no_mangle]
pub unsafe extern "C" fn input_source_list_free(list: InputSourceList) {
    drop(from_raw_list(list.inputs, list.count));
}

/// Returns the static display name of `input` ("Unknown" for unrecognised
/// codes).  The pointer is valid for the life of the process and must not be
/// released.
#[no_mangle]
pub extern "C" fn input_source_name(input: u16) -> *const c_char {
    static NAMES: OnceLock<Vec<CString>> = OnceLock::new();
    let names = NAMES.get_or_init(|| {
        // Slot 0 holds the fallback label; slots 1..=23 the table.
        std::iter::once(InputSource::UNKNOWN)
            .chain(InputSource::known())
            .map(|i| CString::new(i.name()).unwrap_or_default())
            .collect()
    });
    let input = InputSource::from_code(input);
    let slot = if input.is_known() {
        input.code() as usize
    } else {
        0
    };
    names[slot].as_ptr()
}

// ── Aliases ───────────────────────────────────────────────────────────────────

/// Looks up the alias for `(monitor_id, input)`.  Returns null when there is
/// none; otherwise release the result with [`string_free`].
///
/// # Safety
///
/// `monitor_id` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn config_get_alias(monitor_id: *const c_char, input: u16) -> *mut c_char {
    let Some(monitor_id) = read_str(monitor_id) else {
        return ptr::null_mut();
    };
    let input = InputSource::from_code(input);
    with_state(|state| to_c_string(state.store.prefs().alias(monitor_id, input)))
}

/// Releases a string returned by [`config_get_alias`].
///
/// # Safety
///
/// `s` must be null or come from [`config_get_alias`], and must not be
/// released twice.
#[no_mangle]
pub unsafe extern "C" fn string_free(s: *mut c_char) {
    release_c_string(s);
}

/// Stores an alias and persists the store.  An empty alias removes the entry.
///
/// # Safety
///
/// Both pointers must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn config_set_alias(
    monitor_id: *const c_char,
    input: u16,
    alias: *const c_char,
) -> bool {
    let (Some(monitor_id), Some(alias)) = (read_str(monitor_id), read_str(alias)) else {
        return false;
    };
    let input = InputSource::from_code(input);
    with_state(|state| state.store.update(|p| p.set_alias(monitor_id, input, alias)))
}

/// Removes an alias and persists the store.
///
/// # Safety
///
/// `monitor_id` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn config_remove_alias(monitor_id: *const c_char, input: u16) -> bool {
    let Some(monitor_id) = read_str(monitor_id) else {
        return false;
    };
    let input = InputSource::from_code(input);
    with_state(|state| state.store.update(|p| p.remove_alias(monitor_id, input)))
}

/// Re-reads the preference store from disk.
#[no_mangle]
pub extern "C" fn config_reload() {
    with_state(|state| state.store.reload());
    debug!("preferences reloaded");
}

// ── Favourites ────────────────────────────────────────────────────────────────

/// # Safety
///
/// `monitor_id` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn config_is_favorite(monitor_id: *const c_char, input: u16) -> bool {
    let Some(monitor_id) = read_str(monitor_id) else {
        return false;
    };
    let input = InputSource::from_code(input);
    with_state(|state| state.store.prefs().is_favorite(monitor_id, input))
}

/// Adds a favourite (no-op if present) and persists the store.
///
/// # Safety
///
/// `monitor_id` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn config_add_favorite(monitor_id: *const c_char, input: u16) -> bool {
    let Some(monitor_id) = read_str(monitor_id) else {
        return false;
    };
    let input = InputSource::from_code(input);
    with_state(|state| state.store.update(|p| p.add_favorite(monitor_id, input)))
}

/// Removes a favourite (no-op if absent) and persists the store.
///
/// # Safety
///
/// `monitor_id` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn config_remove_favorite(monitor_id: *const c_char, input: u16) -> bool {
    let Some(monitor_id) = read_str(monitor_id) else {
        return false;
    };
    let input = InputSource::from_code(input);
    with_state(|state| state.store.update(|p| p.remove_favorite(monitor_id, input)))
}

/// Lists every stored favourite in insertion order.  Release the result with
/// [`favorite_list_free`].
#[no_mangle]
pub extern "C" fn config_get_favorites() -> FavoriteList {
    let favorites = with_state(|state| state.store.prefs().favorites());
    let infos: Vec<FavoriteInfo> = favorites
        .iter()
        .map(|f| FavoriteInfo {
            monitor_id: to_c_string(Some(&f.monitor_id)),
            input_value: f.input.code(),
        })
        .collect();
    let (favorites, count) = into_raw_list(infos);
    FavoriteList { favorites, count }
}

/// Releases a list returned by [`config_get_favorites`], including the id
/// strings it owns.
///
/// # Safety
///
/// `list` must come from [`config_get_favorites`] and must not be released
/// twice.
#[no_mangle]
pub unsafe extern "C" fn favorite_list_free(list: FavoriteList) {
    if let Some(infos) = from_raw_list(list.favorites, list.count) {
        for info in infos.iter() {
            release_c_string(info.monitor_id);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
