//! In-memory [`NativeApi`] with an allocation ledger.
//!
//! `MockNative` behaves like the native library (index validity tied to the
//! last enumeration, write-through preferences, explicit reload) but records
//! every buffer it hands out.  Tests use the ledger to prove that each buffer
//! is released exactly once, through the matching release function.
//!
//! Releasing an unknown pointer or using the wrong release function is
//! recorded as a violation instead of being freed, so a buggy caller produces
//! a failed assertion rather than undefined behaviour.
//!
//! Always compiled (not `#[cfg(test)]`) so integration tests in `tests/` can
//! use it.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard};

use monswitch_core::{normalize_alias, InputSource};
use monswitch_native::abi::{FavoriteInfo, FavoriteList, InputSourceList, MonitorInfo, MonitorList};

use super::NativeApi;

/// Which release function a buffer must go back through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    MonitorList,
    InputList,
    FavoriteList,
    String,
}

/// One simulated monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockMonitor {
    pub id: Option<String>,
    pub model_name: Option<String>,
    pub manufacturer_id: Option<String>,
    pub inputs: Vec<InputSource>,
    pub current: InputSource,
}

impl MockMonitor {
    /// A monitor named `"{id} Display"` currently showing its first input.
    pub fn new(id: &str, inputs: &[InputSource]) -> Self {
        Self {
            id: Some(id.to_string()),
            model_name: Some(format!("{id} Display")),
            manufacturer_id: None,
            inputs: inputs.to_vec(),
            current: inputs.first().copied().unwrap_or_default(),
        }
    }

    pub fn with_current(mut self, input: InputSource) -> Self {
        self.current = input;
        self
    }
}

/// The simulated preference file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockPreferences {
    pub aliases: HashMap<(String, u16), String>,
    /// `None` ids model a malformed entry the library might report.
    pub favorites: Vec<(Option<String>, u16)>,
}

#[derive(Default)]
struct World {
    monitors: Vec<MockMonitor>,
    enumerated: usize,
    /// Preferences as loaded in memory.
    loaded: MockPreferences,
    /// Preferences as persisted; only read back by `reload_config`.
    on_disk: MockPreferences,
    reject_mutations: bool,
    init_calls: usize,
    enumerate_calls: usize,
    set_input_calls: usize,
    store_calls: usize,
}

impl World {
    fn monitor(&self, index: usize) -> Option<&MockMonitor> {
        if index < self.enumerated {
            self.monitors.get(index)
        } else {
            None
        }
    }

    fn persist(&mut self) {
        self.on_disk = self.loaded.clone();
    }
}

#[derive(Default)]
struct Ledger {
    outstanding: HashMap<usize, BufferKind>,
    allocations: usize,
    releases: HashMap<BufferKind, usize>,
    violations: Vec<String>,
}

impl Ledger {
    fn record(&mut self, addr: usize, kind: BufferKind) {
        if addr != 0 {
            self.allocations += 1;
            self.outstanding.insert(addr, kind);
        }
    }

    /// Returns `true` if `addr` may be freed as `kind`.
    fn settle(&mut self, addr: usize, kind: BufferKind) -> bool {
        if addr == 0 {
            return false;
        }
        match self.outstanding.get(&addr).copied() {
            Some(expected) if expected == kind => {
                self.outstanding.remove(&addr);
                *self.releases.entry(kind).or_default() += 1;
                true
            }
            Some(expected) => {
                self.violations
                    .push(format!("{expected:?} buffer {addr:#x} released as {kind:?}"));
                false
            }
            None => {
                self.violations
                    .push(format!("{kind:?} buffer {addr:#x} released twice or never allocated"));
                false
            }
        }
    }
}

/// Cloneable handle; clones share the same world and ledger.
#[derive(Clone, Default)]
pub struct MockNative {
    world: Arc<Mutex<World>>,
    ledger: Arc<Mutex<Ledger>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn leak_slice<T>(items: Vec<T>) -> (*mut T, usize) {
    if items.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let count = items.len();
    (Box::into_raw(items.into_boxed_slice()) as *mut T, count)
}

/// # Safety
/// `ptr`/`count` must come from `leak_slice`.
unsafe fn reclaim_slice<T>(ptr: *mut T, count: usize) -> Box<[T]> {
    Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, count))
}

fn leak_string(value: Option<&str>) -> *mut c_char {
    value
        .and_then(|v| CString::new(v).ok())
        .map_or(ptr::null_mut(), CString::into_raw)
}

/// # Safety
/// `ptr` must be null or come from `leak_string`.
unsafe fn reclaim_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

fn key(monitor_id: &CStr, input: u16) -> (String, u16) {
    (monitor_id.to_string_lossy().into_owned(), input)
}

impl MockNative {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_monitors(monitors: Vec<MockMonitor>) -> Self {
        let native = Self::new();
        native.set_monitors(monitors);
        native
    }

    fn world(&self) -> MutexGuard<'_, World> {
        lock(&self.world)
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        lock(&self.ledger)
    }

    // ── Scenario control ──────────────────────────────────────────────────────

    /// Replaces the attached monitors (hot-plug).  Takes effect for per-index
    /// calls immediately, exactly like real hardware going away.
    pub fn set_monitors(&self, monitors: Vec<MockMonitor>) {
        self.world().monitors = monitors;
    }

    /// Makes every mutating call report failure.
    pub fn reject_mutations(&self, reject: bool) {
        self.world().reject_mutations = reject;
    }

    /// Adds a favourite with a null monitor id to both copies of the
    /// preferences.
    pub fn inject_malformed_favorite(&self, input: InputSource) {
        let mut world = self.world();
        world.loaded.favorites.push((None, input.code()));
        world.persist();
    }

    /// Edits the persisted preferences only, as another process would.
    pub fn edit_on_disk(&self, edit: impl FnOnce(&mut MockPreferences)) {
        edit(&mut self.world().on_disk);
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    pub fn current_input_of(&self, monitor_id: &str) -> Option<InputSource> {
        self.world()
            .monitors
            .iter()
            .find(|m| m.id.as_deref() == Some(monitor_id))
            .map(|m| m.current)
    }

    pub fn on_disk(&self) -> MockPreferences {
        self.world().on_disk.clone()
    }

    pub fn init_calls(&self) -> usize {
        self.world().init_calls
    }

    pub fn enumerate_calls(&self) -> usize {
        self.world().enumerate_calls
    }

    pub fn set_input_calls(&self) -> usize {
        self.world().set_input_calls
    }

    /// Number of alias / favourite calls that reached the library.
    pub fn store_calls(&self) -> usize {
        self.world().store_calls
    }

    pub fn allocations(&self) -> usize {
        self.ledger().allocations
    }

    pub fn outstanding(&self) -> usize {
        self.ledger().outstanding.len()
    }

    pub fn releases_of(&self, kind: BufferKind) -> usize {
        self.ledger().releases.get(&kind).copied().unwrap_or(0)
    }

    pub fn violations(&self) -> Vec<String> {
        self.ledger().violations.clone()
    }

    /// `true` when nothing is outstanding and no release was misused.
    pub fn is_balanced(&self) -> bool {
        let ledger = self.ledger();
        ledger.outstanding.is_empty() && ledger.violations.is_empty()
    }
}

impl NativeApi for MockNative {
    fn init(&self) {
        self.world().init_calls += 1;
    }

    fn enumerate(&self) -> MonitorList {
        let infos: Vec<MonitorInfo> = {
            let mut world = self.world();
            world.enumerate_calls += 1;
            world.enumerated = world.monitors.len();
            world
                .monitors
                .iter()
                .map(|m| MonitorInfo {
                    id: leak_string(m.id.as_deref()),
                    model_name: leak_string(m.model_name.as_deref()),
                    manufacturer_id: leak_string(m.manufacturer_id.as_deref()),
                })
                .collect()
        };
        let (monitors, count) = leak_slice(infos);
        self.ledger().record(monitors as usize, BufferKind::MonitorList);
        MonitorList { monitors, count }
    }

    unsafe fn free_monitor_list(&self, list: MonitorList) {
        if self
            .ledger()
            .settle(list.monitors as usize, BufferKind::MonitorList)
        {
            for info in reclaim_slice(list.monitors, list.count).iter() {
                reclaim_string(info.id);
                reclaim_string(info.model_name);
                reclaim_string(info.manufacturer_id);
            }
        }
    }

    fn current_input(&self, index: usize) -> u16 {
        self.world()
            .monitor(index)
            .map_or(InputSource::UNKNOWN, |m| m.current)
            .code()
    }

    fn set_input(&self, index: usize, input: u16) -> bool {
        let mut world = self.world();
        world.set_input_calls += 1;
        if world.reject_mutations || world.monitor(index).is_none() {
            return false;
        }
        let input = InputSource::from_code(input);
        match world.monitors.get_mut(index) {
            Some(monitor) if monitor.inputs.contains(&input) => {
                monitor.current = input;
                true
            }
            _ => false,
        }
    }

    fn available_inputs(&self, index: usize) -> InputSourceList {
        let codes: Vec<u16> = self
            .world()
            .monitor(index)
            .map(|m| m.inputs.iter().map(|i| i.code()).collect())
            .unwrap_or_default();
        let (inputs, count) = leak_slice(codes);
        self.ledger().record(inputs as usize, BufferKind::InputList);
        InputSourceList { inputs, count }
    }

    unsafe fn free_input_list(&self, list: InputSourceList) {
        if self.ledger().settle(list.inputs as usize, BufferKind::InputList) {
            drop(reclaim_slice(list.inputs, list.count));
        }
    }

    fn get_alias(&self, monitor_id: &CStr, input: u16) -> *mut c_char {
        let ptr = {
            let mut world = self.world();
            world.store_calls += 1;
            leak_string(world.loaded.aliases.get(&key(monitor_id, input)).map(String::as_str))
        };
        self.ledger().record(ptr as usize, BufferKind::String);
        ptr
    }

    unsafe fn free_string(&self, s: *mut c_char) {
        if self.ledger().settle(s as usize, BufferKind::String) {
            reclaim_string(s);
        }
    }

    fn set_alias(&self, monitor_id: &CStr, input: u16, alias: &CStr) -> bool {
        let mut world = self.world();
        world.store_calls += 1;
        if world.reject_mutations {
            return false;
        }
        match normalize_alias(&alias.to_string_lossy()) {
            Some(alias) => {
                world.loaded.aliases.insert(key(monitor_id, input), alias.to_string());
            }
            None => {
                world.loaded.aliases.remove(&key(monitor_id, input));
            }
        }
        world.persist();
        true
    }

    fn remove_alias(&self, monitor_id: &CStr, input: u16) -> bool {
        let mut world = self.world();
        world.store_calls += 1;
        if world.reject_mutations {
            return false;
        }
        world.loaded.aliases.remove(&key(monitor_id, input));
        world.persist();
        true
    }

    fn reload_config(&self) {
        let mut world = self.world();
        world.loaded = world.on_disk.clone();
    }

    fn is_favorite(&self, monitor_id: &CStr, input: u16) -> bool {
        let mut world = self.world();
        world.store_calls += 1;
        let (id, input) = key(monitor_id, input);
        world
            .loaded
            .favorites
            .iter()
            .any(|(fav_id, fav_input)| fav_id.as_deref() == Some(id.as_str()) && *fav_input == input)
    }

    fn add_favorite(&self, monitor_id: &CStr, input: u16) -> bool {
        let mut world = self.world();
        world.store_calls += 1;
        if world.reject_mutations {
            return false;
        }
        let (id, input) = key(monitor_id, input);
        let entry = (Some(id), input);
        if !world.loaded.favorites.contains(&entry) {
            world.loaded.favorites.push(entry);
        }
        world.persist();
        true
    }

    fn remove_favorite(&self, monitor_id: &CStr, input: u16) -> bool {
        let mut world = self.world();
        world.store_calls += 1;
        if world.reject_mutations {
            return false;
        }
        let (id, input) = key(monitor_id, input);
        world
            .loaded
            .favorites
            .retain(|(fav_id, fav_input)| !(fav_id.as_deref() == Some(id.as_str()) && *fav_input == input));
        world.persist();
        true
    }

    fn favorites(&self) -> FavoriteList {
        let infos: Vec<FavoriteInfo> = self
            .world()
            .loaded
            .favorites
            .iter()
            .map(|(id, input)| FavoriteInfo {
                monitor_id: leak_string(id.as_deref()),
                input_value: *input,
            })
            .collect();
        let (favorites, count) = leak_slice(infos);
        self.ledger().record(favorites as usize, BufferKind::FavoriteList);
        FavoriteList { favorites, count }
    }

    unsafe fn free_favorite_list(&self, list: FavoriteList) {
        if self
            .ledger()
            .settle(list.favorites as usize, BufferKind::FavoriteList)
        {
            for info in reclaim_slice(list.favorites, list.count).iter() {
                reclaim_string(info.monitor_id);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
