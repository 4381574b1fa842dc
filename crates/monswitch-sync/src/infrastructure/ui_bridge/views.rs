//! View models for the menu-bar item and the settings window.
//!
//! Each view is built inside one [`MonitorControl::read`], so all of its rows
//! come from the same snapshot and preference state, and the view carries
//! the [`Generation`] of exactly that state.  A change that lands afterwards
//! moves the facade's generation past the view's and the next check rebuilds
//! it.

use monswitch_core::{Generation, InputSource, MonitorHandle};
use serde::Serialize;

use crate::application::control::{ControlView, MonitorControl};
use crate::application::port::MonitorControlPort;

const QUICK_SWITCH_TITLE: &str = "⭐ Quick Switch";
const FAVORITE_PREFIX: &str = "⭐ ";
const NO_MONITORS: &str = "No monitors found";

/// One clickable row: selecting it switches `handle` to `input`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: String,
    pub handle: MonitorHandle,
    pub input: InputSource,
    /// The monitor is currently showing this input.
    pub selected: bool,
    pub favorite: bool,
}

/// One monitor's submenu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuSection {
    pub title: String,
    pub monitor_id: String,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuView {
    pub generation: Generation,
    pub quick_switch: Vec<MenuItem>,
    pub sections: Vec<MenuSection>,
}

impl MenuView {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Plain-text rendering used by the CLI.
    pub fn render_text(&self) -> String {
        if self.is_empty() {
            return format!("{NO_MONITORS}\n");
        }
        let mut out = String::new();
        if !self.quick_switch.is_empty() {
            out.push_str(QUICK_SWITCH_TITLE);
            out.push('\n');
            for item in &self.quick_switch {
                push_item(&mut out, item);
            }
            out.push('\n');
        }
        for section in &self.sections {
            out.push_str(&section.title);
            out.push('\n');
            for item in &section.items {
                push_item(&mut out, item);
            }
        }
        out
    }
}

fn push_item(out: &mut String, item: &MenuItem) {
    let mark = if item.selected { "✓" } else { " " };
    out.push_str(&format!("  {mark} {}\n", item.label));
}

/// Builds the menu: quick-switch favourites first, then one section per
/// attached monitor in enumeration order.
pub fn build_menu<P: MonitorControlPort>(control: &MonitorControl<P>) -> MenuView {
    control.read(menu_from)
}

fn menu_from(view: &ControlView<'_>) -> MenuView {
    let quick_switch = view
        .quick_switch()
        .into_iter()
        .map(|entry| MenuItem {
            label: format!("{} → {}", entry.label, entry.monitor.display_name()),
            handle: entry.monitor.handle,
            input: entry.input,
            selected: entry.is_current,
            favorite: true,
        })
        .collect();

    let sections = view
        .snapshot()
        .monitors()
        .iter()
        .map(|monitor| {
            let items = view
                .input_entries(monitor.handle)
                .into_iter()
                .map(|entry| MenuItem {
                    label: if entry.is_favorite {
                        format!("{FAVORITE_PREFIX}{}", entry.name)
                    } else {
                        entry.name
                    },
                    handle: monitor.handle,
                    input: entry.input,
                    selected: entry.is_current,
                    favorite: entry.is_favorite,
                })
                .collect();
            MenuSection {
                title: monitor.display_name(),
                monitor_id: monitor.id.clone(),
                items,
            }
        })
        .collect();

    MenuView {
        generation: view.generation(),
        quick_switch,
        sections,
    }
}

/// One editable row of the settings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsRow {
    pub monitor_id: String,
    pub monitor_name: String,
    pub handle: MonitorHandle,
    pub input: InputSource,
    pub default_name: String,
    pub alias: Option<String>,
    pub favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsTable {
    pub generation: Generation,
    pub rows: Vec<SettingsRow>,
}

impl SettingsTable {
    pub fn render_text(&self) -> String {
        if self.rows.is_empty() {
            return format!("{NO_MONITORS}\n");
        }
        let mut out = String::new();
        for row in &self.rows {
            let star = if row.favorite { FAVORITE_PREFIX } else { "" };
            let alias = row.alias.as_deref().unwrap_or("-");
            out.push_str(&format!(
                "{:<24} {:<16} {star}{alias}\n",
                row.monitor_name, row.default_name
            ));
        }
        out
    }
}

/// One row per `(monitor, available input)`, enumeration order then
/// hardware order.
pub fn build_settings<P: MonitorControlPort>(control: &MonitorControl<P>) -> SettingsTable {
    control.read(|view| {
        let mut rows = Vec::new();
        for monitor in view.snapshot().monitors() {
            let monitor_name = monitor.display_name();
            for input in view.available_inputs(monitor.handle) {
                rows.push(SettingsRow {
                    monitor_id: monitor.id.clone(),
                    monitor_name: monitor_name.clone(),
                    handle: monitor.handle,
                    input,
                    default_name: input.name().to_string(),
                    alias: view.alias(&monitor.id, input),
                    favorite: view.is_favorite(&monitor.id, input),
                });
            }
        }
        SettingsTable {
            generation: view.generation(),
            rows,
        }
    })
}

/// Holds the last built view and rebuilds it only when the generation moved.
#[derive(Debug)]
pub struct ViewCache<T> {
    rendered: Option<(Generation, T)>,
}

impl<T> Default for ViewCache<T> {
    fn default() -> Self {
        Self { rendered: None }
    }
}

impl<T> ViewCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale(&self, current: Generation) -> bool {
        !matches!(&self.rendered, Some((at, _)) if *at == current)
    }

    /// Returns the cached view, calling `build` first if it is stale.
    ///
    /// `build` returns the view together with the generation it was built
    /// at, which may differ from `current` if a change raced the build.
    pub fn get_or_rebuild(&mut self, current: Generation, build: impl FnOnce() -> (Generation, T)) -> &T {
        if self.is_stale(current) {
            self.rendered = None;
        }
        &self.rendered.get_or_insert_with(build).1
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
