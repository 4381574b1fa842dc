//! `monswitch`: command-line surface for Monitor Switch.
//!
//! Drives the same facade a menu-bar item would: it lists monitors and their
//! inputs, switches inputs, and edits aliases and favourites.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ LinkedNative::acquire_with(setup)   -- claims the native library
//!  └─ MonitorControl::start(bridge)       -- init + first enumeration
//!  └─ AsyncMonitorControl                 -- blocking calls off the runtime
//!       └─ ui_bridge commands             -- CommandResult<T> → text / JSON
//! ```
//!
//! The hardware protocol plugs in behind `monswitch_native::DisplayBackend`.
//! Without `--fixture` the library runs with an empty backend; with it, the
//! displays described in the TOML fixture are simulated.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use monswitch_native::{DisplayBackend, NativeSetup, NullBackend, SimulatedBackend};
use monswitch_sync::application::control::MonitorControl;
use monswitch_sync::infrastructure::bridge::{LinkedNative, OwnershipBridge};
use monswitch_sync::infrastructure::ui_bridge::{
    self, AsyncMonitorControl, CommandResult, MenuView, PreferenceDto, PreferenceEdit, SwitchDto,
};

type Dispatch = AsyncMonitorControl<OwnershipBridge<LinkedNative>>;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Switch monitor inputs and manage input aliases and favourites.
#[derive(Debug, Parser)]
#[command(name = "monswitch", version)]
struct Cli {
    /// Preference file (aliases and favourites).
    ///
    /// Defaults to `<config dir>/monitor-switch/config.toml`.
    #[arg(long, global = true, env = "MONSWITCH_CONFIG")]
    config: Option<PathBuf>,

    /// TOML file describing simulated displays (`[[displays]]` tables).
    #[arg(long, global = true, env = "MONSWITCH_FIXTURE")]
    fixture: Option<PathBuf>,

    /// Print the command result as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the menu: quick-switch favourites, then every monitor's inputs.
    List,
    /// Show every (monitor, input) pair with its alias and favourite flag.
    Settings,
    /// Switch a monitor (id or 1-based position) to an input (name or code).
    Switch { monitor: String, input: String },
    /// Manage input aliases.
    #[command(subcommand)]
    Alias(AliasCommand),
    /// Manage favourites.
    #[command(subcommand)]
    Favorite(FavoriteCommand),
    /// Re-enumerate periodically and print the menu whenever it changes.
    Watch {
        /// Seconds between refreshes.
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },
}

#[derive(Debug, Subcommand)]
enum AliasCommand {
    /// Set an alias; an empty label removes it.
    Set {
        monitor: String,
        input: String,
        label: String,
    },
    Remove { monitor: String, input: String },
}

#[derive(Debug, Subcommand)]
enum FavoriteCommand {
    Add { monitor: String, input: String },
    Remove { monitor: String, input: String },
    Toggle { monitor: String, input: String },
}

impl Cli {
    fn native_setup(&self) -> anyhow::Result<NativeSetup> {
        let backend: Box<dyn DisplayBackend> = match &self.fixture {
            Some(path) => Box::new(
                SimulatedBackend::from_fixture(path)
                    .with_context(|| format!("loading display fixture {}", path.display()))?,
            ),
            None => {
                warn!("no display backend configured; no monitors will be found");
                Box::new(NullBackend)
            }
        };
        Ok(NativeSetup {
            backend,
            config_path: self.config.clone(),
        })
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Prints `result` as JSON or through `render`, and turns a failed command
/// into an error so the process exits non-zero.
fn emit<T: Serialize>(
    result: CommandResult<T>,
    json: bool,
    render: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("serialising command result")?
        );
    } else if let Some(data) = &result.data {
        print!("{}", render(data));
    }
    match result.error {
        Some(error) if !result.success => bail!(error),
        _ => Ok(()),
    }
}

fn render_switch(dto: &SwitchDto) -> String {
    format!("{} → {}\n", dto.monitor_name, dto.input_name)
}

fn render_preference(dto: &PreferenceDto) -> String {
    let mut out = format!("{} / {}: {}", dto.monitor_id, dto.input, dto.display_name);
    if dto.favorite {
        out.push_str(" ⭐");
    }
    out.push('\n');
    out
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn run_preference(
    dispatch: &Dispatch,
    json: bool,
    monitor: &str,
    input: &str,
    edit: PreferenceEdit,
) -> anyhow::Result<()> {
    let result = ui_bridge::edit_preference(dispatch, monitor, input, edit).await;
    emit(result, json, render_preference)
}

/// Refreshes every `interval` and prints the menu when its content changed.
async fn run_watch(dispatch: &Dispatch, json: bool, interval: Duration) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(interval);
    let mut last_shown: Option<MenuView> = None;

    info!(?interval, "watching monitors; press Ctrl-C to stop");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                dispatch.reload_config().await?;
                let result = ui_bridge::refresh(dispatch).await;
                let Some(menu) = result.data.as_ref() else {
                    return emit(result, json, MenuView::render_text);
                };
                let changed = last_shown.as_ref().map_or(true, |shown| {
                    shown.quick_switch != menu.quick_switch || shown.sections != menu.sections
                });
                if changed {
                    last_shown = Some(menu.clone());
                    emit(result, json, MenuView::render_text)?;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for Ctrl-C")?;
                info!("received Ctrl-C, stopping");
                return Ok(());
            }
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let native = LinkedNative::acquire_with(cli.native_setup()?)
        .context("acquiring the native control library")?;
    let control = tokio::task::spawn_blocking(move || MonitorControl::start(OwnershipBridge::new(native)))
        .await
        .context("starting monitor control")?;
    info!(monitors = control.snapshot().len(), "monitor control ready");
    let dispatch = AsyncMonitorControl::new(control);
    let json = cli.json;

    match cli.command {
        Command::List => emit(ui_bridge::get_menu(&dispatch).await, json, MenuView::render_text),
        Command::Settings => emit(ui_bridge::get_settings(&dispatch).await, json, |table| {
            table.render_text()
        }),
        Command::Switch { monitor, input } => emit(
            ui_bridge::switch_input(&dispatch, &monitor, &input).await,
            json,
            render_switch,
        ),
        Command::Alias(AliasCommand::Set {
            monitor,
            input,
            label,
        }) => run_preference(&dispatch, json, &monitor, &input, PreferenceEdit::SetAlias(label)).await,
        Command::Alias(AliasCommand::Remove { monitor, input }) => {
            run_preference(&dispatch, json, &monitor, &input, PreferenceEdit::RemoveAlias).await
        }
        Command::Favorite(FavoriteCommand::Add { monitor, input }) => {
            run_preference(&dispatch, json, &monitor, &input, PreferenceEdit::AddFavorite).await
        }
        Command::Favorite(FavoriteCommand::Remove { monitor, input }) => {
            run_preference(&dispatch, json, &monitor, &input, PreferenceEdit::RemoveFavorite).await
        }
        Command::Favorite(FavoriteCommand::Toggle { monitor, input }) => {
            run_preference(&dispatch, json, &monitor, &input, PreferenceEdit::ToggleFavorite).await
        }
        Command::Watch { interval } => {
            run_watch(&dispatch, json, Duration::from_secs(interval.max(1))).await
        }
    }
}
