//! Terminal user interface for adbscope
//!
//! This crate provides the interactive TUI: application state, keybindings,
//! terminal event handling, and the widgets that render the record table.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, FilterPanelState, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{FilterPanel, HelpOverlay, StatusBar, TABLE_HINTS};
pub use ui::screens::{RecordTableScreen, autosize_columns};
pub use ui::{Layout, Theme};
