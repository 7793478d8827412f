mod filter_panel;
mod help_overlay;
mod status_bar;

pub use filter_panel::FilterPanel;
pub use help_overlay::HelpOverlay;
pub use status_bar::{StatusBar, TABLE_HINTS};
