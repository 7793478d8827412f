use chrono::{DateTime, Local};

use adbscope_logs::{FilterSpec, RecordTable};
use adbscope_types::FilterField;

/// Edit buffer for one filter field
#[derive(Clone, Debug, Default)]
pub struct FieldInput {
    pub text: String,
    pub invert: bool,
}

/// State of the filter panel while it is open
#[derive(Debug, Default)]
pub struct FilterPanelState {
    /// Is the panel visible?
    pub open: bool,
    /// Index of the focused field, in `FilterField::ALL` order
    pub focus: usize,
    /// Edit buffers, one per field in `FilterField::ALL` order
    pub inputs: [FieldInput; 5],
}

impl FilterPanelState {
    /// Open the panel with the buffers seeded from the active spec
    pub fn open_with(&mut self, spec: &FilterSpec) {
        for (input, field) in self.inputs.iter_mut().zip(FilterField::ALL) {
            let filter = spec.field(field);
            input.text = filter.pattern.clone();
            input.invert = filter.invert;
        }
        self.focus = 0;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Build a spec from the edit buffers
    pub fn build_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::default();
        for (input, field) in self.inputs.iter().zip(FilterField::ALL) {
            let filter = spec.field_mut(field);
            filter.pattern = input.text.clone();
            filter.invert = input.invert;
        }
        spec
    }

    pub fn focused(&self) -> FilterField {
        FilterField::ALL[self.focus]
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.inputs.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + self.inputs.len() - 1) % self.inputs.len();
    }

    pub fn input_char(&mut self, c: char) {
        self.inputs[self.focus].text.push(c);
    }

    pub fn backspace(&mut self) {
        self.inputs[self.focus].text.pop();
    }

    pub fn clear_focused(&mut self) {
        self.inputs[self.focus].text.clear();
        self.inputs[self.focus].invert = false;
    }

    pub fn toggle_invert(&mut self) {
        self.inputs[self.focus].invert = !self.inputs[self.focus].invert;
    }
}

/// UI-specific transient state
pub struct UiState {
    /// Scroll position (first visible table row)
    pub scroll: usize,
    /// Follow the newest records?
    pub follow: bool,
    /// Is help overlay visible?
    pub help_visible: bool,
    /// Filter panel state
    pub filter_panel: FilterPanelState,
    /// Compile error from the last filter apply, shown inside the panel
    pub filter_error: Option<String>,
    /// Transient message shown in the status bar
    pub status_message: Option<String>,
    /// Column widths from the last autosize (None = defaults)
    pub column_widths: Option<[u16; 9]>,
    /// The logcat stream reached EOF or failed
    pub stream_ended: bool,
    /// When the process table was last refreshed
    pub last_refresh: Option<DateTime<Local>>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            scroll: 0,
            follow: true,
            help_visible: false,
            filter_panel: FilterPanelState::default(),
            filter_error: None,
            status_message: None,
            column_widths: None,
            stream_ended: false,
            last_refresh: None,
        }
    }
}

/// Global application state
pub struct AppState {
    /// Path of the adb binary in use, for the header
    pub adb_path: String,
    /// UI state
    pub ui_state: UiState,
    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new(adb_path: String) -> Self {
        Self {
            adb_path,
            ui_state: UiState::default(),
            should_quit: false,
        }
    }

    /// Show a transient message in the status bar
    pub fn show_message(&mut self, message: String) {
        self.ui_state.status_message = Some(message);
    }

    pub fn dismiss_message(&mut self) {
        self.ui_state.status_message = None;
    }

    /// Open the filter panel seeded from the table's active spec
    pub fn open_filter(&mut self, table: &RecordTable) {
        self.ui_state.filter_error = None;
        self.ui_state.filter_panel.open_with(&table.filter_spec());
    }

    /// Close the panel without applying
    pub fn close_filter(&mut self) {
        self.ui_state.filter_panel.close();
        self.ui_state.filter_error = None;
    }

    /// Apply the panel's spec to the table. On an invalid pattern the panel
    /// stays open with the error shown so the input can be corrected.
    pub fn apply_filter(&mut self, table: &RecordTable) {
        self.ui_state.filter_error = None;
        match table.set_filter(self.ui_state.filter_panel.build_spec()) {
            Ok(()) => {
                self.ui_state.filter_panel.close();
                self.ui_state.scroll = 0;
            }
            Err(e) => {
                self.ui_state.filter_error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use adbscope_logs::{ProcessRegistry, RecordStore, RecordTable};
    use adbscope_types::FilterField;

    use super::*;

    #[test]
    fn panel_buffers_round_trip_through_a_spec() {
        let mut panel = FilterPanelState::default();
        panel.focus = 2; // name
        panel.input_char('a');
        panel.input_char('p');
        panel.input_char('p');
        panel.toggle_invert();

        let spec = panel.build_spec();
        assert_eq!(spec.field(FilterField::Name).pattern, "app");
        assert!(spec.field(FilterField::Name).invert);
        assert!(spec.field(FilterField::Pid).pattern.is_empty());

        let mut reopened = FilterPanelState::default();
        reopened.open_with(&spec);
        assert!(reopened.open);
        assert_eq!(reopened.focus, 0);
        assert_eq!(reopened.inputs[2].text, "app");
        assert!(reopened.inputs[2].invert);
    }

    #[test]
    fn focus_wraps_in_both_directions() {
        let mut panel = FilterPanelState::default();
        panel.prev_field();
        assert_eq!(panel.focused(), FilterField::Tag);
        panel.next_field();
        assert_eq!(panel.focused(), FilterField::Pid);
    }

    #[test]
    fn invalid_pattern_keeps_the_panel_open() {
        let (table, _events) = RecordTable::new(RecordStore::new(), ProcessRegistry::new());
        let mut state = AppState::new("adb".to_string());

        state.open_filter(&table);
        state.ui_state.filter_panel.input_char('[');
        state.apply_filter(&table);

        assert!(state.ui_state.filter_panel.open);
        assert!(state.ui_state.filter_error.is_some());

        state.ui_state.filter_panel.backspace();
        state.apply_filter(&table);

        assert!(!state.ui_state.filter_panel.open);
        assert!(state.ui_state.filter_error.is_none());
    }
}
