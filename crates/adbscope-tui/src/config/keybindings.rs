use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    Table,
    FilterPanel,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Record table bindings - less-like navigation
        let mut table = HashMap::new();
        // Line navigation
        table.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        table.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        table.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        table.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        // Page navigation (less-style)
        table.insert(KeyBinding::ctrl(KeyCode::Char('f')), Action::PageDown);
        table.insert(KeyBinding::ctrl(KeyCode::Char('b')), Action::PageUp);
        table.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        table.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        table.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        table.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        // Top/bottom navigation (less-style)
        table.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        table.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        table.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        table.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        table.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleFollow);
        table.insert(KeyBinding::new(KeyCode::Char('a')), Action::AutosizeColumns);
        table.insert(KeyBinding::new(KeyCode::Char('r')), Action::RefreshProcesses);
        table.insert(KeyBinding::new(KeyCode::Char('e')), Action::Export);
        table.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenFilter);
        table.insert(KeyBinding::new(KeyCode::Esc), Action::DismissMessage);
        bindings.insert(KeyContext::Table, table);

        // Filter panel bindings (when the panel is open)
        let mut filter_panel = HashMap::new();
        filter_panel.insert(KeyBinding::new(KeyCode::Tab), Action::FilterNextField);
        filter_panel.insert(KeyBinding::new(KeyCode::Down), Action::FilterNextField);
        filter_panel.insert(KeyBinding::shift(KeyCode::BackTab), Action::FilterPrevField);
        filter_panel.insert(KeyBinding::new(KeyCode::BackTab), Action::FilterPrevField);
        filter_panel.insert(KeyBinding::new(KeyCode::Up), Action::FilterPrevField);
        filter_panel.insert(KeyBinding::ctrl(KeyCode::Char('t')), Action::FilterToggleInvert);
        filter_panel.insert(KeyBinding::new(KeyCode::Enter), Action::ApplyFilter);
        filter_panel.insert(KeyBinding::new(KeyCode::Esc), Action::CloseFilter);
        filter_panel.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::FilterClear);
        filter_panel.insert(KeyBinding::new(KeyCode::Backspace), Action::FilterBackspace);
        filter_panel.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::CloseFilter);
        bindings.insert(KeyContext::FilterPanel, filter_panel);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(context_bindings) = self.bindings.get(&context) {
            if let Some(action) = context_bindings.get(&binding) {
                return Some(action.clone());
            }
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event while the filter panel is open
    /// Returns Some(Action) for special keys, None for keys without meaning
    pub fn get_filter_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // Check panel bindings first
        if let Some(panel_bindings) = self.bindings.get(&KeyContext::FilterPanel) {
            if let Some(action) = panel_bindings.get(&binding) {
                return Some(action.clone());
            }
        }

        // For regular characters, return FilterInput action
        if let KeyCode::Char(c) = key.code {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                return Some(Action::FilterInput(c));
            }
        }

        None
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
