/// All possible actions in the application (command pattern)
#[derive(Clone, Debug)]
pub enum Action {
    // App control
    Quit,
    ToggleHelp,

    // Table navigation
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    ToggleFollow,

    // Table data
    AutosizeColumns,
    RefreshProcesses,
    Export,

    // Filter panel
    OpenFilter,
    CloseFilter,
    ApplyFilter,
    FilterNextField,
    FilterPrevField,
    FilterToggleInvert,
    FilterInput(char),
    FilterBackspace,
    FilterClear,

    // Status messages
    ShowMessage(String),
    DismissMessage,

    // Tick (for periodic updates)
    Tick,

    // Render request
    Render,
}
