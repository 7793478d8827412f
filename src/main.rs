use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use adbscope_adb::AdbBridge;
use adbscope_logs::{
    ProcessLookup, ProcessRegistry, RecordStore, RecordTable, RefreshHandle, StreamIngestor,
    ViewEvent, spawn_refresher,
};
use adbscope_tui::{
    Action, AppState, Event, EventHandler, HelpOverlay, KeyBindings, KeyContext,
    RecordTableScreen, Tui, autosize_columns,
};

/// Rows jumped by one page up/down
const PAGE_JUMP: usize = 20;

/// Adbscope - A terminal UI for viewing Android logcat streams
#[derive(Parser, Debug)]
#[command(name = "adbscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the adb binary (defaults to $ANDROID_SDK_ROOT/platform-tools/adb)
    #[arg(long, value_name = "PATH")]
    adb: Option<PathBuf>,

    /// UI tick interval in milliseconds
    #[arg(long, default_value = "100")]
    tick_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for debugging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Run the application
    let result = run_app(args).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run_app(args: Args) -> Result<()> {
    let bridge = match args.adb {
        Some(path) => AdbBridge::with_adb(path),
        None => AdbBridge::from_env()?,
    };

    let mut logcat = bridge.spawn_logcat()?;
    let reader = logcat
        .take_stdout()
        .context("logcat stdout is not piped")?;

    let cancel = CancellationToken::new();

    // Shared stores and the filtered view over them
    let registry = ProcessRegistry::new();
    let (table, mut view_rx) = RecordTable::new(RecordStore::new(), registry.clone());

    // Background ps refresher; a completed snapshot re-resolves visible names
    let (refresh_done_tx, mut refresh_done_rx) = mpsc::unbounded_channel::<()>();
    let refresh = {
        let table = table.clone();
        spawn_refresher(
            registry,
            Arc::new(bridge.process_table()),
            cancel.clone(),
            move || {
                table.invalidate();
                let _ = refresh_done_tx.send(());
            },
        )
    };

    // Ingest the logcat stream
    let ingestor = StreamIngestor::new(table.clone(), refresh.clone());
    let dropped = ingestor.dropped_counter();
    tokio::spawn(ingestor.run(reader, cancel.clone()));

    // Seed the process table before the first records need names
    refresh.request(Vec::new());

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let mut state = AppState::new(bridge.adb_path().display().to_string());

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(args.tick_ms));
    let keybindings = KeyBindings::new();

    loop {
        let dropped_count = dropped.load(Ordering::Relaxed);
        tui.draw(|frame| {
            RecordTableScreen::render(frame, &mut state, &table, dropped_count);
            if state.ui_state.help_visible {
                HelpOverlay::render(frame);
            }
        })?;

        tokio::select! {
            Some(event) = events.next() => match event {
                Event::Key(key) => {
                    let action = if state.ui_state.filter_panel.open {
                        keybindings.get_filter_input_action(&key)
                    } else {
                        keybindings.get_action(KeyContext::Table, &key)
                    };
                    if let Some(action) = action {
                        let _ = action_tx.send(action);
                    }
                }
                Event::Tick | Event::Resize(_, _) => {}
                Event::Error(e) => {
                    let _ = action_tx.send(Action::ShowMessage(format!("Input error: {e}")));
                }
            },

            Some(event) = view_rx.recv() => {
                // Drain whatever else arrived so one redraw covers the batch
                handle_view_event(&mut state, event);
                while let Ok(event) = view_rx.try_recv() {
                    handle_view_event(&mut state, event);
                }
            }

            Some(()) = refresh_done_rx.recv() => {
                state.ui_state.last_refresh = Some(chrono::Local::now());
            }

            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &table, &refresh, action);
            }
        }

        if state.should_quit {
            break;
        }
    }

    // Cleanup
    cancel.cancel();
    logcat.terminate().await;
    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn handle_view_event(state: &mut AppState, event: ViewEvent) {
    if event == ViewEvent::StreamEnded {
        state.ui_state.stream_ended = true;
        state.show_message("logcat stream ended".to_string());
    }
}

fn handle_action(
    state: &mut AppState,
    table: &RecordTable,
    refresh: &RefreshHandle,
    action: Action,
) {
    match action {
        Action::Quit => state.should_quit = true,
        Action::ToggleHelp => state.ui_state.help_visible = !state.ui_state.help_visible,

        // Scrolling up detaches from the stream tail; the render pass clamps
        // whatever remains to the last page
        Action::ScrollUp(n) => {
            state.ui_state.follow = false;
            state.ui_state.scroll = state.ui_state.scroll.saturating_sub(n);
        }
        Action::ScrollDown(n) => {
            state.ui_state.scroll = state.ui_state.scroll.saturating_add(n);
        }
        Action::PageUp => {
            state.ui_state.follow = false;
            state.ui_state.scroll = state.ui_state.scroll.saturating_sub(PAGE_JUMP);
        }
        Action::PageDown => {
            state.ui_state.scroll = state.ui_state.scroll.saturating_add(PAGE_JUMP);
        }
        Action::ScrollToTop => {
            state.ui_state.follow = false;
            state.ui_state.scroll = 0;
        }
        Action::ScrollToBottom => {
            state.ui_state.scroll = usize::MAX;
        }
        Action::ToggleFollow => state.ui_state.follow = !state.ui_state.follow,

        Action::AutosizeColumns => {
            state.ui_state.column_widths = Some(autosize_columns(table));
        }
        Action::RefreshProcesses => refresh.request(Vec::new()),
        Action::Export => {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            let filename = format!("adbscope_{timestamp}.log");
            match export_visible(&filename, table) {
                Ok(count) => {
                    state.show_message(format!("Exported {count} records to {filename}"));
                }
                Err(e) => state.show_message(format!("Export failed: {e:#}")),
            }
        }

        Action::OpenFilter => state.open_filter(table),
        Action::CloseFilter => state.close_filter(),
        Action::ApplyFilter => state.apply_filter(table),
        Action::FilterNextField => state.ui_state.filter_panel.next_field(),
        Action::FilterPrevField => state.ui_state.filter_panel.prev_field(),
        Action::FilterToggleInvert => state.ui_state.filter_panel.toggle_invert(),
        Action::FilterInput(c) => state.ui_state.filter_panel.input_char(c),
        Action::FilterBackspace => state.ui_state.filter_panel.backspace(),
        Action::FilterClear => state.ui_state.filter_panel.clear_focused(),

        Action::ShowMessage(message) => state.show_message(message),
        Action::DismissMessage => state.dismiss_message(),

        Action::Tick | Action::Render => {}
    }
}

/// Write the visible rows as plain text, one record per line
fn export_visible(filename: &str, table: &RecordTable) -> Result<usize> {
    let mut file = File::create(filename)?;
    let registry = table.registry();

    let mut count = 0;
    while let Some(record) = table.record_at(count) {
        writeln!(
            file,
            "{} {} {} {} {} {} {} {}: {}",
            record.date(),
            record.time(),
            record.pid_text(),
            record.tid(),
            registry.lookup_parent_id(record.pid()),
            registry.lookup_name(record.pid()),
            record.priority(),
            record.tag(),
            record.message(),
        )?;
        count += 1;
    }
    Ok(count)
}
