use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use adbscope_logs::RecordTable;
use adbscope_types::{Column, Priority};

use crate::app::AppState;
use crate::ui::components::{FilterPanel, StatusBar, TABLE_HINTS};
use crate::ui::{Layout, Theme};

/// Widest cell per column over the currently visible rows, capped so one
/// long value cannot push the rest of the table off screen
pub fn autosize_columns(table: &RecordTable) -> [u16; 9] {
    const MAX_WIDTH: usize = 48;

    let mut widths = [0usize; 9];
    for (i, column) in Column::ALL.iter().enumerate() {
        widths[i] = column.title().width();
    }
    for row in 0..table.row_count() {
        for (i, column) in Column::ALL.iter().enumerate() {
            if let Some(text) = table.cell(row, *column) {
                widths[i] = widths[i].max(text.width().min(MAX_WIDTH));
            }
        }
    }

    let mut out = [0u16; 9];
    for (i, width) in widths.iter().enumerate() {
        out[i] = *width as u16;
    }
    out
}

fn default_widths() -> [u16; 9] {
    // The message column takes whatever width remains
    [10, 12, 5, 5, 5, 16, 8, 16, 0]
}

/// Safely truncate a string to a maximum byte length, finding the nearest valid UTF-8 boundary
fn safe_truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    // Find the last valid char boundary at or before max_bytes
    let mut pos = max_bytes;
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    &s[..pos]
}

/// Get text style based on record priority
fn priority_text_style(priority: Priority) -> Style {
    match priority {
        Priority::Error | Priority::Fatal => Style::default().fg(Color::Red),
        Priority::Warn => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::White),
    }
}

/// The main screen: header, optional filter panel, record table, status bar
pub struct RecordTableScreen;

impl RecordTableScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, table: &RecordTable, dropped: u64) {
        let (header_area, content, status_area) = Layout::main(frame.area());

        Self::render_header(frame, header_area, state, table);

        let table_area = if state.ui_state.filter_panel.open {
            let (panel_area, table_area) = Layout::with_filter_panel(content);
            FilterPanel::render(
                frame,
                panel_area,
                &state.ui_state.filter_panel,
                state.ui_state.filter_error.as_deref(),
            );
            table_area
        } else {
            content
        };

        Self::render_table(frame, table_area, state, table);
        Self::render_status_bar(frame, status_area, state, table, dropped);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState, table: &RecordTable) {
        let mut spans = vec![
            Span::styled("adbscope", Theme::title()),
            Span::styled(" | ", Theme::text_dim()),
            Span::styled(state.adb_path.clone(), Theme::text()),
            Span::styled(" | ", Theme::text_dim()),
            Span::styled("logcat -b default,events", Theme::text_dim()),
        ];

        if !table.filter_spec().is_empty() {
            spans.push(Span::styled(" | ", Theme::text_dim()));
            spans.push(Span::styled("filtered", Theme::text_highlight()));
        }
        if state.ui_state.stream_ended {
            spans.push(Span::styled(" | ", Theme::text_dim()));
            spans.push(Span::styled("stream ended", Theme::error()));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, area);
    }

    fn render_table(frame: &mut Frame, area: Rect, state: &mut AppState, table: &RecordTable) {
        let total = table.row_count();
        // Borders take two rows, the column headers one more
        let inner_height = area.height.saturating_sub(3) as usize;
        let inner_width = area.width.saturating_sub(2) as usize;

        if state.ui_state.follow {
            state.ui_state.scroll = total.saturating_sub(inner_height);
        }
        let max_scroll = total.saturating_sub(inner_height);
        if state.ui_state.scroll > max_scroll {
            state.ui_state.scroll = max_scroll;
        }

        let widths = state
            .ui_state
            .column_widths
            .unwrap_or_else(default_widths);

        let mut lines = Vec::with_capacity(inner_height + 1);
        lines.push(Self::header_row(&widths));

        let first = state.ui_state.scroll;
        let last = (first + inner_height).min(total);
        for row in first..last {
            lines.push(Self::record_row(table, row, &widths, inner_width));
        }

        let stored = table.store().len();
        let title = if table.filter_spec().is_empty() {
            format!(" Records ({stored}) ")
        } else {
            format!(" Records ({total} of {stored}) ")
        };

        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(title, Theme::title())),
        );
        frame.render_widget(widget, area);
    }

    fn header_row(widths: &[u16; 9]) -> Line<'static> {
        let mut spans = Vec::new();
        for (i, column) in Column::ALL.iter().enumerate() {
            if *column == Column::Message {
                spans.push(Span::styled(
                    column.title().to_string(),
                    Theme::table_header(),
                ));
            } else {
                let width = widths[i] as usize;
                spans.push(Span::styled(
                    format!("{:<width$} ", column.title()),
                    Theme::table_header(),
                ));
            }
        }
        Line::from(spans)
    }

    fn record_row(
        table: &RecordTable,
        row: usize,
        widths: &[u16; 9],
        max_width: usize,
    ) -> Line<'static> {
        let priority = Priority::from_letter(
            table.cell(row, Column::Priority).as_deref().unwrap_or(""),
        );
        let base = priority_text_style(priority);

        let mut spans = Vec::new();
        let mut used = 0usize;
        for (i, column) in Column::ALL.iter().enumerate() {
            let text = table.cell(row, *column).unwrap_or_default();

            if *column == Column::Message {
                let remaining = max_width.saturating_sub(used);
                let message = if text.len() > remaining {
                    format!("{}...", safe_truncate(&text, remaining.saturating_sub(3)))
                } else {
                    text
                };
                spans.push(Span::styled(message, base));
            } else {
                let width = widths[i] as usize;
                let cell = format!("{:<width$} ", safe_truncate(&text, width));
                used += cell.len();
                let style = if *column == Column::Priority {
                    Style::default()
                        .fg(priority.color())
                        .add_modifier(Modifier::BOLD)
                } else {
                    base
                };
                spans.push(Span::styled(cell, style));
            }
        }
        Line::from(spans)
    }

    fn render_status_bar(
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        table: &RecordTable,
        dropped: u64,
    ) {
        let visible = table.row_count();
        let stored = table.store().len();
        let procs = table.registry().len();

        let mut right = format!("{visible}/{stored} records | {procs} procs");
        if let Some(at) = state.ui_state.last_refresh {
            right.push_str(&format!(" | ps {}", at.format("%H:%M:%S")));
        }
        if dropped > 0 {
            right.push_str(&format!(" | {dropped} dropped"));
        }
        right.push_str(if state.ui_state.follow { " ▼" } else { "  " });

        let status = StatusBar::new(TABLE_HINTS)
            .message(state.ui_state.status_message.as_deref())
            .right(right);
        frame.render_widget(status, area);
    }
}
