use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use adbscope_types::FilterField;

use crate::app::FilterPanelState;
use crate::ui::Theme;

/// Filter entry panel with one row per filterable field
pub struct FilterPanel;

impl FilterPanel {
    pub fn render(frame: &mut Frame, area: Rect, panel: &FilterPanelState, error: Option<&str>) {
        let mut lines = Vec::new();

        for (i, (input, field)) in panel.inputs.iter().zip(FilterField::ALL).enumerate() {
            let focused = i == panel.focus;

            let label_style = if focused {
                Theme::text_highlight()
            } else {
                Theme::text_dim()
            };
            let mut spans = vec![Span::styled(
                format!(" {:>8}: ", field.label()),
                label_style,
            )];

            if input.invert {
                spans.push(Span::styled("!", Theme::error()));
                spans.push(Span::styled(" ", Theme::text()));
            }

            spans.push(Span::styled(input.text.clone(), Theme::text()));

            if focused {
                spans.push(Span::styled("█", Style::default().fg(Theme::HIGHLIGHT)));
            }

            lines.push(Line::from(spans));
        }

        lines.push(match error {
            Some(error) => Line::from(Span::styled(format!(" {error}"), Theme::error())),
            None => Line::from(""),
        });
        lines.push(Line::from(Span::styled(
            " [Tab] Next  [Ctrl+t] Invert  [Ctrl+u] Clear  [Enter] Apply  [Esc] Close",
            Theme::text_dim(),
        )));

        let border_style = if error.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Theme::border_focused()
        };

        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Filter ", Theme::title())),
        );

        frame.render_widget(widget, area);
    }
}
