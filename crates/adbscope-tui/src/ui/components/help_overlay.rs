use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let area = frame.area();

        // Center the help popup
        let popup_width = 52.min(area.width.saturating_sub(4));
        let popup_height = 26.min(area.height.saturating_sub(4));

        let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
        let y = area.y + (area.height.saturating_sub(popup_height)) / 2;
        let popup_area = Rect::new(x, y, popup_width, popup_height);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Navigation",
                Style::default().fg(Color::Yellow),
            )]),
            Self::key_line("j/↓", "Scroll down"),
            Self::key_line("k/↑", "Scroll up"),
            Self::key_line("Ctrl+d", "Page down"),
            Self::key_line("Ctrl+u", "Page up"),
            Self::key_line("g/Home", "Go to top"),
            Self::key_line("G/End", "Go to bottom"),
            Self::key_line("f", "Toggle follow mode"),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Table",
                Style::default().fg(Color::Yellow),
            )]),
            Self::key_line("a", "Autosize columns"),
            Self::key_line("r", "Refresh process table"),
            Self::key_line("e", "Export visible records"),
            Self::key_line("/", "Open filter panel"),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Filter panel",
                Style::default().fg(Color::Yellow),
            )]),
            Self::key_line("Tab/↓", "Next field"),
            Self::key_line("S-Tab/↑", "Previous field"),
            Self::key_line("Ctrl+t", "Invert field match"),
            Self::key_line("Ctrl+u", "Clear field"),
            Self::key_line("Enter", "Apply"),
            Self::key_line("Esc", "Close without applying"),
            Line::from(""),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>8}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
