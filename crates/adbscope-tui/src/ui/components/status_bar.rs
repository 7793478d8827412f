use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::ui::Theme;

/// Hints for the record table screen
pub const TABLE_HINTS: &[(&str, &str)] = &[
    ("/", "Filter"),
    ("f", "Follow"),
    ("a", "Autosize"),
    ("r", "Refresh ps"),
    ("e", "Export"),
    ("?", "Help"),
    ("q", "Quit"),
];

/// Status bar showing keyboard shortcuts or a transient message
pub struct StatusBar<'a> {
    hints: &'a [(&'a str, &'a str)],
    message: Option<&'a str>,
    right_text: Option<String>,
}

impl<'a> StatusBar<'a> {
    /// Build from (key, description) pairs
    pub fn new(hints: &'a [(&'a str, &'a str)]) -> Self {
        Self {
            hints,
            message: None,
            right_text: None,
        }
    }

    /// Replace the hints with a message for this frame
    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }

    /// Set text to display on the right side
    pub fn right<S: Into<String>>(mut self, text: S) -> Self {
        self.right_text = Some(text.into());
        self
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        buf.set_style(area, Theme::status_bar());

        let line = match self.message {
            Some(message) => Line::from(Span::styled(message, Theme::status_bar_key())),
            None => {
                let mut spans = Vec::new();
                for (i, (key, desc)) in self.hints.iter().enumerate() {
                    if i > 0 {
                        spans.push(Span::styled("  ", Theme::status_bar()));
                    }
                    spans.push(Span::styled(format!("[{key}]"), Theme::status_bar_key()));
                    spans.push(Span::styled(format!(" {desc}"), Theme::status_bar()));
                }
                Line::from(spans)
            }
        };

        let line_width = line.width() as u16;
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));

        // Render right text if it fits next to the hints
        if let Some(right) = self.right_text {
            let right_span = Span::styled(&right, Theme::status_bar());
            let right_x = area.x + area.width.saturating_sub(right.len() as u16 + 2);
            if right_x > area.x + line_width + 2 {
                buf.set_span(right_x, area.y, &right_span, right.len() as u16);
            }
        }
    }
}
