//! Status bar rendering.

use crate::app::{App, UiMode};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Key help for the current mode.
pub fn key_help(mode: UiMode) -> &'static str {
    match mode {
        UiMode::List => {
            "q quit, j/k move, Enter select, H half-connections, r refresh, s sort, / search"
        }
        UiMode::Search => "type to filter, Enter/Esc done",
        UiMode::Detail => "Esc close, j/k move, Enter select, H half-connections, r refresh",
    }
}

/// Render the one-line status bar.
///
/// # Details
/// Shows the status message (or key help when there is none) followed by
/// the per-status counts of the last fetch.
pub fn render_status(app: &App, area: Rect, buf: &mut Buffer) {
    let counts = app.counts();
    let message = app
        .status_message
        .as_deref()
        .unwrap_or_else(|| key_help(app.mode));

    let line = Line::from(vec![
        Span::styled(message, Style::default().fg(Color::White)),
        Span::styled(
            format!(
                "  | complete {} · request-only {} · response-only {}",
                counts.complete, counts.request_only, counts.response_only
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    Widget::render(Paragraph::new(line), area, buf);
}
