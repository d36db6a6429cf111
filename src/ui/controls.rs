//! Controls widget rendering.
//!
//! Displays the half-connection toggle, search input and sort mode.

use crate::app::{App, UiMode};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Label of the half-connection toggle.
pub const TOGGLE_LABEL: &str = "Show Half-Connections";

/// Help text shown under the toggle.
pub const TOGGLE_TOOLTIP: &str =
    "Display incomplete transactions where either the request or response is missing";

/// Height of the controls widget including borders.
pub const CONTROLS_HEIGHT: u16 = 5;

/// Render the controls widget.
///
/// # Arguments
/// * `app` - Application state
/// * `area` - Area to render in
/// * `buf` - Buffer to render to
///
/// # Details
/// Line 1 is a checkbox reflecting `show_half_connections`, line 2 the
/// tooltip, line 3 the search prompt and sort mode. The block is
/// highlighted while search mode is active.
pub fn render_controls(app: &App, area: Rect, buf: &mut Buffer) {
    let searching = app.mode == UiMode::Search;

    let checkbox = if app.show_half_connections { "[x] " } else { "[ ] " };
    let toggle_line = Line::from(vec![
        Span::styled(
            checkbox,
            Style::default()
                .fg(if app.show_half_connections {
                    Color::Green
                } else {
                    Color::Gray
                })
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(TOGGLE_LABEL, Style::default().fg(Color::White)),
        Span::styled("  (press 'H')", Style::default().fg(Color::DarkGray)),
    ]);

    let tooltip_line = Line::from(Span::styled(
        format!("    {}", TOGGLE_TOOLTIP),
        Style::default().fg(Color::DarkGray),
    ));

    let prompt = if searching { "Search: " } else { "Search (press '/'): " };
    let search_line = Line::from(vec![
        Span::styled(prompt, Style::default().fg(Color::Yellow)),
        Span::styled(
            &app.search_query,
            Style::default().fg(if searching { Color::White } else { Color::Gray }),
        ),
        Span::styled(
            if searching { "_" } else { "" },
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("   "),
        Span::styled("Sort: ", Style::default().fg(Color::Cyan)),
        Span::styled(app.sort_mode_name(), Style::default().fg(Color::Magenta)),
    ]);

    let paragraph = Paragraph::new(vec![toggle_line, tooltip_line, search_line]).block(
        Block::default()
            .title("Connections")
            .borders(Borders::ALL)
            .style(if searching {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            }),
    );

    Widget::render(paragraph, area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::buffer_text;

    fn render(app: &App) -> String {
        let mut buf = Buffer::empty(Rect::new(0, 0, 100, CONTROLS_HEIGHT));
        render_controls(app, buf.area, &mut buf);
        buffer_text(&buf)
    }

    #[test]
    fn test_checkbox_reflects_toggle() {
        let mut app = App::new(false);
        let text = render(&app);
        assert!(text.contains("[ ] Show Half-Connections"));
        assert!(text.contains(TOGGLE_TOOLTIP));

        app.toggle_half_connections();
        let text = render(&app);
        assert!(text.contains("[x] Show Half-Connections"));
    }

    #[test]
    fn test_search_prompt() {
        let mut app = App::new(false);
        app.mode = UiMode::Search;
        app.add_search_char('h');
        let text = render(&app);
        assert!(text.contains("Search: h_"));
        assert!(text.contains("Sort: Time (newest)"));
    }
}
