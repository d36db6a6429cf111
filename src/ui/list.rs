//! Connection list widget rendering.
//!
//! Displays a scrollable list of connections with selection highlighting
//! and status-dependent styling.

use crate::api::Connection;
use crate::app::App;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};

/// Rows used by one connection (header, addresses, id, separator).
pub const LINES_PER_ITEM: u16 = 4;

/// Style for a list item derived from its display classes.
///
/// # Details
/// `half-connection` dims the item; `request_only` and `response_only`
/// pick the accent colour.
pub fn class_style(classes: &[&str]) -> Style {
    classes
        .iter()
        .fold(Style::default(), |style, class| match *class {
            "half-connection" => style.add_modifier(Modifier::DIM),
            "request_only" => style.fg(Color::Yellow),
            "response_only" => style.fg(Color::Magenta),
            _ => style,
        })
}

/// Index of the first visible item so the selection stays centered.
pub fn scroll_offset(selected_index: usize, total: usize, visible: usize) -> usize {
    let center_offset = visible / 2;
    let offset = selected_index.saturating_sub(center_offset);
    offset.min(total.saturating_sub(visible))
}

/// Number of items that fit in a list area.
pub fn visible_items(area: Rect) -> usize {
    (area.height.saturating_sub(2) / LINES_PER_ITEM).max(1) as usize
}

fn connection_item<'a>(conn: &'a Connection, is_selected: bool, separator: &str) -> ListItem<'a> {
    let accent = class_style(&conn.class_names());

    let mut header = vec![
        Span::styled(
            conn.protocol.as_str(),
            Style::default()
                .fg(if is_selected { Color::Yellow } else { Color::Cyan })
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(conn.format_timestamp(), Style::default().fg(Color::Gray)),
    ];
    if let Some(label) = conn.effective_status().label() {
        header.push(Span::raw("  "));
        header.push(Span::styled(
            format!("[{}]", label),
            accent.add_modifier(Modifier::BOLD),
        ));
    }

    let addresses = Line::from(vec![
        Span::styled(conn.source.as_str(), accent),
        Span::styled(" → ", Style::default().fg(Color::DarkGray)),
        Span::styled(conn.target.as_str(), accent),
    ]);

    let id = Line::from(Span::styled(
        format!("id: {}", conn.id),
        Style::default().fg(Color::DarkGray),
    ));

    let separator = Line::from(Span::styled(
        separator.to_string(),
        Style::default().fg(if is_selected {
            Color::Blue
        } else {
            Color::DarkGray
        }),
    ));

    ListItem::new(vec![Line::from(header), addresses, id, separator])
}

/// Render the connection list widget.
///
/// # Arguments
/// * `app` - Application state
/// * `area` - Area to render in
/// * `buf` - Buffer to render to
///
/// # Details
/// Each connection takes [`LINES_PER_ITEM`] rows: protocol, time and
/// status label; `source → target`; id; separator. Only the visible window
/// around the selection is built.
pub fn render_list(app: &App, area: Rect, buf: &mut Buffer) {
    let current_list = &app.visible_connections;
    let title = format!(
        "Connections ({}/{})",
        current_list.len(),
        app.all_connections.len()
    );

    if current_list.is_empty() {
        let message = if app.fetch_task.is_some() {
            "Loading connections..."
        } else {
            "No connections to display"
        };
        let list = List::new(vec![ListItem::new(message)])
            .block(Block::default().title(title).borders(Borders::ALL));
        Widget::render(list, area, buf);
        return;
    }

    let selected_index = app.selected_index.min(current_list.len().saturating_sub(1));
    let separator_line = "─".repeat(area.width.saturating_sub(2).max(10) as usize);

    let visible = visible_items(area);
    let offset = scroll_offset(selected_index, current_list.len(), visible);
    let end = (offset + visible).min(current_list.len());

    let items: Vec<ListItem> = current_list[offset..end]
        .iter()
        .enumerate()
        .map(|(i, conn)| connection_item(conn, offset + i == selected_index, &separator_line))
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(selected_index - offset));

    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD));

    StatefulWidget::render(list, area, buf, &mut list_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ConnectionStatus;
    use crate::ui::buffer_text;

    fn render(app: &App, height: u16) -> String {
        let mut buf = Buffer::empty(Rect::new(0, 0, 60, height));
        render_list(app, buf.area, &mut buf);
        buffer_text(&buf)
    }

    fn sample_app() -> App {
        let mut app = App::new(true);
        app.set_connections(vec![
            Connection::new("c1", "HTTP", "10.0.0.1:5000", "10.0.0.2:80", 200, None),
            Connection::new(
                "c2",
                "gRPC",
                "10.0.0.3:6000",
                "10.0.0.4:443",
                100,
                Some(ConnectionStatus::RequestOnly),
            ),
        ]);
        app
    }

    #[test]
    fn test_request_only_renders_label() {
        let text = render(&sample_app(), 12);
        assert!(text.contains("Connections (2/2)"));
        assert!(text.contains("[Request Only]"));
        assert!(text.contains("10.0.0.3:6000 → 10.0.0.4:443"));
        assert!(text.contains("id: c2"));
        assert!(!text.contains("Response Only"));
    }

    #[test]
    fn test_half_hidden_not_rendered() {
        let mut app = sample_app();
        app.set_show_half_connections(false);
        let text = render(&app, 12);
        assert!(text.contains("Connections (1/2)"));
        assert!(!text.contains("Request Only"));
        assert!(text.contains("id: c1"));
    }

    #[test]
    fn test_empty_list_message() {
        let app = App::new(false);
        let text = render(&app, 6);
        assert!(text.contains("No connections to display"));
    }

    #[test]
    fn test_class_style() {
        let complete = Connection::new("a", "HTTP", "s", "t", 0, None);
        assert_eq!(class_style(&complete.class_names()), Style::default());

        let half = Connection::new("b", "HTTP", "s", "t", 0, Some(ConnectionStatus::ResponseOnly));
        let style = class_style(&half.class_names());
        assert_eq!(style.fg, Some(Color::Magenta));
        assert!(style.add_modifier.contains(Modifier::DIM));
    }

    #[test]
    fn test_scroll_offset_keeps_selection_centered() {
        assert_eq!(scroll_offset(0, 20, 5), 0);
        assert_eq!(scroll_offset(10, 20, 5), 8);
        assert_eq!(scroll_offset(19, 20, 5), 15);
        assert_eq!(scroll_offset(3, 2, 5), 0);
    }
}
