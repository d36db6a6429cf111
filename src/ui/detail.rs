//! Detail pane for the selected connection.

use crate::api::Connection;
use crate::app::App;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

fn field<'a>(name: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<10}", name), Style::default().fg(Color::Cyan)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

/// Pretty-print a captured payload, or `(missing)` for the absent side.
pub fn format_payload(payload: Option<&serde_json::Value>) -> Vec<String> {
    match payload {
        None | Some(serde_json::Value::Null) => vec!["(missing)".to_string()],
        Some(value) => serde_json::to_string_pretty(value)
            .unwrap_or_else(|_| value.to_string())
            .lines()
            .map(str::to_string)
            .collect(),
    }
}

fn payload_section<'a>(title: &'a str, payload: Option<&serde_json::Value>) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            title,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    lines.extend(
        format_payload(payload)
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(Color::Gray)))),
    );
    lines
}

fn detail_lines(conn: &Connection) -> Vec<Line<'_>> {
    let status = conn.effective_status();
    let mut lines = vec![
        field("ID", conn.id.clone()),
        field("Protocol", conn.protocol.clone()),
        field("Source", conn.source.clone()),
        field("Target", conn.target.clone()),
        field(
            "Time",
            conn.captured_at()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| conn.timestamp.to_string()),
        ),
        field(
            "Status",
            status.label().unwrap_or("Complete").to_string(),
        ),
    ];
    lines.extend(payload_section("Request", conn.request.as_ref()));
    lines.extend(payload_section("Response", conn.response.as_ref()));
    lines
}

/// Render the detail pane.
///
/// # Arguments
/// * `app` - Application state
/// * `area` - Area to render in
/// * `buf` - Buffer to render to
pub fn render_detail(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .title("Connection (Esc to close)")
        .borders(Borders::ALL);

    let lines = match &app.selected_connection {
        Some(conn) => detail_lines(conn),
        None => vec![Line::from(Span::styled(
            "No connection selected",
            Style::default().fg(Color::Gray),
        ))],
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    Widget::render(paragraph, area, buf);
}
