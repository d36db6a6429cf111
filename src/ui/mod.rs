//! UI components module.
//!
//! Contains ratatui widgets for displaying the application interface.

pub mod controls;
pub mod detail;
pub mod list;
pub mod status;

pub use controls::render_controls;
pub use detail::render_detail;
pub use list::render_list;
pub use status::render_status;

/// Flatten a buffer into newline separated rows of text.
#[cfg(test)]
pub(crate) fn buffer_text(buf: &ratatui::buffer::Buffer) -> String {
    let area = buf.area;
    let mut text = String::new();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            text.push_str(buf[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}
