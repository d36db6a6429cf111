//! connview - terminal viewer for captured network connections.
//!
//! Main entry point and event loop for the application.

mod api;
mod app;
mod config;
mod ui;

use anyhow::Context;
use api::ConnectionsClient;
use app::{App, UiMode};
use clap::Parser;
use config::{Config, SHOW_HALF_ENV};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Command line options.
#[derive(Debug, Parser)]
#[command(name = "connview", version, about = "Browse captured network connections")]
struct Cli {
    /// Config file (defaults to <config dir>/connview/config.jsonc)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Capture backend base URL, overrides the config file
    #[arg(long, value_name = "URL")]
    url: Option<String>,
    /// Show half-connections on startup
    #[arg(long)]
    half: bool,
    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    write_config: bool,
}

/// Outcome of handling one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Continue,
    Quit,
}

/// Screen regions for one frame.
#[derive(Debug, Clone, Copy)]
struct Regions {
    controls: Rect,
    list: Rect,
    detail: Option<Rect>,
    status: Rect,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env(std::env::var(SHOW_HALF_ENV).ok().as_deref());
    if let Some(url) = cli.url {
        config.base_url = url;
    }
    if cli.half {
        config.show_half_connections = true;
    }

    if cli.write_config {
        config.save(cli.config.as_deref())?;
        let path = match cli.config {
            Some(path) => path,
            None => Config::default_config_path()?,
        };
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let log_path = config.log_file_path()?;
    init_tracing(&log_path)?;

    let client = ConnectionsClient::new(&config)?;
    tracing::info!(
        base_url = client.base_url(),
        half = config.show_half_connections,
        "starting connview"
    );

    let mut app = App::new(config.show_half_connections);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &client, &config).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Some(task) = app.fetch_task.take() {
        task.abort();
    }
    if let Err(e) = &result {
        tracing::error!(error = %e, "connview exited with error");
    }
    result
}

/// Install the file-backed tracing subscriber.
///
/// # Details
/// The terminal belongs to the UI, so events go to `path`. The filter comes
/// from `RUST_LOG` and defaults to `info`.
fn init_tracing(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Split the frame into controls, list, optional detail pane and status bar.
fn layout(area: Rect, detail_open: bool) -> Regions {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(ui::controls::CONTROLS_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let (list, detail) = if detail_open {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);
        (cols[0], Some(cols[1]))
    } else {
        (rows[1], None)
    };

    Regions {
        controls: rows[0],
        list,
        detail,
        status: rows[2],
    }
}

/// Render the complete UI and return the regions used.
fn render_ui(f: &mut ratatui::Frame, app: &App) -> Regions {
    let regions = layout(f.area(), app.mode == UiMode::Detail);
    ui::render_controls(app, regions.controls, f.buffer_mut());
    ui::render_list(app, regions.list, f.buffer_mut());
    if let Some(detail) = regions.detail {
        ui::render_detail(app, detail, f.buffer_mut());
    }
    ui::render_status(app, regions.status, f.buffer_mut());
    regions
}

/// Main event loop.
///
/// # Details
/// Starts queued fetches, applies finished ones, schedules periodic
/// refreshes, renders, then polls input with a 100 ms timeout.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: &ConnectionsClient,
    config: &Config,
) -> anyhow::Result<()> {
    let refresh_interval = Duration::from_secs(config.refresh_interval_secs);
    let mut last_fetch = Instant::now();
    let mut regions = layout(Rect::default(), false);

    loop {
        if let Some(half) = app.take_fetch_request() {
            app.start_fetch(client, half);
            last_fetch = Instant::now();
        }

        if app.fetch_finished()
            && let Some(task) = app.fetch_task.take()
        {
            match task.await {
                Ok(outcome) => {
                    app.finish_fetch(outcome);
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    tracing::error!(error = %e, "fetch task failed");
                    app.set_status(format!("Fetch task failed: {}", e));
                }
            }
        }

        if app.refresh_due(last_fetch.elapsed(), refresh_interval) {
            app.request_fetch();
        }

        terminal.draw(|f| {
            regions = render_ui(f, app);
        })?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if handle_key_event(app, key) == KeyAction::Quit {
                        break;
                    }
                }
                Event::Mouse(mouse) => handle_mouse_event(mouse, app, regions.list),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Apply a key press to the application state.
fn handle_key_event(app: &mut App, key: KeyEvent) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }
    app.clear_status();

    match app.mode {
        UiMode::List | UiMode::Detail => match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return KeyAction::Quit,
            KeyCode::Esc if app.mode == UiMode::Detail => app.clear_selection(),
            KeyCode::Esc => return KeyAction::Quit,
            KeyCode::Up | KeyCode::Char('k') => app.move_up(),
            KeyCode::Down | KeyCode::Char('j') => app.move_down(),
            KeyCode::Enter => {
                if let Some(conn) = app.select_current() {
                    let message = format!("Selected {}", conn.id);
                    app.set_status(message);
                }
            }
            KeyCode::Char('H') | KeyCode::Char(' ') => app.toggle_half_connections(),
            KeyCode::Char('r') => app.request_fetch(),
            KeyCode::Char('s') => {
                app.cycle_sort_mode();
                app.set_status(format!("Sort: {}", app.sort_mode_name()));
            }
            KeyCode::Char('/') => app.mode = UiMode::Search,
            _ => {}
        },
        UiMode::Search => match key.code {
            KeyCode::Enter | KeyCode::Esc => app.mode = UiMode::List,
            KeyCode::Backspace => app.remove_search_char(),
            KeyCode::Char(c) => app.add_search_char(c),
            _ => {}
        },
    }

    KeyAction::Continue
}

/// Handle mouse events (scroll and click).
///
/// # Details
/// Wheel moves the selection; a left click inside the list selects the
/// connection under the cursor and opens it in the detail pane.
fn handle_mouse_event(mouse: MouseEvent, app: &mut App, list_area: Rect) {
    if app.mode == UiMode::Search {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => app.move_up(),
        MouseEventKind::ScrollDown => app.move_down(),
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(index) = clicked_index(app, list_area, mouse.column, mouse.row) {
                app.select_index(index);
            }
        }
        _ => {}
    }
}

/// Map a click position to an index in the visible list.
fn clicked_index(app: &App, list_area: Rect, column: u16, row: u16) -> Option<usize> {
    let inside = column >= list_area.x
        && column < list_area.x + list_area.width
        && row > list_area.y
        && row < list_area.y + list_area.height.saturating_sub(1);
    if !inside {
        return None;
    }

    let total = app.visible_connections.len();
    let offset = ui::list::scroll_offset(
        app.selected_index.min(total.saturating_sub(1)),
        total,
        ui::list::visible_items(list_area),
    );
    let index = offset + ((row - list_area.y - 1) / ui::list::LINES_PER_ITEM) as usize;
    (index < total).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{Connection, ConnectionStatus};

    fn press(app: &mut App, code: KeyCode) -> KeyAction {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app_with(n: usize) -> App {
        let mut app = App::new(true);
        app.take_fetch_request();
        app.set_connections(
            (0..n)
                .map(|i| {
                    Connection::new(
                        format!("c{}", i),
                        "HTTP",
                        "a",
                        "b",
                        (n - i) as i64,
                        (i % 2 == 1).then_some(ConnectionStatus::RequestOnly),
                    )
                })
                .collect(),
        );
        app
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from(["connview", "--url", "http://capture:1", "--half"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://capture:1"));
        assert!(cli.half);
        assert!(!cli.write_config);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_toggle_key_requeues_fetch() {
        let mut app = app_with(4);
        assert_eq!(press(&mut app, KeyCode::Char('H')), KeyAction::Continue);
        assert!(!app.show_half_connections);
        assert_eq!(app.take_fetch_request(), Some(false));

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.take_fetch_request(), Some(true));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with(1);
        assert_eq!(press(&mut app, KeyCode::Char('q')), KeyAction::Quit);
        assert_eq!(press(&mut app, KeyCode::Esc), KeyAction::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(&mut app, ctrl_c), KeyAction::Quit);
    }

    #[test]
    fn test_enter_opens_detail_and_esc_closes() {
        let mut app = app_with(3);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, UiMode::Detail);
        assert_eq!(app.selected_connection.as_ref().unwrap().id, "c1");
        assert_eq!(press(&mut app, KeyCode::Esc), KeyAction::Continue);
        assert_eq!(app.mode, UiMode::List);
    }

    #[test]
    fn test_search_mode_captures_keys() {
        let mut app = app_with(3);
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(press(&mut app, KeyCode::Char('q')), KeyAction::Continue);
        assert_eq!(app.search_query, "q");
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, UiMode::List);
        assert!(app.search_query.is_empty());
    }

    #[test]
    fn test_key_press_clears_status_message() {
        let mut app = app_with(3);
        app.set_status("Fetching connections...".to_string());
        press(&mut app, KeyCode::Down);
        assert!(app.status_message.is_none());

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.status_message.as_deref(), Some("Sort: Time (oldest)"));
    }

    #[test]
    fn test_refresh_key() {
        let mut app = app_with(1);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.take_fetch_request(), Some(true));
    }

    #[test]
    fn test_clicked_index() {
        let app = app_with(5);
        let area = Rect::new(0, 5, 40, 10);
        assert_eq!(clicked_index(&app, area, 3, 6), Some(0));
        assert_eq!(clicked_index(&app, area, 3, 10), Some(1));
        assert_eq!(clicked_index(&app, area, 3, 5), None);
        assert_eq!(clicked_index(&app, area, 50, 6), None);
    }

    #[test]
    fn test_layout_with_detail() {
        let area = Rect::new(0, 0, 100, 30);
        let closed = layout(area, false);
        assert!(closed.detail.is_none());
        assert_eq!(closed.list.width, 100);

        let open = layout(area, true);
        let detail = open.detail.unwrap();
        assert_eq!(open.list.width + detail.width, 100);
        assert_eq!(open.controls.height, ui::controls::CONTROLS_HEIGHT);
        assert_eq!(open.status.height, 1);
    }
}
