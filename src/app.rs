//! Application state management.
//!
//! Manages the connection list, selection, search, half-connection toggle
//! and the in-flight fetch.

use crate::api::{ApiError, Connection, ConnectionStatus, ConnectionsClient};
use std::cmp;
use std::time::Duration;
use tokio::task::JoinHandle;

/// UI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    /// Normal list view
    List,
    /// Search mode
    Search,
    /// Detail pane for the selected connection
    Detail,
}

/// Sort mode for the connection list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Newest capture first
    Newest,
    /// Oldest capture first
    Oldest,
    /// Protocol name (alphabetical)
    Protocol,
    /// Source address (alphabetical)
    Source,
}

/// Result of a finished fetch, tagged with the flag it was issued for.
#[derive(Debug)]
pub struct FetchOutcome {
    /// `half` parameter the request was sent with
    pub half: bool,
    /// Fetched connections or the failure
    pub result: Result<Vec<Connection>, ApiError>,
}

/// Counts of fetched connections by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub complete: usize,
    pub request_only: usize,
    pub response_only: usize,
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    /// All connections from the last applied fetch
    pub all_connections: Vec<Connection>,
    /// Connections after toggle, search and sort
    pub visible_connections: Vec<Connection>,
    /// Currently selected index (in visible_connections)
    pub selected_index: usize,
    /// Connection forwarded to the detail pane
    pub selected_connection: Option<Connection>,
    /// Search query string
    pub search_query: String,
    /// Current UI mode
    pub mode: UiMode,
    /// Whether half-connections are shown
    pub show_half_connections: bool,
    /// Current sort mode
    pub sort_mode: SortMode,
    /// Status message to display
    pub status_message: Option<String>,
    /// Fetch requested but not started yet, with its `half` flag
    pub pending_fetch: Option<bool>,
    /// In-flight fetch task
    pub fetch_task: Option<JoinHandle<FetchOutcome>>,
}

impl App {
    /// Create a new application state.
    ///
    /// # Arguments
    /// * `show_half_connections` - Initial toggle state
    ///
    /// # Details
    /// An initial fetch is queued for the given toggle state.
    pub fn new(show_half_connections: bool) -> Self {
        Self {
            all_connections: Vec::new(),
            visible_connections: Vec::new(),
            selected_index: 0,
            selected_connection: None,
            search_query: String::new(),
            mode: UiMode::List,
            show_half_connections,
            sort_mode: SortMode::Newest,
            status_message: None,
            pending_fetch: Some(show_half_connections),
            fetch_task: None,
        }
    }

    /// Replace the connection list and apply current filters.
    pub fn set_connections(&mut self, connections: Vec<Connection>) {
        self.all_connections = connections;
        self.apply_filters();
    }

    /// Apply toggle, search query and sort to the connection list.
    ///
    /// # Details
    /// Half-connections are hidden while the toggle is off, even if the
    /// backend returned some. The search matches id, protocol, source and
    /// target case-insensitively.
    pub fn apply_filters(&mut self) {
        let query = self.search_query.to_lowercase();
        let mut visible: Vec<Connection> = self
            .all_connections
            .iter()
            .filter(|conn| self.show_half_connections || !conn.is_half())
            .filter(|conn| {
                query.is_empty()
                    || conn.id.to_lowercase().contains(&query)
                    || conn.protocol.to_lowercase().contains(&query)
                    || conn.source.to_lowercase().contains(&query)
                    || conn.target.to_lowercase().contains(&query)
            })
            .cloned()
            .collect();

        self.apply_sorting(&mut visible);

        self.visible_connections = visible;
        self.selected_index = cmp::min(
            self.selected_index,
            self.visible_connections.len().saturating_sub(1),
        );
        self.refresh_selected_connection();
    }

    fn apply_sorting(&self, connections: &mut [Connection]) {
        match self.sort_mode {
            SortMode::Newest => connections.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            SortMode::Oldest => connections.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            SortMode::Protocol => connections.sort_by(|a, b| a.protocol.cmp(&b.protocol)),
            SortMode::Source => connections.sort_by(|a, b| a.source.cmp(&b.source)),
        }
    }

    /// Cycle to next sort mode: Newest -> Oldest -> Protocol -> Source -> Newest.
    pub fn cycle_sort_mode(&mut self) {
        self.sort_mode = match self.sort_mode {
            SortMode::Newest => SortMode::Oldest,
            SortMode::Oldest => SortMode::Protocol,
            SortMode::Protocol => SortMode::Source,
            SortMode::Source => SortMode::Newest,
        };
        self.apply_filters();
    }

    /// Get current sort mode as a string.
    pub fn sort_mode_name(&self) -> &str {
        match self.sort_mode {
            SortMode::Newest => "Time (newest)",
            SortMode::Oldest => "Time (oldest)",
            SortMode::Protocol => "Protocol (A-Z)",
            SortMode::Source => "Source (A-Z)",
        }
    }

    /// Set the half-connection toggle.
    ///
    /// # Details
    /// A change re-applies filters and queues a fetch with the new flag.
    /// Setting the current value again does nothing.
    pub fn set_show_half_connections(&mut self, show: bool) {
        if self.show_half_connections == show {
            return;
        }
        self.show_half_connections = show;
        self.apply_filters();
        self.request_fetch();
        self.set_status(format!(
            "Half-connections {}",
            if show { "shown" } else { "hidden" }
        ));
    }

    /// Flip the half-connection toggle.
    pub fn toggle_half_connections(&mut self) {
        self.set_show_half_connections(!self.show_half_connections);
    }

    /// Queue a fetch for the current toggle state.
    pub fn request_fetch(&mut self) {
        self.pending_fetch = Some(self.show_half_connections);
    }

    /// Take the queued fetch flag, if any.
    pub fn take_fetch_request(&mut self) -> Option<bool> {
        self.pending_fetch.take()
    }

    /// Spawn a fetch on the runtime.
    ///
    /// # Arguments
    /// * `client` - Backend client
    /// * `half` - `half` parameter for the request
    ///
    /// # Details
    /// Aborts a fetch that is still in flight, so only the latest request
    /// can deliver a result.
    pub fn start_fetch(&mut self, client: &ConnectionsClient, half: bool) {
        if let Some(task) = self.fetch_task.take() {
            task.abort();
            tracing::debug!("aborted in-flight fetch");
        }
        let client = client.clone();
        self.fetch_task = Some(tokio::spawn(async move {
            let result = client.fetch_connections(half).await;
            FetchOutcome { half, result }
        }));
        self.set_status("Fetching connections...".to_string());
    }

    /// Whether the in-flight fetch has completed.
    pub fn fetch_finished(&self) -> bool {
        self.fetch_task
            .as_ref()
            .is_some_and(|task| task.is_finished())
    }

    /// Apply a finished fetch.
    ///
    /// # Returns
    /// * `bool` - True if the outcome was applied
    ///
    /// # Details
    /// Outcomes issued for a toggle state other than the current one are
    /// discarded. Failures keep the previous list and report the error.
    pub fn finish_fetch(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.half != self.show_half_connections {
            tracing::debug!(half = outcome.half, "discarding stale fetch result");
            return false;
        }
        match outcome.result {
            Ok(connections) => {
                tracing::info!(count = connections.len(), half = outcome.half, "loaded connections");
                self.set_connections(connections);
                self.set_status(format!(
                    "Loaded {} connections ({} shown)",
                    self.all_connections.len(),
                    self.visible_connections.len()
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch connections");
                self.set_status(format!("Error fetching connections: {}", e));
            }
        }
        true
    }

    /// Keep the detail pane in sync with the visible list.
    ///
    /// # Details
    /// A selection that is no longer visible (hidden by the toggle, the
    /// search or a refetch) is dropped and the detail pane closes.
    fn refresh_selected_connection(&mut self) {
        if let Some(selected) = &self.selected_connection {
            self.selected_connection = self
                .visible_connections
                .iter()
                .find(|conn| conn.id == selected.id)
                .cloned();
            if self.selected_connection.is_none() && self.mode == UiMode::Detail {
                self.mode = UiMode::List;
            }
        }
    }

    /// Whether a periodic refresh should be queued.
    ///
    /// # Arguments
    /// * `elapsed` - Time since the last fetch started
    /// * `interval` - Refresh interval (zero disables)
    pub fn refresh_due(&self, elapsed: Duration, interval: Duration) -> bool {
        !interval.is_zero()
            && self.fetch_task.is_none()
            && self.pending_fetch.is_none()
            && elapsed >= interval
    }

    /// Counts of all fetched connections by status.
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for conn in &self.all_connections {
            match conn.effective_status() {
                ConnectionStatus::Complete => counts.complete += 1,
                ConnectionStatus::RequestOnly => counts.request_only += 1,
                ConnectionStatus::ResponseOnly => counts.response_only += 1,
            }
        }
        counts
    }

    /// Move selection up, wrapping to bottom if at top.
    pub fn move_up(&mut self) {
        let len = self.visible_connections.len();
        if len == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = len - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Move selection down, wrapping to top if at bottom.
    pub fn move_down(&mut self) {
        let len = self.visible_connections.len();
        if len == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % len;
    }

    /// Get the connection under the cursor.
    pub fn highlighted_connection(&self) -> Option<&Connection> {
        self.visible_connections.get(self.selected_index)
    }

    /// Forward the highlighted connection to the detail pane.
    ///
    /// # Returns
    /// * `Option<&Connection>` - The selected connection, if the list is not empty
    pub fn select_current(&mut self) -> Option<&Connection> {
        let conn = self.highlighted_connection()?.clone();
        tracing::debug!(id = %conn.id, "selected connection");
        self.selected_connection = Some(conn);
        self.mode = UiMode::Detail;
        self.selected_connection.as_ref()
    }

    /// Select the connection at a visible index.
    pub fn select_index(&mut self, index: usize) -> Option<&Connection> {
        if index >= self.visible_connections.len() {
            return None;
        }
        self.selected_index = index;
        self.select_current()
    }

    /// Close the detail pane.
    pub fn clear_selection(&mut self) {
        self.selected_connection = None;
        self.mode = UiMode::List;
    }

    /// Add a character to the search query (search mode only).
    pub fn add_search_char(&mut self, ch: char) {
        if self.mode == UiMode::Search {
            self.search_query.push(ch);
            self.apply_filters();
        }
    }

    /// Remove last character from search query (search mode only).
    pub fn remove_search_char(&mut self) {
        if self.mode == UiMode::Search {
            self.search_query.pop();
            self.apply_filters();
        }
    }

    /// Set status message.
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    /// Clear status message so the key help shows again.
    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}
