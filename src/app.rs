use crate::config::Config;
use crate::tmdb::{Endpoint, FetchError, Movie, MovieSource, TmdbClient};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Input mode for the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Result of one fetch, handed back to the event loop once it settles.
#[derive(Debug)]
pub struct FetchOutcome {
    pub id: u64,
    pub endpoint: Endpoint,
    pub result: Result<Vec<Movie>, FetchError>,
}

/// Header, search box, status line and grid borders.
pub const GRID_OVERHEAD: u16 = 9;
/// Rows taken by one card, borders included.
pub const CARD_HEIGHT: u16 = 9;

/// Grid columns for a terminal width, mirroring small/medium/large breakpoints.
pub fn columns_for_width(width: u16) -> usize {
    match width {
        0..80 => 1,
        80..120 => 2,
        _ => 3,
    }
}

/// Main application state.
pub struct App<S: MovieSource = TmdbClient> {
    source: Arc<S>,
    pub config: Config,
    outcome_tx: UnboundedSender<FetchOutcome>,
    outcome_rx: UnboundedReceiver<FetchOutcome>,
    initialized: bool,
    next_fetch_id: u64,
    pub in_flight: usize,

    pub movies: Vec<Movie>,
    pub loading: bool,
    pub error: Option<String>,
    pub query: String,

    pub should_quit: bool,
    pub show_help: bool,
    pub input_mode: InputMode,

    // Grid view state
    pub selected: usize,
    pub grid_columns: usize,
    pub page_rows: usize,

    // Status message
    pub status_msg: String,
}

impl<S: MovieSource> App<S> {
    pub fn new(source: S, config: Config) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            source: Arc::new(source),
            config,
            outcome_tx,
            outcome_rx,
            initialized: false,
            next_fetch_id: 0,
            in_flight: 0,

            movies: Vec::new(),
            loading: true,
            error: None,
            query: String::new(),

            should_quit: false,
            show_help: false,
            input_mode: InputMode::Normal,

            selected: 0,
            grid_columns: 1,
            page_rows: 1,

            status_msg: "Loading popular movies...".to_string(),
        }
    }

    /// Kick off the initial unfiltered listing. Only the first call fetches.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.loading = true;
        self.fetch_movies("");
    }

    /// Start a fetch for `query` on the runtime and return immediately.
    ///
    /// Overlapping fetches are not cancelled: each one settles on its own
    /// and whichever settles last decides the visible state.
    pub fn fetch_movies(&mut self, query: &str) {
        self.loading = true;
        self.error = None;

        let endpoint = Endpoint::for_query(query);
        let url = endpoint.url(&self.config);
        let id = self.next_fetch_id;
        self.next_fetch_id += 1;
        self.in_flight += 1;

        debug!(fetch = id, endpoint = endpoint.label(), query, "fetch started");
        self.status_msg = match &endpoint {
            Endpoint::Popular => "Fetching popular movies...".to_string(),
            Endpoint::Search(q) => format!("Searching for \"{}\"...", q),
        };

        let source = Arc::clone(&self.source);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_page(&url).await.map(|page| page.results);
            // Receiver only goes away when the app is dropped.
            let _ = tx.send(FetchOutcome { id, endpoint, result });
        });
    }

    /// Submit the current search box contents.
    pub fn handle_search(&mut self) {
        self.input_mode = InputMode::Normal;
        let query = self.query.clone();
        self.fetch_movies(&query);
    }

    /// Apply a settled fetch to the visible state.
    pub fn apply_outcome(&mut self, outcome: FetchOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome.result {
            Ok(movies) => {
                info!(
                    fetch = outcome.id,
                    endpoint = outcome.endpoint.label(),
                    count = movies.len(),
                    "fetch succeeded"
                );
                self.movies = movies;
                self.selected = 0;
                self.status_msg = match &outcome.endpoint {
                    Endpoint::Popular => format!("{} popular movies", self.movies.len()),
                    Endpoint::Search(q) => format!("{} results for \"{}\"", self.movies.len(), q),
                };
            }
            Err(e) => {
                warn!(
                    fetch = outcome.id,
                    endpoint = outcome.endpoint.label(),
                    error = %e,
                    "fetch failed"
                );
                self.error = Some(e.user_message());
                self.status_msg.clear();
            }
        }

        if self.in_flight > 0 {
            debug!(
                fetch = outcome.id,
                pending = self.in_flight,
                "fetch settled while others are still in flight"
            );
        }
        self.loading = false;
    }

    /// Apply every outcome that is ready. Returns true if any was applied.
    pub fn poll_outcomes(&mut self) -> bool {
        let mut applied = false;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome);
            applied = true;
        }
        applied
    }

    /// Wait for the next fetch to settle and apply it.
    pub async fn next_outcome(&mut self) -> bool {
        match self.outcome_rx.recv().await {
            Some(outcome) => {
                self.apply_outcome(outcome);
                true
            }
            None => false,
        }
    }

    /// Recompute grid geometry from the terminal size.
    pub fn update_viewport(&mut self, width: u16, height: u16) {
        // Cards sit inside the grid border.
        self.grid_columns = columns_for_width(width.saturating_sub(2));
        let rows = height.saturating_sub(GRID_OVERHEAD) / CARD_HEIGHT;
        self.page_rows = (rows as usize).max(1);
    }

    pub fn selected_movie(&self) -> Option<&Movie> {
        self.movies.get(self.selected)
    }

    /// First grid row shown, paging so the selection stays visible.
    pub fn first_visible_row(&self) -> usize {
        let row = self.selected / self.grid_columns.max(1);
        (row / self.page_rows.max(1)) * self.page_rows.max(1)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.movies.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        let target = self.selected + self.grid_columns.max(1);
        if target < self.movies.len() {
            self.selected = target;
        }
    }

    pub fn select_up(&mut self) {
        if self.selected >= self.grid_columns.max(1) {
            self.selected -= self.grid_columns.max(1);
        }
    }

    pub fn select_page_down(&mut self) {
        if self.movies.is_empty() {
            return;
        }
        let step = self.grid_columns.max(1) * self.page_rows.max(1);
        self.selected = (self.selected + step).min(self.movies.len() - 1);
    }

    pub fn select_page_up(&mut self) {
        let step = self.grid_columns.max(1) * self.page_rows.max(1);
        self.selected = self.selected.saturating_sub(step);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.movies.len().saturating_sub(1);
    }
}
