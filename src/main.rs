mod app;
mod config;
mod tmdb;
mod ui;

use app::{App, InputMode};
use clap::{Parser, Subcommand};
use config::{Config, DEFAULT_API_BASE, DEFAULT_IMAGE_BASE, DEFAULT_LANGUAGE};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tmdb::{Movie, MovieSource, TmdbClient};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Search and browse movies from TMDB in the terminal
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TMDB API key (v3 auth)
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Base URL of the TMDB API
    #[arg(long, env = "TMDB_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    api_base: String,

    /// Base URL for poster images
    #[arg(long, env = "TMDB_IMAGE_BASE", default_value = DEFAULT_IMAGE_BASE, global = true)]
    image_base: String,

    /// Language sent with every request
    #[arg(long, env = "TMDB_LANGUAGE", default_value = DEFAULT_LANGUAGE, global = true)]
    language: String,

    /// Directory for log files (defaults to the user data directory)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive search (default)
    Run,
    /// Fetch one result page and print it
    Search {
        /// Search text; omit to list popular movies
        #[arg(default_value = "")]
        query: String,
        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.log_dir.clone())?;
    info!("movie-search v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match Config::new(cli.api_key, &cli.api_base, &cli.image_base, &cli.language) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };
    let client = TmdbClient::new()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Search { query, json } => {
            let mut app = App::new(client, config);
            if !run_search(&mut app, &query, json, &mut std::io::stdout().lock()).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Run => {
            let mut app = App::new(client, config);

            let default_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                ratatui::restore();
                default_hook(info);
            }));

            // Init terminal
            let mut terminal = ratatui::init();
            let size = terminal.size()?;
            app.update_viewport(size.width, size.height);
            app.initialize();

            // Main loop
            let result = run_app(&mut terminal, &mut app);

            // Restore terminal
            ratatui::restore();

            if let Err(e) = result {
                eprintln!("Error: {e}");
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(log_dir: Option<PathBuf>) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => directories::ProjectDirs::from("org", "themoviedb", "movie-search")
            .map(|d| d.data_dir().join("logs"))
            .unwrap_or_else(|| std::env::temp_dir().join("movie-search/logs")),
    };
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "movie-search.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("movie_search=info"));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .init();
    Ok(guard)
}

/// One fetch through the same controller the TUI uses, printed to `out`.
///
/// Returns `false` when the fetch failed; the caller turns that into the exit status.
async fn run_search<S: MovieSource, W: Write>(
    app: &mut App<S>,
    query: &str,
    json: bool,
    out: &mut W,
) -> Result<bool, Box<dyn std::error::Error>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    app.fetch_movies(query);
    spinner.set_message(app.status_msg.clone());
    app.next_outcome().await;
    spinner.finish_and_clear();

    if let Some(ref error) = app.error {
        eprintln!("Error: {}", error);
        return Ok(false);
    }

    write_results(out, &app.movies, &app.config.image_base, json)?;
    Ok(true)
}

fn write_results<W: Write>(
    out: &mut W,
    movies: &[Movie],
    image_base: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(movies)?)?;
        return Ok(());
    }

    if movies.is_empty() {
        writeln!(out, "{}", ui::NO_RESULTS_MESSAGE)?;
    }
    for movie in movies {
        writeln!(out, "{} ({})", movie.title, ui::format_release_date(&movie.release_date))?;
        match movie.poster_url(image_base) {
            Some(url) => writeln!(out, "  poster: {}", url)?,
            None => writeln!(out, "  poster: No image available")?,
        }
        for line in ui::clamp_lines(&movie.overview, 76, 3) {
            writeln!(out, "  {}", line)?;
        }
    }
    Ok(())
}

fn run_app<S: MovieSource>(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App<S>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.poll_outcomes();
        terminal.draw(|frame| ui::render(app, frame))?;

        if app.should_quit {
            return Ok(());
        }

        // Short timeout so settled fetches show up promptly
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key(app, key);
                }
                Event::Resize(width, height) => {
                    app.update_viewport(width, height);
                }
                _ => {}
            }
        }
    }
}

fn handle_key<S: MovieSource>(app: &mut App<S>, key: KeyEvent) {
    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // If help is showing, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match app.input_mode {
        InputMode::Editing => handle_search_input(app, key),
        InputMode::Normal => handle_grid_key(app, key),
    }
}

fn handle_search_input<S: MovieSource>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.handle_search();
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.query.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.query.push(c);
        }
        _ => {}
    }
}

fn handle_grid_key<S: MovieSource>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Char('?') => {
            app.show_help = true;
        }
        KeyCode::Char('/') | KeyCode::Char('i') => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Right | KeyCode::Char('l') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_down(),
        KeyCode::Up | KeyCode::Char('k') => app.select_up(),
        KeyCode::PageDown => app.select_page_down(),
        KeyCode::PageUp => app.select_page_up(),
        KeyCode::Char('g') => app.select_first(),
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('o') => open_selected_poster(app),
        _ => {}
    }
}

fn open_selected_poster<S: MovieSource>(app: &mut App<S>) {
    let url = app
        .selected_movie()
        .and_then(|movie| movie.poster_url(&app.config.image_base));
    match url {
        Some(url) => {
            if std::process::Command::new("xdg-open").arg(&url).spawn().is_ok() {
                app.status_msg = format!("Opening: {}", url);
            } else {
                app.status_msg = format!("Poster: {} (no opener available)", url);
            }
        }
        None => {
            app.status_msg = "No poster for this movie".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{Canned, FakeSource, movie, test_config};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_typing_then_enter_submits_search() {
        let source = FakeSource::default()
            .respond("", Canned::Page(vec![movie(1, "Heat")]))
            .respond("up", Canned::Page(vec![movie(2, "Up")]));
        let mut app = App::new(source, test_config());
        app.initialize();
        app.next_outcome().await;

        handle_key(&mut app, press(KeyCode::Char('/')));
        assert_eq!(app.input_mode, InputMode::Editing);
        for c in "upx".chars() {
            handle_key(&mut app, press(KeyCode::Char(c)));
        }
        handle_key(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.query, "up");
        // Typing alone never fetches.
        assert!(!app.loading);

        handle_key(&mut app, press(KeyCode::Enter));
        assert!(app.loading);
        assert_eq!(app.input_mode, InputMode::Normal);
        app.next_outcome().await;
        assert_eq!(app.movies, vec![movie(2, "Up")]);
    }

    #[tokio::test]
    async fn test_escape_leaves_editing_without_fetch() {
        let source = FakeSource::default().respond("", Canned::Page(vec![movie(1, "Heat")]));
        let mut app = App::new(source, test_config());
        app.initialize();
        app.next_outcome().await;

        handle_key(&mut app, press(KeyCode::Char('i')));
        handle_key(&mut app, press(KeyCode::Char('q')));
        handle_key(&mut app, press(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.query, "q");
        assert!(!app.loading);
        assert!(!app.should_quit);

        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_help_toggle_and_ctrl_c() {
        let mut app = App::new(FakeSource::default(), test_config());
        handle_key(&mut app, press(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key(&mut app, press(KeyCode::Char('x')));
        assert!(!app.show_help);

        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    async fn search_output(source: FakeSource, query: &str, json: bool) -> (bool, String) {
        let mut app = App::new(source, test_config());
        let mut out = Vec::new();
        let ok = run_search(&mut app, query, json, &mut out).await.unwrap();
        (ok, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_search_prints_plain_results() {
        let no_poster = Movie {
            poster_path: None,
            overview: String::new(),
            ..movie(2, "Ronin")
        };
        let source = FakeSource::default()
            .respond("heat", Canned::Page(vec![movie(1, "Heat"), no_poster]));

        let (ok, out) = search_output(source, "heat", false).await;
        assert!(ok);
        assert_eq!(
            out,
            "Heat (7/16/2008)\n\
             \x20 poster: https://image.tmdb.org/t/p/w500/1.jpg\n\
             \x20 Overview of Heat\n\
             Ronin (7/16/2008)\n\
             \x20 poster: No image available\n"
        );
    }

    #[tokio::test]
    async fn test_search_json_output_lists_movies() {
        let movies = vec![movie(1, "Heat"), movie(2, "Ronin")];
        let source = FakeSource::default().respond("", Canned::Page(movies.clone()));

        let (ok, out) = search_output(source, "", true).await;
        assert!(ok);
        let parsed: Vec<Movie> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, movies);
    }

    #[tokio::test]
    async fn test_search_without_matches_prints_message() {
        let source = FakeSource::default().respond("zzzz", Canned::Page(vec![]));

        let (ok, out) = search_output(source, "zzzz", false).await;
        assert!(ok);
        assert_eq!(out, format!("{}\n", ui::NO_RESULTS_MESSAGE));

        let source = FakeSource::default().respond("zzzz", Canned::Page(vec![]));
        let (_, out) = search_output(source, "zzzz", true).await;
        assert_eq!(out.trim(), "[]");
    }

    #[tokio::test]
    async fn test_search_failure_returns_instead_of_exiting() {
        let source = FakeSource::default().respond("heat", Canned::Status(500));

        let (ok, out) = search_output(source, "heat", false).await;
        assert!(!ok);
        assert!(out.is_empty());
    }

    #[test]
    fn test_cli_parses_search_subcommand() {
        let cli = Cli::try_parse_from([
            "movie-search",
            "--api-key",
            "k",
            "search",
            "the matrix",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("k"));
        assert_eq!(cli.api_base, DEFAULT_API_BASE);
        match cli.command {
            Some(Commands::Search { query, json }) => {
                assert_eq!(query, "the matrix");
                assert!(json);
            }
            _ => panic!("Expected Search command"),
        }
    }
}
