mod grid;
mod help;
mod search;

use crate::app::App;
use crate::tmdb::MovieSource;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub use grid::format_release_date;

pub const NO_RESULTS_MESSAGE: &str = "No movies found. Try a different search term.";

/// Top-level render: header, search form, results region, status bar.
pub fn render<S: MovieSource>(app: &App<S>, frame: &mut Frame) {
    let area = frame.area();

    // Layout: header(3) + search(3) + results(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    search::render_header(app, frame, chunks[0]);
    search::render_form(app, frame, chunks[1]);
    grid::render(app, frame, chunks[2]);
    render_status(app, frame, chunks[3]);

    // Render help overlay on top if active
    if app.show_help {
        help::render(frame);
    }
}

fn render_status<S: MovieSource>(app: &App<S>, frame: &mut Frame, area: ratatui::layout::Rect) {
    let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let status_line = Line::from(vec![
        Span::styled(" /", key),
        Span::raw(" Search  "),
        Span::styled("Enter", key),
        Span::raw(" Submit  "),
        Span::styled("←↑↓→", key),
        Span::raw(" Move  "),
        Span::styled("o", key),
        Span::raw(" Poster  "),
        Span::styled("?", key),
        Span::raw(" Help  "),
        Span::styled("q", key),
        Span::raw(" Quit  "),
        Span::styled(&app.status_msg, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(status_line), area);
}

/// Truncate a string to `max_width` display columns, adding "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        result.push(c);
        used += w;
    }
    if max_width > 0 {
        result.push('…');
    }
    result
}

/// Word-wrap `text` to `width` columns, keeping at most `max_lines` lines.
/// The last kept line ends in "…" when text was dropped.
pub fn clamp_lines(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    if width == 0 || max_lines == 0 {
        return Vec::new();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut overflow = false;

    for word in text.split_whitespace() {
        let candidate_width = if current.is_empty() {
            word.width()
        } else {
            current.width() + 1 + word.width()
        };
        if candidate_width <= width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if lines.len() == max_lines {
            overflow = true;
            break;
        }
        if word.width() > width {
            lines.push(truncate_str(word, width));
        } else {
            current.push_str(word);
        }
        if lines.len() == max_lines {
            overflow = true;
            break;
        }
    }
    if !overflow && !current.is_empty() {
        if lines.len() == max_lines {
            overflow = true;
        } else {
            lines.push(current);
        }
    }

    if overflow {
        if let Some(last) = lines.last_mut() {
            if !last.ends_with('…') {
                let shortened = truncate_str(last, width.saturating_sub(1));
                *last = format!("{}…", shortened.trim_end_matches('…'));
            }
        }
    }
    lines
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app::tests::{Canned, FakeSource, movie, test_config};
    use crate::app::{App, CARD_HEIGHT, GRID_OVERHEAD, InputMode};
    use crate::tmdb::{FETCH_ERROR_MESSAGE, Movie};
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    pub(crate) fn buffer_text(buffer: &Buffer) -> String {
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draw(app: &mut App<FakeSource>, width: u16, height: u16) -> String {
        app.update_viewport(width, height);
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    async fn settled(source: FakeSource) -> App<FakeSource> {
        let mut app = App::new(source, test_config());
        app.initialize();
        app.next_outcome().await;
        app
    }

    #[tokio::test]
    async fn test_render_loading_state() {
        let source = FakeSource::default();
        let _gate = source.respond_gated("", Canned::Page(vec![movie(1, "Heat")]));
        let mut app = App::new(source, test_config());
        app.initialize();

        let screen = draw(&mut app, 100, 30);
        assert!(screen.contains("Movie Search"));
        assert!(screen.contains("Search for movies..."));
        assert!(screen.contains("Loading..."));
        assert!(!screen.contains(NO_RESULTS_MESSAGE));
    }

    #[tokio::test]
    async fn test_render_two_popular_movies() {
        let app_source = FakeSource::default()
            .respond("", Canned::Page(vec![movie(1, "Heat"), movie(2, "Ronin")]));
        let mut app = settled(app_source).await;
        assert!(!app.loading);
        assert!(app.error.is_none());

        let screen = draw(&mut app, 100, GRID_OVERHEAD + 2 * CARD_HEIGHT);
        assert!(screen.contains("Heat"));
        assert!(screen.contains("Ronin"));
        assert!(screen.contains("7/16/2008"));
        assert!(!screen.contains("Loading..."));
        assert!(!screen.contains(NO_RESULTS_MESSAGE));
    }

    #[tokio::test]
    async fn test_render_single_search_result() {
        let source = FakeSource::default()
            .respond("", Canned::Page(vec![movie(1, "Heat")]))
            .respond("batman", Canned::Page(vec![movie(268, "Batman")]));
        let mut app = settled(source).await;
        app.query = "batman".to_string();
        app.handle_search();
        app.next_outcome().await;

        let screen = draw(&mut app, 100, 30);
        assert!(screen.contains("Batman"));
        assert!(!screen.contains("Heat"));
        assert!(screen.contains("/w500/268.jpg"));
    }

    #[tokio::test]
    async fn test_render_error_hides_cards() {
        let source = FakeSource::default().respond("", Canned::Network);
        let mut app = settled(source).await;
        assert!(!app.loading);

        let screen = draw(&mut app, 100, 30);
        assert!(screen.contains(FETCH_ERROR_MESSAGE));
        assert!(!screen.contains("Loading..."));
        assert!(!screen.contains(NO_RESULTS_MESSAGE));
        assert!(!screen.contains("Overview of"));
    }

    #[tokio::test]
    async fn test_render_empty_results_message() {
        let source = FakeSource::default().respond("", Canned::Page(vec![]));
        let mut app = settled(source).await;

        let screen = draw(&mut app, 100, 30);
        assert!(screen.contains(NO_RESULTS_MESSAGE));
        assert!(screen.contains("0 movies"));
    }

    #[tokio::test]
    async fn test_render_placeholder_without_poster() {
        let no_poster = Movie {
            poster_path: Some(String::new()),
            ..movie(7, "Blank")
        };
        let source = FakeSource::default().respond("", Canned::Page(vec![no_poster]));
        let mut app = settled(source).await;

        let screen = draw(&mut app, 100, 30);
        assert!(screen.contains("No image available"));
        assert!(!screen.contains("/w500"));
    }

    #[tokio::test]
    async fn test_render_pages_to_selection() {
        let movies: Vec<Movie> = (0..6).map(|i| movie(i, &format!("Film{}", i))).collect();
        let source = FakeSource::default().respond("", Canned::Page(movies));
        let mut app = settled(source).await;

        // One column, one card row per page.
        let screen = draw(&mut app, 60, GRID_OVERHEAD + CARD_HEIGHT);
        assert!(screen.contains("Film0"));
        assert!(!screen.contains("Film1"));

        app.select_down();
        app.select_down();
        let screen = draw(&mut app, 60, GRID_OVERHEAD + CARD_HEIGHT);
        assert!(screen.contains("Film2"));
        assert!(!screen.contains("Film0"));
    }

    #[tokio::test]
    async fn test_render_help_overlay() {
        let source = FakeSource::default().respond("", Canned::Page(vec![]));
        let mut app = settled(source).await;
        app.show_help = true;
        let screen = draw(&mut app, 100, 40);
        assert!(screen.contains("Keybindings"));
    }

    #[tokio::test]
    async fn test_cursor_stays_in_search_box_for_long_query() {
        let source = FakeSource::default().respond("", Canned::Page(vec![]));
        let mut app = settled(source).await;
        app.input_mode = InputMode::Editing;
        app.query = "x".repeat(70_000);

        app.update_viewport(100, 30);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(&app, frame)).unwrap();

        // Input box spans columns 0..88 below the three-row header.
        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!((cursor.x, cursor.y), (86, 4));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("Heat", 10), "Heat");
        assert_eq!(truncate_str("The Dark Knight", 8), "The Dar…");
        assert_eq!(truncate_str("千と千尋の神隠し", 5), "千と…");
    }

    #[test]
    fn test_clamp_lines() {
        assert_eq!(clamp_lines("a short overview", 40, 3), vec!["a short overview"]);
        assert_eq!(
            clamp_lines("one two three four five six", 9, 2),
            vec!["one two", "three…"]
        );
        assert!(clamp_lines("", 10, 3).is_empty());
        assert_eq!(clamp_lines("supercalifragilistic", 6, 3), vec!["super…"]);
    }
}
