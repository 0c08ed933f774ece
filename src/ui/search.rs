use crate::app::{App, InputMode};
use crate::tmdb::MovieSource;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

const PLACEHOLDER: &str = "Search for movies...";

pub fn render_header<S: MovieSource>(app: &App<S>, frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " Movie Search",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   [{} movies]", app.movies.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .alignment(Alignment::Left)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, area);
}

/// Search input plus the submit button.
pub fn render_form<S: MovieSource>(app: &App<S>, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(12)])
        .split(area);

    let editing = app.input_mode == InputMode::Editing;
    let input_style = if editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let title = if editing {
        " Search (Enter to submit, Esc to cancel) "
    } else {
        " Search (/) "
    };

    let text = if app.query.is_empty() {
        Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(app.query.as_str(), Style::default().fg(Color::White))
    };
    let input = Paragraph::new(Line::from(vec![Span::raw(" "), text])).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(input_style)
            .title(title),
    );
    frame.render_widget(input, chunks[0]);

    let button_style = if app.loading {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };
    let button = Paragraph::new("Search")
        .style(button_style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(button_style));
    frame.render_widget(button, chunks[1]);

    // Set cursor position when editing
    if editing {
        let max_x = chunks[0].right().saturating_sub(2);
        let query_width = u16::try_from(app.query.width()).unwrap_or(u16::MAX);
        let cursor_x = chunks[0].x.saturating_add(2).saturating_add(query_width).min(max_x);
        frame.set_cursor_position((cursor_x, chunks[0].y + 1));
    }
}
