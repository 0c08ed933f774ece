use super::{NO_RESULTS_MESSAGE, clamp_lines, truncate_str};
use crate::app::{App, CARD_HEIGHT};
use crate::tmdb::{Movie, MovieSource};
use chrono::NaiveDate;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

const OVERVIEW_LINES: usize = 3;
const POSTER_HEIGHT: u16 = 3;

/// Render whichever of loading / error / results applies.
pub fn render<S: MovieSource>(app: &App<S>, frame: &mut Frame, area: Rect) {
    if app.loading {
        render_notice(frame, area, "Loading...", Style::default().fg(Color::White));
        return;
    }
    if let Some(ref error) = app.error {
        render_notice(frame, area, error, Style::default().fg(Color::Red));
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Results ");

    let rows_total = app.movies.len().div_ceil(app.grid_columns.max(1));
    let first_row = app.first_visible_row();
    let block = if rows_total > 0 {
        block.title_bottom(
            Line::from(format!(" row {}/{} ", first_row + 1, rows_total)).alignment(Alignment::Right),
        )
    } else {
        block
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.movies.is_empty() {
        let message = Paragraph::new(NO_RESULTS_MESSAGE)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, centered_line(inner));
        return;
    }

    let columns = app.grid_columns.max(1);
    let visible_rows = (inner.height / CARD_HEIGHT).max(1) as usize;
    let visible_rows = visible_rows.min(app.page_rows.max(1));

    for screen_row in 0..visible_rows {
        let row = first_row + screen_row;
        let start = row * columns;
        if start >= app.movies.len() {
            break;
        }
        let y = inner.y + screen_row as u16 * CARD_HEIGHT;
        let height = CARD_HEIGHT.min(inner.bottom().saturating_sub(y));
        if height == 0 {
            break;
        }
        let row_area = Rect::new(inner.x, y, inner.width, height);
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(row_area);

        for (col, cell) in cells.iter().enumerate() {
            let index = start + col;
            if let Some(movie) = app.movies.get(index) {
                render_card(app, frame, *cell, movie, index == app.selected);
            }
        }
    }
}

fn render_card<S: MovieSource>(app: &App<S>, frame: &mut Frame, area: Rect, movie: &Movie, selected: bool) {
    let border_style = if selected {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let title_width = area.width.saturating_sub(4) as usize;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(
            format!(" {} ", truncate_str(&movie.title, title_width)),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(POSTER_HEIGHT),
            Constraint::Min(0),
        ])
        .split(inner);

    let date = Paragraph::new(format_release_date(&movie.release_date))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(date, chunks[0]);

    match movie.poster_url(&app.config.image_base) {
        Some(url) => {
            let poster = Paragraph::new(vec![
                Line::from(Span::styled("Poster:", Style::default().fg(Color::DarkGray))),
                Line::from(Span::styled(
                    url,
                    Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                )),
            ])
            .wrap(Wrap { trim: false });
            frame.render_widget(poster, chunks[1]);
        }
        None => {
            let placeholder = Paragraph::new(vec![
                Line::from(""),
                Line::from("No image available"),
            ])
            .alignment(Alignment::Center)
            .style(Style::default().bg(Color::Gray).fg(Color::Black));
            frame.render_widget(placeholder, chunks[1]);
        }
    }

    let overview: Vec<Line> = clamp_lines(&movie.overview, chunks[2].width as usize, OVERVIEW_LINES)
        .into_iter()
        .map(Line::from)
        .collect();
    frame.render_widget(Paragraph::new(overview), chunks[2]);
}

fn render_notice(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let notice = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(notice, centered_line(area));
}

fn centered_line(area: Rect) -> Rect {
    let y = area.y + area.height / 2;
    Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 1.min(area.height))
}

/// en-US short date (`7/16/2008`) for a `YYYY-MM-DD` release date.
pub fn format_release_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => date.format("%-m/%-d/%Y").to_string(),
        Err(_) => "Invalid Date".to_string(),
    }
}
