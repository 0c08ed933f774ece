use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const BINDINGS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[
            ("?", "Toggle this help"),
            ("q", "Quit application"),
            ("Ctrl+C", "Quit from anywhere"),
        ],
    ),
    (
        "Search Box",
        &[
            ("/ or i", "Start editing the query"),
            ("Enter", "Submit the search (empty lists popular movies)"),
            ("Esc", "Stop editing without searching"),
        ],
    ),
    (
        "Results",
        &[
            ("←↑↓→/hjkl", "Move between cards"),
            ("PgUp/PgDn", "Move a page"),
            ("g/G", "Jump to first/last card"),
            ("o", "Open the selected poster"),
        ],
    ),
];

pub fn render(frame: &mut Frame) {
    let area = centered_rect(70, 70, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let mut help_text = vec![Line::from("")];
    for (section, keys) in BINDINGS {
        help_text.push(Line::from(Span::styled(
            format!("  {}", section),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for (key, action) in keys.iter() {
            help_text.push(Line::from(vec![
                Span::styled(format!("    {:<12}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ]));
        }
        help_text.push(Line::from(""));
    }

    let help = Paragraph::new(help_text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help: Keybindings ")
                .title_bottom(Line::from(" Press any key to close ").style(Style::default().fg(Color::DarkGray))),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(help, area);
}

/// Create a centered rectangle using percentage of parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
