use flick::scores::{score_color, ScoreRow};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::App;

/// Pure presenter for a single recent-score row
pub fn present_row(row: &ScoreRow) -> Row<'static> {
    let (r, g, b) = score_color(row.score);

    let missed_style = if row.missed_green_targets == 0 {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let incorrect_style = if row.incorrect_clicks == 0 {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    };

    Row::new(vec![
        Cell::from(row.timestamp.clone()),
        Cell::from(row.average_time.clone()),
        Cell::from(row.missed_green_targets.to_string()).style(missed_style),
        Cell::from(row.incorrect_clicks.to_string()).style(incorrect_style),
        Cell::from(row.score.to_string()).style(
            Style::default()
                .fg(Color::Rgb(r, g, b))
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

/// Render the Recent Scores screen
pub fn render_scores(app: &App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Table
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let title = Paragraph::new("Recent Scores")
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if app.scores.is_empty() {
        let empty = Paragraph::new("No games played yet")
            .style(Style::default().add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(empty, chunks[1]);
    } else {
        let header = Row::new(vec![
            "Timestamp",
            "Avg Reaction (ms)",
            "Missed Greens",
            "Incorrect Clicks",
            "Score",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

        let rows: Vec<Row> = app.scores.iter().map(present_row).collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(20),
                Constraint::Length(18),
                Constraint::Length(14),
                Constraint::Length(17),
                Constraint::Length(7),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(table, chunks[1]);
    }

    let instructions = Paragraph::new("(h)/(b) back to board / (esc)ape")
        .style(Style::default().add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[2]);
}
