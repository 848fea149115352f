pub mod board;
pub mod scores_table;
pub mod screen;

use flick::{
    layout::TargetColor,
    results::GameResult,
    scores::score_color,
    session::Phase,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

fn chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // status
            Constraint::Min(3),    // board
            Constraint::Length(1), // legend
        ])
        .split(area)
}

/// Cells targets can be drawn in, inside the board border
pub fn board_area(frame: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(chunks(frame)[1])
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = chunks(area);
        let session = &self.session;
        let state = session.state();
        let total = self.presenter.board.len();

        let status = match session.phase() {
            Phase::Idle => "press enter or click to start".to_string(),
            Phase::Running | Phase::Paused => format!(
                "target {}/{}   missed {}   incorrect {}{}",
                (state.current_index + 1).min(total),
                total,
                state.missed_green_targets,
                state.incorrect_clicks,
                if session.is_paused() { "   PAUSED" } else { "" }
            ),
            Phase::Finished => "finished".to_string(),
        };
        Paragraph::new(Span::styled(status, dim_bold_style))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        Block::default()
            .borders(Borders::ALL)
            .title(" flick ")
            .render(chunks[1], buf);
        let inner = board_area(area);

        let fits = inner.width >= board::TARGET_WIDTH && inner.height > 0;
        if let Some((_, target)) = self.presenter.shown_target().filter(|_| fits) {
            let (x, y) = board::project(target.position, board::extent_of(session.config()), inner);
            let color = match target.color {
                TargetColor::Green => Color::Green,
                TargetColor::Red => Color::Red,
            };
            buf.set_string(x, y, board::TARGET_GLYPH, Style::default().fg(color));
        }

        match session.phase() {
            Phase::Idle if self.presenter.finished.is_none() => {
                let label = "[  Start  ]";
                let button = centered(inner, label.width() as u16, 1);
                Paragraph::new(Span::styled(
                    label,
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ))
                .render(button, buf);
            }
            Phase::Paused => {
                let label = "PAUSED - (p) to resume";
                Paragraph::new(Span::styled(
                    label,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD | Modifier::ITALIC),
                ))
                .alignment(Alignment::Center)
                .render(centered(inner, label.width() as u16, 1), buf);
            }
            _ => {}
        }

        if let Some(result) = &self.presenter.finished {
            render_game_over(result, inner, buf);
        }

        Paragraph::new(Span::styled(
            "(enter) start / (space) hit / (p)ause / (r)estart / (h) scores / (esc)ape",
            italic_style,
        ))
        .render(chunks[2], buf);
    }
}

fn render_game_over(result: &GameResult, area: Rect, buf: &mut Buffer) {
    let (r, g, b) = score_color(result.score);
    let summary = format!(
        "Avg Reaction: {:.2}ms   Missed Greens: {}   Incorrect Clicks: {}",
        result.average_time_ms, result.missed_green_targets, result.incorrect_clicks
    );
    let lines = vec![
        Line::from(Span::styled(
            "Game Over",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(summary.clone()),
        Line::from(""),
        Line::from(Span::styled(
            result.score.to_string(),
            Style::default()
                .fg(Color::Rgb(r, g, b))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Final Score",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "(enter) play again / (x) close",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];

    let width = summary.width() as u16 + 4;
    let height = lines.len() as u16 + 2;
    let popover = centered(area, width, height);

    Clear.render(popover, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(popover, buf);
}
