use ratatui::Frame;

use crate::{ui::scores_table::render_scores, App, AppState};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Board screen - targets, status line and popovers
pub struct BoardScreen;

impl Screen for BoardScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Recent scores table
pub struct ScoresScreen;

impl Screen for ScoresScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_scores(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Board => Box::new(BoardScreen),
        AppState::Scores => Box::new(ScoresScreen),
    }
}
