use crate::layout::Target;
use crate::results::GameResult;
use crate::session::ViewEvent;

/// What the screen should show, rebuilt purely from session view events
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BoardPresenter {
    pub board: Vec<Target>,
    pub shown: Option<usize>,
    pub finished: Option<GameResult>,
}

impl BoardPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::BoardChanged(board) => {
                self.board = board;
                self.shown = None;
                self.finished = None;
            }
            ViewEvent::TargetRevealed(index) => self.shown = Some(index),
            ViewEvent::TargetHidden(index) => {
                if self.shown == Some(index) {
                    self.shown = None;
                }
            }
            ViewEvent::SessionFinished(result) => self.finished = Some(result),
        }
    }

    pub fn apply_all(&mut self, events: impl IntoIterator<Item = ViewEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    pub fn shown_target(&self) -> Option<(usize, &Target)> {
        self.shown
            .and_then(|index| self.board.get(index).map(|t| (index, t)))
    }

    pub fn dismiss_game_over(&mut self) {
        self.finished = None;
    }
}
