use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::layout::{Target, TargetLayout};
use crate::results::{record_result, GameResult, ReactionRecord, ResultsStore};
use crate::timer::{ReactionClock, TimerReply};

pub const BASE_SCORE: f64 = 2000.0;
pub const MISSED_GREEN_PENALTY: f64 = 50.0;
pub const INCORRECT_CLICK_PENALTY: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Finished,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub current_index: usize,
    pub total_time: f64,
    pub incorrect_clicks: u32,
    pub missed_green_targets: u32,
    pub waiting_for_reaction: bool,
}

/// Receives presentation updates from the session
pub trait SessionView {
    fn on_board_changed(&mut self, _targets: &[Target]) {}
    fn on_target_revealed(&mut self, _index: usize) {}
    fn on_target_hidden(&mut self, _index: usize) {}
    fn on_session_finished(&mut self, _result: &GameResult) {}
}

impl SessionView for () {}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    BoardChanged(Vec<Target>),
    TargetRevealed(usize),
    TargetHidden(usize),
    SessionFinished(GameResult),
}

/// View that queues every update for the caller to drain
#[derive(Debug, Default)]
pub struct ViewEvents {
    events: Vec<ViewEvent>,
}

impl ViewEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ViewEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }
}

impl SessionView for ViewEvents {
    fn on_board_changed(&mut self, targets: &[Target]) {
        self.events.push(ViewEvent::BoardChanged(targets.to_vec()));
    }

    fn on_target_revealed(&mut self, index: usize) {
        self.events.push(ViewEvent::TargetRevealed(index));
    }

    fn on_target_hidden(&mut self, index: usize) {
        self.events.push(ViewEvent::TargetHidden(index));
    }

    fn on_session_finished(&mut self, result: &GameResult) {
        self.events.push(ViewEvent::SessionFinished(result.clone()));
    }
}

/// Average reaction and final score.
///
/// The total is divided by `total_targets - 1` (1 for single-target boards).
/// The score is rounded and never clamped.
pub fn compute_score(
    total_time: f64,
    total_targets: usize,
    missed_green_targets: u32,
    incorrect_clicks: u32,
) -> (f64, i64) {
    let divisor = total_targets.saturating_sub(1).max(1) as f64;
    let average_time = total_time / divisor;
    let score = (BASE_SCORE
        - average_time
        - missed_green_targets as f64 * MISSED_GREEN_PENALTY
        - incorrect_clicks as f64 * INCORRECT_CLICK_PENALTY)
        .round() as i64;
    (average_time, score)
}

/// One game: a board of targets shown one at a time until all are consumed
pub struct SessionController<C: ReactionClock, V: SessionView> {
    config: Config,
    layout: TargetLayout,
    clock: C,
    view: V,
    store: Box<dyn ResultsStore>,
    phase: Phase,
    board: Vec<Target>,
    state: SessionState,
    history: Vec<ReactionRecord>,
    pending_advance: bool,
    deadline: Option<Instant>,
    outstanding_ticket: Option<u64>,
    next_ticket: u64,
    result: Option<GameResult>,
}

impl<C: ReactionClock, V: SessionView> SessionController<C, V> {
    pub fn new(
        config: Config,
        layout: TargetLayout,
        clock: C,
        view: V,
        store: Box<dyn ResultsStore>,
    ) -> Self {
        Self {
            config,
            layout,
            clock,
            view,
            store,
            phase: Phase::Idle,
            board: Vec::new(),
            state: SessionState::default(),
            history: Vec::new(),
            pending_advance: false,
            deadline: None,
            outstanding_ticket: None,
            next_ticket: 0,
            result: None,
        }
    }

    pub fn start(&mut self) {
        if !matches!(self.phase, Phase::Idle | Phase::Finished) {
            debug!(phase = %self.phase, "start ignored");
            return;
        }
        let board = self.layout.generate(
            self.config.board_width,
            self.config.board_height,
            self.config.total_targets,
            self.config.min_distance,
        );
        self.start_with_board(board);
    }

    pub fn start_with_board(&mut self, board: Vec<Target>) {
        if !matches!(self.phase, Phase::Idle | Phase::Finished) {
            debug!(phase = %self.phase, "start ignored");
            return;
        }
        self.reset();
        self.board = board;
        self.view.on_board_changed(&self.board);
        self.phase = Phase::Running;
        debug!(targets = self.board.len(), "session started");
        self.advance();
    }

    pub fn restart(&mut self) {
        debug!(phase = %self.phase, "restarting session");
        self.reset();
        self.phase = Phase::Idle;
        self.start();
    }

    fn reset(&mut self) {
        self.deadline = None;
        self.outstanding_ticket = None;
        self.pending_advance = false;
        self.state = SessionState::default();
        self.history.clear();
        self.result = None;
    }

    pub fn handle_click(&mut self, index: usize) {
        if self.phase != Phase::Running {
            return;
        }
        let Some(target) = self.board.get_mut(index) else {
            return;
        };
        let is_red = target.is_red();

        if index == self.state.current_index && self.state.waiting_for_reaction {
            target.clicked = true;
            self.state.waiting_for_reaction = false;
            self.pending_advance = true;
            self.request_stop();
        }
        // every red click counts, qualifying or not
        if is_red {
            self.state.incorrect_clicks += 1;
        }
    }

    pub fn on_timeout(&mut self) {
        if self.phase != Phase::Running || !self.state.waiting_for_reaction {
            return;
        }
        debug!(index = self.state.current_index, "reaction window expired");
        self.state.waiting_for_reaction = false;
        self.pending_advance = true;
        self.request_stop();
    }

    /// Fire the timeout once the armed deadline has passed
    pub fn poll_deadline(&mut self, now: Instant) {
        if let Some(deadline) = self.deadline {
            if now >= deadline {
                self.deadline = None;
                self.on_timeout();
            }
        }
    }

    pub fn on_reaction_measured(&mut self, reply: TimerReply) {
        if self.outstanding_ticket != Some(reply.ticket) {
            debug!(ticket = reply.ticket, "discarding stale timer reply");
            return;
        }
        self.outstanding_ticket = None;
        if !self.state.waiting_for_reaction && !self.pending_advance {
            return;
        }

        let index = self.state.current_index;
        self.state.total_time += reply.elapsed_ms;
        if let Some(target) = self.board.get(index) {
            self.history.push(ReactionRecord {
                target_index: index,
                color: target.color,
                reaction_time_ms: reply.elapsed_ms,
            });
        }
        self.state.waiting_for_reaction = false;

        // a reply landing mid-pause is applied on resume
        if self.pending_advance && self.phase == Phase::Running {
            self.pending_advance = false;
            self.state.current_index += 1;
            self.advance();
        }
    }

    pub fn pause(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        self.phase = Phase::Paused;
        self.deadline = None;
        if self.state.current_index < self.board.len() {
            self.view.on_target_hidden(self.state.current_index);
        }
        debug!(index = self.state.current_index, "paused");
    }

    pub fn resume(&mut self) {
        if self.phase != Phase::Paused {
            return;
        }
        self.phase = Phase::Running;
        debug!(index = self.state.current_index, "resumed");

        if self.pending_advance {
            if self.outstanding_ticket.is_none() {
                self.pending_advance = false;
                self.state.current_index += 1;
                self.advance();
            }
            // otherwise the outstanding reply advances past this target
            return;
        }
        if self.state.current_index < self.board.len() {
            self.view.on_target_revealed(self.state.current_index);
            // fresh window: paused time is not charged to the deadline
            self.arm_deadline();
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            Phase::Running => self.pause(),
            Phase::Paused => self.resume(),
            Phase::Idle | Phase::Finished => {}
        }
    }

    fn request_stop(&mut self) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.outstanding_ticket = Some(ticket);
        self.deadline = None;
        self.clock.stop(ticket);
    }

    fn arm_deadline(&mut self) {
        self.deadline = Instant::now().checked_add(self.config.reaction_window());
        if self.deadline.is_none() {
            warn!(
                window_ms = self.config.reaction_window_ms,
                "reaction window out of range, target will not expire"
            );
        }
    }

    fn advance(&mut self) {
        self.deadline = None;
        let index = self.state.current_index;

        if index > 0 {
            if let Some(prev) = self.board.get(index - 1) {
                if prev.is_green() && !prev.clicked {
                    self.state.missed_green_targets += 1;
                }
            }
            self.view.on_target_hidden(index - 1);
        }

        if index < self.board.len() {
            self.view.on_target_revealed(index);
            self.state.waiting_for_reaction = true;
            self.pending_advance = false;
            self.clock.arm();
            self.arm_deadline();
        } else {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.state.waiting_for_reaction = false;

        let (average_time_ms, score) = compute_score(
            self.state.total_time,
            self.board.len(),
            self.state.missed_green_targets,
            self.state.incorrect_clicks,
        );
        let result = GameResult {
            timestamp: Utc::now(),
            average_time_ms,
            incorrect_clicks: self.state.incorrect_clicks,
            missed_green_targets: self.state.missed_green_targets,
            score,
            targets: self.history.iter().map(|r| (r.key(), r.clone())).collect(),
        };
        info!(
            score,
            average_time_ms,
            missed = result.missed_green_targets,
            incorrect = result.incorrect_clicks,
            "session finished"
        );

        self.view.on_session_finished(&result);
        if let Err(err) = record_result(self.store.as_ref(), &result) {
            warn!(%err, "could not persist session result");
        }
        self.result = Some(result);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn board(&self) -> &[Target] {
        &self.board
    }

    pub fn history(&self) -> &[ReactionRecord] {
        &self.history
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Target currently on screen, if any
    pub fn visible_target(&self) -> Option<(usize, &Target)> {
        if self.phase != Phase::Running {
            return None;
        }
        let index = self.state.current_index;
        self.board.get(index).map(|t| (index, t))
    }
}
