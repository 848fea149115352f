//! Reaction timing on a dedicated thread.
//!
//! The thread understands two messages. `Start` records the current instant.
//! `Stop(ticket)` answers with the milliseconds elapsed since the last
//! `Start`, echoing the ticket so the caller can discard stale answers.
//! Keeping the clock off the event loop means a slow redraw does not inflate
//! the measured reaction.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMessage {
    Start,
    Stop(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerReply {
    pub ticket: u64,
    pub elapsed_ms: f64,
}

/// What the session needs from a stopwatch. Replies to `stop` arrive later,
/// through whatever channel the implementation was wired to.
pub trait ReactionClock {
    fn arm(&mut self);
    fn stop(&mut self, ticket: u64);
}

/// Production clock backed by a background thread
pub struct ReactionTimer {
    tx: Option<Sender<TimerMessage>>,
    handle: Option<JoinHandle<()>>,
}

impl ReactionTimer {
    pub fn spawn<F>(on_reply: F) -> Self
    where
        F: Fn(TimerReply) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<TimerMessage>();

        let handle = thread::spawn(move || {
            let mut started_at: Option<Instant> = None;

            while let Ok(msg) = rx.recv() {
                match msg {
                    TimerMessage::Start => started_at = Some(Instant::now()),
                    TimerMessage::Stop(ticket) => {
                        let elapsed_ms = started_at
                            .map(|s| s.elapsed().as_secs_f64() * 1000.0)
                            .unwrap_or(0.0);
                        on_reply(TimerReply { ticket, elapsed_ms });
                    }
                }
            }
            debug!("reaction timer thread exiting");
        });

        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    fn send(&self, msg: TimerMessage) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(msg);
        }
    }
}

impl ReactionClock for ReactionTimer {
    fn arm(&mut self) {
        self.send(TimerMessage::Start);
    }

    fn stop(&mut self, ticket: u64) {
        self.send(TimerMessage::Stop(ticket));
    }
}

impl Drop for ReactionTimer {
    fn drop(&mut self) {
        // closing the channel ends the thread's recv loop
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Clock for scripted sessions: records calls, never replies on its own
#[derive(Debug, Default, Clone)]
pub struct ScriptedClock {
    pub arms: usize,
    pub stops: Vec<u64>,
}

impl ScriptedClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_ticket(&self) -> Option<u64> {
        self.stops.last().copied()
    }
}

impl ReactionClock for ScriptedClock {
    fn arm(&mut self) {
        self.arms += 1;
    }

    fn stop(&mut self, ticket: u64) {
        self.stops.push(ticket);
    }
}
