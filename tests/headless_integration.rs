use std::sync::mpsc;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use flick::config::Config;
use flick::layout::{min_pairwise_distance, Position, Target, TargetColor, TargetLayout};
use flick::results::{MemoryResultsStore, ResultsStore};
use flick::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use flick::session::{Phase, SessionController, ViewEvent, ViewEvents};
use flick::timer::{ReactionTimer, ScriptedClock, TimerReply};

use TargetColor::{Green, Red};

fn board(colors: &[TargetColor]) -> Vec<Target> {
    colors
        .iter()
        .enumerate()
        .map(|(i, c)| Target::new(Position::new((i % 5) as f64 * 150.0, (i / 5) as f64 * 150.0), *c))
        .collect()
}

fn scripted(store: MemoryResultsStore) -> SessionController<ScriptedClock, ViewEvents> {
    SessionController::new(
        Config::default(),
        TargetLayout::seeded(21),
        ScriptedClock::new(),
        ViewEvents::new(),
        Box::new(store),
    )
}

fn reply(ctl: &mut SessionController<ScriptedClock, ViewEvents>, elapsed_ms: f64) {
    let ticket = ctl.clock().last_ticket().expect("a stop was requested");
    ctl.on_reaction_measured(TimerReply { ticket, elapsed_ms });
}

// 15 targets, greens 1 and 5 left to expire, reds 3, 7 and 11 clicked
#[test]
fn scripted_session_scores_as_expected() {
    let colors = [
        Green, Green, Green, Red, Green, Green, Green, Red, Green, Green, Green, Red, Green,
        Green, Green,
    ];
    let times: Vec<f64> = (1..=15).map(|i| 150.0 + i as f64 * 17.5).collect();

    let store = MemoryResultsStore::new();
    let mut ctl = scripted(store.clone());
    ctl.start_with_board(board(&colors));

    for (i, t) in times.iter().enumerate() {
        assert_eq!(ctl.state().current_index, i);
        if i == 1 || i == 5 {
            ctl.on_timeout();
        } else {
            ctl.handle_click(i);
        }
        reply(&mut ctl, *t);
    }

    assert_eq!(ctl.phase(), Phase::Finished);
    assert_eq!(ctl.state().missed_green_targets, 2);
    assert_eq!(ctl.state().incorrect_clicks, 3);

    let sum: f64 = times.iter().sum();
    let expected = (2000.0 - sum / 14.0 - 100.0 - 90.0).round() as i64;
    let result = ctl.result().expect("finished session has a result");
    assert_eq!(result.score, expected);
    assert_eq!(result.average_time_ms, sum / 14.0);
    assert_eq!(result.targets.len(), 15);
    assert_eq!(ctl.clock().stops.len(), 15);
}

#[test]
fn finished_session_is_persisted_under_its_timestamp() {
    let store = MemoryResultsStore::new();
    let mut ctl = scripted(store.clone());
    ctl.start_with_board(board(&[Green, Red, Green]));

    ctl.handle_click(0);
    reply(&mut ctl, 300.0);
    ctl.on_timeout();
    reply(&mut ctl, 1500.0);
    ctl.handle_click(2);
    reply(&mut ctl, 280.0);

    let result = ctl.result().unwrap().clone();
    let history = store.load();
    assert_eq!(history.get(&result.key()), Some(&result));
    assert!(result.key().ends_with('Z'));
    assert_matches!(
        ctl.view().events().last(),
        Some(ViewEvent::SessionFinished(r)) if r == &result
    );
}

#[test]
fn restart_mid_session_resets_counters_and_board() {
    let mut ctl = scripted(MemoryResultsStore::new());
    ctl.start();

    // rack up some state on whatever board was drawn
    for _ in 0..4 {
        let index = ctl.state().current_index;
        ctl.handle_click(index);
        reply(&mut ctl, 200.0);
    }
    ctl.on_timeout();
    reply(&mut ctl, 1500.0);
    assert_eq!(ctl.state().current_index, 5);

    ctl.restart();

    assert_eq!(ctl.phase(), Phase::Running);
    assert_eq!(ctl.state().current_index, 0);
    assert_eq!(ctl.state().incorrect_clicks, 0);
    assert_eq!(ctl.state().missed_green_targets, 0);
    assert_eq!(ctl.state().total_time, 0.0);
    assert!(ctl.history().is_empty());
    assert_eq!(ctl.board().len(), 15);
    assert!(min_pairwise_distance(ctl.board()).unwrap() >= 60.0);
}

#[test]
fn pause_resume_keeps_progress() {
    let mut ctl = scripted(MemoryResultsStore::new());
    ctl.start_with_board(board(&[Red, Green, Green, Green]));
    ctl.handle_click(0);
    reply(&mut ctl, 410.0);
    ctl.on_timeout();
    reply(&mut ctl, 1500.0);

    let before = ctl.state().clone();
    ctl.pause();
    ctl.handle_click(2);
    ctl.on_timeout();
    ctl.resume();

    assert_eq!(ctl.state(), &before);
    assert_eq!(ctl.state().current_index, 2);
    assert_eq!(ctl.state().missed_green_targets, 1);
    assert_eq!(ctl.state().incorrect_clicks, 1);
}

// Full loop with the real timer thread: click greens as they appear and let
// reds run out the window.
#[test]
fn headless_session_with_timer_thread_completes() {
    let (tx, rx) = mpsc::channel();
    let timer_tx = tx.clone();
    let timer = ReactionTimer::spawn(move |reply| {
        let _ = timer_tx.send(GameEvent::Reaction(reply));
    });

    let config = Config {
        total_targets: 6,
        reaction_window_ms: 40,
        ..Config::default()
    };
    let store = MemoryResultsStore::new();
    let mut ctl = SessionController::new(
        config,
        TargetLayout::seeded(8),
        timer,
        ViewEvents::new(),
        Box::new(store.clone()),
    );

    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    ctl.start();
    for _ in 0..2_000u32 {
        for event in ctl.view_mut().drain() {
            if let ViewEvent::TargetRevealed(index) = event {
                if ctl.board()[index].color == Green {
                    ctl.handle_click(index);
                }
            }
        }
        if let GameEvent::Reaction(reply) = runner.step() {
            ctl.on_reaction_measured(reply);
        }
        ctl.poll_deadline(Instant::now());
        if ctl.phase() == Phase::Finished {
            break;
        }
    }
    drop(tx);

    assert_eq!(ctl.phase(), Phase::Finished, "session should finish");
    let result = ctl.result().unwrap();
    assert_eq!(result.missed_green_targets, 0);
    assert_eq!(result.incorrect_clicks, 0);
    assert_eq!(result.targets.len(), 6);
    assert_eq!(store.load().len(), 1);
}
