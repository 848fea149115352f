pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use flick::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    layout::TargetLayout,
    logging,
    presenter::BoardPresenter,
    results::{export_csv, FileResultsStore, ResultsStore},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, GameEventSource, Runner, Ticker},
    scores::{recent_rows, render_plain, ScoreRow},
    session::{Phase, SessionController, ViewEvents},
    timer::ReactionTimer,
    TICK_RATE_MS,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::mpsc::Sender,
    time::{Duration, Instant},
};
use tracing::info;

/// click the green targets, leave the red ones alone
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal reaction-time game. Targets appear one at a time: click green ones as fast as you can and leave red ones alone. Scores are kept locally."
)]
pub struct Cli {
    /// number of targets per session
    #[clap(short = 't', long)]
    targets: Option<usize>,

    /// milliseconds each target stays up before it counts as missed
    #[clap(short = 'w', long)]
    window_ms: Option<u64>,

    /// seed for reproducible boards
    #[clap(long)]
    seed: Option<u64>,

    /// results file to read and write (defaults to the state directory)
    #[clap(long, value_name = "PATH")]
    results_file: Option<PathBuf>,

    /// print the five most recent results and exit
    #[clap(long)]
    scores: bool,

    /// write every stored result as CSV to PATH ("-" for stdout) and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// store the given options as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(targets) = self.targets {
            config.total_targets = targets;
        }
        if let Some(window_ms) = self.window_ms {
            config.reaction_window_ms = window_ms;
        }
        config
    }

    fn results_store(&self) -> FileResultsStore {
        match &self.results_file {
            Some(path) => FileResultsStore::with_path(path),
            None => FileResultsStore::new(),
        }
    }

    fn layout(&self) -> TargetLayout {
        match self.seed {
            Some(seed) => TargetLayout::seeded(seed),
            None => TargetLayout::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Board,
    Scores,
}

pub struct App {
    pub session: SessionController<ReactionTimer, ViewEvents>,
    pub presenter: BoardPresenter,
    pub state: AppState,
    pub scores: Vec<ScoreRow>,
    store: FileResultsStore,
}

impl App {
    pub fn new(
        config: Config,
        layout: TargetLayout,
        store: FileResultsStore,
        events: Sender<GameEvent>,
    ) -> Self {
        let timer = ReactionTimer::spawn(move |reply| {
            let _ = events.send(GameEvent::Reaction(reply));
        });
        let session = SessionController::new(
            config,
            layout,
            timer,
            ViewEvents::new(),
            Box::new(store.clone()),
        );

        Self {
            session,
            presenter: BoardPresenter::new(),
            state: AppState::Board,
            scores: Vec::new(),
            store,
        }
    }

    /// Pull pending view updates out of the session
    pub fn sync(&mut self) {
        let events = self.session.view_mut().drain();
        self.presenter.apply_all(events);
    }

    /// Runs on every loop pass, whatever event woke the loop
    pub fn on_tick(&mut self, now: Instant) {
        self.session.poll_deadline(now);
        self.sync();
    }

    pub fn show_scores(&mut self) {
        self.scores = recent_rows(&self.store.load());
        self.state = AppState::Scores;
    }

    /// Returns false when the app should quit
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Esc
            || key.code == KeyCode::Char('q')
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return false;
        }

        match self.state {
            AppState::Scores => match key.code {
                KeyCode::Char('h') | KeyCode::Char('b') | KeyCode::Backspace => {
                    self.state = AppState::Board;
                }
                _ => {}
            },
            AppState::Board => match key.code {
                KeyCode::Enter | KeyCode::Char('s') => {
                    self.presenter.dismiss_game_over();
                    self.session.start();
                }
                KeyCode::Char('p') => self.session.toggle_pause(),
                KeyCode::Char('r') => self.session.restart(),
                KeyCode::Char('h') => self.show_scores(),
                KeyCode::Char('x') => self.presenter.dismiss_game_over(),
                KeyCode::Char(' ') => {
                    if let Some((index, _)) = self.presenter.shown_target() {
                        self.session.handle_click(index);
                    }
                }
                _ => {}
            },
        }
        self.sync();
        true
    }

    pub fn on_click(&mut self, column: u16, row: u16, frame: Rect) {
        if self.state != AppState::Board {
            return;
        }
        let area = ui::board_area(frame);
        let extent = ui::board::extent_of(self.session.config());
        if let Some((index, target)) = self.presenter.shown_target() {
            if ui::board::hit(target.position, extent, area, column, row) {
                self.session.handle_click(index);
            }
        } else if self.session.phase() == Phase::Idle && self.presenter.finished.is_none() {
            // the start prompt sits in the middle of the board
            self.session.start();
        }
        self.sync();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = AppDirs::log_path() {
        logging::init(&path);
    }

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
    }

    let store = cli.results_store();

    if cli.scores {
        print!("{}", render_plain(&recent_rows(&store.load())));
        return Ok(());
    }

    if let Some(path) = &cli.export {
        let history = store.load();
        if path.as_os_str() == "-" {
            export_csv(&history, io::stdout().lock())?;
        } else {
            export_csv(&history, std::fs::File::create(path)?)?;
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let mut app = App::new(config, cli.layout(), store, runner.event_source().sender());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    info!("exiting");
    outcome
}

fn start_tui<B: Backend, E: GameEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            GameEvent::Tick | GameEvent::Resize => {}
            GameEvent::Reaction(reply) => {
                app.session.on_reaction_measured(reply);
                app.sync();
            }
            GameEvent::Key(key) => {
                if !app.on_key(key) {
                    break;
                }
            }
            GameEvent::Mouse(mouse) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    let size = terminal.size()?;
                    let frame = Rect::new(0, 0, size.width, size.height);
                    app.on_click(mouse.column, mouse.row, frame);
                }
            }
        }
        // a steady stream of input never yields a Tick, so check here
        app.on_tick(Instant::now());
        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}
