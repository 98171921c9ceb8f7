//! App: terminal init, main loop, cascade pacing and key handling.

use crate::GameConfig;
use crate::input::{Action, NameKey, key_to_action, key_to_name_key};
use crate::motion::Motion;
use crate::theme::Theme;
use crate::ui::{self, BoardFx, View};
use anyhow::Result;
use blocktui::engine::{self, Cascade, Cell, Grid, StepResult};
use blocktui::leaderboard::{self, Leaderboard};
use blocktui::palette::{PALETTES, Palette};
use blocktui::session::{Phase, Session};
use blocktui::storage::{Store, sanitize_name};
use crossterm::event::{self, Event, KeyEventKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info, warn};

/// How long cleared tiles stay highlighted before the board collapses.
const HIGHLIGHT_MS: u64 = 300;
/// How long tiles take to fall into place.
const FALL_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Playing,
    LevelTransition,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::Exit => Self::Restart,
        }
    }
}

/// Presentation of the cascade currently in flight.
#[derive(Debug)]
enum Animation {
    Idle,
    /// Board before `step`, with its cleared cells fading out.
    Highlight {
        before: Grid,
        step: StepResult,
        started: Instant,
    },
    Fall {
        motion: Motion,
        started: Instant,
    },
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    store: Store,
    rng: StdRng,
    screen: Screen,
    paused: bool,
    player: Option<String>,
    name_input: String,
    session: Session,
    /// Settled board; while a cascade runs, the cascade owns the live one.
    grid: Grid,
    cascade: Option<Cascade>,
    animation: Animation,
    cursor: Cell,
    selected: Option<Cell>,
    leaderboard: Leaderboard,
    quit_selected: QuitOption,
    /// One-line notice for I/O trouble (leaderboard, name file).
    status: Option<String>,
    last_tick: Instant,
    /// TachyonFX fade for the tiles being cleared.
    clear_effect: Option<Effect>,
    clear_effect_time: Option<Instant>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, store: Store) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let player = config
            .player
            .as_deref()
            .and_then(sanitize_name)
            .or_else(|| store.player_name());
        let session = Session::new(config.session, PALETTES.len(), &mut rng);
        let palette = PALETTES[session.palette_index()];
        let grid = engine::generate(config.rows, config.cols, &palette.alphabet()?, &mut rng)?;
        let leaderboard = Leaderboard::load(&store.leaderboard_path()).unwrap_or_else(|e| {
            warn!(error = %e, "leaderboard unreadable");
            Leaderboard::default()
        });
        let screen = if player.is_some() {
            Screen::Playing
        } else {
            Screen::Login
        };
        info!(rows = config.rows, cols = config.cols, player = ?player, "new game");
        Ok(Self {
            config,
            theme,
            store,
            rng,
            screen,
            paused: false,
            player,
            name_input: String::new(),
            session,
            grid,
            cascade: None,
            animation: Animation::Idle,
            cursor: Cell::new(0, 0),
            selected: None,
            leaderboard,
            quit_selected: QuitOption::Resume,
            status: None,
            last_tick: Instant::now(),
            clear_effect: None,
            clear_effect_time: None,
        })
    }

    fn palette(&self) -> &'static Palette {
        &PALETTES[self.session.palette_index()]
    }

    /// Fresh board for the session's current level; drops any cascade in flight.
    fn new_board(&mut self) -> Result<()> {
        let alphabet = self.palette().alphabet()?;
        self.grid = engine::generate(self.config.rows, self.config.cols, &alphabet, &mut self.rng)?;
        self.cascade = None;
        self.animation = Animation::Idle;
        self.clear_effect = None;
        self.clear_effect_time = None;
        self.selected = None;
        self.last_tick = Instant::now();
        Ok(())
    }

    fn restart(&mut self) -> Result<()> {
        self.session.restart();
        self.status = None;
        self.paused = false;
        self.screen = Screen::Playing;
        self.new_board()
    }

    fn busy(&self) -> bool {
        self.cascade.is_some() || !matches!(self.animation, Animation::Idle)
    }

    /// The board to draw this frame.
    fn shown_grid(&self) -> &Grid {
        match &self.animation {
            Animation::Highlight { before, .. } => before,
            _ => self.cascade.as_ref().map_or(&self.grid, Cascade::grid),
        }
    }

    fn start_cascade(&mut self, action: engine::Action) {
        let alphabet = match self.palette().alphabet() {
            Ok(a) => a,
            Err(e) => {
                warn!(error = %e, "palette unusable");
                return;
            }
        };
        match Cascade::start(self.grid.clone(), action, alphabet, self.config.engine.clone()) {
            Ok(cascade) if cascade.is_settled() => self.grid = cascade.into_grid(),
            Ok(cascade) => {
                self.cascade = Some(cascade);
                if self.config.no_animation {
                    self.run_cascade_instantly();
                }
            }
            Err(e) => {
                debug!(error = %e, "action rejected");
                self.session.push_message(format!("🚫 {e}"));
            }
        }
    }

    fn run_cascade_instantly(&mut self) {
        while self.cascade.is_some() {
            if let Some(step) = self.next_step() {
                self.book_step(&step);
            }
        }
    }

    /// Runs one step of the cascade in flight; `None` (and the cascade gone) once settled.
    fn next_step(&mut self) -> Option<StepResult> {
        let cascade = self.cascade.as_mut()?;
        if let Some(step) = cascade.step(&mut self.rng) {
            return Some(step);
        }
        if let Some(done) = self.cascade.take() {
            if done.runaway() {
                self.session.push_message("⚠️ Cascade cut short".to_string());
            }
            self.grid = done.into_grid();
        }
        None
    }

    fn book_step(&mut self, step: &StepResult) {
        if self.session.apply_step(step) == Phase::LevelComplete {
            // the rest of the cascade is discarded with the board
            self.cascade = None;
            self.animation = Animation::Idle;
            self.screen = Screen::LevelTransition;
        }
    }

    /// Moves the cascade animation along: step, highlight, fall, repeat.
    fn tick_animation(&mut self, now: Instant) {
        match std::mem::replace(&mut self.animation, Animation::Idle) {
            Animation::Idle => {
                let Some(before) = self.cascade.as_ref().map(|c| c.grid().clone()) else {
                    return;
                };
                let Some(step) = self.next_step() else {
                    return;
                };
                self.clear_effect = None;
                self.clear_effect_time = None;
                self.animation = Animation::Highlight {
                    before,
                    step,
                    started: now,
                };
            }
            Animation::Highlight {
                before,
                step,
                started,
            } => {
                if now.duration_since(started) < Duration::from_millis(HIGHLIGHT_MS) {
                    self.animation = Animation::Highlight {
                        before,
                        step,
                        started,
                    };
                    return;
                }
                self.clear_effect = None;
                self.book_step(&step);
                if self.screen != Screen::Playing {
                    return;
                }
                let placed: Vec<_> = step.created_power_ups.iter().map(|p| p.cell).collect();
                let motion = Motion::between(&before, self.shown_grid(), &placed);
                if !motion.is_empty() {
                    self.animation = Animation::Fall {
                        motion,
                        started: now,
                    };
                }
            }
            Animation::Fall { motion, started } => {
                if now.duration_since(started) < Duration::from_millis(FALL_MS) {
                    self.animation = Animation::Fall { motion, started };
                }
            }
        }
    }

    fn finish_game(&mut self) {
        self.cascade = None;
        self.animation = Animation::Idle;
        self.screen = Screen::GameOver;
        let Some(name) = self.player.as_deref() else {
            return;
        };
        let path = self.store.leaderboard_path();
        match leaderboard::submit(&path, name, self.session.total_cleared) {
            Ok(board) => self.leaderboard = board,
            Err(e) => {
                warn!(error = %e, "could not save leaderboard");
                self.status = Some(format!("Leaderboard not saved: {e}"));
            }
        }
    }

    fn select(&mut self) {
        if self.busy() {
            return;
        }
        let cursor = self.cursor;
        match self.selected {
            None => {
                let special = self.grid.symbol(cursor).and_then(|s| s.power_up()).is_some();
                if special {
                    self.start_cascade(engine::Action::Activate(cursor));
                } else {
                    self.selected = Some(cursor);
                }
            }
            Some(sel) if sel == cursor => self.selected = None,
            Some(sel) if sel.is_adjacent(cursor) => {
                self.selected = None;
                self.start_cascade(engine::Action::Swap(sel, cursor));
            }
            Some(_) => self.selected = Some(cursor),
        }
    }

    fn move_cursor(&mut self, action: Action) {
        let (rows, cols) = (self.grid.rows(), self.grid.cols());
        let c = &mut self.cursor;
        match action {
            Action::Up => c.row = c.row.saturating_sub(1),
            Action::Down => c.row = (c.row + 1).min(rows - 1),
            Action::Left => c.col = c.col.saturating_sub(1),
            Action::Right => c.col = (c.col + 1).min(cols - 1),
            _ => {}
        }
    }

    fn submit_name(&mut self) {
        let Some(name) = sanitize_name(&self.name_input) else {
            return;
        };
        if let Err(e) = self.store.remember_player(&name) {
            warn!(error = %e, "could not remember player");
        }
        info!(player = %name, "signed in");
        self.player = Some(name);
        self.name_input.clear();
        self.screen = Screen::Playing;
        self.last_tick = Instant::now();
    }

    fn sign_out(&mut self) -> Result<()> {
        if let Err(e) = self.store.forget_player() {
            warn!(error = %e, "could not forget player");
        }
        self.player = None;
        self.restart()?;
        self.screen = Screen::Login;
        Ok(())
    }

    /// Returns `false` when the app should exit.
    fn handle_key(&mut self, key: event::KeyEvent) -> Result<bool> {
        if self.screen == Screen::Login {
            match key_to_name_key(key) {
                NameKey::Quit => return Ok(false),
                NameKey::Submit => self.submit_name(),
                NameKey::Erase => {
                    self.name_input.pop();
                }
                NameKey::Type(c) => self.name_input.push(c),
                NameKey::None => {}
            }
            return Ok(true);
        }

        let action = key_to_action(key);
        match self.screen {
            Screen::Login => {}
            Screen::Playing if self.paused => match action {
                Action::Pause => {
                    self.paused = false;
                    self.last_tick = Instant::now();
                }
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                _ => {}
            },
            Screen::Playing => match action {
                Action::Up | Action::Down | Action::Left | Action::Right => {
                    self.move_cursor(action)
                }
                Action::Select => self.select(),
                Action::Pause => self.paused = true,
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.next(),
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.prev(),
                Action::Select => match self.quit_selected {
                    QuitOption::Resume => self.resume(),
                    QuitOption::Restart => self.restart()?,
                    QuitOption::Exit => return Ok(false),
                },
                Action::Quit | Action::Pause => self.resume(),
                _ => {}
            },
            Screen::LevelTransition => match action {
                Action::Select => {
                    self.session.advance_level();
                    self.new_board()?;
                    self.screen = Screen::Playing;
                }
                Action::Quit => return Ok(false),
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Restart => self.restart()?,
                Action::SignOut => self.sign_out()?,
                Action::Quit => return Ok(false),
                _ => {}
            },
        }
        Ok(true)
    }

    fn resume(&mut self) {
        self.screen = Screen::Playing;
        self.last_tick = Instant::now();
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = ratatui::init();
        let result = self.run_loop(&mut terminal);
        ratatui::restore();
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        loop {
            let now = Instant::now();

            if self.screen == Screen::Playing && !self.paused {
                let elapsed = now.duration_since(self.last_tick);
                if self.session.tick(elapsed) == Phase::GameOver {
                    self.finish_game();
                } else {
                    self.tick_animation(now);
                }
            }
            self.last_tick = now;

            let board_fx = match &self.animation {
                Animation::Idle => BoardFx::Still,
                Animation::Highlight { step, .. } => BoardFx::Clearing(&step.cleared),
                Animation::Fall { motion, started } => {
                    let progress = now.duration_since(*started).as_secs_f64()
                        / Duration::from_millis(FALL_MS).as_secs_f64();
                    BoardFx::Falling(motion, progress)
                }
            };
            let grid = match &self.animation {
                Animation::Highlight { before, .. } => before,
                _ => self.cascade.as_ref().map_or(&self.grid, Cascade::grid),
            };
            let view = View {
                screen: self.screen,
                paused: self.paused,
                theme: &self.theme,
                session: &self.session,
                grid,
                palette: self.palette(),
                glyphs: self.config.glyphs,
                cursor: self.cursor,
                selected: self.selected,
                board_fx,
                player: self.player.as_deref(),
                name_input: &self.name_input,
                leaderboard: &self.leaderboard,
                quit_selected: self.quit_selected,
                status: self.status.as_deref(),
            };
            let (effect, effect_time) = (&mut self.clear_effect, &mut self.clear_effect_time);
            terminal.draw(|f| ui::draw(f, &view, effect, effect_time, now))?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if !self.handle_key(key)? {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
