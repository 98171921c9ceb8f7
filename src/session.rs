//! Level progression around the engine: countdown, block targets, palette rotation
//! and the message log.

use crate::engine::{Dice, StepResult};
use std::time::Duration;
use tracing::info;

pub const STARTING_TIMER_SECS: u32 = 40;
pub const MIN_TIMER_SECS: u32 = 10;
pub const BASE_TARGET: u32 = 20;
/// Extra blocks required per level.
pub const TARGET_STEP: u32 = 5;

const MESSAGE_LOG_CAP: usize = 64;
const SECOND: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub starting_timer_secs: u32,
    pub base_target: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_timer_secs: STARTING_TIMER_SECS,
            base_target: BASE_TARGET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    /// Target reached; waiting for the player to continue.
    LevelComplete,
    /// Countdown hit zero.
    GameOver,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    pub level: u32,
    palette_order: Vec<usize>,
    pub time_left: u32,
    /// Sub-second time not yet charged to the countdown.
    carry: Duration,
    pub target: u32,
    pub remaining: u32,
    pub total_cleared: u32,
    pub best_chain: usize,
    messages: Vec<String>,
    phase: Phase,
}

/// `max(MIN_TIMER_SECS, starting - (level - 1))`.
pub fn timer_for_level(level: u32, starting_timer_secs: u32) -> u32 {
    starting_timer_secs
        .saturating_sub(level.saturating_sub(1))
        .max(MIN_TIMER_SECS)
}

/// `base + TARGET_STEP * (level - 1)`.
pub fn target_for_level(level: u32, base_target: u32) -> u32 {
    base_target + TARGET_STEP * level.saturating_sub(1)
}

impl Session {
    /// Fresh game at level 1. The palette order is shuffled once here and kept for
    /// every later level and restart.
    pub fn new<D: Dice + ?Sized>(
        config: SessionConfig,
        palette_count: usize,
        dice: &mut D,
    ) -> Self {
        let palette_order = crate::palette::shuffled_order(palette_count.max(1), dice);
        let mut session = Self {
            config,
            level: 1,
            palette_order,
            time_left: 0,
            carry: Duration::ZERO,
            target: 0,
            remaining: 0,
            total_cleared: 0,
            best_chain: 0,
            messages: Vec::new(),
            phase: Phase::Playing,
        };
        session.enter_level(1);
        session
    }

    fn enter_level(&mut self, level: u32) {
        self.level = level;
        self.time_left = timer_for_level(level, self.config.starting_timer_secs);
        self.target = target_for_level(level, self.config.base_target);
        self.remaining = self.target;
        self.carry = Duration::ZERO;
        self.phase = Phase::Playing;
        info!(level, timer = self.time_left, target = self.target, "level started");
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Active palette: `order[(level - 1) % len]`.
    pub fn palette_index(&self) -> usize {
        let slot = (self.level.saturating_sub(1) as usize) % self.palette_order.len();
        self.palette_order[slot]
    }

    /// Books one cascade step. Steps arriving outside `Playing` are ignored.
    pub fn apply_step(&mut self, step: &StepResult) -> Phase {
        if self.phase != Phase::Playing {
            return self.phase;
        }
        let cleared = step.cleared_count as u32;
        self.total_cleared += cleared;
        self.remaining = self.remaining.saturating_sub(cleared);
        self.time_left += step.time_bonus;
        self.best_chain = self.best_chain.max(step.chain_depth + 1);
        for msg in &step.log_messages {
            self.push_message(msg.clone());
        }
        if self.remaining == 0 {
            info!(level = self.level, total = self.total_cleared, "level complete");
            self.phase = Phase::LevelComplete;
            self.messages.clear();
        }
        self.phase
    }

    /// Advances the countdown by `elapsed`, whole seconds at a time.
    pub fn tick(&mut self, elapsed: Duration) -> Phase {
        if self.phase != Phase::Playing {
            return self.phase;
        }
        self.carry += elapsed;
        while self.carry >= SECOND && self.time_left > 0 {
            self.carry -= SECOND;
            self.time_left -= 1;
        }
        if self.time_left == 0 {
            info!(level = self.level, total = self.total_cleared, "out of time");
            self.phase = Phase::GameOver;
        }
        self.phase
    }

    pub fn advance_level(&mut self) {
        self.enter_level(self.level + 1);
    }

    /// Back to level 1 with the same palette order.
    pub fn restart(&mut self) {
        self.total_cleared = 0;
        self.best_chain = 0;
        self.messages.clear();
        self.enter_level(1);
    }

    pub fn push_message(&mut self, msg: String) {
        if self.messages.len() == MESSAGE_LOG_CAP {
            self.messages.remove(0);
        }
        self.messages.push(msg);
    }

    /// Newest first.
    pub fn recent_messages(&self, n: usize) -> impl Iterator<Item = &str> {
        self.messages.iter().rev().take(n).map(String::as_str)
    }

    /// Time left against the starting timer, clamped to [0, 1].
    pub fn time_ratio(&self) -> f64 {
        let full = self.config.starting_timer_secs.max(1);
        (f64::from(self.time_left) / f64::from(full)).clamp(0.0, 1.0)
    }

    /// Blocks still to clear against this level's target.
    pub fn block_ratio(&self) -> f64 {
        if self.target == 0 {
            return 0.0;
        }
        (f64::from(self.remaining) / f64::from(self.target)).clamp(0.0, 1.0)
    }
}
