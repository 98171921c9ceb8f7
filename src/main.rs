//! blocktui: match-3 emoji block puzzle in the terminal.

mod app;
mod input;
mod motion;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use blocktui::engine::{DEFAULT_MAX_STEPS, EngineConfig};
use blocktui::palette::GlyphSet;
use blocktui::session::{BASE_TARGET, STARTING_TIMER_SECS, SessionConfig};
use blocktui::storage::Store;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Options derived from the CLI that shape one run of the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub engine: EngineConfig,
    pub session: SessionConfig,
    pub glyphs: GlyphSet,
    pub seed: Option<u64>,
    pub no_animation: bool,
    pub player: Option<String>,
    pub frame_rate: f64,
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            rows: args.rows,
            cols: args.cols,
            engine: EngineConfig {
                max_steps: args.max_steps,
                chain_bonus_from: args.chain_bonus_from,
                revert_unmatched_swaps: args.revert_unmatched_swaps,
            },
            session: SessionConfig {
                starting_timer_secs: args.timer,
                base_target: args.target,
            },
            glyphs: args.glyphs,
            seed: args.seed,
            no_animation: args.no_animation,
            player: args.player.clone(),
            frame_rate: args.frame_rate,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.colors).unwrap_or_default();
    let config = GameConfig::from(&args);
    let mut app = App::new(config, theme, Store::from_env())?;
    app.run()?;
    Ok(())
}

/// Logs go to a file so they never fight the UI for the terminal.
/// No `--log-file`, no subscriber.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env("BLOCKTUI_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Match-3 emoji block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blocktui",
    version,
    about = "Match-3 emoji block puzzle in the terminal. Swap neighbours, clear runs of three, beat the clock.",
    long_about = "blocktui is a terminal take on the emoji block game.\n\n\
        Swap two neighbouring tiles to line up three or more of a kind. Cleared tiles \
        fall away and new ones drop in; chains and big groups buy extra seconds. Groups \
        of five make a row blaster or column crusher, six or more a bomb. Clear the \
        level target before the timer runs out.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor    Space / Enter  Select, swap, fire power-up\n  \
        P              Pause          Q / Esc        Quit menu\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Board rows.
    #[arg(long, default_value = "6", value_name = "N")]
    pub rows: usize,

    /// Board columns.
    #[arg(long, default_value = "6", value_name = "N")]
    pub cols: usize,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour scheme for tiles: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub colors: ColorScheme,

    /// Tile faces: emoji, or plain letters for terminals without emoji fonts.
    #[arg(long, value_enum, default_value = "emoji")]
    pub glyphs: GlyphSet,

    /// Seed for boards and refills; random when not set.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Resolve cascades instantly (no highlight or falling animation).
    #[arg(long)]
    pub no_animation: bool,

    /// Safety cap on cascade steps per move.
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS, value_name = "N")]
    pub max_steps: usize,

    /// First chain depth (0 = the move's own clear) that earns the chain time bonus.
    #[arg(long, default_value = "1", value_name = "DEPTH")]
    pub chain_bonus_from: usize,

    /// Undo swaps that don't make a match instead of keeping them.
    #[arg(long)]
    pub revert_unmatched_swaps: bool,

    /// Seconds on the clock at level 1 (one less per level, never below 10).
    #[arg(long, default_value_t = STARTING_TIMER_SECS, value_name = "SECS")]
    pub timer: u32,

    /// Blocks to clear at level 1 (five more per level).
    #[arg(long, default_value_t = BASE_TARGET, value_name = "N")]
    pub target: u32,

    /// Play as this name instead of the remembered one.
    #[arg(long, value_name = "NAME")]
    pub player: Option<String>,

    /// Write logs here (filter with BLOCKTUI_LOG, e.g. BLOCKTUI_LOG=blocktui=debug).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorScheme {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fold_into_config() {
        let args = Args::parse_from(["blocktui"]);
        let config = GameConfig::from(&args);
        assert_eq!((config.rows, config.cols), (6, 6));
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.glyphs, GlyphSet::Emoji);
    }

    #[test]
    fn test_flags_reach_engine_config() {
        let args = Args::parse_from([
            "blocktui",
            "--max-steps",
            "8",
            "--chain-bonus-from",
            "2",
            "--revert-unmatched-swaps",
            "--glyphs",
            "ascii",
            "--colors",
            "colourblind",
        ]);
        let config = GameConfig::from(&args);
        assert_eq!(config.engine.max_steps, 8);
        assert_eq!(config.engine.chain_bonus_from, 2);
        assert!(config.engine.revert_unmatched_swaps);
        assert_eq!(config.glyphs, GlyphSet::Ascii);
        assert_eq!(args.colors, ColorScheme::Colorblind);
    }
}
