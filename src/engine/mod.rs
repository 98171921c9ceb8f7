//! Match-3 cascade engine. Pure and synchronous: every call takes a board and a
//! [`Dice`] and returns a new board plus a description of what happened.

mod bonus;
mod cascade;
mod dice;
mod error;
mod generator;
mod grid;
mod groups;
mod matcher;
mod powerup;

pub use bonus::{Bonus, MAX_TIME_BONUS, calculate as calculate_bonus};
pub use cascade::{
    Action, Cascade, CascadeState, DEFAULT_MAX_STEPS, EngineConfig, Settle, StepResult, resolve,
};
pub use dice::Dice;
pub use error::EngineError;
pub use generator::generate;
pub use grid::{Alphabet, Cell, Grid, MIN_SIDE, PowerUp, Symbol, Tile, TileId};
pub use groups::{Group, group_by_4_connectivity, largest_group_size};
pub use matcher::{MIN_RUN, MatchSet, find_matches, has_matches};
pub use powerup::{
    BOMB_GROUP_SIZE, CreatedPowerUp, LINE_GROUP_SIZE, blast_area, expand, plan_creation,
};
