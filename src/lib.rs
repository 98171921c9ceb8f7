//! blocktui: a match-3 cascade engine and the pieces of the terminal game built on it.

pub mod engine;
pub mod leaderboard;
pub mod palette;
pub mod session;
pub mod storage;
