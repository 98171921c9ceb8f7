//! Power-ups: which groups earn one, and what a special tile sweeps when it fires.

use super::dice::Dice;
use super::grid::{Cell, Grid, PowerUp};
use super::groups::Group;
use super::matcher::MatchSet;

/// Group size that earns a bomb.
pub const BOMB_GROUP_SIZE: usize = 6;
/// Group size that earns a row blaster or column crusher.
pub const LINE_GROUP_SIZE: usize = 5;

/// A special tile queued for placement after compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedPowerUp {
    pub kind: PowerUp,
    pub cell: Cell,
}

impl CreatedPowerUp {
    pub fn log_message(&self) -> String {
        match self.kind {
            PowerUp::Bomb => "💣 Bomb created!".to_string(),
            PowerUp::RowClear => "🔥 Row blaster created!".to_string(),
            PowerUp::ColumnClear => "🌪️ Column crusher created!".to_string(),
        }
    }
}

/// At most one power-up per group: 6+ cells make a bomb, exactly 5 a line clearer
/// (row or column, even odds). The cell is picked uniformly within the group.
pub fn plan_creation<D: Dice + ?Sized>(groups: &[Group], dice: &mut D) -> Vec<CreatedPowerUp> {
    let mut created = Vec::new();
    for group in groups {
        let size = group.len();
        if size < LINE_GROUP_SIZE {
            continue;
        }
        let cell = group[dice.roll(size)];
        let kind = if size >= BOMB_GROUP_SIZE {
            PowerUp::Bomb
        } else if dice.flip() {
            PowerUp::RowClear
        } else {
            PowerUp::ColumnClear
        };
        created.push(CreatedPowerUp { kind, cell });
    }
    created
}

/// Cells a special tile sweeps in addition to its own.
pub fn blast_area(grid: &Grid, cell: Cell, kind: PowerUp) -> Vec<Cell> {
    match kind {
        PowerUp::Bomb => grid.neighbours8(cell).collect(),
        PowerUp::RowClear => (0..grid.cols()).map(|col| Cell::new(cell.row, col)).collect(),
        PowerUp::ColumnClear => (0..grid.rows()).map(|row| Cell::new(row, cell.col)).collect(),
    }
}

/// Grows `seed` until no special tile inside it adds anything new. Each cell is
/// inspected once, so chains of specials fire exactly once within a step.
pub fn expand(grid: &Grid, seed: &MatchSet) -> MatchSet {
    let mut expanded = seed.clone();
    let mut pending: Vec<Cell> = seed.iter().copied().collect();
    while let Some(cell) = pending.pop() {
        let Some(kind) = grid.symbol(cell).and_then(|s| s.power_up()) else {
            continue;
        };
        for hit in blast_area(grid, cell, kind) {
            if expanded.insert(hit) {
                pending.push(hit);
            }
        }
    }
    expanded
}
