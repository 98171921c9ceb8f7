//! Falling animation: how far each tile travels between two boards, joined by `TileId`.

use blocktui::engine::{Cell, Grid, Tile, TileId};
use std::collections::HashMap;

/// Rows each tile of the newer board fell; tiles that did not move are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Motion {
    drops: HashMap<TileId, usize>,
}

impl Motion {
    /// Survivors fall from their old row. Fresh tiles start above the board, stacked
    /// in the order they landed, so a column of `k` refills falls `k` rows.
    /// Tiles at `placed` (power-ups made in place) do not move and are not refills.
    pub fn between(before: &Grid, after: &Grid, placed: &[Cell]) -> Self {
        let origin: HashMap<TileId, usize> =
            before.tiles().map(|(cell, tile)| (tile.id, cell.row)).collect();
        let mut drops = HashMap::new();
        for col in 0..after.cols() {
            let column: Vec<(usize, Tile)> = (0..after.rows())
                .filter(|&row| !placed.contains(&Cell::new(row, col)))
                .filter_map(|row| after.tile(Cell::new(row, col)).map(|t| (row, t)))
                .collect();
            let fresh = column.iter().filter(|(_, t)| !origin.contains_key(&t.id)).count();
            for &(row, tile) in &column {
                let drop = origin.get(&tile.id).map_or(fresh, |&from| row.saturating_sub(from));
                if drop > 0 {
                    drops.insert(tile.id, drop);
                }
            }
        }
        Self { drops }
    }

    pub fn drop_of(&self, id: TileId) -> usize {
        self.drops.get(&id).copied().unwrap_or(0)
    }

    /// Rows still to fall at `progress` in [0, 1].
    pub fn remaining(&self, id: TileId, progress: f64) -> f64 {
        self.drop_of(id) as f64 * (1.0 - progress.clamp(0.0, 1.0))
    }

    pub fn is_empty(&self) -> bool {
        self.drops.is_empty()
    }
}
