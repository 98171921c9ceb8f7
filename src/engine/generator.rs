//! Initial boards with no pre-existing match.

use super::dice::Dice;
use super::error::EngineError;
use super::grid::{Alphabet, Cell, Grid, Symbol};
use tracing::debug;

/// Fills row-major; a candidate is excluded when it would complete a run with its two
/// left or two upper neighbours. At most two symbols are ever excluded, so any
/// alphabet of three or more always leaves a choice and no retry is needed.
pub fn generate<D: Dice + ?Sized>(
    rows: usize,
    cols: usize,
    alphabet: &Alphabet,
    dice: &mut D,
) -> Result<Grid, EngineError> {
    let mut grid = Grid::empty(rows, cols)?;
    let mut allowed: Vec<Symbol> = Vec::with_capacity(alphabet.len());
    for cell in grid.cells() {
        allowed.clear();
        allowed.extend(alphabet.symbols().filter(|&s| !completes_run(&grid, cell, s)));
        let symbol = allowed[dice.roll(allowed.len())];
        grid.fill(cell, symbol);
    }
    debug!(rows, cols, symbols = alphabet.len(), "generated board");
    Ok(grid)
}

fn completes_run(grid: &Grid, cell: Cell, symbol: Symbol) -> bool {
    let same = |dr: isize, dc: isize| {
        cell.offset(dr, dc)
            .and_then(|c| grid.symbol(c))
            .is_some_and(|s| s == symbol)
    };
    (same(0, -1) && same(0, -2)) || (same(-1, 0) && same(-2, 0))
}
