//! Run detection: horizontal and vertical runs of three or more equal symbols.

use super::grid::{Cell, Grid, Symbol};
use std::collections::BTreeSet;

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

/// Deduplicated cells; ordered so that downstream random picks are reproducible.
pub type MatchSet = BTreeSet<Cell>;

/// Every cell on a run of `MIN_RUN`+ equal symbols. Specials match like regular symbols;
/// empty slots break runs.
pub fn find_matches(grid: &Grid) -> MatchSet {
    let mut matches = MatchSet::new();
    for row in 0..grid.rows() {
        scan_line(grid, (0..grid.cols()).map(|col| Cell::new(row, col)), &mut matches);
    }
    for col in 0..grid.cols() {
        scan_line(grid, (0..grid.rows()).map(|row| Cell::new(row, col)), &mut matches);
    }
    matches
}

pub fn has_matches(grid: &Grid) -> bool {
    !find_matches(grid).is_empty()
}

fn scan_line(grid: &Grid, line: impl Iterator<Item = Cell>, out: &mut MatchSet) {
    let mut run: Vec<Cell> = Vec::new();
    let mut current: Option<Symbol> = None;
    for cell in line {
        let symbol = grid.symbol(cell);
        if symbol.is_some() && symbol == current {
            run.push(cell);
            continue;
        }
        flush(&mut run, out);
        current = symbol;
        if symbol.is_some() {
            run.push(cell);
        }
    }
    flush(&mut run, out);
}

fn flush(run: &mut Vec<Cell>, out: &mut MatchSet) {
    if run.len() >= MIN_RUN {
        out.extend(run.drain(..));
    } else {
        run.clear();
    }
}
