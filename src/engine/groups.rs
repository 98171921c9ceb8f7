//! 4-connected grouping of matched cells, used to size power-ups and bonuses.

use super::grid::Cell;
use super::matcher::MatchSet;

/// Cells of one cluster, sorted row-major.
pub type Group = Vec<Cell>;

const NEIGHBOURS_4: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Flood fill restricted to `matches`. Each cell lands in exactly one group; diagonals
/// never connect.
pub fn group_by_4_connectivity(matches: &MatchSet) -> Vec<Group> {
    let mut visited = MatchSet::new();
    let mut groups = Vec::new();

    for &start in matches {
        if !visited.insert(start) {
            continue;
        }
        let mut group = Vec::new();
        let mut stack = vec![start];
        while let Some(cell) = stack.pop() {
            group.push(cell);
            for (dr, dc) in NEIGHBOURS_4 {
                let Some(next) = cell.offset(dr, dc) else {
                    continue;
                };
                if matches.contains(&next) && visited.insert(next) {
                    stack.push(next);
                }
            }
        }
        group.sort_unstable();
        groups.push(group);
    }
    groups
}

pub fn largest_group_size(groups: &[Group]) -> usize {
    groups.iter().map(Vec::len).max().unwrap_or(0)
}
