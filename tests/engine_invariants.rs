//! Properties of generation and cascade resolution over random seeds and shapes.

use blocktui::engine::{
    Action, Alphabet, Cell, EngineConfig, MAX_TIME_BONUS, generate, has_matches, resolve,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;

fn shape() -> impl Strategy<Value = (u64, usize, usize, u8)> {
    (any::<u64>(), 3usize..9, 3usize..9, 3u8..7)
}

/// An in-bounds cell and one of its orthogonal neighbours.
fn swap_on(rows: usize, cols: usize, pick: usize) -> Action {
    let cell = Cell::new((pick / cols) % rows, pick % cols);
    let other = if cell.col + 1 < cols {
        Cell::new(cell.row, cell.col + 1)
    } else {
        Cell::new(cell.row, cell.col - 1)
    };
    if pick % 2 == 0 || cell.row + 1 >= rows {
        Action::Swap(cell, other)
    } else {
        Action::Swap(cell, Cell::new(cell.row + 1, cell.col))
    }
}

proptest! {
    #[test]
    fn generated_boards_are_full_and_clean((seed, rows, cols, symbols) in shape()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let alphabet = Alphabet::with_len(symbols).unwrap();
        let grid = generate(rows, cols, &alphabet, &mut rng).unwrap();
        prop_assert!(grid.is_full());
        prop_assert!(!has_matches(&grid));
        let ids: HashSet<_> = grid.tiles().map(|(_, t)| t.id).collect();
        prop_assert_eq!(ids.len(), rows * cols);
    }

    #[test]
    fn swaps_settle_to_stable_boards(
        (seed, rows, cols, symbols) in shape(),
        picks in proptest::collection::vec(any::<usize>(), 1..6),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let alphabet = Alphabet::with_len(symbols).unwrap();
        let config = EngineConfig::default();
        let mut grid = generate(rows, cols, &alphabet, &mut rng).unwrap();

        for pick in picks {
            let action = swap_on(rows, cols, pick);
            let settle = resolve(grid, action, &alphabet, &config, &mut rng).unwrap();
            prop_assert!(settle.grid.is_full());
            prop_assert!(settle.runaway || !has_matches(&settle.grid));
            for (i, step) in settle.steps.iter().enumerate() {
                prop_assert_eq!(step.chain_depth, i);
                prop_assert!(step.time_bonus <= MAX_TIME_BONUS);
                prop_assert!(step.cleared_count > 0);
                prop_assert_eq!(step.cleared_count, step.cleared.len());
            }
            let ids: HashSet<_> = settle.grid.tiles().map(|(_, t)| t.id).collect();
            prop_assert_eq!(ids.len(), rows * cols);
            grid = settle.grid;
        }
    }

    #[test]
    fn settling_a_stable_board_is_a_no_op((seed, rows, cols, symbols) in shape()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let alphabet = Alphabet::with_len(symbols).unwrap();
        let grid = generate(rows, cols, &alphabet, &mut rng).unwrap();
        let config = EngineConfig::default();
        let settle = resolve(grid.clone(), Action::Settle, &alphabet, &config, &mut rng).unwrap();
        prop_assert!(settle.steps.is_empty());
        prop_assert_eq!(settle.grid, grid);
    }
}
