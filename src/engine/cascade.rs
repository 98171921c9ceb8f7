//! Cascade state machine: detect, expand, clear, create, compact, refill, re-detect.

use super::bonus;
use super::dice::Dice;
use super::error::EngineError;
use super::grid::{Alphabet, Cell, Grid, Symbol};
use super::groups::{group_by_4_connectivity, largest_group_size};
use super::matcher::{MatchSet, find_matches};
use super::powerup::{self, CreatedPowerUp};
use tracing::{debug, instrument, warn};

/// Steps after which a cascade is forcibly settled.
pub const DEFAULT_MAX_STEPS: usize = 64;

/// What the player did. Adjacency is checked before any work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Swap(Cell, Cell),
    /// Fire the special tile at this cell directly.
    Activate(Cell),
    /// Resolve whatever matches the board already holds.
    Settle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_steps: usize,
    /// First chain depth that earns the chain bonus.
    pub chain_bonus_from: usize,
    /// Undo a swap that produced nothing instead of keeping it.
    pub revert_unmatched_swaps: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            chain_bonus_from: 1,
            revert_unmatched_swaps: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    Idle,
    /// A step just landed; the next `step` call looks for new runs first.
    Detecting,
    Resolving(usize),
    Settled,
}

/// Outcome of one resolve step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// Index of this step within its cascade, starting at 0.
    pub chain_depth: usize,
    /// Cleared cells (after power-up expansion), row-major.
    pub cleared: Vec<Cell>,
    pub cleared_count: usize,
    /// Largest 4-connected group among the run cells; 0 for a direct activation.
    pub largest_group_size: usize,
    pub time_bonus: u32,
    pub created_power_ups: Vec<CreatedPowerUp>,
    /// The step was seeded by firing a special tile rather than by runs.
    pub activation: bool,
    pub log_messages: Vec<String>,
}

/// A finished cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settle {
    pub grid: Grid,
    pub steps: Vec<StepResult>,
    /// The step cap was hit and the board may still hold matches.
    pub runaway: bool,
}

impl Settle {
    pub fn total_cleared(&self) -> usize {
        self.steps.iter().map(|s| s.cleared_count).sum()
    }

}

/// Resumable cascade over an owned grid. Dropping it mid-way is always safe.
#[derive(Debug, Clone)]
pub struct Cascade {
    grid: Grid,
    alphabet: Alphabet,
    config: EngineConfig,
    state: CascadeState,
    pending: MatchSet,
    /// Depth the next step runs at.
    depth: usize,
    activation: bool,
    runaway: bool,
}

impl Cascade {
    pub fn new(grid: Grid, alphabet: Alphabet, config: EngineConfig) -> Self {
        Self {
            grid,
            alphabet,
            config,
            state: CascadeState::Idle,
            pending: MatchSet::new(),
            depth: 0,
            activation: false,
            runaway: false,
        }
    }

    /// `new` followed by `begin`.
    pub fn start(
        grid: Grid,
        action: Action,
        alphabet: Alphabet,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        Self::new(grid, alphabet, config).begin(action)
    }

    /// Validates and applies `action`, then seeds step 0. An empty seed settles at once.
    /// A swap touching a special tile fires it (both, if both are special).
    #[instrument(
        level = "debug",
        skip(self),
        fields(rows = self.grid.rows(), cols = self.grid.cols())
    )]
    pub fn begin(mut self, action: Action) -> Result<Self, EngineError> {
        if self.state != CascadeState::Idle {
            return Err(EngineError::AlreadyStarted);
        }
        match action {
            Action::Swap(a, b) => {
                for cell in [a, b] {
                    if !self.grid.contains(cell) {
                        return Err(EngineError::OutOfBounds(cell));
                    }
                }
                if !a.is_adjacent(b) {
                    return Err(EngineError::InvalidSwap { a, b });
                }
                self.grid.swap(a, b);
                let fired: MatchSet = [a, b]
                    .into_iter()
                    .filter(|&c| self.grid.symbol(c).and_then(|s| s.power_up()).is_some())
                    .collect();
                if fired.is_empty() {
                    self.pending = find_matches(&self.grid);
                    if self.pending.is_empty() && self.config.revert_unmatched_swaps {
                        self.grid.swap(a, b);
                    }
                } else {
                    self.activation = true;
                    self.pending = fired;
                }
            }
            Action::Activate(cell) => {
                if !self.grid.contains(cell) {
                    return Err(EngineError::OutOfBounds(cell));
                }
                if self.grid.symbol(cell).and_then(|s| s.power_up()).is_none() {
                    return Err(EngineError::NotAPowerUp(cell));
                }
                self.activation = true;
                self.pending = [cell].into();
            }
            Action::Settle => self.pending = find_matches(&self.grid),
        }
        self.state = if self.pending.is_empty() {
            CascadeState::Settled
        } else {
            CascadeState::Resolving(0)
        };
        debug!(?action, seed = self.pending.len(), state = ?self.state, "cascade started");
        Ok(self)
    }

    pub fn state(&self) -> CascadeState {
        self.state
    }

    pub fn is_settled(&self) -> bool {
        self.state == CascadeState::Settled
    }

    pub fn runaway(&self) -> bool {
        self.runaway
    }

    /// Board as of the last completed step.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Re-scans the board after a step and picks the next state.
    fn detect(&mut self) {
        self.pending = find_matches(&self.grid);
        self.state = if self.pending.is_empty() {
            CascadeState::Settled
        } else {
            CascadeState::Resolving(self.depth)
        };
    }

    /// Runs one step; `None` once settled.
    pub fn step<D: Dice + ?Sized>(&mut self, dice: &mut D) -> Option<StepResult> {
        if self.state == CascadeState::Detecting {
            self.detect();
        }
        let CascadeState::Resolving(depth) = self.state else {
            return None;
        };
        if depth >= self.config.max_steps {
            warn!(
                depth,
                pending = self.pending.len(),
                "runaway cascade: step cap reached, settling with matches left"
            );
            self.runaway = true;
            self.state = CascadeState::Settled;
            return None;
        }

        let raw = std::mem::take(&mut self.pending);
        let expanded = powerup::expand(&self.grid, &raw);

        let (created, largest) = if self.activation {
            (Vec::new(), 0)
        } else {
            let groups = group_by_4_connectivity(&raw);
            (powerup::plan_creation(&groups, dice), largest_group_size(&groups))
        };

        for &cell in &expanded {
            self.grid.take(cell);
        }
        self.grid.compact_and_refill(&self.alphabet, dice);
        for p in &created {
            self.grid.fill(p.cell, Symbol::Special(p.kind));
        }

        let bonus = bonus::calculate(largest, depth, self.config.chain_bonus_from);
        let mut log_messages: Vec<String> =
            created.iter().map(CreatedPowerUp::log_message).collect();
        log_messages.extend(bonus.messages);

        let result = StepResult {
            chain_depth: depth,
            cleared_count: expanded.len(),
            cleared: expanded.into_iter().collect(),
            largest_group_size: largest,
            time_bonus: bonus.time_bonus,
            created_power_ups: created,
            activation: self.activation,
            log_messages,
        };
        debug!(
            depth,
            cleared = result.cleared_count,
            largest,
            bonus = result.time_bonus,
            created = result.created_power_ups.len(),
            "cascade step"
        );

        self.activation = false;
        self.depth = depth + 1;
        self.state = CascadeState::Detecting;
        Some(result)
    }

    pub fn run_to_settle<D: Dice + ?Sized>(mut self, dice: &mut D) -> Settle {
        let mut steps = Vec::new();
        while let Some(step) = self.step(dice) {
            steps.push(step);
        }
        Settle {
            grid: self.grid,
            steps,
            runaway: self.runaway,
        }
    }
}

/// One-shot resolve: applies `action` and runs the cascade to completion.
pub fn resolve<D: Dice + ?Sized>(
    grid: Grid,
    action: Action,
    alphabet: &Alphabet,
    config: &EngineConfig,
    dice: &mut D,
) -> Result<Settle, EngineError> {
    Ok(Cascade::start(grid, action, alphabet.clone(), config.clone())?.run_to_settle(dice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grid::PowerUp;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Cycle(Vec<usize>, usize);

    impl Dice for Cycle {
        fn roll(&mut self, sides: usize) -> usize {
            let v = self.0[self.1 % self.0.len()];
            self.1 += 1;
            v % sides
        }
    }

    /// 6×6 board of ids `(2r + c) % 4`: rows cycle four symbols, columns alternate two.
    fn striped() -> Vec<Vec<Symbol>> {
        (0..6)
            .map(|r| (0..6).map(|c| Symbol::Regular(((2 * r + c) % 4) as u8)).collect())
            .collect()
    }

    fn set(rows: &mut [Vec<Symbol>], cells: &[(usize, usize)], symbol: Symbol) {
        for &(r, c) in cells {
            rows[r][c] = symbol;
        }
    }

    fn six() -> Alphabet {
        Alphabet::with_len(6).unwrap()
    }

    fn assert_settled(settle: &Settle) {
        assert!(settle.grid.is_full());
        assert!(find_matches(&settle.grid).is_empty());
        for (i, step) in settle.steps.iter().enumerate() {
            assert_eq!(step.chain_depth, i);
            assert!(step.time_bonus <= bonus::MAX_TIME_BONUS);
            assert_eq!(step.cleared_count, step.cleared.len());
        }
    }

    #[test]
    fn test_run_of_five_makes_line_clearer() {
        let mut rows = striped();
        set(&mut rows, &[(5, 0), (5, 1), (5, 3), (5, 4), (4, 2)], Symbol::Regular(4));
        let grid = Grid::from_symbols(&rows).unwrap();
        assert!(find_matches(&grid).is_empty());

        // cell index 2 of the run, row blaster, then refills 0..=4 across row 0
        let mut dice = Cycle(vec![2, 0, 0, 1, 2, 3, 4], 0);
        let action = Action::Swap(Cell::new(4, 2), Cell::new(5, 2));
        let settle = resolve(grid, action, &six(), &EngineConfig::default(), &mut dice).unwrap();

        assert_settled(&settle);
        assert_eq!(settle.steps.len(), 1);
        let step = &settle.steps[0];
        assert_eq!(step.cleared_count, 5);
        assert_eq!(step.largest_group_size, 5);
        assert_eq!(step.time_bonus, 2);
        assert_eq!(step.created_power_ups.len(), 1);
        let created = step.created_power_ups[0];
        assert!(matches!(created.kind, PowerUp::RowClear | PowerUp::ColumnClear));
        assert_eq!(created.cell.row, 5);
        assert!(created.cell.col <= 4);
        assert_eq!(settle.grid.symbol(created.cell), Some(Symbol::Special(created.kind)));
        assert!(step.log_messages.iter().any(|m| m.contains("5-match")));
    }

    #[test]
    fn test_l_shape_of_six_makes_bomb() {
        let mut rows = striped();
        set(
            &mut rows,
            &[(3, 0), (4, 0), (5, 0), (5, 1), (5, 2), (5, 3)],
            Symbol::Regular(4),
        );
        let grid = Grid::from_symbols(&rows).unwrap();

        // bomb at group index 5 = (5, 3); then six refills alternating 4/5
        let mut dice = Cycle(vec![5, 4, 5, 4, 5, 4, 5], 0);
        let settle =
            resolve(grid, Action::Settle, &six(), &EngineConfig::default(), &mut dice).unwrap();

        assert_settled(&settle);
        assert_eq!(settle.steps.len(), 1);
        let step = &settle.steps[0];
        assert_eq!(step.largest_group_size, 6);
        assert_eq!(step.time_bonus, 2);
        assert_eq!(
            step.created_power_ups,
            vec![CreatedPowerUp { kind: PowerUp::Bomb, cell: Cell::new(5, 3) }]
        );
        assert_eq!(settle.grid.symbol(Cell::new(5, 3)), Some(Symbol::Special(PowerUp::Bomb)));
    }

    #[test]
    fn test_activating_bomb_clears_neighbourhood_only() {
        let mut rows = striped();
        rows[2][2] = Symbol::Special(PowerUp::Bomb);
        let grid = Grid::from_symbols(&rows).unwrap();
        assert!(find_matches(&grid).is_empty());

        let mut dice = Cycle(vec![4, 5], 0);
        let settle = resolve(
            grid,
            Action::Activate(Cell::new(2, 2)),
            &six(),
            &EngineConfig::default(),
            &mut dice,
        )
        .unwrap();

        assert_settled(&settle);
        assert_eq!(settle.steps.len(), 1);
        let step = &settle.steps[0];
        assert!(step.activation);
        assert_eq!(step.cleared_count, 9);
        assert!(step.cleared.iter().all(|c| c.row.abs_diff(2) <= 1 && c.col.abs_diff(2) <= 1));
        assert!(step.created_power_ups.is_empty());
        assert_eq!(step.largest_group_size, 0);
        assert_eq!(step.time_bonus, 0);
        assert!(settle.grid.tiles().all(|(_, t)| t.symbol.power_up().is_none()));
    }

    #[test]
    fn test_unmatched_swap_is_kept_without_steps() {
        let grid = Grid::from_symbols(&striped()).unwrap();
        let (a, b) = (Cell::new(0, 0), Cell::new(0, 1));
        let mut rng = StdRng::seed_from_u64(1);
        let settle =
            resolve(grid.clone(), Action::Swap(a, b), &six(), &EngineConfig::default(), &mut rng)
                .unwrap();

        assert!(settle.steps.is_empty());
        assert_eq!(settle.grid.tile(a), grid.tile(b));
        assert_eq!(settle.grid.tile(b), grid.tile(a));
        for cell in grid.cells().filter(|&c| c != a && c != b) {
            assert_eq!(settle.grid.tile(cell), grid.tile(cell));
        }
    }

    #[test]
    fn test_unmatched_swap_reverted_when_configured() {
        let grid = Grid::from_symbols(&striped()).unwrap();
        let config = EngineConfig { revert_unmatched_swaps: true, ..EngineConfig::default() };
        let mut rng = StdRng::seed_from_u64(1);
        let action = Action::Swap(Cell::new(0, 0), Cell::new(1, 0));
        let settle = resolve(grid.clone(), action, &six(), &config, &mut rng).unwrap();
        assert!(settle.steps.is_empty());
        assert_eq!(settle.grid, grid);
    }

    #[test]
    fn test_refill_run_chains_with_bonus() {
        let mut rows = striped();
        set(&mut rows, &[(5, 0), (5, 1), (5, 2)], Symbol::Regular(4));
        let grid = Grid::from_symbols(&rows).unwrap();

        // refill row 0 with 5,5,5 (a new run), then 4,5,4
        let mut dice = Cycle(vec![5, 5, 5, 4, 5, 4], 0);
        let settle =
            resolve(grid, Action::Settle, &six(), &EngineConfig::default(), &mut dice).unwrap();

        assert_settled(&settle);
        assert_eq!(settle.steps.len(), 2);
        assert_eq!(settle.steps[0].time_bonus, 0);
        let chained = &settle.steps[1];
        assert_eq!(chained.chain_depth, 1);
        assert_eq!(chained.largest_group_size, 3);
        assert_eq!(chained.time_bonus, 1);
        assert!(chained.log_messages.iter().any(|m| m.contains("Chain")));
        assert_eq!(settle.total_cleared(), 6);
    }

    #[test]
    fn test_chain_bonus_can_start_later() {
        let mut rows = striped();
        set(&mut rows, &[(5, 0), (5, 1), (5, 2)], Symbol::Regular(4));
        let grid = Grid::from_symbols(&rows).unwrap();
        let config = EngineConfig { chain_bonus_from: 2, ..EngineConfig::default() };
        let mut dice = Cycle(vec![5, 5, 5, 4, 5, 4], 0);
        let settle = resolve(grid, Action::Settle, &six(), &config, &mut dice).unwrap();
        assert_eq!(settle.steps[1].time_bonus, 0);
    }

    #[test]
    fn test_step_cap_forces_settle() {
        let mut rows = striped();
        set(&mut rows, &[(5, 0), (5, 1), (5, 2)], Symbol::Regular(4));
        let grid = Grid::from_symbols(&rows).unwrap();
        let config = EngineConfig { max_steps: 1, ..EngineConfig::default() };
        let mut dice = Cycle(vec![5, 5, 5], 0);
        let settle = resolve(grid, Action::Settle, &six(), &config, &mut dice).unwrap();
        assert!(settle.runaway);
        assert_eq!(settle.steps.len(), 1);
        assert!(!find_matches(&settle.grid).is_empty());
    }

    #[test]
    fn test_settled_board_settles_to_nothing() {
        let grid = Grid::from_symbols(&striped()).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let settle =
            resolve(grid.clone(), Action::Settle, &six(), &EngineConfig::default(), &mut rng)
                .unwrap();
        assert!(settle.steps.is_empty());
        assert!(!settle.runaway);
        assert_eq!(settle.grid, grid);
    }

    #[test]
    fn test_swap_into_special_fires_it() {
        let mut rows = striped();
        rows[2][2] = Symbol::Special(PowerUp::RowClear);
        let grid = Grid::from_symbols(&rows).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let action = Action::Swap(Cell::new(2, 2), Cell::new(3, 2));
        let settle = resolve(grid, action, &six(), &EngineConfig::default(), &mut rng).unwrap();

        assert_settled(&settle);
        let first = &settle.steps[0];
        assert!(first.activation);
        assert_eq!(first.cleared_count, 6);
        assert!(first.cleared.iter().all(|c| c.row == 3));
        assert!(first.created_power_ups.is_empty());
    }

    #[test]
    fn test_bad_actions_rejected() {
        let grid = Grid::from_symbols(&striped()).unwrap();
        let config = EngineConfig::default();
        let start = |action| Cascade::start(grid.clone(), action, six(), config.clone());

        assert!(matches!(
            start(Action::Swap(Cell::new(0, 0), Cell::new(1, 1))),
            Err(EngineError::InvalidSwap { .. })
        ));
        assert!(matches!(
            start(Action::Swap(Cell::new(0, 5), Cell::new(0, 6))),
            Err(EngineError::OutOfBounds(_))
        ));
        assert!(matches!(
            start(Action::Activate(Cell::new(1, 1))),
            Err(EngineError::NotAPowerUp(_))
        ));
    }

    #[test]
    fn test_stepwise_matches_state_machine() {
        let mut rows = striped();
        set(&mut rows, &[(5, 0), (5, 1), (5, 2)], Symbol::Regular(4));
        let grid = Grid::from_symbols(&rows).unwrap();
        let cascade = Cascade::new(grid, six(), EngineConfig::default());
        assert_eq!(cascade.state(), CascadeState::Idle);

        let mut cascade = cascade.begin(Action::Settle).unwrap();
        assert_eq!(cascade.state(), CascadeState::Resolving(0));
        let mut dice = Cycle(vec![5, 5, 5, 4, 5, 4], 0);
        assert!(cascade.step(&mut dice).is_some());
        assert_eq!(cascade.state(), CascadeState::Detecting);
        assert_eq!(cascade.step(&mut dice).map(|s| s.chain_depth), Some(1));
        assert_eq!(cascade.state(), CascadeState::Detecting);
        assert!(cascade.step(&mut dice).is_none());
        assert!(cascade.is_settled());
        assert!(cascade.step(&mut dice).is_none());
    }

    #[test]
    fn test_begin_only_once() {
        let mut rows = striped();
        set(&mut rows, &[(5, 0), (5, 1), (5, 2)], Symbol::Regular(4));
        let grid = Grid::from_symbols(&rows).unwrap();
        let cascade = Cascade::start(grid, Action::Settle, six(), EngineConfig::default()).unwrap();
        assert_eq!(
            cascade.begin(Action::Settle).map(|c| c.state()),
            Err(EngineError::AlreadyStarted)
        );
    }

    #[test]
    fn test_run_of_bombs_creates_from_run_cells_only() {
        let mut rows = striped();
        set(&mut rows, &[(2, 0), (2, 1), (2, 2)], Symbol::Special(PowerUp::Bomb));
        let grid = Grid::from_symbols(&rows).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut cascade =
            Cascade::start(grid, Action::Settle, six(), EngineConfig::default()).unwrap();
        let step = cascade.step(&mut rng).unwrap();

        // three blasts over rows 1..=3, columns 0..=3
        assert_eq!(step.cleared_count, 12);
        assert_eq!(step.largest_group_size, 3);
        assert!(step.created_power_ups.is_empty());
        assert!(!step.activation);
        assert_eq!(step.time_bonus, 0);
    }

    #[test]
    fn test_swapping_two_specials_fires_both() {
        let mut rows = striped();
        rows[2][2] = Symbol::Special(PowerUp::RowClear);
        rows[2][3] = Symbol::Special(PowerUp::ColumnClear);
        let grid = Grid::from_symbols(&rows).unwrap();
        let action = Action::Swap(Cell::new(2, 2), Cell::new(2, 3));
        let mut rng = StdRng::seed_from_u64(5);
        let mut cascade = Cascade::start(grid, action, six(), EngineConfig::default()).unwrap();
        let step = cascade.step(&mut rng).unwrap();

        // the row clearer lands on (2, 3) and sweeps row 2, the column crusher column 2
        assert!(step.activation);
        assert_eq!(step.cleared_count, 6 + 5);
        assert!(step.cleared.contains(&Cell::new(0, 2)));
        assert!(step.cleared.contains(&Cell::new(5, 2)));
        assert!(step.cleared.contains(&Cell::new(2, 5)));
        assert!(!step.cleared.contains(&Cell::new(5, 3)));
        assert_eq!(step.largest_group_size, 0);
    }
}
