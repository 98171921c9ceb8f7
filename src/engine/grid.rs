//! Grid model: cells, symbols, tiles and the R×C board they live on.

use super::dice::Dice;
use super::error::EngineError;
use std::fmt;

/// Smallest board side and alphabet the engine accepts.
pub const MIN_SIDE: usize = 3;

/// Grid position, 0-indexed; row 0 is the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Orthogonal neighbour (shares an edge).
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }

    /// Cell shifted by (dr, dc); `None` when it would leave the non-negative quadrant.
    pub fn offset(self, dr: isize, dc: isize) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Special tiles; never produced by refill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerUp {
    Bomb,
    RowClear,
    ColumnClear,
}

/// Tile face. Regular ids index into the active palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Regular(u8),
    Special(PowerUp),
}

impl Symbol {
    #[inline]
    pub fn power_up(self) -> Option<PowerUp> {
        match self {
            Self::Special(kind) => Some(kind),
            Self::Regular(_) => None,
        }
    }
}

/// Identity token, unique within a grid for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub id: TileId,
    pub symbol: Symbol,
}

/// Ordered set of regular symbols a level draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    ids: Vec<u8>,
}

impl Alphabet {
    /// Fails when fewer than three distinct ids remain after dedup.
    pub fn new(mut ids: Vec<u8>) -> Result<Self, EngineError> {
        let mut seen = Vec::with_capacity(ids.len());
        ids.retain(|id| {
            let fresh = !seen.contains(id);
            seen.push(*id);
            fresh
        });
        if ids.len() < MIN_SIDE {
            return Err(EngineError::DegenerateConfiguration(format!(
                "alphabet needs at least {MIN_SIDE} symbols, got {}",
                ids.len()
            )));
        }
        Ok(Self { ids })
    }

    /// Ids `0..len`.
    pub fn with_len(len: u8) -> Result<Self, EngineError> {
        Self::new((0..len).collect())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.ids.iter().map(|&id| Symbol::Regular(id))
    }

    /// Uniformly random regular symbol.
    pub fn roll<D: Dice + ?Sized>(&self, dice: &mut D) -> Symbol {
        Symbol::Regular(self.ids[dice.roll(self.ids.len())])
    }
}

/// R×C board. Slots are only empty inside a cascade step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    slots: Vec<Option<Tile>>,
    next_id: u64,
}

impl Grid {
    pub(crate) fn empty(rows: usize, cols: usize) -> Result<Self, EngineError> {
        if rows < MIN_SIDE || cols < MIN_SIDE {
            return Err(EngineError::DegenerateConfiguration(format!(
                "board must be at least {MIN_SIDE}x{MIN_SIDE}, got {rows}x{cols}"
            )));
        }
        Ok(Self {
            rows,
            cols,
            slots: vec![None; rows * cols],
            next_id: 0,
        })
    }

    /// Builds a board from symbol rows (top row first). Existing matches are kept.
    pub fn from_symbols(rows: &[Vec<Symbol>]) -> Result<Self, EngineError> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return Err(EngineError::DegenerateConfiguration(
                "rows have different lengths".to_string(),
            ));
        }
        let mut grid = Self::empty(rows.len(), cols)?;
        for (r, row) in rows.iter().enumerate() {
            for (c, &symbol) in row.iter().enumerate() {
                grid.fill(Cell::new(r, c), symbol);
            }
        }
        Ok(grid)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    #[inline]
    fn idx(&self, cell: Cell) -> usize {
        cell.row * self.cols + cell.col
    }

    #[inline]
    pub fn tile(&self, cell: Cell) -> Option<Tile> {
        if !self.contains(cell) {
            return None;
        }
        self.slots[self.idx(cell)]
    }

    #[inline]
    pub fn symbol(&self, cell: Cell) -> Option<Symbol> {
        self.tile(cell).map(|t| t.symbol)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        let cols = self.cols;
        (0..self.rows * cols).map(move |i| Cell::new(i / cols, i % cols))
    }

    pub fn tiles(&self) -> impl Iterator<Item = (Cell, Tile)> + '_ {
        self.cells().filter_map(|cell| self.tile(cell).map(|t| (cell, t)))
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Up to eight surrounding cells, clamped to the board.
    pub fn neighbours8(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        const NEIGHBOURS_8: [(isize, isize); 8] = [
            (-1, -1), (-1, 0), (-1, 1),
            (0, -1),           (0, 1),
            (1, -1),  (1, 0),  (1, 1),
        ];
        NEIGHBOURS_8
            .into_iter()
            .filter_map(move |(dr, dc)| cell.offset(dr, dc))
            .filter(|&n| self.contains(n))
    }

    pub(crate) fn take(&mut self, cell: Cell) -> Option<Tile> {
        if !self.contains(cell) {
            return None;
        }
        let i = self.idx(cell);
        self.slots[i].take()
    }

    fn put(&mut self, cell: Cell, tile: Tile) {
        let i = self.idx(cell);
        self.slots[i] = Some(tile);
    }

    /// Places a freshly minted tile, replacing any occupant.
    pub(crate) fn fill(&mut self, cell: Cell, symbol: Symbol) -> Tile {
        let tile = Tile {
            id: TileId(self.next_id),
            symbol,
        };
        self.next_id += 1;
        self.put(cell, tile);
        tile
    }

    pub(crate) fn swap(&mut self, a: Cell, b: Cell) {
        let (ia, ib) = (self.idx(a), self.idx(b));
        self.slots.swap(ia, ib);
    }

    /// Gravity: survivors in each column drop to the bottom keeping their order,
    /// then the vacated top slots are refilled bottom-up with regular symbols.
    /// Columns are processed left to right.
    pub(crate) fn compact_and_refill<D: Dice + ?Sized>(
        &mut self,
        alphabet: &Alphabet,
        dice: &mut D,
    ) {
        for col in 0..self.cols {
            let mut write = self.rows;
            for row in (0..self.rows).rev() {
                if let Some(tile) = self.take(Cell::new(row, col)) {
                    write -= 1;
                    self.put(Cell::new(write, col), tile);
                }
            }
            for row in (0..write).rev() {
                let symbol = alphabet.roll(dice);
                self.fill(Cell::new(row, col), symbol);
            }
        }
    }
}
