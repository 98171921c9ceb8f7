use super::grid::Cell;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("cells {a} and {b} are not adjacent")]
    InvalidSwap { a: Cell, b: Cell },
    #[error("cell {0} is outside the board")]
    OutOfBounds(Cell),
    #[error("cell {0} does not hold a power-up")]
    NotAPowerUp(Cell),
    #[error("cascade already started")]
    AlreadyStarted,
    #[error("degenerate configuration: {0}")]
    DegenerateConfiguration(String),
}
