//! Random source seam. Anything implementing `rand::Rng` is a `Dice`; tests script their own.

use rand::Rng;

pub trait Dice {
    /// Uniform value in `0..sides`. `sides` is never zero.
    fn roll(&mut self, sides: usize) -> usize;

    /// Fair coin.
    fn flip(&mut self) -> bool {
        self.roll(2) == 0
    }
}

impl<R: Rng> Dice for R {
    #[inline]
    fn roll(&mut self, sides: usize) -> usize {
        self.random_range(0..sides)
    }
}
