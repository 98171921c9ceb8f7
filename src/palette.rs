//! Tile faces: the emoji sets a game rotates through, and their ASCII fallback.

use crate::engine::{Alphabet, Dice, EngineError, PowerUp, Symbol};

/// Symbols per palette; every level draws from all of them.
pub const PALETTE_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub glyphs: [&'static str; PALETTE_SIZE],
}

pub static PALETTES: [Palette; 7] = [
    Palette { name: "classic", glyphs: ["🧱", "🍀", "❤️", "💎", "🌈", "🎈"] },
    Palette { name: "dungeon", glyphs: ["🐺", "🐊", "🦀", "🧙", "🦜", "☠️"] },
    Palette { name: "food", glyphs: ["🍕", "🍔", "🍟", "🌮", "🍗", "🍩"] },
    Palette { name: "animals", glyphs: ["🐶", "🐱", "🐸", "🐷", "🐼", "🦊"] },
    Palette { name: "smileys", glyphs: ["😀", "🤢", "🥵", "🥶", "😎", "😈"] },
    Palette { name: "vehicles", glyphs: ["🚂", "⛵", "✈️", "🚕", "🚒", "🚑"] },
    Palette { name: "sports", glyphs: ["⚽", "🏀", "🏈", "⚾", "🎾", "🥊"] },
];

const ASCII_GLYPHS: [&str; PALETTE_SIZE] = ["A", "B", "C", "D", "E", "F"];

/// How tiles are drawn. ASCII is for terminals without emoji fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum GlyphSet {
    #[default]
    Emoji,
    Ascii,
}

impl Palette {
    /// Regular ids, one per glyph.
    pub fn alphabet(&self) -> Result<Alphabet, EngineError> {
        Alphabet::with_len(self.glyphs.len() as u8)
    }

    /// Face for a symbol; specials look the same in every palette.
    pub fn glyph(&self, symbol: Symbol, set: GlyphSet) -> &'static str {
        match (symbol, set) {
            (Symbol::Special(kind), set) => special_glyph(kind, set),
            (Symbol::Regular(id), GlyphSet::Emoji) => self.glyphs[id as usize % PALETTE_SIZE],
            (Symbol::Regular(id), GlyphSet::Ascii) => ASCII_GLYPHS[id as usize % PALETTE_SIZE],
        }
    }
}

pub fn special_glyph(kind: PowerUp, set: GlyphSet) -> &'static str {
    match (kind, set) {
        (PowerUp::Bomb, GlyphSet::Emoji) => "💣",
        (PowerUp::RowClear, GlyphSet::Emoji) => "🔥",
        (PowerUp::ColumnClear, GlyphSet::Emoji) => "🌪️",
        (PowerUp::Bomb, GlyphSet::Ascii) => "*",
        (PowerUp::RowClear, GlyphSet::Ascii) => "=",
        (PowerUp::ColumnClear, GlyphSet::Ascii) => "|",
    }
}

/// Palette indices in a random order, fixed for one game (Fisher–Yates).
pub fn shuffled_order<D: Dice + ?Sized>(count: usize, dice: &mut D) -> Vec<usize> {
    let mut order: Vec<usize> = (0..count).collect();
    for i in (1..count).rev() {
        let j = dice.roll(i + 1);
        order.swap(i, j);
    }
    order
}
