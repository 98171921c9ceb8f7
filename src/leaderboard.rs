//! Local leaderboard: one record per player, stored as `name<TAB>best<TAB>total` lines.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Rows shown on the game-over screen.
pub const TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    /// Most blocks cleared in a single game.
    pub best_run: u32,
    /// Blocks cleared across all games.
    pub total_blocks: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    records: Vec<Record>,
}

impl Leaderboard {
    /// Lines that don't parse are skipped.
    pub fn parse(content: &str) -> Self {
        let mut board = Self::default();
        for line in content.lines() {
            let mut fields = line.split('\t');
            let (Some(name), Some(best), Some(total)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            let (Ok(best_run), Ok(total_blocks)) =
                (best.trim().parse::<u32>(), total.trim().parse::<u32>())
            else {
                continue;
            };
            if name.is_empty() || board.get(name).is_some() {
                continue;
            }
            board.records.push(Record {
                name: name.to_string(),
                best_run,
                total_blocks,
            });
        }
        board
    }

    pub fn render(&self) -> String {
        self.records
            .iter()
            .map(|r| format!("{}\t{}\t{}\n", r.name, r.best_run, r.total_blocks))
            .collect()
    }

    /// Empty board when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render()).with_context(|| format!("writing {}", path.display()))
    }

    pub fn get(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Get-or-create: a new player starts at `{cleared, cleared}`, a known one keeps
    /// the better run and accumulates the total.
    pub fn record_run(&mut self, name: &str, cleared: u32) -> &Record {
        let idx = match self.records.iter().position(|r| r.name == name) {
            Some(i) => {
                let r = &mut self.records[i];
                r.best_run = r.best_run.max(cleared);
                r.total_blocks = r.total_blocks.saturating_add(cleared);
                i
            }
            None => {
                self.records.push(Record {
                    name: name.to_string(),
                    best_run: cleared,
                    total_blocks: cleared,
                });
                self.records.len() - 1
            }
        };
        &self.records[idx]
    }

    /// Best runs first, ties by name.
    pub fn top(&self, n: usize) -> Vec<&Record> {
        let mut sorted: Vec<&Record> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.best_run.cmp(&a.best_run).then_with(|| a.name.cmp(&b.name)));
        sorted.truncate(n);
        sorted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load, record and save in one go. A broken file is replaced rather than fatal.
pub fn submit(path: &Path, name: &str, cleared: u32) -> Result<Leaderboard> {
    let mut board = Leaderboard::load(path).unwrap_or_else(|e| {
        warn!(error = %e, "leaderboard unreadable, starting fresh");
        Leaderboard::default()
    });
    let record = board.record_run(name, cleared);
    debug!(
        player = name,
        cleared,
        best = record.best_run,
        total = record.total_blocks,
        "run recorded"
    );
    board.save(path)?;
    Ok(board)
}
