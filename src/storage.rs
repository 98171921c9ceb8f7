//! On-disk state under the XDG config dir (`$XDG_CONFIG_HOME/blocktui` or
//! `~/.config/blocktui`): the remembered player name and the leaderboard file.

use anyhow::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "blocktui";
const PLAYER_FILE: &str = "player";
const LEADERBOARD_FILE: &str = "leaderboard";

/// Longest player name kept, in characters.
pub const MAX_NAME_LEN: usize = 24;

fn config_dir() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join(APP_DIR)
}

/// Trims, drops control characters and tabs, caps length. Empty means "no name".
pub fn sanitize_name(raw: &str) -> Option<String> {
    let name: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect();
    let name = name.trim().to_string();
    (!name.is_empty()).then_some(name)
}

#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Store in the user's config dir.
    pub fn from_env() -> Self {
        Self::at(config_dir())
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn leaderboard_path(&self) -> PathBuf {
        self.dir.join(LEADERBOARD_FILE)
    }

    /// Remembered name; `None` when missing, empty or unreadable.
    pub fn player_name(&self) -> Option<String> {
        let raw = fs::read_to_string(self.dir.join(PLAYER_FILE)).ok()?;
        sanitize_name(&raw)
    }

    pub fn remember_player(&self, name: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(PLAYER_FILE), format!("{name}\n"))?;
        Ok(())
    }

    pub fn forget_player(&self) -> Result<()> {
        match fs::remove_file(self.dir.join(PLAYER_FILE)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fresh, empty directory under the system temp dir.
    pub(crate) fn scratch_dir(tag: &str) -> PathBuf {
        static N: AtomicUsize = AtomicUsize::new(0);
        let n = N.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("blocktui-{tag}-{}-{n}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("  ada \n"), Some("ada".to_string()));
        assert_eq!(sanitize_name("a\tb"), Some("ab".to_string()));
        assert_eq!(sanitize_name("   "), None);
        assert_eq!(sanitize_name(&"x".repeat(40)).map(|n| n.len()), Some(MAX_NAME_LEN));
    }

    #[test]
    fn test_player_name_lifecycle() {
        let store = Store::at(scratch_dir("player"));
        assert_eq!(store.player_name(), None);
        store.remember_player("grace").unwrap();
        assert_eq!(store.player_name(), Some("grace".to_string()));
        store.forget_player().unwrap();
        assert_eq!(store.player_name(), None);
        store.forget_player().unwrap();
        let _ = fs::remove_dir_all(store.dir());
    }
}
