//! Key bindings: arrows or vim-style hjkl.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    /// Pick, swap with, or fire the tile under the cursor.
    Select,
    Pause,
    Quit,
    Restart,
    SignOut,
    None,
}

pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Char('s' | 'S') => Action::SignOut,
        _ => Action::None,
    }
}

/// Keys on the name prompt, where letters are text rather than commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKey {
    Type(char),
    Erase,
    Submit,
    Quit,
    None,
}

pub fn key_to_name_key(key: KeyEvent) -> NameKey {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => NameKey::Quit,
            _ => NameKey::None,
        };
    }
    match code {
        KeyCode::Esc => NameKey::Quit,
        KeyCode::Enter => NameKey::Submit,
        KeyCode::Backspace => NameKey::Erase,
        KeyCode::Char(c) if !c.is_control() => NameKey::Type(c),
        _ => NameKey::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_arrows_and_vim_agree() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::Left);
        assert_eq!(key_to_action(key(KeyCode::Char('h'))), Action::Left);
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::Up);
        assert_eq!(key_to_action(key(KeyCode::Char('k'))), Action::Up);
        assert_eq!(key_to_action(key(KeyCode::Char('j'))), Action::Down);
        assert_eq!(key_to_action(key(KeyCode::Char('l'))), Action::Right);
    }

    #[test]
    fn test_select_pause_quit() {
        assert_eq!(key_to_action(key(KeyCode::Enter)), Action::Select);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Select);
        assert_eq!(key_to_action(key(KeyCode::Char('p'))), Action::Pause);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }

    #[test]
    fn test_modified_keys_ignored() {
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('h'), KeyModifiers::ALT)),
            Action::None
        );
        assert_eq!(key_to_action(key(KeyCode::Char('z'))), Action::None);
    }

    #[test]
    fn test_name_prompt_keys() {
        assert_eq!(key_to_name_key(key(KeyCode::Char('q'))), NameKey::Type('q'));
        assert_eq!(
            key_to_name_key(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            NameKey::Type('A')
        );
        assert_eq!(key_to_name_key(key(KeyCode::Backspace)), NameKey::Erase);
        assert_eq!(key_to_name_key(key(KeyCode::Enter)), NameKey::Submit);
        assert_eq!(key_to_name_key(key(KeyCode::Esc)), NameKey::Quit);
    }

    #[test]
    fn test_ctrl_c_quits_name_prompt() {
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(key_to_name_key(ctrl('c')), NameKey::Quit);
        assert_eq!(key_to_name_key(ctrl('u')), NameKey::None);
    }
}
