//! Key mapping for terminal input
//!
//! Converts host key events into the logical key codes the session
//! understands: ASCII for ordinary keys, out-of-band codes for the rest.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::keys::*;

/// What a host key press means to the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKey {
    /// Logical key code for the session
    Key(u8),
    /// Leave the program
    Quit,
}

/// Key mapper for converting key events to key codes
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent. Releases and keys with no logical code
    /// map to `None`.
    pub fn map(event: &KeyEvent) -> Option<HostKey> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);

        let key = match event.code {
            KeyCode::Char(ch) => return Self::map_char(ch, ctrl),

            // Enter goes through the configured newline sequence
            KeyCode::Enter => b'\n',
            KeyCode::Backspace => 0x08,
            KeyCode::Tab => b'\t',
            KeyCode::Esc => K_ESC,

            // Arrow keys
            KeyCode::Up => K_UP,
            KeyCode::Down => K_DOWN,
            KeyCode::Right => K_RIGHT,
            KeyCode::Left => K_LEFT,

            // Navigation keys
            KeyCode::Home => K_HOME,
            KeyCode::End => K_END,
            KeyCode::PageUp => K_PGUP,
            KeyCode::PageDown => K_PGDN,
            KeyCode::Insert => K_INS,
            KeyCode::Delete => K_DEL,

            // Function keys
            KeyCode::F(n @ 1..=12) => K_F1 + (n - 1),

            // Lock keys
            KeyCode::CapsLock => K_CAPSLK,
            KeyCode::NumLock => K_NUMLK,
            KeyCode::ScrollLock => K_SCRLK,
            KeyCode::PrintScreen => K_PRTSC,
            KeyCode::Pause => K_BREAK,

            _ => return None,
        };
        Some(HostKey::Key(key))
    }

    /// Map a character, with Ctrl held or not
    fn map_char(ch: char, ctrl: bool) -> Option<HostKey> {
        if !ch.is_ascii() {
            return None;
        }
        let byte = ch as u8;

        if ctrl {
            let key = match byte {
                b'q' | b'Q' => return Some(HostKey::Quit),
                // Ctrl+] stands in for NumLock, which many hosts swallow
                b']' => K_NUMLK,
                b'a'..=b'z' => byte - b'a' + 1,
                b'A'..=b'Z' => byte - b'A' + 1,
                b'@' | b' ' => 0x00,
                b'[' => K_ESC,
                b'\\' => 0x1C,
                b'^' | b'~' => 0x1E,
                b'_' | b'?' => 0x1F,
                _ => byte,
            };
            return Some(HostKey::Key(key));
        }

        // Normal character
        Some(HostKey::Key(byte))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Option<HostKey> {
        KeyMapper::map(&KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_plain_characters() {
        assert_eq!(press(KeyCode::Char('a'), KeyModifiers::NONE), Some(HostKey::Key(b'a')));
        assert_eq!(press(KeyCode::Char('A'), KeyModifiers::SHIFT), Some(HostKey::Key(b'A')));
        assert_eq!(press(KeyCode::Char('é'), KeyModifiers::NONE), None);
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(HostKey::Key(0x03)));
        assert_eq!(press(KeyCode::Char('['), KeyModifiers::CONTROL), Some(HostKey::Key(K_ESC)));
        assert_eq!(press(KeyCode::Char('q'), KeyModifiers::CONTROL), Some(HostKey::Quit));
        assert_eq!(press(KeyCode::Char(']'), KeyModifiers::CONTROL), Some(HostKey::Key(K_NUMLK)));
    }

    #[test]
    fn test_only_control_changes_characters() {
        let ctrl_alt = KeyModifiers::CONTROL | KeyModifiers::ALT;
        assert_eq!(press(KeyCode::Char('c'), ctrl_alt), Some(HostKey::Key(0x03)));
        assert_eq!(press(KeyCode::Char('x'), KeyModifiers::ALT), Some(HostKey::Key(b'x')));
        assert_eq!(press(KeyCode::Char('Q'), KeyModifiers::SHIFT), Some(HostKey::Key(b'Q')));
    }

    #[test]
    fn test_special_keys() {
        assert_eq!(press(KeyCode::Enter, KeyModifiers::NONE), Some(HostKey::Key(b'\n')));
        assert_eq!(press(KeyCode::Esc, KeyModifiers::NONE), Some(HostKey::Key(K_ESC)));
        assert_eq!(press(KeyCode::Up, KeyModifiers::NONE), Some(HostKey::Key(K_UP)));
        assert_eq!(press(KeyCode::PageDown, KeyModifiers::NONE), Some(HostKey::Key(K_PGDN)));
        assert_eq!(press(KeyCode::F(1), KeyModifiers::NONE), Some(HostKey::Key(K_F1)));
        assert_eq!(press(KeyCode::F(12), KeyModifiers::NONE), Some(HostKey::Key(K_F12)));
        assert_eq!(press(KeyCode::F(13), KeyModifiers::NONE), None);
        assert_eq!(press(KeyCode::NumLock, KeyModifiers::NONE), Some(HostKey::Key(K_NUMLK)));
    }

    #[test]
    fn test_release_ignored() {
        let event = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(KeyMapper::map(&event), None);
    }
}
