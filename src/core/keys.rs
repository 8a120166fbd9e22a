//! Logical key codes
//!
//! Keys arrive as single bytes: plain ASCII below 0x80, and out-of-band
//! codes from 0x80 up for keys that have no ASCII form.

pub const K_ESC: u8 = 0x1B;
pub const K_CAPSLK: u8 = 0x80;
pub const K_F1: u8 = 0x81;
pub const K_F2: u8 = 0x82;
pub const K_F3: u8 = 0x83;
pub const K_F4: u8 = 0x84;
pub const K_F5: u8 = 0x85;
pub const K_F6: u8 = 0x86;
pub const K_F7: u8 = 0x87;
pub const K_F8: u8 = 0x88;
pub const K_F9: u8 = 0x89;
pub const K_F10: u8 = 0x8A;
pub const K_F11: u8 = 0x8B;
pub const K_F12: u8 = 0x8C;
pub const K_UP: u8 = 0x8D;
pub const K_LEFT: u8 = 0x8E;
pub const K_DOWN: u8 = 0x8F;
pub const K_RIGHT: u8 = 0x90;
pub const K_INS: u8 = 0x91;
pub const K_DEL: u8 = 0x92;
pub const K_HOME: u8 = 0x93;
pub const K_END: u8 = 0x94;
pub const K_PGUP: u8 = 0x95;
pub const K_PGDN: u8 = 0x96;
/// Opens and closes the setup screen.
pub const K_NUMLK: u8 = 0x97;
pub const K_SCRLK: u8 = 0x98;
pub const K_PRTSC: u8 = 0x99;
pub const K_BREAK: u8 = 0x9A;

/// Sequences for `K_F1..=K_PGDN`, indexed from `K_F1`.
const SPECIAL_KEY_SEQUENCES: [&[u8]; (K_PGDN - K_F1 + 1) as usize] = [
    b"\x1bOP",   // F1
    b"\x1bOQ",   // F2
    b"\x1bOR",   // F3
    b"\x1bOS",   // F4
    b"\x1b[15~", // F5
    b"\x1b[17~", // F6
    b"\x1b[18~", // F7
    b"\x1b[19~", // F8
    b"\x1b[20~", // F9
    b"\x1b[21~", // F10
    b"\x1b[23~", // F11
    b"\x1b[24~", // F12
    b"\x1bOA",   // Up
    b"\x1bOD",   // Left
    b"\x1bOB",   // Down
    b"\x1bOC",   // Right
    b"\x1b[2~",  // Insert
    b"\x1b[3~",  // Delete
    b"\x1b[H",   // Home
    b"\x1b[F",   // End
    b"\x1b[5~",  // Page Up
    b"\x1b[6~",  // Page Down
];

/// Bytes sent to the host for a special key, or `None` when the key has
/// no sequence (CapsLock, NumLock and friends).
pub fn special_key_sequence(key: u8) -> Option<&'static [u8]> {
    if (K_F1..=K_PGDN).contains(&key) {
        Some(SPECIAL_KEY_SEQUENCES[(key - K_F1) as usize])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_keys() {
        assert_eq!(special_key_sequence(K_F1), Some(&b"\x1bOP"[..]));
        assert_eq!(special_key_sequence(K_F4), Some(&b"\x1bOS"[..]));
        assert_eq!(special_key_sequence(K_F5), Some(&b"\x1b[15~"[..]));
        assert_eq!(special_key_sequence(K_F11), Some(&b"\x1b[23~"[..]));
        assert_eq!(special_key_sequence(K_F12), Some(&b"\x1b[24~"[..]));
    }

    #[test]
    fn test_cursor_and_editing_keys() {
        assert_eq!(special_key_sequence(K_UP), Some(&b"\x1bOA"[..]));
        assert_eq!(special_key_sequence(K_LEFT), Some(&b"\x1bOD"[..]));
        assert_eq!(special_key_sequence(K_DOWN), Some(&b"\x1bOB"[..]));
        assert_eq!(special_key_sequence(K_RIGHT), Some(&b"\x1bOC"[..]));
        assert_eq!(special_key_sequence(K_HOME), Some(&b"\x1b[H"[..]));
        assert_eq!(special_key_sequence(K_PGDN), Some(&b"\x1b[6~"[..]));
    }

    #[test]
    fn test_keys_without_sequence() {
        for key in [K_CAPSLK, K_NUMLK, K_SCRLK, K_PRTSC, K_BREAK, b'a', K_ESC] {
            assert_eq!(special_key_sequence(key), None);
        }
    }
}
