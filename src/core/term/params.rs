//! CSI parameter extraction
//!
//! Parameters arrive as the raw bytes between `ESC [` and the final byte,
//! e.g. `5;10` or `;7`. They are pulled out left to right on demand so each
//! command can supply its own per-position default.

/// Sequential reader over a raw parameter string.
#[derive(Clone, Debug)]
pub struct Params<'a> {
    raw: &'a [u8],
    /// Offset of the next field, `None` once the string is used up.
    pos: Option<usize>,
}

impl<'a> Params<'a> {
    pub fn new(raw: &'a [u8]) -> Self {
        Self { raw, pos: Some(0) }
    }

    /// Next field.
    ///
    /// Returns `Some(default)` for an empty field, `Some(n)` for a numeric
    /// one and `None` once every field has been consumed. An empty string
    /// holds exactly one (empty) field, so `ESC [ m` reads as `ESC [ 0 m`.
    pub fn next(&mut self, default: u16) -> Option<u16> {
        let start = self.pos?;
        let rest = &self.raw[start..];
        let field = match rest.iter().position(|&b| b == b';') {
            Some(sep) => {
                self.pos = Some(start + sep + 1);
                &rest[..sep]
            }
            None => {
                self.pos = None;
                rest
            }
        };

        if field.is_empty() {
            Some(default)
        } else {
            Some(parse_decimal(field))
        }
    }

    /// Next field for fixed-arity commands; a missing field is the default.
    pub fn get(&mut self, default: u16) -> u16 {
        self.next(default).unwrap_or(default)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos.is_none()
    }

    /// Offset of the next unread field.
    pub fn position(&self) -> Option<usize> {
        self.pos
    }
}

/// Leading decimal digits of `field`, saturating. Anything that does not
/// start with a digit (`?25`) reads as zero.
fn parse_decimal(field: &[u8]) -> u16 {
    field
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u16, |acc, &d| acc.saturating_mul(10).saturating_add(u16::from(d - b'0')))
}
