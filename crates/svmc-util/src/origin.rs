//! Source-location tracking.
//!
//! Every token, expression, statement and function definition in this
//! compiler carries an [`Origin`] — a 1-based line/column pair pointing back
//! to the character that started it. There is exactly one source file per
//! compilation (no multi-file `SourceMap`), so unlike a general-purpose
//! compiler frontend we don't need a `FileId` alongside it.

use std::fmt;

/// A 1-based (line, column) location in the compiled source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Origin {
    pub line: u32,
    pub column: u32,
}

impl Origin {
    pub const DUMMY: Origin = Origin { line: 0, column: 0 };

    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Tracks line/column as a cursor advances byte-by-byte through the source.
///
/// The tokenizer owns one of these and calls [`Cursor::advance`] once per
/// consumed character; every token records the `Origin` the cursor held
/// before consuming the token's first character.
#[derive(Clone, Debug)]
pub struct Cursor {
    line: u32,
    column: u32,
}

impl Cursor {
    pub fn new() -> Self {
        Self { line: 1, column: 1 }
    }

    pub fn origin(&self) -> Origin {
        Origin::new(self.line, self.column)
    }

    /// Advance the cursor past `ch`, bumping the line counter on `\n`.
    pub fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_tracks_lines_and_columns() {
        let mut c = Cursor::new();
        assert_eq!(c.origin(), Origin::new(1, 1));
        c.advance('a');
        c.advance('b');
        assert_eq!(c.origin(), Origin::new(1, 3));
        c.advance('\n');
        assert_eq!(c.origin(), Origin::new(2, 1));
    }
}
