use std::io::{self, Write};

/// The line being edited plus its cursor. Every mutation writes the bytes
/// that bring the terminal in line with the new contents.
#[derive(Debug, Default)]
pub struct LineBuffer {
    chars: Vec<char>,
    cursor: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn insert(&mut self, c: char, out: &mut impl Write) -> io::Result<()> {
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
        self.redraw_from(self.cursor - 1, 0, out)
    }

    pub fn insert_str(&mut self, text: &str, out: &mut impl Write) -> io::Result<()> {
        let start = self.cursor;
        for c in text.chars() {
            self.chars.insert(self.cursor, c);
            self.cursor += 1;
        }
        self.redraw_from(start, 0, out)
    }

    /// Delete the character left of the cursor.
    pub fn backspace(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.cursor == 0 {
            return Ok(());
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        out.write_all(b"\x08")?;
        self.redraw_from(self.cursor, 1, out)
    }

    pub fn move_left(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.cursor > 0 {
            self.cursor -= 1;
            out.write_all(b"\x08")?;
        }
        Ok(())
    }

    pub fn move_right(&mut self, out: &mut impl Write) -> io::Result<()> {
        if let Some(&c) = self.chars.get(self.cursor) {
            self.cursor += 1;
            write!(out, "{c}")?;
        }
        Ok(())
    }

    /// Swap in `text`, leaving the cursor at its end.
    pub fn replace(&mut self, text: &str, out: &mut impl Write) -> io::Result<()> {
        back(self.cursor, out)?;
        self.chars = text.chars().collect();
        self.cursor = self.chars.len();
        write!(out, "{text}\x1b[K")
    }

    /// Print `chars[from..]` plus `blanks` spaces, then step back to the cursor.
    fn redraw_from(&self, from: usize, blanks: usize, out: &mut impl Write) -> io::Result<()> {
        let tail: String = self.chars[from..].iter().collect();
        write!(out, "{tail}{:blanks$}", "")?;
        back(self.chars.len() - self.cursor + blanks, out)
    }
}

fn back(columns: usize, out: &mut impl Write) -> io::Result<()> {
    for _ in 0..columns {
        out.write_all(b"\x08")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_in_middle_redraws_suffix() {
        let mut buf = LineBuffer::new();
        let mut out = Vec::new();
        buf.insert('a', &mut out).unwrap();
        buf.insert('c', &mut out).unwrap();
        buf.move_left(&mut out).unwrap();
        out.clear();

        buf.insert('b', &mut out).unwrap();
        assert_eq!(buf.as_string(), "abc");
        assert_eq!(buf.cursor(), 2);
        assert_eq!(out, b"bc\x08");
    }

    #[test]
    fn test_backspace_blanks_the_last_column() {
        let mut buf = LineBuffer::new();
        let mut out = Vec::new();
        buf.insert_str("abc", &mut out).unwrap();
        buf.move_left(&mut out).unwrap();
        out.clear();

        buf.backspace(&mut out).unwrap();
        assert_eq!(buf.as_string(), "ac");
        assert_eq!(buf.cursor(), 1);
        assert_eq!(out, b"\x08c \x08\x08");
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut buf = LineBuffer::new();
        let mut out = Vec::new();
        buf.backspace(&mut out).unwrap();
        assert!(out.is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_cursor_bounds() {
        let mut buf = LineBuffer::new();
        let mut out = Vec::new();
        buf.insert('x', &mut out).unwrap();
        buf.move_right(&mut out).unwrap();
        assert_eq!(buf.cursor(), 1);
        buf.move_left(&mut out).unwrap();
        buf.move_left(&mut out).unwrap();
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn test_replace() {
        let mut buf = LineBuffer::new();
        let mut out = Vec::new();
        buf.insert_str("draft", &mut out).unwrap();
        out.clear();

        buf.replace("ls", &mut out).unwrap();
        assert_eq!(buf.as_string(), "ls");
        assert_eq!(buf.cursor(), 2);
        assert_eq!(out, b"\x08\x08\x08\x08\x08ls\x1b[K");
    }
}
