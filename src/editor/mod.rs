//! Raw-mode line editor with history recall and filename completion.

mod buffer;
mod complete;
mod keys;
mod terminal;

use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::unistd;

use buffer::LineBuffer;
use complete::{complete, completion_prefix};
use keys::{Key, KeyDecoder};
use terminal::RawMode;

use crate::history::History;

/// What one read produced.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// End of the input session, distinct from an empty line.
    Eof,
}

pub struct LineEditor {
    interactive: bool,
}

impl LineEditor {
    pub fn new(interactive: bool) -> Self {
        LineEditor { interactive }
    }

    /// Read one line. Interactive sessions get the prompt and raw-mode
    /// editing; anything else is read as a plain newline-terminated line.
    pub fn read_line(&mut self, prompt: &str, history: &History) -> io::Result<ReadOutcome> {
        if !self.interactive {
            return read_plain(&mut io::stdin().lock());
        }

        let _raw = RawMode::enable().map_err(io::Error::from)?;
        let mut out = io::stdout().lock();
        out.write_all(prompt.as_bytes())?;
        out.flush()?;

        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        edit(&mut TerminalInput, &mut out, history, &cwd)
    }
}

/// Unbuffered reads from fd 0, so typeahead stays in the terminal for the
/// next foreground program.
struct TerminalInput;

impl Read for TerminalInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match unistd::read(io::stdin(), buf) {
                Ok(n) => return Ok(n),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

pub fn read_plain(input: &mut impl BufRead) -> io::Result<ReadOutcome> {
    let mut line = String::new();
    loop {
        match input.read_line(&mut line) {
            Ok(0) => return Ok(ReadOutcome::Eof),
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(ReadOutcome::Line(line))
}

/// Position in history while browsing with Up/Down. `history.len()` is the
/// live line, whose contents are stashed on the first step back.
struct HistoryWalk {
    position: usize,
    stash: Option<String>,
}

impl HistoryWalk {
    fn new(history: &History) -> Self {
        HistoryWalk {
            position: history.len(),
            stash: None,
        }
    }

    fn older(&mut self, history: &History, current: String) -> Option<String> {
        if self.position == 0 {
            return None;
        }
        if self.position == history.len() {
            self.stash = Some(current);
        }
        self.position -= 1;
        history.get(self.position).map(str::to_string)
    }

    fn newer(&mut self, history: &History) -> Option<String> {
        if self.position >= history.len() {
            return None;
        }
        self.position += 1;
        if self.position == history.len() {
            Some(self.stash.take().unwrap_or_default())
        } else {
            history.get(self.position).map(str::to_string)
        }
    }
}

/// The editing loop, over any byte source and sink.
pub fn edit<R: Read, W: Write>(
    input: &mut R,
    out: &mut W,
    history: &History,
    cwd: &Path,
) -> io::Result<ReadOutcome> {
    let mut decoder = KeyDecoder::new();
    let mut buffer = LineBuffer::new();
    let mut walk = HistoryWalk::new(history);
    let mut byte = [0u8; 1];

    loop {
        if input.read(&mut byte)? == 0 {
            return Ok(if buffer.is_empty() {
                ReadOutcome::Eof
            } else {
                ReadOutcome::Line(buffer.as_string())
            });
        }
        let Some(key) = decoder.step(byte[0]) else {
            continue;
        };

        match key {
            Key::Char(c) => buffer.insert(c, out)?,
            Key::Backspace => buffer.backspace(out)?,
            Key::Left => buffer.move_left(out)?,
            Key::Right => buffer.move_right(out)?,
            Key::Enter => {
                out.write_all(b"\r\n")?;
                out.flush()?;
                return Ok(ReadOutcome::Line(buffer.as_string()));
            }
            Key::Interrupt => {
                out.write_all(b"^C\r\n")?;
                out.flush()?;
                return Ok(ReadOutcome::Line(String::new()));
            }
            Key::Eof => {
                if buffer.is_empty() {
                    out.write_all(b"\r\n")?;
                    out.flush()?;
                    return Ok(ReadOutcome::Eof);
                }
            }
            Key::Up => {
                if let Some(line) = walk.older(history, buffer.as_string()) {
                    buffer.replace(&line, out)?;
                }
            }
            Key::Down => {
                if let Some(line) = walk.newer(history) {
                    buffer.replace(&line, out)?;
                }
            }
            Key::Tab => {
                let prefix = completion_prefix(buffer.chars(), buffer.cursor());
                if let Some(suffix) = complete(&prefix, cwd) {
                    buffer.insert_str(&suffix, out)?;
                }
            }
        }
        out.flush()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UP: &str = "\x1b[A";
    const DOWN: &str = "\x1b[B";
    const LEFT: &str = "\x1b[D";

    fn history(lines: &[&str]) -> History {
        let mut h = History::new();
        for line in lines {
            h.add(line);
        }
        h
    }

    fn run(keys: &str, history: &History, cwd: &Path) -> (ReadOutcome, Vec<u8>) {
        let mut out = Vec::new();
        let outcome = edit(&mut keys.as_bytes(), &mut out, history, cwd).unwrap();
        (outcome, out)
    }

    fn line(keys: &str, history: &History) -> ReadOutcome {
        run(keys, history, Path::new("/nonexistent")).0
    }

    #[test]
    fn test_typed_line() {
        assert_eq!(line("ls -la\r", &History::new()), ReadOutcome::Line("ls -la".into()));
        assert_eq!(line("héllo\n", &History::new()), ReadOutcome::Line("héllo".into()));
    }

    #[test]
    fn test_backspace_and_cursor_editing() {
        let h = History::new();
        assert_eq!(line("abx\x7fc\r", &h), ReadOutcome::Line("abc".into()));
        assert_eq!(line(&format!("ac{LEFT}b\r"), &h), ReadOutcome::Line("abc".into()));
    }

    #[test]
    fn test_interrupt_submits_empty_line() {
        let (outcome, out) = run("partial\x03", &History::new(), Path::new("/"));
        assert_eq!(outcome, ReadOutcome::Line(String::new()));
        assert!(out.ends_with(b"^C\r\n"));
    }

    #[test]
    fn test_ctrl_d() {
        let h = History::new();
        assert_eq!(line("\x04", &h), ReadOutcome::Eof);
        assert_eq!(line("ab\x04\r", &h), ReadOutcome::Line("ab".into()));
    }

    #[test]
    fn test_end_of_input() {
        let h = History::new();
        assert_eq!(line("", &h), ReadOutcome::Eof);
        assert_eq!(line("tail", &h), ReadOutcome::Line("tail".into()));
    }

    #[test]
    fn test_history_recall() {
        let h = history(&["first", "second"]);
        assert_eq!(line(&format!("{UP}\r"), &h), ReadOutcome::Line("second".into()));
        assert_eq!(line(&format!("{UP}{UP}\r"), &h), ReadOutcome::Line("first".into()));
        // Up past the oldest entry stays there.
        assert_eq!(line(&format!("{UP}{UP}{UP}\r"), &h), ReadOutcome::Line("first".into()));
        assert_eq!(line(&format!("{UP}{UP}{DOWN}\r"), &h), ReadOutcome::Line("second".into()));
    }

    #[test]
    fn test_up_up_down_down_restores_draft() {
        let h = history(&["first", "second"]);
        let keys = format!("draft{UP}{UP}{DOWN}{DOWN}\r");
        assert_eq!(line(&keys, &h), ReadOutcome::Line("draft".into()));
        // Further Downs at the live position change nothing.
        let keys = format!("draft{UP}{DOWN}{DOWN}\r");
        assert_eq!(line(&keys, &h), ReadOutcome::Line("draft".into()));
    }

    #[test]
    fn test_up_with_empty_history() {
        assert_eq!(line(&format!("x{UP}\r"), &History::new()), ReadOutcome::Line("x".into()));
    }

    #[test]
    fn test_tab_completion() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alpha.txt"), "").unwrap();
        std::fs::write(dir.path().join("beta.txt"), "").unwrap();
        std::fs::write(dir.path().join("bravo.txt"), "").unwrap();
        let h = History::new();

        let (outcome, _) = run("cat al\t\r", &h, dir.path());
        assert_eq!(outcome, ReadOutcome::Line("cat alpha.txt".into()));

        let (outcome, with_tab) = run("cat b\t\r", &h, dir.path());
        let (_, without_tab) = run("cat b\r", &h, dir.path());
        assert_eq!(outcome, ReadOutcome::Line("cat b".into()));
        assert_eq!(with_tab, without_tab);
    }

    #[test]
    fn test_read_plain() {
        let mut input = io::Cursor::new("echo one\r\necho two\nlast");
        assert_eq!(read_plain(&mut input).unwrap(), ReadOutcome::Line("echo one".into()));
        assert_eq!(read_plain(&mut input).unwrap(), ReadOutcome::Line("echo two".into()));
        assert_eq!(read_plain(&mut input).unwrap(), ReadOutcome::Line("last".into()));
        assert_eq!(read_plain(&mut input).unwrap(), ReadOutcome::Eof);
    }
}
