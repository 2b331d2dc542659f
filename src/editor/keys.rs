//! Byte-to-key decoding for the raw-mode editor.
//!
//! Decoding is a pure transition function over [`InputState`]; the editor
//! feeds it one byte at a time and acts on the keys it yields.

/// A decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    /// ^C
    Interrupt,
    /// ^D
    Eof,
    Up,
    Down,
    Left,
    Right,
    Tab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputState {
    #[default]
    Normal,
    /// Saw ESC.
    Escape,
    /// Saw `ESC [` or `ESC O`; parameter bytes until a final byte.
    EscapeSeq,
    /// Partway through a multi-byte UTF-8 character.
    Utf8 { bytes: [u8; 4], len: u8, need: u8 },
}

const ESC: u8 = 0x1b;
const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const CTRL_H: u8 = 0x08;
const DEL: u8 = 0x7f;

/// Advance the decoder by one byte.
pub fn transition(state: InputState, byte: u8) -> (InputState, Option<Key>) {
    use InputState::*;

    match state {
        Normal => match byte {
            ESC => (Escape, None),
            b'\r' | b'\n' => (Normal, Some(Key::Enter)),
            DEL | CTRL_H => (Normal, Some(Key::Backspace)),
            CTRL_C => (Normal, Some(Key::Interrupt)),
            CTRL_D => (Normal, Some(Key::Eof)),
            b'\t' => (Normal, Some(Key::Tab)),
            0x20..=0x7e => (Normal, Some(Key::Char(byte as char))),
            0xc2..=0xf4 => {
                let need = match byte {
                    0xc2..=0xdf => 2,
                    0xe0..=0xef => 3,
                    _ => 4,
                };
                let mut bytes = [0; 4];
                bytes[0] = byte;
                (Utf8 { bytes, len: 1, need }, None)
            }
            _ => (Normal, None),
        },
        Escape => match byte {
            b'[' | b'O' => (EscapeSeq, None),
            _ => (Normal, None),
        },
        EscapeSeq => match byte {
            b'A' => (Normal, Some(Key::Up)),
            b'B' => (Normal, Some(Key::Down)),
            b'C' => (Normal, Some(Key::Right)),
            b'D' => (Normal, Some(Key::Left)),
            // Parameter and intermediate bytes, e.g. `ESC [ 1 ; 5 C`.
            0x20..=0x3f => (EscapeSeq, None),
            _ => (Normal, None),
        },
        Utf8 { mut bytes, len, need } => {
            if byte & 0xc0 != 0x80 {
                // Broken sequence: drop it and decode this byte afresh.
                return transition(Normal, byte);
            }
            bytes[len as usize] = byte;
            let len = len + 1;
            if len < need {
                return (Utf8 { bytes, len, need }, None);
            }
            let key = std::str::from_utf8(&bytes[..len as usize])
                .ok()
                .and_then(|s| s.chars().next())
                .map(Key::Char);
            (Normal, key)
        }
    }
}

/// Stateful wrapper over [`transition`].
#[derive(Debug, Default)]
pub struct KeyDecoder {
    state: InputState,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, byte: u8) -> Option<Key> {
        let (next, key) = transition(self.state, byte);
        self.state = next;
        key
    }

    #[cfg(test)]
    fn state(&self) -> InputState {
        self.state
    }
}
