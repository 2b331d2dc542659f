use std::io;
use std::os::fd::AsFd;

use nix::sys::termios::{self, InputFlags, LocalFlags, SetArg, SpecialCharacterIndices, Termios};

/// Puts a terminal into raw mode for its lifetime.
///
/// Mode switches drain output but keep pending input, so keys typed while a
/// command ran reach the next prompt.
pub struct RawMode<F: AsFd = io::Stdin> {
    fd: F,
    original: Termios,
}

impl RawMode {
    pub fn enable() -> nix::Result<Self> {
        Self::enable_on(io::stdin())
    }
}

impl<F: AsFd> RawMode<F> {
    pub fn enable_on(fd: F) -> nix::Result<Self> {
        let original = termios::tcgetattr(&fd)?;

        let mut raw = original.clone();
        raw.local_flags
            .remove(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::ISIG | LocalFlags::IEXTEN);
        raw.input_flags.remove(InputFlags::IXON);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(&fd, SetArg::TCSADRAIN, &raw)?;

        Ok(RawMode { fd, original })
    }
}

impl<F: AsFd> Drop for RawMode<F> {
    fn drop(&mut self) {
        if let Err(e) = termios::tcsetattr(&self.fd, SetArg::TCSADRAIN, &self.original) {
            tracing::warn!(error = %e, "failed to restore terminal mode");
        }
    }
}
