use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;

use nix::libc;

use super::path::expand_home;
use crate::parser::Command;

/// Open a file for an output redirect: created with mode 0644, truncated for
/// `>` and appended to for `>>`.
pub fn open_stdout_redirect(target: &str, append: bool) -> Result<File, String> {
    let path = expand_home(target);
    let mut options = OpenOptions::new();
    options.write(true).create(true).mode(0o644);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options
        .open(&path)
        .map_err(|e| format!("cairn: {}: {}", path.display(), e))
}

/// Open a file for an input redirect.
pub fn open_stdin_redirect(target: &str) -> Result<File, String> {
    let path = expand_home(target);
    File::open(&path).map_err(|e| format!("cairn: {}: {}", path.display(), e))
}

/// Point the calling process's stdin/stdout at the command's redirect files.
/// Only called in a forked child; file redirects override pipe wiring.
pub fn apply(command: &Command) -> Result<(), String> {
    if let Some(target) = &command.input {
        install(open_stdin_redirect(target)?, libc::STDIN_FILENO);
    }
    if let Some(target) = &command.output {
        install(open_stdout_redirect(target, command.append)?, libc::STDOUT_FILENO);
    }
    Ok(())
}

fn install(file: File, target: RawFd) {
    unsafe {
        libc::dup2(file.as_raw_fd(), target);
    }
    // Dropping `file` closes the original descriptor.
}
