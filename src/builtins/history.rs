use std::io::{self, Write};

use crate::engine::{ExecutionResult, ShellState};
use crate::builtins::registry::CommandInfo;
use crate::history::History;

pub const COMMAND_INFO: CommandInfo = CommandInfo {
    name: "history",
    description: "Display the history list with line numbers.",
    usage: "history\n\nDisplay the history list with line numbers, oldest first.",
    run: history_runner,
};

pub fn history_runner(_args: &[String], state: &mut ShellState) -> (ExecutionResult, i32) {
    let code = match write_history(&state.history, &mut io::stdout().lock()) {
        Ok(()) => 0,
        Err(_) => 1,
    };
    (ExecutionResult::KeepRunning, code)
}

/// Prints all recorded history entries, numbered starting from 1.
pub fn write_history(history: &History, out: &mut impl Write) -> io::Result<()> {
    for (i, entry) in history.iter().enumerate() {
        writeln!(out, "{:4}  {}", i + 1, entry)?;
    }
    Ok(())
}
