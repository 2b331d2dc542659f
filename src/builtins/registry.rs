use crate::engine::{ExecutionResult, ShellState};
use crate::builtins;

/// Runs a builtin with its arguments (program name excluded). The `i32`
/// becomes `$?`.
pub type BuiltinRunner = fn(&[String], &mut ShellState) -> (ExecutionResult, i32);

pub struct CommandInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub run: BuiltinRunner,
}

pub const BUILTINS: &[CommandInfo] = &[
    builtins::cd::COMMAND_INFO_CD,
    builtins::cd::COMMAND_INFO_PWD,
    builtins::system::COMMAND_INFO_EXIT,
    builtins::help::COMMAND_INFO,
    builtins::history::COMMAND_INFO,
    builtins::jobs::COMMAND_INFO,
    builtins::fg::COMMAND_INFO,
    builtins::bg::COMMAND_INFO,
    builtins::export::COMMAND_INFO,
    builtins::unset::COMMAND_INFO,
];

pub fn find_command(name: &str) -> Option<&'static CommandInfo> {
    BUILTINS.iter().find(|cmd| cmd.name == name)
}
