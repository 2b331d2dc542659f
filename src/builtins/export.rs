use std::io::{self, Write};

use crate::engine::{ExecutionResult, ShellState};
use crate::builtins::registry::CommandInfo;

pub const COMMAND_INFO: CommandInfo = CommandInfo {
    name: "export",
    description: "Set environment variables for subsequently executed commands.",
    usage: "export [name=value ...]\n\nSet each NAME to VALUE in the environment. Without arguments, print\nthe environment sorted by name.",
    run: export_runner,
};

pub fn export_runner(args: &[String], _state: &mut ShellState) -> (ExecutionResult, i32) {
    if args.is_empty() {
        let mut stdout = io::stdout().lock();
        for (name, value) in sorted_environment() {
            let _ = writeln!(stdout, "export {}='{}'", name, value);
        }
        return (ExecutionResult::KeepRunning, 0);
    }
    (ExecutionResult::KeepRunning, run(args))
}

/// Behaviour:
/// - `export name=value` → set variable in the environment
/// - `export name`       → no effect (every variable is already exported)
pub fn run(args: &[String]) -> i32 {
    let mut code = 0;
    for arg in args {
        let Some((name, value)) = arg.split_once('=') else {
            continue;
        };
        if !is_valid_name(name) {
            eprintln!("cairn: export: '{}': not a valid identifier", arg);
            code = 1;
            continue;
        }
        unsafe { std::env::set_var(name, value); }
    }
    code
}

pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn sorted_environment() -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = std::env::vars().collect();
    pairs.sort();
    pairs
}
