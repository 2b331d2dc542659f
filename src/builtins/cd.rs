use std::env;
use std::path::PathBuf;

use crate::engine::{ExecutionResult, ShellState, expand_home};
use crate::builtins::registry::CommandInfo;

pub const COMMAND_INFO_CD: CommandInfo = CommandInfo {
    name: "cd",
    description: "Change the shell working directory.",
    usage: "cd [dir | -]\n\nChange the current directory to DIR. The default DIR is $HOME; `-` returns to the previous directory.",
    run: cd_runner,
};

pub const COMMAND_INFO_PWD: CommandInfo = CommandInfo {
    name: "pwd",
    description: "Print the name of the current working directory.",
    usage: "pwd\n\nPrint the absolute pathname of the current working directory.",
    run: pwd_runner,
};

pub fn pwd_runner(_args: &[String], _state: &mut ShellState) -> (ExecutionResult, i32) {
    match env::current_dir() {
        Ok(path) => {
            println!("{}", path.display());
            (ExecutionResult::KeepRunning, 0)
        }
        Err(e) => {
            eprintln!("cairn: pwd: {}", e);
            (ExecutionResult::KeepRunning, 1)
        }
    }
}

pub fn cd_runner(args: &[String], state: &mut ShellState) -> (ExecutionResult, i32) {
    match run(args, state) {
        Ok(()) => (ExecutionResult::KeepRunning, 0),
        Err(e) => {
            eprintln!("cairn: cd: {}", e);
            (ExecutionResult::KeepRunning, 1)
        }
    }
}

pub fn run(args: &[String], state: &mut ShellState) -> Result<(), String> {
    let current = env::current_dir().map_err(|e| e.to_string())?;
    let target = resolve_target(args, state)?;

    env::set_current_dir(&target).map_err(|e| format!("{}: {}", target.display(), e))?;
    if args.first().map(String::as_str) == Some("-") {
        println!("{}", target.display());
    }

    state.previous_dir = Some(current);
    Ok(())
}

/// Where `cd` would go, without going there.
pub fn resolve_target(args: &[String], state: &ShellState) -> Result<PathBuf, String> {
    match args.first().map(String::as_str) {
        None => env::var_os("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .ok_or_else(|| "HOME not set".to_string()),
        Some("-") => state
            .previous_dir
            .clone()
            .ok_or_else(|| "OLDPWD not set".to_string()),
        Some(dir) => Ok(expand_home(dir)),
    }
}
