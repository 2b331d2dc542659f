use crate::engine::{ExecutionResult, ShellState};
use crate::builtins::registry::CommandInfo;

pub const COMMAND_INFO_EXIT: CommandInfo = CommandInfo {
    name: "exit",
    description: "Exit the shell.",
    usage: "exit [n]\n\nExit the shell with a status of N. If N is omitted, the exit status\nis that of the last command executed.",
    run: exit_runner,
};

pub fn exit_runner(args: &[String], state: &mut ShellState) -> (ExecutionResult, i32) {
    match args.first() {
        None => (ExecutionResult::Exit(state.last_status), state.last_status),
        Some(arg) => match arg.parse::<i32>() {
            // Only the low byte survives exit(2).
            Ok(code) => (ExecutionResult::Exit(code & 0xff), code & 0xff),
            Err(_) => {
                eprintln!("cairn: exit: {}: numeric argument required", arg);
                (ExecutionResult::KeepRunning, 2)
            }
        },
    }
}
