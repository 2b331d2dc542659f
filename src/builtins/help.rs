use std::io::{self, Write};

use crate::engine::{ExecutionResult, ShellState};
use crate::builtins::registry::{BUILTINS, CommandInfo, find_command};

pub const COMMAND_INFO: CommandInfo = CommandInfo {
    name: "help",
    description: "Display information about builtin commands.",
    usage: "help [name ...]\n\nWithout arguments, list the builtins and their descriptions.\nWith NAME, show the usage of that builtin.",
    run: help_runner,
};

pub fn help_runner(args: &[String], _state: &mut ShellState) -> (ExecutionResult, i32) {
    let mut stdout = io::stdout().lock();
    if args.is_empty() {
        let _ = write_overview(&mut stdout);
        return (ExecutionResult::KeepRunning, 0);
    }

    let mut exit_code = 0;
    for arg in args {
        match find_command(arg) {
            Some(cmd) => {
                let _ = writeln!(stdout, "{}: {}", cmd.name, cmd.description);
                let _ = writeln!(stdout, "{}", cmd.usage);
            }
            None => {
                eprintln!("cairn: help: no help topics match `{}`", arg);
                exit_code = 1;
            }
        }
    }
    (ExecutionResult::KeepRunning, exit_code)
}

fn write_overview(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "cairn, version {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "These shell commands are defined internally.")?;
    writeln!(out, "Type `help name` to find out more about the function `name`.\n")?;

    let width = BUILTINS.iter().map(|b| b.name.len()).max().unwrap_or(0);
    for builtin in BUILTINS {
        writeln!(out, " {:<width$}  {}", builtin.name, builtin.description)?;
    }
    writeln!(
        out,
        "\nSyntax: quotes, pipes (|), redirections (<, >, >>), background (&), $VAR and $?"
    )
}
