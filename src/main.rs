mod builtins;
mod editor;
mod engine;
mod error;
mod history;
mod parser;
mod signals;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use sysinfo::System;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use editor::{LineEditor, ReadOutcome};
use engine::job_control::TerminalControl;
use engine::path::display_home_relative;
use engine::{ExecutionResult, ShellState};

/// `user@host:dir$ ` with user@host in green and the directory in blue.
fn get_prompt(user: &str, host: &str) -> String {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("?"));
    let home = env::var_os("HOME").map(PathBuf::from).or_else(dirs::home_dir);
    let path_str = display_home_relative(&cwd, home.as_deref());

    format!("\x1b[1;32m{user}@{host}\x1b[0m:\x1b[1;34m{path_str}\x1b[0m$ ")
}

/// Stderr logging, silent unless `RUST_LOG` asks for more.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Substitute, record, parse and run one input line.
fn run_line(line: &str, state: &mut ShellState) -> ExecutionResult {
    if line.trim().is_empty() {
        return ExecutionResult::KeepRunning;
    }
    state.history.add(line);

    let expanded = parser::expand_variables(line, state.last_status);
    match parser::parse_pipeline(&expanded) {
        Ok(Some(pipeline)) => engine::execute(&pipeline, state),
        Ok(None) => ExecutionResult::KeepRunning,
        Err(e) => {
            eprintln!("cairn: {e}");
            ExecutionResult::KeepRunning
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    if let Err(e) = signals::init() {
        eprintln!("cairn: cannot install signal handlers: {e}");
        return ExitCode::FAILURE;
    }

    let mut state = ShellState::new(signals::job_table(), TerminalControl::detect());
    let mut editor = LineEditor::new(state.is_interactive());
    let user = env::var("USER").unwrap_or_else(|_| "user".to_string());
    let host = System::host_name().unwrap_or_else(|| "unknown".to_string());
    tracing::debug!(interactive = state.is_interactive(), "shell started");

    let status = loop {
        let prompt = get_prompt(&user, &host);
        let line = match editor.read_line(&prompt, &state.history) {
            Ok(ReadOutcome::Line(line)) => line,
            Ok(ReadOutcome::Eof) => break state.last_status,
            Err(e) => {
                eprintln!("cairn: {e}");
                break 1;
            }
        };

        if let ExecutionResult::Exit(code) = run_line(&line, &mut state) {
            break code;
        }
    };

    state.shutdown();
    ExitCode::from(status as u8)
}
