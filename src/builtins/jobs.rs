use std::io;

use crate::engine::job_control::report_jobs;
use crate::engine::{ExecutionResult, ShellState};
use crate::builtins::registry::CommandInfo;

pub const COMMAND_INFO: CommandInfo = CommandInfo {
    name: "jobs",
    description: "Display status of jobs.",
    usage: "jobs\n\nList the active jobs. Jobs reported as Done are forgotten afterwards.",
    run: jobs_runner,
};

pub fn jobs_runner(_args: &[String], state: &mut ShellState) -> (ExecutionResult, i32) {
    let code = match report_jobs(state.jobs, &mut io::stdout().lock()) {
        Ok(()) => 0,
        Err(_) => 1,
    };
    (ExecutionResult::KeepRunning, code)
}
