use crate::engine::job_control::{resolve_job, resume_in_background};
use crate::engine::{ExecutionResult, ShellState};
use crate::builtins::registry::CommandInfo;

pub const COMMAND_INFO: CommandInfo = CommandInfo {
    name: "bg",
    description: "Move jobs to the background.",
    usage: "bg [%jid]\n\nResume the stopped job JID in the background, as if it had been\nstarted with `&`. Without JID, the most recent job is used.",
    run: bg_runner,
};

pub fn bg_runner(args: &[String], state: &mut ShellState) -> (ExecutionResult, i32) {
    let result =
        resolve_job(args, state.jobs).and_then(|job| resume_in_background(job.id, state.jobs));
    match result {
        Ok(()) => (ExecutionResult::KeepRunning, 0),
        Err(e) => {
            eprintln!("cairn: bg: {}", e);
            (ExecutionResult::KeepRunning, 1)
        }
    }
}
