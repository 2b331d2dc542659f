use crate::engine::job_control::{resolve_job, resume_in_foreground};
use crate::engine::{ExecutionResult, ShellState};
use crate::builtins::registry::CommandInfo;

pub const COMMAND_INFO: CommandInfo = CommandInfo {
    name: "fg",
    description: "Move job to the foreground.",
    usage: "fg [%jid]\n\nPlace the job identified by JID in the foreground and wait for it.\nWithout JID, the most recent job is used.",
    run: fg_runner,
};

pub fn fg_runner(args: &[String], state: &mut ShellState) -> (ExecutionResult, i32) {
    let result = resolve_job(args, state.jobs).and_then(|job| resume_in_foreground(job.id, state));
    match result {
        Ok(code) => (ExecutionResult::KeepRunning, code),
        Err(e) => {
            eprintln!("cairn: fg: {}", e);
            (ExecutionResult::KeepRunning, 1)
        }
    }
}
