use std::io::{self, IsTerminal};

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{Pid, getpgrp, tcsetpgrp};

use crate::engine::job_table::{Job, JobState, JobTable};
use crate::engine::state::ShellState;
use crate::error::{Result, ShellError};
use crate::signals::{self, ChildSignalGuard};

/// Controlling-terminal handoff. Present only when stdin is a terminal.
#[derive(Debug, Clone, Copy)]
pub struct TerminalControl {
    shell_pgid: Pid,
}

impl TerminalControl {
    pub fn detect() -> Option<Self> {
        if !io::stdin().is_terminal() {
            return None;
        }
        Some(TerminalControl { shell_pgid: getpgrp() })
    }

    /// Make `pgid` the terminal's foreground group.
    pub fn give_to(&self, pgid: Pid) {
        if let Err(e) = tcsetpgrp(io::stdin(), pgid) {
            tracing::debug!(pgid = pgid.as_raw(), error = %e, "tcsetpgrp failed");
        }
    }

    /// Put the shell back in the foreground
    pub fn reclaim(&self) {
        self.give_to(self.shell_pgid);
    }
}

/// How a foreground wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every member is gone; carries the pipeline's exit status.
    Finished(i32),
    /// A member stopped; carries 128 + the stop signal.
    Stopped(i32),
}

/// Shell-style status for a terminated process: the exit code, or 128 + the
/// signal number.
pub fn status_code(status: WaitStatus) -> Option<(Pid, i32)> {
    match status {
        WaitStatus::Exited(pid, code) => Some((pid, code)),
        WaitStatus::Signaled(pid, signal, _) => Some((pid, 128 + signal as i32)),
        _ => None,
    }
}

/// Block until every process in `alive` has terminated or one of them stops.
///
/// The caller must hold a [`ChildSignalGuard`] so the reaper cannot take
/// these statuses. Collected pids are removed from `alive` and released
/// from `table`. The pipeline's status is the status of `tail` when it
/// was collected here, otherwise the last status collected.
pub fn wait_for_group(
    pgid: Pid,
    tail: Option<Pid>,
    alive: &mut Vec<Pid>,
    table: &JobTable,
) -> WaitOutcome {
    let group = Pid::from_raw(-pgid.as_raw());
    let mut tail_status = None;
    let mut last_status = 0;

    while !alive.is_empty() {
        match waitpid(group, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Stopped(_, signal)) => {
                return WaitOutcome::Stopped(128 + signal as i32);
            }
            Ok(status) => {
                let Some((pid, code)) = status_code(status) else {
                    continue;
                };
                alive.retain(|&p| p != pid);
                table.forget_member(pid);
                last_status = code;
                if Some(pid) == tail {
                    tail_status = Some(code);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => {
                // ECHILD: someone else already collected the rest.
                tracing::debug!(pgid = pgid.as_raw(), error = %e, "group wait ended early");
                alive.clear();
            }
        }
    }

    WaitOutcome::Finished(tail_status.unwrap_or(last_status))
}

/// Resolve a job argument (`%N` or `N`); with none, the most recent job.
pub fn resolve_job(args: &[String], table: &JobTable) -> Result<Job> {
    match args.first() {
        None => table
            .latest()
            .ok_or_else(|| ShellError::NoSuchJob("current".to_string())),
        Some(spec) => spec
            .strip_prefix('%')
            .unwrap_or(spec)
            .parse::<u32>()
            .ok()
            .and_then(|id| table.find_by_id(id))
            .ok_or_else(|| ShellError::NoSuchJob(spec.clone())),
    }
}

/// Continue a job in the foreground and wait for it. Returns the status to
/// record as `$?`.
pub fn resume_in_foreground(id: u32, state: &mut ShellState) -> Result<i32> {
    let _guard = ChildSignalGuard::block().map_err(ShellError::sys("sigprocmask"))?;

    // Re-read under the guard; the reaper may have finished it meanwhile.
    let job = state
        .jobs
        .find_by_id(id)
        .ok_or_else(|| ShellError::NoSuchJob(format!("%{id}")))?;
    if job.state == JobState::Done {
        state.jobs.remove(id);
        return Err(ShellError::JobTerminated(id));
    }

    println!("{}", job.label);
    state.jobs.set_state(id, JobState::Running);
    if let Some(terminal) = &state.terminal {
        terminal.give_to(job.pgid);
    }
    signals::set_foreground(job.pgid);

    if let Err(e) = killpg(job.pgid, Signal::SIGCONT) {
        signals::clear_foreground();
        if let Some(terminal) = &state.terminal {
            terminal.reclaim();
        }
        return Err(ShellError::Sys { call: "kill", source: e });
    }

    let mut alive = job.members.clone();
    let outcome = wait_for_group(job.pgid, job.tail, &mut alive, state.jobs);

    signals::clear_foreground();
    if let Some(terminal) = &state.terminal {
        terminal.reclaim();
    }

    match outcome {
        WaitOutcome::Finished(code) => {
            state.jobs.remove(id);
            Ok(code)
        }
        WaitOutcome::Stopped(code) => {
            state.jobs.set_state(id, JobState::Stopped);
            println!();
            println!("[{}] Stopped   {}", id, job.label);
            Ok(code)
        }
    }
}

/// Continue a stopped job without waiting for it.
pub fn resume_in_background(id: u32, table: &JobTable) -> Result<()> {
    let job = table
        .find_by_id(id)
        .ok_or_else(|| ShellError::NoSuchJob(format!("%{id}")))?;
    if job.state == JobState::Done {
        table.remove(id);
        return Err(ShellError::JobTerminated(id));
    }

    table.set_state(id, JobState::Running);
    killpg(job.pgid, Signal::SIGCONT).map_err(ShellError::sys("kill"))?;
    println!("[{}] {}", job.id, job.label);
    Ok(())
}

/// Print every job as `[id] State   label`, then drop the ones reported Done.
pub fn report_jobs(table: &JobTable, out: &mut impl io::Write) -> io::Result<()> {
    for job in table.list() {
        writeln!(out, "[{}] {}   {}", job.id, job.state, job.label)?;
        if job.state == JobState::Done {
            table.remove(job.id);
        }
    }
    Ok(())
}
