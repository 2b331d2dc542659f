use std::ffi::CString;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{SigSet, SigmaskHow, Signal, killpg, sigprocmask};
use nix::sys::wait::waitpid;
use nix::unistd::{self, ForkResult, Pid};

use crate::builtins;
use crate::error::{Result, ShellError};
use crate::parser::{Command, Pipeline};
use crate::signals::{self, ChildSignalGuard};

use super::job_control::{self, TerminalControl, WaitOutcome};
use super::job_table::JobState;
use super::redirect;
use super::state::{ExecutionResult, ShellState};

/// Run one parsed line: a lone builtin in-process, anything else as a
/// process group. Errors are reported here and never end the shell.
pub fn execute(pipeline: &Pipeline, state: &mut ShellState) -> ExecutionResult {
    if let [command] = pipeline.commands.as_slice() {
        if let Some(info) = builtins::registry::find_command(command.program()) {
            if command.has_redirects() || pipeline.background {
                eprintln!(
                    "cairn: warning: redirections and '&' are ignored for builtin '{}'",
                    info.name
                );
            }
            let (result, code) = (info.run)(command.args(), state);
            state.last_status = code;
            return result;
        }
    }

    if let Err(e) = launch(pipeline, state) {
        eprintln!("cairn: {e}");
    }
    ExecutionResult::KeepRunning
}

/// Start every stage of `pipeline` in one new process group, then either
/// register it as a background job or wait for it in the foreground.
pub fn launch(pipeline: &Pipeline, state: &mut ShellState) -> Result<()> {
    let argvs = pipeline
        .commands
        .iter()
        .map(to_c_argv)
        .collect::<Result<Vec<_>>>()?;

    // Unflushed output would otherwise be duplicated into every child.
    let _ = io::stdout().flush();

    let guard = ChildSignalGuard::block().map_err(ShellError::sys("sigprocmask"))?;
    let pipes = open_pipes(pipeline.commands.len())?;
    let terminal = state.terminal.filter(|_| !pipeline.background);

    let mut group: Option<Pid> = None;
    let mut members = Vec::with_capacity(pipeline.commands.len());

    for (index, (command, argv)) in pipeline.commands.iter().zip(&argvs).enumerate() {
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                let wiring = StageWiring {
                    index,
                    pipes: &pipes,
                    group,
                    take_terminal: terminal.is_some(),
                    mask: guard.previous(),
                };
                exec_stage(command, argv, &wiring);
            }
            Ok(ForkResult::Parent { child }) => {
                let pgid = *group.get_or_insert(child);
                let _ = unistd::setpgid(child, pgid);
                if index == 0 {
                    if let Some(terminal) = &terminal {
                        terminal.give_to(pgid);
                    }
                }
                members.push(child);
            }
            Err(errno) => {
                drop(pipes);
                if let Some(pgid) = group {
                    abandon_partial(pgid, terminal.as_ref());
                }
                return Err(ShellError::Sys { call: "fork", source: errno });
            }
        }
    }

    // The children hold their own copies.
    drop(pipes);

    let Some(pgid) = group else {
        return Ok(());
    };
    let tail = members.last().copied();
    tracing::debug!(
        pgid = pgid.as_raw(),
        stages = members.len(),
        background = pipeline.background,
        "launched pipeline"
    );

    if pipeline.background {
        match state
            .jobs
            .add(pgid, &pipeline.text, &members, tail, JobState::Running)
        {
            Ok(id) => println!("[{}] {}", id, pgid),
            Err(e) => {
                tracing::warn!(pgid = pgid.as_raw(), "background group runs untracked");
                eprintln!("cairn: {e}");
            }
        }
        return Ok(());
    }

    signals::set_foreground(pgid);
    let mut alive = members;
    let outcome = job_control::wait_for_group(pgid, tail, &mut alive, state.jobs);
    signals::clear_foreground();
    if let Some(terminal) = &terminal {
        terminal.reclaim();
    }

    match outcome {
        WaitOutcome::Finished(code) => state.last_status = code,
        WaitOutcome::Stopped(code) => {
            println!();
            let tail = tail.filter(|pid| alive.contains(pid));
            match state
                .jobs
                .add(pgid, &pipeline.text, &alive, tail, JobState::Stopped)
            {
                Ok(id) => {
                    tracing::debug!(id, pgid = pgid.as_raw(), "foreground job stopped");
                    println!("[{}] Stopped   {}", id, pipeline.text);
                }
                Err(e) => eprintln!("cairn: {e}"),
            }
            state.last_status = code;
        }
    }

    drop(guard);
    Ok(())
}

fn to_c_argv(command: &Command) -> Result<Vec<CString>> {
    command
        .argv
        .iter()
        .map(|arg| {
            CString::new(arg.as_bytes()).map_err(|_| ShellError::InvalidArgument(arg.clone()))
        })
        .collect()
}

/// `count - 1` pipes as (read, write) pairs; pipe `i` joins stage `i` to
/// stage `i + 1`.
fn open_pipes(count: usize) -> Result<Vec<(OwnedFd, OwnedFd)>> {
    (1..count)
        .map(|_| unistd::pipe().map_err(ShellError::sys("pipe")))
        .collect()
}

/// Kill and collect the stages forked before a launch failed. SIGCHLD is
/// still blocked, so every status lands here.
fn abandon_partial(pgid: Pid, terminal: Option<&TerminalControl>) {
    tracing::warn!(pgid = pgid.as_raw(), "killing partially launched pipeline");
    let _ = killpg(pgid, Signal::SIGKILL);
    let group = Pid::from_raw(-pgid.as_raw());
    loop {
        match waitpid(group, None) {
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(_) => break,
        }
    }
    if let Some(terminal) = terminal {
        terminal.reclaim();
    }
}

struct StageWiring<'a> {
    index: usize,
    pipes: &'a [(OwnedFd, OwnedFd)],
    /// `None` for the first stage, which leads its own group.
    group: Option<Pid>,
    take_terminal: bool,
    mask: &'a SigSet,
}

/// Child side of a fork. Never returns.
fn exec_stage(command: &Command, argv: &[CString], wiring: &StageWiring<'_>) -> ! {
    let me = unistd::getpid();
    let pgid = wiring.group.unwrap_or(me);
    let _ = unistd::setpgid(me, pgid);
    if wiring.take_terminal {
        let _ = unistd::tcsetpgrp(io::stdin(), pgid);
    }

    signals::restore_default();
    let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(wiring.mask), None);

    if wiring.index > 0 {
        replace_fd(wiring.pipes[wiring.index - 1].0.as_raw_fd(), libc::STDIN_FILENO);
    }
    if wiring.index < wiring.pipes.len() {
        replace_fd(wiring.pipes[wiring.index].1.as_raw_fd(), libc::STDOUT_FILENO);
    }
    for (read, write) in wiring.pipes {
        close_fd(read.as_raw_fd());
        close_fd(write.as_raw_fd());
    }

    // After the pipes, so a file redirect wins.
    if let Err(message) = redirect::apply(command) {
        eprintln!("{message}");
        exit_child(1);
    }

    let errno = match unistd::execvp(&argv[0], argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    if errno == Errno::ENOENT {
        eprintln!("cairn: command not found: {}", command.program());
    } else {
        eprintln!("cairn: {}: {}", command.program(), errno.desc());
    }
    exit_child(127)
}

fn replace_fd(from: RawFd, to: RawFd) {
    if from != to {
        unsafe {
            libc::dup2(from, to);
        }
    }
}

fn close_fd(fd: RawFd) {
    if fd > libc::STDERR_FILENO {
        unsafe {
            libc::close(fd);
        }
    }
}

fn exit_child(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}
