//! Process-wide signal handling: terminal signal relay, SIGCHLD reaping and
//! the foreground process group cell.

use std::os::fd::BorrowedFd;
use std::sync::atomic::{AtomicI32, Ordering};

use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{
    SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal, killpg, sigaction, sigprocmask,
};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

use crate::engine::JobTable;

/// Process group currently running in the foreground, 0 when none.
static FOREGROUND_PGID: AtomicI32 = AtomicI32::new(0);

/// The job table the SIGCHLD handler reaps into.
static JOB_TABLE: JobTable = JobTable::new();

pub fn job_table() -> &'static JobTable {
    &JOB_TABLE
}

pub fn set_foreground(pgid: Pid) {
    FOREGROUND_PGID.store(pgid.as_raw(), Ordering::SeqCst);
}

pub fn clear_foreground() {
    FOREGROUND_PGID.store(0, Ordering::SeqCst);
}

pub fn foreground() -> Option<Pid> {
    match FOREGROUND_PGID.load(Ordering::SeqCst) {
        0 => None,
        pgid => Some(Pid::from_raw(pgid)),
    }
}

/// Install the shell's handlers.
///
/// SIGINT and SIGTSTP are relayed to the foreground group, SIGCHLD drives
/// the reaper, and the job-control signals that would stop the shell itself
/// are ignored.
pub fn init() -> nix::Result<()> {
    let relay = SigAction::new(
        SigHandler::Handler(relay_to_foreground),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    let reap = SigAction::new(
        SigHandler::Handler(on_child_status),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());

    unsafe {
        sigaction(Signal::SIGINT, &relay)?;
        sigaction(Signal::SIGTSTP, &relay)?;
        sigaction(Signal::SIGCHLD, &reap)?;
        sigaction(Signal::SIGQUIT, &ignore)?;
        sigaction(Signal::SIGTTIN, &ignore)?;
        sigaction(Signal::SIGTTOU, &ignore)?;
    }
    Ok(())
}

/// Restore default dispositions. Called in a forked child before exec.
pub fn restore_default() {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for signal in [
        Signal::SIGINT,
        Signal::SIGTSTP,
        Signal::SIGCHLD,
        Signal::SIGQUIT,
        Signal::SIGTTIN,
        Signal::SIGTTOU,
    ] {
        let _ = unsafe { sigaction(signal, &default) };
    }
}

/// Keeps SIGCHLD blocked while alive and restores the previous mask on drop.
///
/// Held across fork and the foreground wait so the reaper can never collect
/// a status before the job exists or before the waiter sees it.
pub struct ChildSignalGuard {
    previous: SigSet,
}

impl ChildSignalGuard {
    pub fn block() -> nix::Result<Self> {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGCHLD);
        let mut previous = SigSet::empty();
        sigprocmask(SigmaskHow::SIG_BLOCK, Some(&mask), Some(&mut previous))?;
        Ok(ChildSignalGuard { previous })
    }

    /// The mask in force before the guard, for a child to reinstate.
    pub fn previous(&self) -> &SigSet {
        &self.previous
    }
}

impl Drop for ChildSignalGuard {
    fn drop(&mut self) {
        let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.previous), None);
    }
}

/// Drain every pending child status into `table`, announcing job changes on
/// `out`. Async-signal-safe.
pub fn reap(table: &JobTable, out: BorrowedFd<'_>) {
    loop {
        match waitpid(
            Pid::from_raw(-1),
            Some(WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED),
        ) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status) => {
                if let Some(notice) = table.record(status) {
                    notice.emit(out);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(_) => break,
        }
    }
}

extern "C" fn on_child_status(_: libc::c_int) {
    let saved = Errno::last_raw();
    let stdout = unsafe { BorrowedFd::borrow_raw(libc::STDOUT_FILENO) };
    reap(&JOB_TABLE, stdout);
    Errno::set_raw(saved);
}

extern "C" fn relay_to_foreground(signo: libc::c_int) {
    let saved = Errno::last_raw();
    if let (Some(pgid), Ok(signal)) = (foreground(), Signal::try_from(signo)) {
        let _ = killpg(pgid, signal);
    }
    Errno::set_raw(saved);
}
