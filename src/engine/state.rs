use std::path::PathBuf;

use super::job_control::TerminalControl;
use super::job_table::JobTable;
use crate::history::History;

/// Everything the shell carries between lines.
pub struct ShellState {
    /// Shared with the SIGCHLD handler.
    pub jobs: &'static JobTable,
    pub history: History,
    /// `$?`
    pub last_status: i32,
    /// Target of `cd -`.
    pub previous_dir: Option<PathBuf>,
    /// `None` when stdin is not a terminal.
    pub terminal: Option<TerminalControl>,
}

impl ShellState {
    pub fn new(jobs: &'static JobTable, terminal: Option<TerminalControl>) -> Self {
        ShellState {
            jobs,
            history: History::new(),
            last_status: 0,
            previous_dir: None,
            terminal,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.terminal.is_some()
    }

    /// Release every job slot. Remaining jobs are left running.
    pub fn shutdown(self) {
        if self.jobs.is_empty() {
            return;
        }
        for job in self.jobs.list() {
            tracing::debug!(
                id = job.id,
                pgid = job.pgid.as_raw(),
                state = %job.state,
                "abandoning job at exit"
            );
        }
        self.jobs.clear();
    }
}

pub enum ExecutionResult {
    KeepRunning,
    Exit(i32),
}
