//! Fixed-capacity registry of background and stopped jobs.
//!
//! The table is shared between the main flow and the SIGCHLD handler. Every
//! field of a slot is an atomic cell, a slot is published by storing its
//! pgid last and retired by clearing its pgid first, and the table never
//! grows. The handler side (`record`, `Notice::emit`) does not allocate.

use std::fmt::{self, Write as _};
use std::os::fd::BorrowedFd;
use std::sync::atomic::{AtomicI32, AtomicU8, AtomicU32, AtomicUsize, Ordering};

use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;

use crate::error::{Result, ShellError};

pub const MAX_JOBS: usize = 128;
/// Longest display label kept per job, in bytes.
pub const MAX_LABEL: usize = 256;
/// Upper bound on processes per job; matches the parser's stage limit.
pub const MAX_MEMBERS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
    Done,
}

impl JobState {
    const fn to_raw(self) -> u8 {
        match self {
            JobState::Running => 0,
            JobState::Stopped => 1,
            JobState::Done => 2,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => JobState::Stopped,
            2 => JobState::Done,
            _ => JobState::Running,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Running => "Running",
            JobState::Stopped => "Stopped",
            JobState::Done => "Done",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owned snapshot of one registered job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: u32,
    pub pgid: Pid,
    pub label: String,
    pub state: JobState,
    /// Processes of the group not yet reaped, in stage order.
    pub members: Vec<Pid>,
    /// Last stage of the pipeline, if it was alive when the job was registered.
    pub tail: Option<Pid>,
}

struct Slot {
    pgid: AtomicI32,
    id: AtomicU32,
    state: AtomicU8,
    tail: AtomicI32,
    members: [AtomicI32; MAX_MEMBERS],
    label_len: AtomicUsize,
    label: [AtomicU8; MAX_LABEL],
}

impl Slot {
    const fn new() -> Self {
        Slot {
            pgid: AtomicI32::new(0),
            id: AtomicU32::new(0),
            state: AtomicU8::new(0),
            tail: AtomicI32::new(0),
            members: [const { AtomicI32::new(0) }; MAX_MEMBERS],
            label_len: AtomicUsize::new(0),
            label: [const { AtomicU8::new(0) }; MAX_LABEL],
        }
    }

    fn pgid(&self) -> i32 {
        self.pgid.load(Ordering::Acquire)
    }

    fn is_free(&self) -> bool {
        self.pgid() == 0
    }

    fn state(&self) -> JobState {
        JobState::from_raw(self.state.load(Ordering::Acquire))
    }

    fn holds(&self, pid: i32) -> bool {
        self.members.iter().any(|m| m.load(Ordering::Relaxed) == pid)
    }

    /// Forget `pid`; returns true when no member of the group is left.
    fn release_member(&self, pid: i32) -> bool {
        for cell in &self.members {
            if cell.load(Ordering::Relaxed) == pid {
                cell.store(0, Ordering::Relaxed);
            }
        }
        if self.tail.load(Ordering::Relaxed) == pid {
            self.tail.store(0, Ordering::Relaxed);
        }
        self.members.iter().all(|m| m.load(Ordering::Relaxed) == 0)
    }

    fn label_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        let len = self.label_len.load(Ordering::Relaxed).min(MAX_LABEL);
        self.label[..len].iter().map(|b| b.load(Ordering::Relaxed))
    }

    fn snapshot(&self) -> Option<Job> {
        let pgid = self.pgid();
        if pgid == 0 {
            return None;
        }
        let label: Vec<u8> = self.label_bytes().collect();
        let members = self
            .members
            .iter()
            .map(|m| m.load(Ordering::Relaxed))
            .filter(|&pid| pid != 0)
            .map(Pid::from_raw)
            .collect();
        let tail = match self.tail.load(Ordering::Relaxed) {
            0 => None,
            pid => Some(Pid::from_raw(pid)),
        };
        Some(Job {
            id: self.id.load(Ordering::Relaxed),
            pgid: Pid::from_raw(pgid),
            label: String::from_utf8_lossy(&label).into_owned(),
            state: self.state(),
            members,
            tail,
        })
    }

    fn clear(&self) {
        self.pgid.store(0, Ordering::Release);
        self.id.store(0, Ordering::Relaxed);
        self.state.store(JobState::Running.to_raw(), Ordering::Relaxed);
        self.tail.store(0, Ordering::Relaxed);
        for cell in &self.members {
            cell.store(0, Ordering::Relaxed);
        }
        self.label_len.store(0, Ordering::Relaxed);
    }
}

pub struct JobTable {
    slots: [Slot; MAX_JOBS],
    next_id: AtomicU32,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub const fn new() -> Self {
        JobTable {
            slots: [const { Slot::new() }; MAX_JOBS],
            next_id: AtomicU32::new(1),
        }
    }

    /// Register a process group and return its job id.
    ///
    /// `members` are the live processes of the group in stage order and
    /// `tail` the last stage, when it is among them. A Done entry whose pgid
    /// the OS has handed out again is dropped first; a live one is refused.
    pub fn add(
        &self,
        pgid: Pid,
        label: &str,
        members: &[Pid],
        tail: Option<Pid>,
        state: JobState,
    ) -> Result<u32> {
        if let Some(slot) = self.slot_by_pgid(pgid.as_raw()) {
            if slot.state() != JobState::Done {
                return Err(ShellError::DuplicateJob(pgid.as_raw()));
            }
            slot.clear();
        }

        let slot = self
            .slots
            .iter()
            .find(|s| s.is_free())
            .ok_or(ShellError::JobTableFull)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        slot.id.store(id, Ordering::Relaxed);
        slot.state.store(state.to_raw(), Ordering::Relaxed);
        slot.tail.store(tail.map_or(0, Pid::as_raw), Ordering::Relaxed);

        for (i, cell) in slot.members.iter().enumerate() {
            let pid = members.get(i).map_or(0, |p| p.as_raw());
            cell.store(pid, Ordering::Relaxed);
        }
        if members.is_empty() {
            // A group with no known member still has its leader.
            slot.members[0].store(pgid.as_raw(), Ordering::Relaxed);
        }

        let label = truncate_label(label);
        for (cell, byte) in slot.label.iter().zip(label.bytes()) {
            cell.store(byte, Ordering::Relaxed);
        }
        slot.label_len.store(label.len(), Ordering::Relaxed);

        slot.pgid.store(pgid.as_raw(), Ordering::Release);
        Ok(id)
    }

    pub fn find_by_id(&self, id: u32) -> Option<Job> {
        self.slot_by_id(id).and_then(Slot::snapshot)
    }

    pub fn find_by_pgid(&self, pgid: Pid) -> Option<Job> {
        self.slot_by_pgid(pgid.as_raw()).and_then(Slot::snapshot)
    }

    /// The job with the highest id, used when `fg`/`bg` get no argument.
    pub fn latest(&self) -> Option<Job> {
        self.list().into_iter().max_by_key(|job| job.id)
    }

    /// Registered jobs in slot order.
    pub fn list(&self) -> Vec<Job> {
        self.slots.iter().filter_map(Slot::snapshot).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Slot::is_free)
    }

    pub fn set_state(&self, id: u32, state: JobState) -> bool {
        match self.slot_by_id(id) {
            Some(slot) => {
                slot.state.store(state.to_raw(), Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Release the slot holding job `id`.
    pub fn remove(&self, id: u32) -> bool {
        match self.slot_by_id(id) {
            Some(slot) => {
                slot.clear();
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        for slot in &self.slots {
            slot.clear();
        }
    }

    /// Drop `pid` from whatever job lists it, after a synchronous wait
    /// collected it.
    pub fn forget_member(&self, pid: Pid) {
        if let Some(slot) = self.slot_holding(pid.as_raw()) {
            slot.release_member(pid.as_raw());
        }
    }

    /// Apply one status collected by the reaper.
    ///
    /// Returns a notice when the owning job changed state in a way the user
    /// should hear about. Statuses of processes no job lists are ignored.
    /// Safe to call from a signal handler.
    pub fn record(&self, status: WaitStatus) -> Option<Notice<'_>> {
        match status {
            WaitStatus::Exited(pid, _) | WaitStatus::Signaled(pid, _, _) => {
                let slot = self.slot_holding(pid.as_raw())?;
                if !slot.release_member(pid.as_raw()) {
                    return None;
                }
                let previous = slot.state.swap(JobState::Done.to_raw(), Ordering::AcqRel);
                if JobState::from_raw(previous) == JobState::Done {
                    return None;
                }
                Some(Notice::new(slot, JobState::Done))
            }
            WaitStatus::Stopped(pid, _) => {
                let slot = self.slot_holding(pid.as_raw())?;
                slot.state
                    .compare_exchange(
                        JobState::Running.to_raw(),
                        JobState::Stopped.to_raw(),
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .ok()
                    .map(|_| Notice::new(slot, JobState::Stopped))
            }
            _ => None,
        }
    }

    fn slot_by_id(&self, id: u32) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|s| !s.is_free() && s.id.load(Ordering::Relaxed) == id)
    }

    fn slot_by_pgid(&self, pgid: i32) -> Option<&Slot> {
        if pgid == 0 {
            return None;
        }
        self.slots.iter().find(|s| s.pgid() == pgid)
    }

    fn slot_holding(&self, pid: i32) -> Option<&Slot> {
        if pid == 0 {
            return None;
        }
        self.slots.iter().find(|s| !s.is_free() && s.holds(pid))
    }
}

fn truncate_label(label: &str) -> &str {
    if label.len() <= MAX_LABEL {
        return label;
    }
    let mut end = MAX_LABEL;
    while !label.is_char_boundary(end) {
        end -= 1;
    }
    &label[..end]
}

/// A job state change produced by the reaper.
pub struct Notice<'a> {
    slot: &'a Slot,
    id: u32,
    state: JobState,
}

impl<'a> Notice<'a> {
    fn new(slot: &'a Slot, state: JobState) -> Self {
        Notice {
            slot,
            id: slot.id.load(Ordering::Relaxed),
            state,
        }
    }

    #[cfg(test)]
    fn id(&self) -> u32 {
        self.id
    }

    #[cfg(test)]
    fn state(&self) -> JobState {
        self.state
    }

    /// Format as `\n[jid] State   label\n`.
    pub fn render(&self, buf: &mut NoticeBuf) {
        let _ = write!(buf, "\n[{}] {}   ", self.id, self.state);
        for byte in self.slot.label_bytes() {
            buf.push(byte);
        }
        buf.push(b'\n');
    }

    /// Write the notice with a single `write(2)`.
    pub fn emit(&self, fd: BorrowedFd<'_>) {
        let mut buf = NoticeBuf::new();
        self.render(&mut buf);
        let _ = nix::unistd::write(fd, buf.as_bytes());
    }
}

/// Stack buffer for handler-side formatting. Overflow is truncated.
pub struct NoticeBuf {
    bytes: [u8; MAX_LABEL + 64],
    len: usize,
}

impl NoticeBuf {
    pub const fn new() -> Self {
        NoticeBuf {
            bytes: [0; MAX_LABEL + 64],
            len: 0,
        }
    }

    fn push(&mut self, byte: u8) {
        if self.len < self.bytes.len() {
            self.bytes[self.len] = byte;
            self.len += 1;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl Default for NoticeBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for NoticeBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.push(byte);
        }
        Ok(())
    }
}
