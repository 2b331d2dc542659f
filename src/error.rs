use thiserror::Error;

/// Errors surfaced to the user as `cairn: <message>`.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error: expected filename after '{0}'")]
    MissingRedirectTarget(&'static str),
    #[error("syntax error: missing command")]
    EmptyCommand,
    #[error("too many piped commands")]
    TooManyCommands,
    #[error("too many args")]
    TooManyArgs,
    #[error("invalid argument: {0:?} contains a NUL byte")]
    InvalidArgument(String),
    #[error("{call}: {source}")]
    Sys {
        call: &'static str,
        #[source]
        source: nix::errno::Errno,
    },
    #[error("cannot add job: job table full")]
    JobTableFull,
    #[error("cannot add job: process group {0} is already a live job")]
    DuplicateJob(i32),
    #[error("{0}: no such job")]
    NoSuchJob(String),
    #[error("%{0}: job has terminated")]
    JobTerminated(u32),
}

impl ShellError {
    pub fn sys(call: &'static str) -> impl FnOnce(nix::errno::Errno) -> ShellError {
        move |source| ShellError::Sys { call, source }
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
