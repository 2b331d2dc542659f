mod state;
mod redirect;
pub mod path;
pub mod job_table;
pub mod job_control;
mod execution;

// Re-export the public API so that `main.rs`, `builtins/` and `signals`
// can use `engine::ShellState`, `engine::JobTable`, etc.
pub use state::{ShellState, ExecutionResult};
pub use job_table::JobTable;
pub use execution::execute;
pub use path::expand_home;
