pub mod registry;

pub mod bg;
pub mod cd;
pub mod export;
pub mod fg;
pub mod help;
pub mod history;
pub mod jobs;
pub mod system;
pub mod unset;
