use crate::engine::{ExecutionResult, ShellState};
use crate::builtins::registry::CommandInfo;
use crate::builtins::export::is_valid_name;

pub const COMMAND_INFO: CommandInfo = CommandInfo {
    name: "unset",
    description: "Remove variables from the environment.",
    usage: "unset [name ...]\n\nRemove each NAME from the environment.",
    run: unset_runner,
};

pub fn unset_runner(args: &[String], _state: &mut ShellState) -> (ExecutionResult, i32) {
    (ExecutionResult::KeepRunning, run(args))
}

/// Unknown names are ignored, as in other shells.
pub fn run(args: &[String]) -> i32 {
    let mut code = 0;
    for name in args {
        if !is_valid_name(name) {
            eprintln!("cairn: unset: '{}': not a valid identifier", name);
            code = 1;
            continue;
        }
        unsafe { std::env::remove_var(name); }
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_several() {
        unsafe {
            std::env::set_var("CAIRN_UNSET_A", "1");
            std::env::set_var("CAIRN_UNSET_B", "2");
        }
        let args = vec!["CAIRN_UNSET_A".to_string(), "CAIRN_UNSET_B".to_string()];
        assert_eq!(run(&args), 0);
        assert!(std::env::var("CAIRN_UNSET_A").is_err());
        assert!(std::env::var("CAIRN_UNSET_B").is_err());
    }

    #[test]
    fn test_unset_missing_is_fine() {
        assert_eq!(run(&["CAIRN_NEVER_SET".to_string()]), 0);
    }
}
