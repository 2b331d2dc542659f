//! End-to-end tests: feed a script to the shell on a pipe and inspect what
//! it prints.

use std::io::Write;
use std::process::{Child, Command, Output, Stdio};

fn spawn_shell(script: &str) -> Child {
    let mut child = Command::new(env!("CARGO_BIN_EXE_cairn"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env_remove("RUST_LOG")
        .spawn()
        .expect("failed to start cairn");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    child
}

fn run_shell(script: &str) -> Output {
    spawn_shell(script).wait_with_output().unwrap()
}

fn stdout_of(script: &str) -> String {
    String::from_utf8(run_shell(script).stdout).unwrap()
}

fn stderr_of(script: &str) -> String {
    String::from_utf8(run_shell(script).stderr).unwrap()
}

#[test]
fn test_simple_command() {
    assert_eq!(stdout_of("echo hello world\n"), "hello world\n");
}

#[test]
fn test_no_prompt_when_not_a_terminal() {
    let out = run_shell("\n\n# just a comment\n");
    assert!(out.stdout.is_empty());
    assert!(out.stderr.is_empty());
    assert!(out.status.success());
}

#[test]
fn test_pipeline() {
    assert_eq!(stdout_of("printf 'b\\na\\nb\\n' | sort | uniq -c | wc -l\n").trim(), "2");
}

#[test]
fn test_producer_stops_when_consumer_exits() {
    // Hangs if any process still holds the pipe's read end.
    assert_eq!(stdout_of("yes | head -n 2\n"), "y\ny\n");
}

#[test]
fn test_redirections() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("out.txt");
    let file = file.display();
    let script = format!("echo first > {file}\necho second >> {file}\nsort -r < {file}\n");
    assert_eq!(stdout_of(&script), "second\nfirst\n");
}

#[test]
fn test_redirect_overrides_pipe() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("mid.txt");
    let script = format!("echo captured > {} | wc -c\n", file.display());
    assert_eq!(stdout_of(&script).trim(), "0");
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "captured\n");
}

#[test]
fn test_missing_input_file() {
    let out = run_shell("cat < /nonexistent/cairn.txt\necho $?\n");
    assert_eq!(String::from_utf8(out.stdout).unwrap(), "1\n");
    assert!(String::from_utf8(out.stderr).unwrap().contains("/nonexistent/cairn.txt"));
}

#[test]
fn test_exit_status_substitution() {
    assert_eq!(stdout_of("sh -c 'exit 3'\necho $?\n"), "3\n");
    assert_eq!(stdout_of("sh -c 'kill -TERM $$'\necho $?\n"), "143\n");
}

#[test]
fn test_only_last_stage_status_counts() {
    assert_eq!(stdout_of("false | true\necho $?\n"), "0\n");
    assert_eq!(stdout_of("true | false\necho $?\n"), "1\n");
}

#[test]
fn test_command_not_found_isolated_to_its_stage() {
    let out = run_shell(
        "cairn_no_such_program | echo still here\necho $?\ncairn_no_such_program\necho $?\n",
    );
    assert_eq!(String::from_utf8(out.stdout).unwrap(), "still here\n0\n127\n");
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("cairn: command not found: cairn_no_such_program"));
}

#[test]
fn test_syntax_errors_discard_the_line() {
    let out = run_shell("echo lost >\necho lost | | wc\necho kept\n");
    assert_eq!(String::from_utf8(out.stdout).unwrap(), "kept\n");
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("cairn: syntax error: expected filename after '>'"));
    assert!(stderr.contains("cairn: syntax error: missing command"));
}

#[test]
fn test_quoting() {
    assert_eq!(stdout_of("echo 'a  |  b' \"c > d\" e'f'g\n"), "a  |  b c > d efg\n");
    assert_eq!(stdout_of("echo \"say \\\"hi\\\"\"\n"), "say \"hi\"\n");
}

#[test]
fn test_export_and_unset() {
    let script = "export CAIRN_IT_VAR=abc OTHER_IT=x\necho $CAIRN_IT_VAR ${OTHER_IT}y\nunset CAIRN_IT_VAR OTHER_IT\necho [$CAIRN_IT_VAR]\n";
    assert_eq!(stdout_of(script), "abc xy\n[]\n");
}

#[test]
fn test_exported_variable_reaches_children() {
    assert_eq!(stdout_of("export CAIRN_IT_CHILD=seen\nsh -c 'echo $CAIRN_IT_CHILD'\n"), "seen\n");
}

#[test]
fn test_history_listing() {
    assert_eq!(
        stdout_of("echo a\n\nhistory\n"),
        "a\n   1  echo a\n   2  history\n"
    );
}

#[test]
fn test_cd_and_pwd() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().canonicalize().unwrap();
    let script = format!("cd {}\npwd\ncd /\ncd -\n", path.display());
    let expected = format!("{0}\n{0}\n", path.display());
    assert_eq!(stdout_of(&script), expected);
}

#[test]
fn test_cd_failure_sets_status() {
    assert_eq!(stdout_of("cd /nonexistent/cairn\necho $?\n"), "1\n");
}

#[test]
fn test_help_lists_builtins() {
    let out = stdout_of("help\n");
    for name in ["cd", "pwd", "exit", "history", "jobs", "fg", "bg", "export", "unset"] {
        assert!(out.contains(name), "help is missing {name}");
    }
}

#[test]
fn test_exit_status() {
    assert_eq!(run_shell("exit 5\necho unreachable\n").status.code(), Some(5));
    assert_eq!(run_shell("sh -c 'exit 4'\n").status.code(), Some(4));
    assert_eq!(run_shell("").status.code(), Some(0));
}

#[test]
fn test_background_job_lifecycle() {
    let out = stdout_of("sleep 0.3 &\njobs\nsleep 1\njobs\njobs\n");
    let mut lines = out.lines().filter(|l| !l.is_empty());

    let launch = lines.next().unwrap();
    assert!(launch.starts_with("[1] "), "unexpected launch line: {launch}");
    assert!(launch[4..].parse::<i32>().is_ok());

    assert_eq!(lines.next(), Some("[1] Running   sleep 0.3 &"));
    // The asynchronous notice, then the one listing that consumes the job.
    assert_eq!(lines.next(), Some("[1] Done   sleep 0.3 &"));
    assert_eq!(lines.next(), Some("[1] Done   sleep 0.3 &"));
    assert_eq!(lines.next(), None);
}

#[test]
fn test_stopped_job_resumed_with_fg() {
    let script = "sh -c 'kill -STOP $$; exit 4'\njobs\nfg %1\necho status=$?\n";
    let out = stdout_of(script);
    let lines: Vec<&str> = out.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(
        lines,
        vec![
            "[1] Stopped   sh -c 'kill -STOP $$; exit 4'",
            "[1] Stopped   sh -c 'kill -STOP $$; exit 4'",
            "sh -c 'kill -STOP $$; exit 4'",
            "status=4",
        ]
    );
}

#[test]
fn test_stopped_job_resumed_with_bg() {
    let script = "sh -c 'kill -STOP $$; sleep 0.1'\nbg\nsleep 0.5\njobs\njobs\n";
    let out = stdout_of(script);
    let lines: Vec<&str> = out.lines().filter(|l| !l.is_empty()).collect();
    let label = "sh -c 'kill -STOP $$; sleep 0.1'";
    assert_eq!(
        lines,
        vec![
            format!("[1] Stopped   {label}"),
            format!("[1] {label}"),
            format!("[1] Done   {label}"),
            format!("[1] Done   {label}"),
        ]
    );
}

#[test]
fn test_fg_unknown_job() {
    let out = run_shell("fg %7\necho $?\n");
    assert_eq!(String::from_utf8(out.stdout).unwrap(), "1\n");
    assert!(String::from_utf8(out.stderr).unwrap().contains("cairn: fg: %7: no such job"));
}

#[test]
fn test_builtin_redirect_warns() {
    assert!(stderr_of("pwd > /dev/null\n").contains("ignored for builtin 'pwd'"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_stages_hold_no_extra_descriptors() {
    // `; true` keeps sh from exec'ing ls in place of itself.
    let listing = "sh -c 'ls /proc/$$/fd; true'";
    let alone = stdout_of(&format!("{listing}\n"));
    let piped = stdout_of(&format!("{listing} | cat\n"));
    let middle = stdout_of(&format!("echo x | {listing} | cat\n"));
    assert_eq!(piped.lines().count(), alone.lines().count());
    assert_eq!(middle.lines().count(), alone.lines().count());
    assert!(alone.lines().any(|fd| fd == "2"));
}

#[cfg(target_os = "linux")]
mod terminal_signals {
    use std::thread;
    use std::time::Duration;

    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    use super::spawn_shell;

    /// Pid of the shell's first child once it has one.
    fn first_child(shell: u32) -> Pid {
        let children = format!("/proc/{shell}/task/{shell}/children");
        for _ in 0..100 {
            let list = std::fs::read_to_string(&children).unwrap_or_default();
            if let Some(pid) = list.split_whitespace().next() {
                // Let the shell finish publishing the foreground group.
                thread::sleep(Duration::from_millis(200));
                return Pid::from_raw(pid.parse().unwrap());
            }
            thread::sleep(Duration::from_millis(50));
        }
        panic!("cairn never started a child");
    }

    #[test]
    fn test_interrupt_reaches_foreground_job_only() {
        let shell = spawn_shell("sleep 5\necho status=$?\n");
        first_child(shell.id());

        kill(Pid::from_raw(shell.id() as i32), Signal::SIGINT).unwrap();

        let out = shell.wait_with_output().unwrap();
        assert_eq!(String::from_utf8(out.stdout).unwrap(), "status=130\n");
        assert_eq!(out.status.code(), Some(0));
    }

    #[test]
    fn test_suspend_registers_stopped_job() {
        let shell = spawn_shell("sleep 5\necho status=$?\njobs\n");
        let sleeper = first_child(shell.id());

        kill(Pid::from_raw(shell.id() as i32), Signal::SIGTSTP).unwrap();
        thread::sleep(Duration::from_millis(300));
        // The stopped sleep still holds the output pipe.
        let _ = kill(sleeper, Signal::SIGKILL);

        let out = shell.wait_with_output().unwrap();
        let stdout = String::from_utf8(out.stdout).unwrap();
        let lines: Vec<&str> = stdout.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(
            lines,
            vec!["[1] Stopped   sleep 5", "status=148", "[1] Stopped   sleep 5"]
        );
        assert!(out.status.success());
    }
}
