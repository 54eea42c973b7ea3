//! Mock gdb binary for integration testing
//!
//! Replays a YAML debugger script (path in `MOCK_GDB_SCRIPT`) over
//! stdin/stdout with gdb's prompt framing, so the CLI can be driven end to
//! end without a real debugger or target.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use calltrace::testing::{Script, ScriptStep};

fn main() {
    let script = match std::env::var_os("MOCK_GDB_SCRIPT") {
        Some(path) => match Script::load(path.as_ref()) {
            Ok(script) => script,
            Err(e) => {
                eprintln!("mock_gdb: {e}");
                std::process::exit(2);
            }
        },
        None => {
            eprintln!("mock_gdb: MOCK_GDB_SCRIPT is not set");
            std::process::exit(2);
        }
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut writer = stdout.lock();

    let mut state = MockState::new(script.steps);
    send(&mut writer, &script.banner, &script.prompt);

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let command = line.trim();
        if command == "quit" {
            break;
        }
        let (notice, reply) = state.reply(command);
        if !notice.is_empty() {
            let mut stderr = std::io::stderr().lock();
            stderr.write_all(notice.as_bytes()).ok();
            stderr.flush().ok();
        }
        send(&mut writer, &reply, &script.prompt);
    }
}

fn send<W: Write>(writer: &mut W, text: &str, prompt: &str) {
    writer.write_all(text.as_bytes()).ok();
    writer.write_all(prompt.as_bytes()).ok();
    writer.flush().ok();
}

struct MockState {
    steps: VecDeque<ScriptStep>,
}

impl MockState {
    fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    /// Returns the stderr notice and the stdout reply for one command
    fn reply(&mut self, command: &str) -> (String, String) {
        if self.steps.front().is_some_and(|step| step.expect == command) {
            return self
                .steps
                .pop_front()
                .map(|step| (step.stderr, step.reply))
                .unwrap_or_default();
        }

        // Session setup and teardown are accepted unless scripted
        if command.starts_with("set ") || command == "kill" || command.is_empty() {
            return (String::new(), String::new());
        }

        (
            format!("Undefined command: \"{command}\".  Try \"help\".\n"),
            String::new(),
        )
    }
}
