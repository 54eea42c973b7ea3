//! In-process scripted debugger

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::common::{Error, Result};
use crate::gdb::DebuggerIo;

use super::script::ScriptStep;

/// [`DebuggerIo`] that replays a fixed conversation
///
/// Any command other than the next expected one is an error, so a test
/// fails as soon as the session deviates from the script.
#[derive(Debug, Default)]
pub struct ScriptedDebugger {
    steps: VecDeque<ScriptStep>,
    sent: Vec<String>,
}

impl ScriptedDebugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an expected command and its reply
    pub fn respond(mut self, command: &str, reply: &str) -> Self {
        self.steps.push_back(ScriptStep {
            expect: command.to_string(),
            reply: reply.to_string(),
            stderr: String::new(),
        });
        self
    }

    /// Commands received so far
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Panics if any scripted step was not consumed
    pub fn assert_finished(&self) {
        assert!(
            self.steps.is_empty(),
            "scripted debugger has unconsumed steps: {:?}",
            self.steps
        );
    }
}

#[async_trait]
impl DebuggerIo for ScriptedDebugger {
    async fn command(&mut self, text: &str) -> Result<String> {
        self.sent.push(text.to_string());
        let step = self.steps.pop_front().ok_or_else(|| Error::DebuggerExited {
            partial: format!("script exhausted at '{text}'"),
        })?;
        if step.expect != text {
            return Err(Error::Internal(format!(
                "scripted debugger expected '{}' but got '{}'",
                step.expect, text
            )));
        }
        Ok(step.stderr + &step.reply)
    }

    fn cmdline(&self) -> String {
        "gdb -q -nx --args ./scripted".to_string()
    }
}
