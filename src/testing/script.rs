//! Debugger script format
//!
//! A script is the exact sequence of commands a session is expected to send,
//! each paired with the text the debugger would print before its prompt.
//! Used by unit tests through [`super::ScriptedDebugger`] and end to end by
//! the `mock_gdb` binary.

use serde::Deserialize;
use std::path::Path;

use crate::common::{Error, Result};

/// A complete scripted debugger conversation
#[derive(Deserialize, Debug, Clone)]
pub struct Script {
    /// Prompt marker printed after every reply
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Printed once before the first prompt
    #[serde(default)]
    pub banner: String,
    /// Commands in the order they must arrive
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

/// One expected command and the reply to it
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    pub expect: String,
    #[serde(default)]
    pub reply: String,
    /// Printed on stderr before the reply, as gdb does for error notices
    #[serde(default)]
    pub stderr: String,
}

fn default_prompt() -> String {
    "(gdb) ".to_string()
}

impl Script {
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse debugger script: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }
}
