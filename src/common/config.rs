//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Debugger process settings
    #[serde(default)]
    pub debugger: DebuggerConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Session command settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// How to launch and talk to the debugger
#[derive(Debug, Deserialize, Clone)]
pub struct DebuggerConfig {
    /// Path or name of the debugger executable
    #[serde(default = "default_debugger_path")]
    pub path: PathBuf,

    /// Additional arguments passed before `--args <program>`
    #[serde(default)]
    pub args: Vec<String>,

    /// Prompt marker the debugger prints when ready for a command
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            path: default_debugger_path(),
            args: Vec::new(),
            prompt: default_prompt(),
        }
    }
}

fn default_debugger_path() -> PathBuf {
    PathBuf::from("gdb")
}

fn default_prompt() -> String {
    "(gdb) ".to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// How long to wait for the prompt after each command
    #[serde(default = "default_prompt_secs")]
    pub prompt_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            prompt_secs: default_prompt_secs(),
        }
    }
}

fn default_prompt_secs() -> u64 {
    10
}

/// Commands issued by the session on the user's behalf
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Sent once after the debugger's first prompt
    #[serde(default = "default_setup_commands")]
    pub setup_commands: Vec<String>,

    /// Run first on every explicit breakpoint hit
    #[serde(default = "default_locals_command")]
    pub locals_command: String,

    /// Used to measure stack depth on every hit
    #[serde(default = "default_backtrace_command")]
    pub backtrace_command: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            setup_commands: default_setup_commands(),
            locals_command: default_locals_command(),
            backtrace_command: default_backtrace_command(),
        }
    }
}

fn default_setup_commands() -> Vec<String> {
    [
        "set pagination off",
        "set confirm off",
        "set width 0",
        "set height 0",
        "set breakpoint pending on",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_locals_command() -> String {
    "info locals".to_string()
}

fn default_backtrace_command() -> String {
    "backtrace".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Resolve the debugger executable
    ///
    /// Paths with a directory component are used as given; bare names are
    /// searched for in PATH.
    pub fn debugger_path(&self) -> Result<PathBuf> {
        let path = &self.debugger.path;
        if path.components().count() > 1 {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(Error::DebuggerNotFound(path.display().to_string()));
        }
        which::which(path).map_err(|_| Error::DebuggerNotFound(path.display().to_string()))
    }
}
