//! Session transcript
//!
//! Every command and every chunk of raw output is appended and flushed
//! immediately. Sessions often end because the target died on a signal,
//! and a buffered transcript would lose exactly the lines that matter.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::common::Result;

pub struct Transcript {
    file: File,
}

impl Transcript {
    /// Open (or create) a transcript file in append mode
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    /// Record a command sent to the debugger
    pub fn record_command(&mut self, command: &str) {
        self.write(format!(">>> {command}\n").as_bytes());
    }

    /// Record raw debugger output as received
    pub fn record_output(&mut self, chunk: &[u8]) {
        self.write(chunk);
    }

    fn write(&mut self, bytes: &[u8]) {
        if let Err(e) = self.file.write_all(bytes).and_then(|_| self.file.flush()) {
            tracing::warn!(error = %e, "Failed to write transcript");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.log");

        let mut transcript = Transcript::open(&path).unwrap();
        transcript.record_command("break foo");
        transcript.record_output(b"Breakpoint 1 at 0x1149: file t.c, line 3.\n(gdb) ");
        drop(transcript);

        let mut transcript = Transcript::open(&path).unwrap();
        transcript.record_command("run");
        drop(transcript);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            ">>> break foo\nBreakpoint 1 at 0x1149: file t.c, line 3.\n(gdb) >>> run\n"
        );
    }
}
