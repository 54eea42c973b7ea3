//! Prompt-delimited framing of debugger output
//!
//! gdb has no length prefix or terminator of its own: a response is whatever
//! it printed between our command and the next occurrence of the prompt
//! marker. The prompt is not newline-terminated, so output is consumed in raw
//! chunks rather than lines.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

/// Accumulates raw output and splits it at prompt markers
///
/// Bytes are buffered undecoded; a response is turned into text only once
/// it is complete, so a character split across two reads survives intact.
#[derive(Debug)]
pub struct PromptFramer {
    prompt: Vec<u8>,
    buffer: Vec<u8>,
}

impl PromptFramer {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into().into_bytes(),
            buffer: Vec::new(),
        }
    }

    /// Append a chunk of raw output
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Take the next complete response, if a prompt has been seen
    ///
    /// The response excludes the prompt itself; bytes after the prompt stay
    /// buffered for the next call.
    pub fn next_response(&mut self) -> Option<String> {
        let pos = self
            .buffer
            .windows(self.prompt.len())
            .position(|window| window == self.prompt.as_slice())?;
        let response = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
        self.buffer.drain(..pos + self.prompt.len());
        Some(response)
    }

    /// Take everything buffered so far, complete or not
    pub fn drain(&mut self) -> String {
        String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned()
    }
}

/// Forward raw output from the debugger's merged output pipe until EOF
pub async fn pump<R: AsyncRead + Unpin>(mut reader: R, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Debugger output stream closed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_response_split_at_prompt() {
        let mut framer = PromptFramer::new("(gdb) ");
        framer.push(b"Breakpoint 1 at 0x1149: file t.c, line 3.\n(gd");
        assert_eq!(framer.next_response(), None);

        framer.push(b"b) ");
        assert_eq!(
            framer.next_response().as_deref(),
            Some("Breakpoint 1 at 0x1149: file t.c, line 3.\n")
        );
        assert_eq!(framer.next_response(), None);
    }

    #[test]
    fn test_multiple_responses_in_one_chunk() {
        let mut framer = PromptFramer::new("(gdb) ");
        framer.push(b"(gdb) first\n(gdb) second");

        assert_eq!(framer.next_response().as_deref(), Some(""));
        assert_eq!(framer.next_response().as_deref(), Some("first\n"));
        assert_eq!(framer.next_response(), None);
        assert_eq!(framer.drain(), "second");
    }

    #[tokio::test]
    async fn test_pump_forwards_until_eof() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        pump(Cursor::new(b"hello (gdb) ".to_vec()), tx).await;

        let mut collected = Vec::new();
        while let Some(chunk) = rx.recv().await {
            collected.extend(chunk);
        }
        assert_eq!(collected, b"hello (gdb) ");
    }

    #[test]
    fn test_character_split_across_chunks() {
        let mut framer = PromptFramer::new("(gdb) ");
        let text = "$1 = \"caf\u{e9}\"\n(gdb) ".as_bytes();
        let split = text.iter().position(|&b| b == 0xc3).unwrap() + 1;

        framer.push(&text[..split]);
        assert_eq!(framer.next_response(), None);
        framer.push(&text[split..]);
        assert_eq!(framer.next_response().as_deref(), Some("$1 = \"caf\u{e9}\"\n"));
    }
}
