//! Plain-text sink for terminals

use std::io::Write;

use chrono::Local;

use super::format::format_time;
use super::{AgentHeader, RenderInstruction, RenderSink};

/// Sink that writes one line per element to a writer (stdout by default)
pub struct TerminalSink<W: Write> {
    out: W,
}

impl TerminalSink<std::io::Stdout> {
    /// Write to standard output
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    /// Write to an arbitrary writer
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the underlying writer
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write conversation line");
        }
    }
}

/// Format one element as a single terminal line, times in local time
#[must_use]
pub fn format_line(instruction: &RenderInstruction) -> String {
    match instruction {
        RenderInstruction::AgentBubble {
            text,
            timestamp,
            sender,
        } => format!(
            "[{}] {} {}: {text}",
            format_time(&timestamp.with_timezone(&Local)),
            sender.avatar,
            sender.display_name,
        ),
        RenderInstruction::CustomerBubble { text, timestamp } => format!(
            "[{}] You: {text}",
            format_time(&timestamp.with_timezone(&Local))
        ),
        RenderInstruction::SystemNotice { text } => format!("-- {text} --"),
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn render(&mut self, instruction: RenderInstruction) {
        let line = format_line(&instruction);
        self.write_line(&line);
    }

    fn update_header(&mut self, header: &AgentHeader) {
        let line = format!("== Chatting with {} ({}) ==", header.name, header.avatar);
        self.write_line(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_and_header_are_written_as_lines() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.update_header(&AgentHeader::for_agent("Alex Kim"));
        sink.render(RenderInstruction::notice("Agent has ended the session."));

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "== Chatting with Alex Kim (AK) ==\n-- Agent has ended the session. --\n"
        );
    }

    #[test]
    fn customer_line_is_labelled_you() {
        let line = format_line(&RenderInstruction::CustomerBubble {
            text: "hello".to_string(),
            timestamp: chrono::Utc::now(),
        });
        assert!(line.ends_with("] You: hello"));
    }
}
