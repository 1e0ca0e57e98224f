//! Render instructions and the append-only conversation sink
//!
//! The classifier and the session produce [`RenderInstruction`]s; a
//! [`RenderSink`] appends them to whatever surface presents the conversation.

pub mod format;
mod terminal;

use chrono::{DateTime, Utc};

pub use terminal::{TerminalSink, format_line};

use crate::messages::{SenderInfo, initials};

/// One visual element to append to the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderInstruction {
    /// Message from a human agent or a bot
    AgentBubble {
        text: String,
        timestamp: DateTime<Utc>,
        sender: SenderInfo,
    },
    /// The local user's own message
    CustomerBubble {
        text: String,
        timestamp: DateTime<Utc>,
    },
    /// Unattributed informational line
    SystemNotice { text: String },
}

impl RenderInstruction {
    /// Build a system notice
    #[must_use]
    pub fn notice(text: impl Into<String>) -> Self {
        Self::SystemNotice { text: text.into() }
    }

    /// Body text regardless of variant
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::AgentBubble { text, .. }
            | Self::CustomerBubble { text, .. }
            | Self::SystemNotice { text } => text,
        }
    }
}

/// Conversation header showing the assigned agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentHeader {
    /// Agent display name
    pub name: String,

    /// Agent initials
    pub avatar: String,
}

impl AgentHeader {
    /// Header for a named agent
    #[must_use]
    pub fn for_agent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            avatar: initials(name),
        }
    }
}

/// Append-only presentation surface
pub trait RenderSink {
    /// Append one element and keep the latest element in view
    fn render(&mut self, instruction: RenderInstruction);

    /// Replace the conversation header
    ///
    /// Default implementation is a no-op for sinks without a header
    fn update_header(&mut self, _header: &AgentHeader) {}
}

/// In-memory sink that keeps every rendered element in order
#[derive(Debug, Default)]
pub struct ConversationLog {
    entries: Vec<RenderInstruction>,
    header: Option<AgentHeader>,
}

impl ConversationLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered elements in arrival order
    #[must_use]
    pub fn entries(&self) -> &[RenderInstruction] {
        &self.entries
    }

    /// Latest header, if one was set
    #[must_use]
    pub const fn header(&self) -> Option<&AgentHeader> {
        self.header.as_ref()
    }

    /// Number of rendered elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been rendered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text of every system notice, in order
    #[must_use]
    pub fn notices(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                RenderInstruction::SystemNotice { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderSink for ConversationLog {
    fn render(&mut self, instruction: RenderInstruction) {
        self.entries.push(instruction);
    }

    fn update_header(&mut self, header: &AgentHeader) {
        self.header = Some(header.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_keeps_arrival_order() {
        let mut log = ConversationLog::new();
        log.render(RenderInstruction::notice("first"));
        log.render(RenderInstruction::CustomerBubble {
            text: "second".to_string(),
            timestamp: Utc::now(),
        });
        log.render(RenderInstruction::notice("third"));

        let texts: Vec<&str> = log.entries().iter().map(RenderInstruction::text).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert_eq!(log.notices(), ["first", "third"]);
    }

    #[test]
    fn header_uses_agent_initials() {
        let mut log = ConversationLog::new();
        log.update_header(&AgentHeader::for_agent("Jane Doe"));
        assert_eq!(
            log.header(),
            Some(&AgentHeader {
                name: "Jane Doe".to_string(),
                avatar: "JD".to_string(),
            })
        );
    }
}
