//! Inbound message classification
//!
//! Maps one raw record to a render instruction or a suppression. The transport
//! delivers two payload shapes: one carries a `messageType` discriminator, the
//! other does not and must be checked for the local user's own echoed
//! messages instead. Both are supported; neither is treated as canonical.
//!
//! Decision order (first match wins):
//!
//! 1. No body under any alternate field name → suppressed
//! 2. `messageType` present: `UserMessage`/`Message` → agent bubble,
//!    `SystemMessage` → system notice, anything else → suppressed
//! 3. `messageType` absent and a customer marker present → suppressed
//! 4. Otherwise → agent bubble with sender attribution
//!
//! Records tagged as rich/card content degrade to a system notice carrying the
//! raw text wherever step 2 or 4 would produce an agent bubble.

use chrono::{DateTime, Utc};

use super::record::{InboundRecord, MessageType};
use super::sender::attribute;
use crate::render::RenderInstruction;

/// Why a record produced nothing on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressReason {
    /// No displayable body under any field name
    EmptyContent,
    /// The local user's own message, already shown at send time
    CustomerEcho,
    /// A `messageType` the widget does not display
    UnsupportedMessageType(String),
}

impl std::fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "no content"),
            Self::CustomerEcho => write!(f, "customer echo"),
            Self::UnsupportedMessageType(kind) => write!(f, "unsupported message type {kind}"),
        }
    }
}

/// Outcome of classifying one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Append this element
    Render(RenderInstruction),
    /// Show nothing
    Suppressed(SuppressReason),
}

impl Classification {
    /// The render instruction, if any
    #[must_use]
    pub fn into_instruction(self) -> Option<RenderInstruction> {
        match self {
            Self::Render(instruction) => Some(instruction),
            Self::Suppressed(_) => None,
        }
    }

    /// Whether the record was suppressed
    #[must_use]
    pub const fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed(_))
    }
}

/// Stateless record classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier;

impl Classifier {
    /// Create a classifier
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Classify a record, stamping missing timestamps with the current time
    #[must_use]
    pub fn classify(&self, record: &InboundRecord) -> Classification {
        self.classify_at(record, Utc::now())
    }

    /// Classify a record, stamping missing timestamps with `now`
    #[must_use]
    pub fn classify_at(&self, record: &InboundRecord, now: DateTime<Utc>) -> Classification {
        let Some(text) = record.body_text() else {
            return Classification::Suppressed(SuppressReason::EmptyContent);
        };

        match record.message_type() {
            Some(MessageType::User | MessageType::Message) => {}
            Some(MessageType::System) => {
                return Classification::Render(RenderInstruction::notice(text));
            }
            Some(MessageType::Other(kind)) => {
                return Classification::Suppressed(SuppressReason::UnsupportedMessageType(kind));
            }
            None if record.is_customer_echo() => {
                return Classification::Suppressed(SuppressReason::CustomerEcho);
            }
            None => {}
        }

        if record.is_rich_content() {
            return Classification::Render(RenderInstruction::notice(text));
        }

        Classification::Render(RenderInstruction::AgentBubble {
            text: text.to_string(),
            timestamp: record.timestamp_or(now),
            sender: attribute(record),
        })
    }
}
