//! HTML markup for rendered conversation elements

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};

use super::RenderInstruction;

/// Escape text for inclusion in HTML element content
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Two-digit hour and minute in the timestamp's own zone
#[must_use]
pub fn format_time<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    timestamp.format("%H:%M").to_string()
}

impl RenderInstruction {
    /// Bubble markup for a browser conversation view, times in local time
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::AgentBubble {
                text,
                timestamp,
                sender,
            } => {
                let avatar_class = if sender.is_bot {
                    "message-avatar bot-avatar"
                } else {
                    "message-avatar"
                };
                format!(
                    "<div class=\"message agent\"><div class=\"{avatar_class}\">{}</div><div><div class=\"message-bubble\">{}</div><div class=\"message-time\">{}</div></div></div>",
                    escape_html(&sender.avatar),
                    escape_html(text),
                    format_time(&timestamp.with_timezone(&Local)),
                )
            }
            Self::CustomerBubble { text, timestamp } => format!(
                "<div class=\"message customer\"><div class=\"message-avatar customer-avatar\">You</div><div><div class=\"message-bubble\">{}</div><div class=\"message-time\">{}</div></div></div>",
                escape_html(text),
                format_time(&timestamp.with_timezone(&Local)),
            ),
            Self::SystemNotice { text } => {
                format!("<div class=\"system-message\"><p>{}</p></div>", escape_html(text))
            }
        }
    }
}
