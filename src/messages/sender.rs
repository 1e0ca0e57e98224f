//! Sender attribution for agent and bot messages
//!
//! Bot detection is a best-effort heuristic, not an authoritative signal: any
//! display name containing "bot" (case-insensitive) is treated as a bot, so a
//! human agent named "Abbot" gets the bot glyph.

use super::record::{BOT_SENDER_TYPE, InboundRecord};

/// Avatar glyph shown for automated senders
pub const BOT_GLYPH: &str = "🤖";

/// Avatar glyph shown when a display name yields no initials
pub const PLACEHOLDER_GLYPH: &str = "?";

/// Role value that marks an automated sender
const BOT_ROLE: &str = "bot";

/// Top-level sender type string that marks an automated sender
const BOT_SENDER_TYPE_NAME: &str = "Bot";

/// Who sent an agent-side message and how to draw their avatar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderInfo {
    /// Resolved display name
    pub display_name: String,

    /// Resolved role
    pub role: String,

    /// Whether the sender looks automated
    pub is_bot: bool,

    /// Initials, the bot glyph, or the placeholder; never empty
    pub avatar: String,
}

/// Derive sender attribution from a record; never fails
#[must_use]
pub fn attribute(record: &InboundRecord) -> SenderInfo {
    let display_name = record.display_name().to_string();
    let role = record.resolved_role().to_string();

    let is_bot = role == BOT_ROLE
        || record.sender_type_code() == Some(BOT_SENDER_TYPE)
        || record.sender_type.as_deref() == Some(BOT_SENDER_TYPE_NAME)
        || display_name.to_lowercase().contains(BOT_ROLE);

    let avatar = if is_bot {
        BOT_GLYPH.to_string()
    } else {
        initials(&display_name)
    };

    SenderInfo {
        display_name,
        role,
        is_bot,
        avatar,
    }
}

/// Uppercased first characters of the first two whitespace-separated words
///
/// Returns the placeholder glyph for a blank name.
#[must_use]
pub fn initials(name: &str) -> String {
    let glyph: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();

    if glyph.is_empty() {
        PLACEHOLDER_GLYPH.to_string()
    } else {
        glyph
    }
}
