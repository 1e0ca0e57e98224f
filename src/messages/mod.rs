//! Inbound message handling: parsing, sender attribution, and classification

mod classifier;
mod dedup;
mod record;
mod sender;

pub use classifier::{Classification, Classifier, SuppressReason};
pub use dedup::RecordDedup;
pub use record::{
    BOT_SENDER_TYPE, CUSTOMER_CHANNEL_TAG, CUSTOMER_ROLE, DELIVERED_TO_AGENT, InboundRecord,
    MessageType, RICH_CONTENT_TAGS, SenderBlock,
};
pub use sender::{BOT_GLYPH, PLACEHOLDER_GLYPH, SenderInfo, attribute, initials};
