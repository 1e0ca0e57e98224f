//! Inbound message records as delivered by the transport
//!
//! The transport hands over loosely-typed JSON whose shape differs between the
//! history fetch and the live-event callback, and between transport versions.
//! Every field is optional and tolerant of unexpected JSON types; the resolver
//! methods encode the ordered fallback chain for each logical field.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Delivery mode stamped on the local user's own echoed messages
pub const DELIVERED_TO_AGENT: &str = "deliveredToAgent";

/// Role carried by the local user's messages
pub const CUSTOMER_ROLE: &str = "customer";

/// Tag marking a message that originated from the live-chat widget channel
pub const CUSTOMER_CHANNEL_TAG: &str = "ChannelId-lcw";

/// Sender type code used by the transport for bots
pub const BOT_SENDER_TYPE: i64 = 2;

/// Tags that mark rich/card content the widget cannot lay out
pub const RICH_CONTENT_TAGS: &[&str] = &["AdaptiveCard", "HeroCard", "ThumbnailCard"];

/// Display name used when the record carries none
pub const DEFAULT_DISPLAY_NAME: &str = "Support";

/// Role used when the record carries none
pub const UNKNOWN_ROLE: &str = "unknown";

/// Version-specific discriminator carried by newer transport payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    /// `UserMessage`
    User,
    /// `Message`
    Message,
    /// `SystemMessage`
    System,
    /// Anything else; never displayed
    Other(String),
}

impl MessageType {
    fn parse(raw: &str) -> Self {
        match raw {
            "UserMessage" => Self::User,
            "Message" => Self::Message,
            "SystemMessage" => Self::System,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Nested attribution block
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SenderBlock {
    /// Display name of the sender
    #[serde(deserialize_with = "lenient::text")]
    pub display_name: Option<String>,

    /// Role hint (`agent`, `bot`, `customer`, ...)
    #[serde(deserialize_with = "lenient::text")]
    pub role: Option<String>,

    /// Numeric sender type code
    #[serde(rename = "type", deserialize_with = "lenient::integer")]
    pub type_code: Option<i64>,
}

/// A raw inbound message, parsed leniently
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InboundRecord {
    /// Transport message identifier (not present on every version)
    #[serde(deserialize_with = "lenient::text")]
    pub id: Option<String>,

    /// Primary body field
    #[serde(deserialize_with = "lenient::text")]
    pub content: Option<String>,

    /// First alternate body field
    #[serde(deserialize_with = "lenient::text")]
    pub text: Option<String>,

    /// Second alternate body field
    #[serde(deserialize_with = "lenient::text")]
    pub body: Option<String>,

    /// Creation time; RFC 3339 string or epoch milliseconds
    #[serde(deserialize_with = "lenient::timestamp")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Delivery mode, e.g. `deliveredToAgent`
    #[serde(deserialize_with = "lenient::text")]
    pub delivery_mode: Option<String>,

    /// Nested attribution block
    #[serde(deserialize_with = "lenient::sender")]
    pub sender: Option<SenderBlock>,

    /// Top-level alternate display name
    #[serde(deserialize_with = "lenient::text")]
    pub sender_display_name: Option<String>,

    /// Top-level alternate sender type string (`Bot`, `User`, ...)
    #[serde(deserialize_with = "lenient::text")]
    pub sender_type: Option<String>,

    /// Top-level role hint
    #[serde(deserialize_with = "lenient::text")]
    pub role: Option<String>,

    /// Version-specific discriminator
    #[serde(deserialize_with = "lenient::text")]
    pub message_type: Option<String>,

    /// Channel and content markers
    #[serde(deserialize_with = "lenient::tags")]
    pub tags: Vec<String>,
}

impl InboundRecord {
    /// Parse a raw transport payload; never fails
    ///
    /// A payload that is not a JSON object yields an empty record, which the
    /// classifier suppresses for lack of content.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        match Self::deserialize(value) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable inbound payload, treating as empty");
                Self::default()
            }
        }
    }

    /// Resolve the displayable body: `content` → `text` → `body`
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        [&self.content, &self.text, &self.body]
            .into_iter()
            .find_map(|field| non_empty(field.as_deref()))
    }

    /// Creation time, or `now` when the record carries none
    #[must_use]
    pub fn timestamp_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.timestamp.unwrap_or(now)
    }

    /// Version-specific discriminator, if this transport shape carries one
    #[must_use]
    pub fn message_type(&self) -> Option<MessageType> {
        self.message_type.as_deref().map(MessageType::parse)
    }

    /// Resolve the display name: `sender.displayName` → `senderDisplayName` → `"Support"`
    #[must_use]
    pub fn display_name(&self) -> &str {
        non_empty(self.sender.as_ref().and_then(|s| s.display_name.as_deref()))
            .or_else(|| non_empty(self.sender_display_name.as_deref()))
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    /// Resolve the role: `role` → `sender.role` → `"unknown"`
    #[must_use]
    pub fn resolved_role(&self) -> &str {
        non_empty(self.role.as_deref())
            .or_else(|| non_empty(self.sender.as_ref().and_then(|s| s.role.as_deref())))
            .unwrap_or(UNKNOWN_ROLE)
    }

    /// Nested sender type code, if any
    #[must_use]
    pub fn sender_type_code(&self) -> Option<i64> {
        self.sender.as_ref().and_then(|s| s.type_code)
    }

    /// Whether this is the local user's own message echoed back by the transport
    #[must_use]
    pub fn is_customer_echo(&self) -> bool {
        self.delivery_mode.as_deref() == Some(DELIVERED_TO_AGENT)
            || self.sender.as_ref().and_then(|s| s.role.as_deref()) == Some(CUSTOMER_ROLE)
            || self.has_tag(CUSTOMER_CHANNEL_TAG)
    }

    /// Whether the record carries a rich/card content marker
    #[must_use]
    pub fn is_rich_content(&self) -> bool {
        self.tags.iter().any(|tag| {
            RICH_CONTENT_TAGS
                .iter()
                .any(|marker| tag.eq_ignore_ascii_case(marker))
        })
    }

    /// Exact tag membership
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Field deserializers that map unexpected JSON types to "absent"
mod lenient {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::SenderBlock;

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
            _ => None,
        })
    }

    pub fn sender<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SenderBlock>, D::Error> {
        Ok(match Value::deserialize(d)? {
            value @ Value::Object(_) => SenderBlock::deserialize(&value).ok(),
            _ => None,
        })
    }

    pub fn tags<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            Value::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToString::to_string)
                .collect(),
            _ => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn body_falls_back_through_alternate_fields() {
        let record = InboundRecord::from_value(&json!({ "text": "from text" }));
        assert_eq!(record.body_text(), Some("from text"));

        let record = InboundRecord::from_value(&json!({ "content": "", "body": "from body" }));
        assert_eq!(record.body_text(), Some("from body"));

        let record = InboundRecord::from_value(&json!({ "content": "c", "text": "t" }));
        assert_eq!(record.body_text(), Some("c"));
    }

    #[test]
    fn missing_body_resolves_to_none() {
        let record = InboundRecord::from_value(&json!({ "sender": { "displayName": "Alex" } }));
        assert_eq!(record.body_text(), None);
    }

    #[test]
    fn non_object_payload_is_empty_record() {
        let record = InboundRecord::from_value(&json!("just a string"));
        assert!(record.body_text().is_none());
        assert!(record.tags.is_empty());
    }

    #[test]
    fn unexpected_field_types_do_not_poison_the_record() {
        let record = InboundRecord::from_value(&json!({
            "content": "hello",
            "sender": "not an object",
            "tags": 42,
            "timestamp": { "nested": true },
            "role": ["agent"],
        }));
        assert_eq!(record.body_text(), Some("hello"));
        assert!(record.sender.is_none());
        assert!(record.tags.is_empty());
        assert!(record.timestamp.is_none());
        assert_eq!(record.resolved_role(), "unknown");
    }

    #[test]
    fn timestamp_accepts_rfc3339_and_epoch_millis() {
        let record = InboundRecord::from_value(&json!({ "timestamp": "2024-05-01T10:15:00Z" }));
        assert_eq!(
            record.timestamp.map(|t| t.to_rfc3339()),
            Some("2024-05-01T10:15:00+00:00".to_string())
        );

        let record = InboundRecord::from_value(&json!({ "timestamp": 1_714_558_500_000_i64 }));
        assert_eq!(record.timestamp.map(|t| t.timestamp()), Some(1_714_558_500));
    }

    #[test]
    fn display_name_fallback_chain() {
        let nested = InboundRecord::from_value(&json!({
            "sender": { "displayName": "Nested" },
            "senderDisplayName": "TopLevel",
        }));
        assert_eq!(nested.display_name(), "Nested");

        let top = InboundRecord::from_value(&json!({ "senderDisplayName": "TopLevel" }));
        assert_eq!(top.display_name(), "TopLevel");

        let none = InboundRecord::from_value(&json!({}));
        assert_eq!(none.display_name(), "Support");
    }

    #[test]
    fn role_prefers_top_level_over_nested() {
        let record = InboundRecord::from_value(&json!({
            "role": "bot",
            "sender": { "role": "agent" },
        }));
        assert_eq!(record.resolved_role(), "bot");

        let nested = InboundRecord::from_value(&json!({ "sender": { "role": "agent" } }));
        assert_eq!(nested.resolved_role(), "agent");
    }

    #[test]
    fn sender_type_code_accepts_numeric_strings() {
        let record = InboundRecord::from_value(&json!({ "sender": { "type": "2" } }));
        assert_eq!(record.sender_type_code(), Some(BOT_SENDER_TYPE));
    }

    #[test]
    fn customer_echo_markers() {
        let by_mode = InboundRecord::from_value(&json!({ "deliveryMode": "deliveredToAgent" }));
        assert!(by_mode.is_customer_echo());

        let by_role = InboundRecord::from_value(&json!({ "sender": { "role": "customer" } }));
        assert!(by_role.is_customer_echo());

        let by_tag = InboundRecord::from_value(&json!({ "tags": ["public", "ChannelId-lcw"] }));
        assert!(by_tag.is_customer_echo());

        let by_tag_string = InboundRecord::from_value(&json!({ "tags": "public,ChannelId-lcw" }));
        assert!(by_tag_string.is_customer_echo());

        let agent = InboundRecord::from_value(&json!({ "sender": { "role": "agent" } }));
        assert!(!agent.is_customer_echo());
    }

    #[test]
    fn top_level_customer_role_is_not_an_echo_marker() {
        let record = InboundRecord::from_value(&json!({ "role": "customer" }));
        assert!(!record.is_customer_echo());
    }

    #[test]
    fn rich_content_marker_is_case_insensitive() {
        let record = InboundRecord::from_value(&json!({ "tags": ["adaptivecard"] }));
        assert!(record.is_rich_content());
    }

    #[test]
    fn message_type_parsing() {
        let record = InboundRecord::from_value(&json!({ "messageType": "SystemMessage" }));
        assert_eq!(record.message_type(), Some(MessageType::System));

        let record = InboundRecord::from_value(&json!({ "messageType": "Typing" }));
        assert_eq!(
            record.message_type(),
            Some(MessageType::Other("Typing".to_string()))
        );

        let record = InboundRecord::from_value(&json!({}));
        assert_eq!(record.message_type(), None);
    }
}
