//! Shared test utilities

use serde_json::Value;
use support_widget::{
    ChatSession, ConversationLog, InboundRecord, Script, ScriptHandle, ScriptedTransport,
    WidgetConfig,
};

/// Parse a JSON fixture into a record
#[must_use]
pub fn record(value: &Value) -> InboundRecord {
    InboundRecord::from_value(value)
}

/// Session over a scripted transport, rendering into an in-memory log
#[must_use]
pub fn scripted_session(
    script: Script,
) -> (ChatSession<ScriptedTransport, ConversationLog>, ScriptHandle) {
    let (transport, handle) = ScriptedTransport::new(script);
    let session = ChatSession::new(Some(transport), ConversationLog::new(), &WidgetConfig::default());
    (session, handle)
}

/// Script whose listed operations reject
#[must_use]
pub fn failing(operations: &[&str]) -> Script {
    Script {
        fail: operations.iter().map(ToString::to_string).collect(),
        ..Script::default()
    }
}
