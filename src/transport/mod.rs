//! Conversation transport abstraction
//!
//! The transport is the external real-time messaging client that connects the
//! widget to a remote conversation. It owns its own wire protocol; this crate
//! only relies on the calls and event hooks declared by [`Transport`].
//!
//! Event hooks are registered with an unbounded `mpsc` sender instead of
//! callbacks, so inbound events reach the session in arrival order on a single
//! queue. Pushing an event never waits on the session.

mod scripted;

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

pub use scripted::{Script, ScriptHandle, ScriptStep, ScriptedTransport};

use crate::{Error, Result};

/// Voice/video failure reason: the platform cannot host calls
pub const UNSUPPORTED_PLATFORM: &str = "UnsupportedPlatform";

/// Voice/video failure reason: calling is switched off for this widget
pub const FEATURE_DISABLED: &str = "FeatureDisabled";

/// Event pushed by the transport through a registered hook
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A new message arrived (loosely-typed payload)
    NewMessage(serde_json::Value),
    /// The agent is typing
    Typing(serde_json::Value),
    /// The agent closed the conversation
    AgentEndedSession,
    /// An agent started a voice/video call
    CallAdded,
    /// The voice/video call ended
    CallDisconnected,
}

/// Conversation metadata used for the header
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationDetails {
    /// Assigned agent's display name
    pub agent_name: Option<String>,

    /// Assigned agent's presence (e.g. `Available`)
    pub agent_presence_status: Option<String>,
}

/// Type of attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Image file (JPEG, PNG, GIF, etc.)
    Image,
    /// Audio file (MP3, WAV, OGG, etc.)
    Audio,
    /// Video file (MP4, MOV, etc.)
    Video,
    /// Generic file
    File,
}

impl AttachmentKind {
    /// Determine attachment kind from MIME type
    #[must_use]
    pub fn from_mime(mime_type: &str) -> Self {
        let lower = mime_type.to_lowercase();
        if lower.starts_with("image/") {
            Self::Image
        } else if lower.starts_with("audio/") {
            Self::Audio
        } else if lower.starts_with("video/") {
            Self::Video
        } else {
            Self::File
        }
    }
}

/// A file the user picked for upload
#[derive(Debug, Clone)]
pub struct FileAttachment {
    /// Type of attachment
    pub kind: AttachmentKind,

    /// Original filename
    pub name: String,

    /// MIME type
    pub mime_type: String,

    /// File contents
    pub data: Vec<u8>,
}

impl FileAttachment {
    /// Create an attachment from in-memory data
    #[must_use]
    pub fn from_data(name: String, mime_type: String, data: Vec<u8>) -> Self {
        Self {
            kind: AttachmentKind::from_mime(&mime_type),
            name,
            mime_type,
            data,
        }
    }

    /// Read an attachment from disk, guessing the MIME type from the extension
    ///
    /// # Errors
    ///
    /// Returns error if the path has no file name or cannot be read
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Attachment(format!("no file name in {}", path.display())))?
            .to_string();
        let data = tokio::fs::read(path).await?;
        let mime_type = mime_from_extension(path).to_string();
        Ok(Self::from_data(name, mime_type, data))
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Client for the external conversation service
///
/// Every call may suspend until the service resolves or rejects it. Rejections
/// surface as `Error::Transport`; the session decides what the user sees.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the transport name
    fn name(&self) -> &'static str;

    /// Connect using the configured organization and widget
    async fn initialize(&mut self) -> Result<()>;

    /// Open a conversation
    async fn start_chat(&mut self) -> Result<()>;

    /// Fetch every prior message in the conversation
    async fn get_messages(&self) -> Result<Vec<serde_json::Value>>;

    /// Fetch conversation metadata
    async fn get_conversation_details(&self) -> Result<ConversationDetails>;

    /// Send the user's text
    async fn send_message(&self, content: &str) -> Result<()>;

    /// Register the new-message hook
    fn on_new_message(&mut self, events: mpsc::UnboundedSender<TransportEvent>);

    /// Register the typing-indicator hook
    fn on_typing_event(&mut self, events: mpsc::UnboundedSender<TransportEvent>);

    /// Register the agent-ended-session hook
    fn on_agent_end_session(&mut self, events: mpsc::UnboundedSender<TransportEvent>);

    /// Download the conversation transcript as text
    ///
    /// Default implementation rejects for transports without transcripts
    async fn get_live_chat_transcript(&self) -> Result<String> {
        Err(Error::transport("get_live_chat_transcript", "not supported"))
    }

    /// Upload a file into the conversation
    ///
    /// Default implementation rejects for transports without attachments
    async fn upload_file_attachment(&self, _file: &FileAttachment) -> Result<()> {
        Err(Error::transport("upload_file_attachment", "not supported"))
    }

    /// Start the voice/video sub-client and register its call hooks
    ///
    /// Default implementation reports the feature as disabled
    async fn initialize_voice_video(
        &mut self,
        _events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<()> {
        Err(Error::VoiceVideo(FEATURE_DISABLED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_kind_from_mime() {
        assert_eq!(AttachmentKind::from_mime("image/PNG"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::from_mime("audio/ogg"), AttachmentKind::Audio);
        assert_eq!(AttachmentKind::from_mime("video/mp4"), AttachmentKind::Video);
        assert_eq!(AttachmentKind::from_mime("application/pdf"), AttachmentKind::File);
    }

    #[test]
    fn mime_guess_uses_extension() {
        assert_eq!(mime_from_extension(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(mime_from_extension(Path::new("notes")), "application/octet-stream");
    }

    #[tokio::test]
    async fn attachment_from_path_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let file = FileAttachment::from_path(&path).await.unwrap();
        assert_eq!(file.name, "receipt.pdf");
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.kind, AttachmentKind::File);
        assert_eq!(file.data, b"%PDF-1.4");
    }

    #[test]
    fn conversation_details_parse_camel_case() {
        let details: ConversationDetails =
            serde_json::from_value(serde_json::json!({ "agentName": "Alex" })).unwrap();
        assert_eq!(details.agent_name.as_deref(), Some("Alex"));
        assert!(details.agent_presence_status.is_none());
    }
}
