//! In-process transport driven by a JSON script
//!
//! Serves a fixed history, conversation details and transcript, records what
//! the session sends, and lets the caller push live events through whichever
//! hooks the session registered. Operations listed in `fail` reject.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::{ConversationDetails, FileAttachment, Transport, TransportEvent, UNSUPPORTED_PLATFORM};
use crate::config::ConnectionConfig;
use crate::{Error, Result};

/// Scripted conversation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Script {
    /// Records returned by the history fetch
    pub history: Vec<serde_json::Value>,

    /// Conversation metadata
    pub details: ConversationDetails,

    /// Transcript text; absent means the call rejects
    pub transcript: Option<String>,

    /// Whether the voice/video sub-client is available
    pub voice_video: bool,

    /// Operation names that reject (e.g. `send_message`)
    pub fail: Vec<String>,

    /// Ordered live events and user actions
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Load a script from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// One step of a scripted conversation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ScriptStep {
    /// Live inbound message
    Message { payload: serde_json::Value },
    /// Agent typing indicator
    Typing {
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// Agent closed the conversation
    AgentEnded,
    /// Agent started a call
    CallAdded,
    /// Call ended
    CallDisconnected,
    /// User typed and sent text
    User { text: String },
    /// User picked a file
    #[serde(rename_all = "camelCase")]
    Upload {
        name: String,
        #[serde(default)]
        mime_type: Option<String>,
        #[serde(default)]
        content: String,
    },
    /// User asked for the transcript
    Transcript,
    /// User pressed the call button
    CallRequest,
    /// User clicked the launcher button
    Toggle,
    /// User clicked the close button
    Close,
    /// User clicked the minimize button
    Minimize,
    /// User clicked the options button
    ToggleDrawer,
    /// User clicked outside the options drawer
    DismissDrawer,
}

#[derive(Debug, Default)]
struct Hooks {
    new_message: Option<mpsc::UnboundedSender<TransportEvent>>,
    typing: Option<mpsc::UnboundedSender<TransportEvent>>,
    agent_end: Option<mpsc::UnboundedSender<TransportEvent>>,
    calls: Option<mpsc::UnboundedSender<TransportEvent>>,
}

#[derive(Debug, Default)]
struct Shared {
    hooks: Hooks,
    sent: Vec<String>,
    uploads: Vec<String>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Transport serving a [`Script`]
pub struct ScriptedTransport {
    script: Script,
    connection: Option<ConnectionConfig>,
    shared: Arc<Mutex<Shared>>,
}

/// Caller-side handle for pushing live events and inspecting outbound traffic
#[derive(Clone)]
pub struct ScriptHandle {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedTransport {
    /// Create a transport for a script (its `steps` are ignored)
    #[must_use]
    pub fn new(script: Script) -> (Self, ScriptHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let transport = Self {
            script,
            connection: None,
            shared: Arc::clone(&shared),
        };
        (transport, ScriptHandle { shared })
    }

    /// Require a complete connection configuration at `initialize`
    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = Some(connection);
        self
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.script.fail.iter().any(|op| op == operation) {
            return Err(Error::transport(operation, "scripted failure"));
        }
        Ok(())
    }
}

impl ScriptHandle {
    /// Push a live event through the matching registered hook
    ///
    /// Returns `false` if no hook is registered for the event or the session
    /// has gone away.
    #[must_use]
    pub fn emit(&self, event: TransportEvent) -> bool {
        let shared = lock(&self.shared);
        let hook = match &event {
            TransportEvent::NewMessage(_) => shared.hooks.new_message.as_ref(),
            TransportEvent::Typing(_) => shared.hooks.typing.as_ref(),
            TransportEvent::AgentEndedSession => shared.hooks.agent_end.as_ref(),
            TransportEvent::CallAdded | TransportEvent::CallDisconnected => {
                shared.hooks.calls.as_ref()
            }
        };

        let Some(hook) = hook else {
            tracing::debug!(?event, "no hook registered for scripted event");
            return false;
        };
        hook.send(event).is_ok()
    }

    /// Drop every registered hook so the session's event queue can close
    pub fn close(&self) {
        lock(&self.shared).hooks = Hooks::default();
    }

    /// Texts the session sent, in order
    #[must_use]
    pub fn sent_messages(&self) -> Vec<String> {
        lock(&self.shared).sent.clone()
    }

    /// Names of files the session uploaded, in order
    #[must_use]
    pub fn uploaded_files(&self) -> Vec<String> {
        lock(&self.shared).uploads.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn initialize(&mut self) -> Result<()> {
        if let Some(connection) = &self.connection {
            connection.validate()?;
        }
        self.check("initialize")
    }

    async fn start_chat(&mut self) -> Result<()> {
        self.check("start_chat")
    }

    async fn get_messages(&self) -> Result<Vec<serde_json::Value>> {
        self.check("get_messages")?;
        Ok(self.script.history.clone())
    }

    async fn get_conversation_details(&self) -> Result<ConversationDetails> {
        self.check("get_conversation_details")?;
        Ok(self.script.details.clone())
    }

    async fn send_message(&self, content: &str) -> Result<()> {
        self.check("send_message")?;
        lock(&self.shared).sent.push(content.to_string());
        Ok(())
    }

    fn on_new_message(&mut self, events: mpsc::UnboundedSender<TransportEvent>) {
        lock(&self.shared).hooks.new_message = Some(events);
    }

    fn on_typing_event(&mut self, events: mpsc::UnboundedSender<TransportEvent>) {
        lock(&self.shared).hooks.typing = Some(events);
    }

    fn on_agent_end_session(&mut self, events: mpsc::UnboundedSender<TransportEvent>) {
        lock(&self.shared).hooks.agent_end = Some(events);
    }

    async fn get_live_chat_transcript(&self) -> Result<String> {
        self.check("get_live_chat_transcript")?;
        self.script
            .transcript
            .clone()
            .ok_or_else(|| Error::transport("get_live_chat_transcript", "no transcript"))
    }

    async fn upload_file_attachment(&self, file: &FileAttachment) -> Result<()> {
        self.check("upload_file_attachment")?;
        lock(&self.shared).uploads.push(file.name.clone());
        Ok(())
    }

    async fn initialize_voice_video(
        &mut self,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<()> {
        if !self.script.voice_video {
            return Err(Error::VoiceVideo(UNSUPPORTED_PLATFORM.to_string()));
        }
        self.check("initialize_voice_video")?;
        lock(&self.shared).hooks.calls = Some(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn script_parses_steps() {
        let script: Script = serde_json::from_value(json!({
            "history": [{ "content": "Hello" }],
            "details": { "agentName": "Alex" },
            "fail": ["send_message"],
            "steps": [
                { "event": "user", "text": "hi" },
                { "event": "message", "payload": { "content": "Hey" } },
                { "event": "typing" },
                { "event": "agentEnded" },
                { "event": "upload", "name": "a.png", "mimeType": "image/png" },
                { "event": "toggleDrawer" },
            ],
        }))
        .unwrap();

        assert_eq!(script.history.len(), 1);
        assert_eq!(script.details.agent_name.as_deref(), Some("Alex"));
        assert_eq!(script.steps.len(), 6);
        assert_eq!(script.steps[5], ScriptStep::ToggleDrawer);
        assert_eq!(script.steps[0], ScriptStep::User { text: "hi".to_string() });
        assert_eq!(script.steps[3], ScriptStep::AgentEnded);
        assert!(matches!(
            &script.steps[4],
            ScriptStep::Upload { mime_type: Some(m), .. } if m == "image/png"
        ));
    }

    #[tokio::test]
    async fn failing_operation_rejects() {
        let script = Script {
            fail: vec!["send_message".to_string()],
            ..Script::default()
        };
        let (transport, handle) = ScriptedTransport::new(script);
        let err = transport.send_message("hi").await.unwrap_err();
        assert!(matches!(err, Error::Transport { operation: "send_message", .. }));
        assert!(handle.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn emit_routes_through_registered_hook() {
        let (mut transport, handle) = ScriptedTransport::new(Script::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        assert!(!handle.emit(TransportEvent::AgentEndedSession));

        transport.on_agent_end_session(tx);
        assert!(handle.emit(TransportEvent::AgentEndedSession));
        assert_eq!(rx.recv().await, Some(TransportEvent::AgentEndedSession));

        handle.close();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn missing_connection_fails_initialize() {
        let (transport, _handle) = ScriptedTransport::new(Script::default());
        let mut transport = transport.with_connection(ConnectionConfig::default());
        assert!(matches!(transport.initialize().await, Err(Error::Config(_))));
    }
}
