//! Chat session lifecycle
//!
//! Drives one conversation against a [`Transport`]: initialization, hook
//! registration, chat start, history backfill, header refresh and the
//! voice/video sub-client, then pumps inbound events through the classifier
//! into the render sink.
//!
//! Every transport call is guarded on its own. A failure is logged and ends
//! only that step's continuation; completed steps and the sink are untouched.

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::config::WidgetConfig;
use crate::messages::{Classification, Classifier, InboundRecord, RecordDedup};
use crate::render::{AgentHeader, RenderInstruction, RenderSink};
use crate::transport::{
    FEATURE_DISABLED, FileAttachment, Transport, TransportEvent, UNSUPPORTED_PLATFORM,
};
use crate::Error;

/// Notice shown when the agent closes the conversation
pub const AGENT_ENDED_NOTICE: &str = "Agent has ended the session.";

/// Notice shown when a send is rejected
pub const SEND_FAILED_NOTICE: &str = "Error sending message. Please try again.";

/// Notice shown when the transcript cannot be fetched
pub const TRANSCRIPT_FAILED_NOTICE: &str = "Unable to download transcript. Please try again.";

/// Notice shown when an upload is attempted without a connected transport
pub const UPLOAD_DISCONNECTED_NOTICE: &str = "Cannot upload file - Chat SDK not connected.";

/// Notice shown when an agent starts a call
pub const CALL_ADDED_NOTICE: &str = "Incoming voice/video call from agent...";

/// Notice shown when a call ends
pub const CALL_ENDED_NOTICE: &str = "Voice/video call ended.";

/// Notice shown when the user requests a call
pub const CALL_REQUESTED_NOTICE: &str = "Requesting voice/video call with agent...";

/// Notice shown when calling is not available
pub const CALL_UNAVAILABLE_NOTICE: &str =
    "Voice/Video calling is not available. Please ensure you are connected to an agent.";

/// Lifecycle state of a chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started, or initialization failed
    Uninitialized,
    /// Transport initialized, chat not started
    SdkReady,
    /// Chat started; inbound messages flow
    ChatActive,
    /// The agent ended the conversation
    Terminated,
    /// The transport library is not loaded; the shell stays usable
    Unavailable,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::SdkReady => write!(f, "sdk ready"),
            Self::ChatActive => write!(f, "chat active"),
            Self::Terminated => write!(f, "terminated"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Append-only log of raw inbound payloads, kept for diagnostics only
#[derive(Debug, Default)]
pub struct RecordLog {
    records: Vec<serde_json::Value>,
}

impl RecordLog {
    fn append(&mut self, record: serde_json::Value) {
        self.records.push(record);
    }

    /// Raw payloads in arrival order
    #[must_use]
    pub fn records(&self) -> impl Iterator<Item = &serde_json::Value> {
        self.records.iter()
    }

    /// Number of logged payloads
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was logged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One conversation between the local user and the remote service
pub struct ChatSession<T: Transport, S: RenderSink> {
    transport: Option<T>,
    sink: S,
    classifier: Classifier,
    dedup: Option<RecordDedup>,
    state: SessionState,
    started: bool,
    events_tx: Option<mpsc::UnboundedSender<TransportEvent>>,
    events_rx: mpsc::UnboundedReceiver<TransportEvent>,
    record_log: RecordLog,
    header: Option<AgentHeader>,
    voice_video_ready: bool,
}

impl<T: Transport, S: RenderSink> ChatSession<T, S> {
    /// Create a session; `None` means the transport library failed to load
    #[must_use]
    pub fn new(transport: Option<T>, sink: S, config: &WidgetConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            sink,
            classifier: Classifier::new(),
            dedup: config.dedup_by_id.then(RecordDedup::default),
            state: SessionState::Uninitialized,
            started: false,
            events_tx: Some(events_tx),
            events_rx,
            record_log: RecordLog::default(),
            header: None,
            voice_video_ready: false,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The render sink
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the session, returning the render sink
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Raw inbound payloads seen so far
    #[must_use]
    pub const fn record_log(&self) -> &RecordLog {
        &self.record_log
    }

    /// Header for the assigned agent, once known
    #[must_use]
    pub const fn agent_header(&self) -> Option<&AgentHeader> {
        self.header.as_ref()
    }

    /// Whether the voice/video sub-client came up
    #[must_use]
    pub const fn voice_video_ready(&self) -> bool {
        self.voice_video_ready
    }

    /// Run the start-up sequence once
    ///
    /// Initialize → register hooks → start chat → backfill history → refresh
    /// header, then bring up voice/video. Later calls are no-ops.
    pub async fn start(&mut self) {
        if self.started {
            tracing::debug!(state = %self.state, "session already started");
            return;
        }
        self.started = true;

        if self.transport.is_none() {
            tracing::warn!("chat transport not loaded; widget runs without chat");
            self.state = SessionState::Unavailable;
            self.events_tx = None;
            return;
        }

        if self.initialize().await {
            self.register_hooks();
            if self.start_chat().await {
                self.backfill().await;
                self.refresh_agent_header().await;
            }
            self.init_voice_video().await;
        }

        // The transport now holds the only senders, so the queue closes with it
        self.events_tx = None;
    }

    async fn initialize(&mut self) -> bool {
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };
        match transport.initialize().await {
            Ok(()) => {
                tracing::info!(transport = transport.name(), "chat transport initialized");
                self.state = SessionState::SdkReady;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to initialize chat transport");
                false
            }
        }
    }

    fn register_hooks(&mut self) {
        let (Some(transport), Some(tx)) = (self.transport.as_mut(), self.events_tx.as_ref()) else {
            return;
        };
        transport.on_new_message(tx.clone());
        transport.on_typing_event(tx.clone());
        transport.on_agent_end_session(tx.clone());
    }

    async fn start_chat(&mut self) -> bool {
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };
        match transport.start_chat().await {
            Ok(()) => {
                tracing::info!("chat session started");
                self.state = SessionState::ChatActive;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to start chat");
                false
            }
        }
    }

    async fn backfill(&mut self) {
        let Some(transport) = self.transport.as_ref() else {
            return;
        };
        match transport.get_messages().await {
            Ok(records) => {
                tracing::debug!(count = records.len(), "backfilling conversation history");
                for record in records {
                    self.ingest(record);
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to fetch conversation history"),
        }
    }

    async fn refresh_agent_header(&mut self) {
        let Some(transport) = self.transport.as_ref() else {
            return;
        };
        let details = match transport.get_conversation_details().await {
            Ok(details) => details,
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch conversation details");
                return;
            }
        };

        if let Some(status) = &details.agent_presence_status {
            tracing::debug!(status = %status, "agent presence");
        }

        if let Some(name) = details.agent_name.as_deref().filter(|n| !n.is_empty()) {
            let header = AgentHeader::for_agent(name);
            self.sink.update_header(&header);
            self.header = Some(header);
        }
    }

    async fn init_voice_video(&mut self) {
        let (Some(transport), Some(tx)) = (self.transport.as_mut(), self.events_tx.as_ref()) else {
            return;
        };
        match transport.initialize_voice_video(tx.clone()).await {
            Ok(()) => {
                tracing::info!("voice/video calling initialized");
                self.voice_video_ready = true;
            }
            Err(Error::VoiceVideo(reason)) if reason == UNSUPPORTED_PLATFORM => {
                tracing::info!("voice/video not supported on this platform");
            }
            Err(Error::VoiceVideo(reason)) if reason == FEATURE_DISABLED => {
                tracing::info!("voice/video feature is disabled");
            }
            Err(e) => tracing::info!(error = %e, "voice/video calling not available"),
        }
    }

    /// Log, classify and render one raw inbound payload
    pub fn ingest(&mut self, raw: serde_json::Value) {
        let record = InboundRecord::from_value(&raw);
        self.record_log.append(raw);

        if let (Some(dedup), Some(id)) = (self.dedup.as_mut(), record.id.as_deref()) {
            if dedup.is_duplicate(id) {
                tracing::debug!(id, "skipping duplicate inbound message");
                return;
            }
        }

        match self.classifier.classify(&record) {
            Classification::Render(instruction) => self.sink.render(instruction),
            Classification::Suppressed(reason) => {
                tracing::debug!(%reason, "inbound message not displayed");
            }
        }
    }

    /// React to one event from the transport
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::NewMessage(raw) => self.ingest(raw),
            TransportEvent::Typing(payload) => {
                tracing::debug!(?payload, "agent typing");
            }
            TransportEvent::AgentEndedSession => {
                tracing::info!("agent ended the session");
                self.sink.render(RenderInstruction::notice(AGENT_ENDED_NOTICE));
                if self.state == SessionState::ChatActive {
                    self.state = SessionState::Terminated;
                }
            }
            TransportEvent::CallAdded => {
                tracing::info!("incoming voice/video call");
                self.sink.render(RenderInstruction::notice(CALL_ADDED_NOTICE));
            }
            TransportEvent::CallDisconnected => {
                tracing::info!("voice/video call disconnected");
                self.sink.render(RenderInstruction::notice(CALL_ENDED_NOTICE));
            }
        }
    }

    /// Wait for the next transport event; `None` once every hook is gone
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events_rx.recv().await
    }

    /// Handle every event already queued without waiting
    ///
    /// Returns the number of events handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    handled += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return handled,
            }
        }
    }

    /// Handle events until the transport drops its hooks
    pub async fn run(&mut self) {
        while let Some(event) = self.next_event().await {
            self.handle_event(event);
        }
        tracing::debug!("transport event queue closed");
    }

    fn connected_transport(&self) -> Option<&T> {
        match self.state {
            SessionState::SdkReady | SessionState::ChatActive | SessionState::Terminated => {
                self.transport.as_ref()
            }
            SessionState::Uninitialized | SessionState::Unavailable => None,
        }
    }

    /// Send user input: render it at once, then hand it to the transport
    ///
    /// Blank input is ignored. Without a connected transport only the local
    /// echo happens.
    pub async fn send_message(&mut self, input: &str) {
        let text = input.trim();
        if text.is_empty() {
            return;
        }

        self.sink.render(RenderInstruction::CustomerBubble {
            text: text.to_string(),
            timestamp: Utc::now(),
        });

        let Some(transport) = self.connected_transport() else {
            tracing::debug!(state = %self.state, "no connected transport, message kept local");
            return;
        };

        if let Err(e) = transport.send_message(text).await {
            tracing::error!(error = %e, "failed to send message");
            self.sink.render(RenderInstruction::notice(SEND_FAILED_NOTICE));
        }
    }

    /// Upload a file into the conversation, narrating progress as notices
    pub async fn upload_attachment(&mut self, file: &FileAttachment) {
        self.sink
            .render(RenderInstruction::notice(format!("Uploading file: {}...", file.name)));

        let Some(transport) = self.connected_transport() else {
            self.sink
                .render(RenderInstruction::notice(UPLOAD_DISCONNECTED_NOTICE));
            return;
        };

        match transport.upload_file_attachment(file).await {
            Ok(()) => {
                tracing::info!(file = %file.name, kind = ?file.kind, "attachment uploaded");
                self.sink.render(RenderInstruction::notice(format!(
                    "File \"{}\" uploaded successfully.",
                    file.name
                )));
            }
            Err(e) => {
                tracing::error!(error = %e, file = %file.name, "failed to upload attachment");
                self.sink.render(RenderInstruction::notice(format!(
                    "Failed to upload file: {}",
                    failure_reason(&e)
                )));
            }
        }
    }

    /// Fetch the conversation transcript
    ///
    /// Returns `None` without a connected transport or when the fetch fails;
    /// a failure is also shown as a notice.
    pub async fn download_transcript(&mut self) -> Option<String> {
        let transport = self.connected_transport()?;
        match transport.get_live_chat_transcript().await {
            Ok(transcript) => Some(transcript),
            Err(e) => {
                tracing::error!(error = %e, "failed to download transcript");
                self.sink
                    .render(RenderInstruction::notice(TRANSCRIPT_FAILED_NOTICE));
                None
            }
        }
    }

    /// Handle the user's call button
    ///
    /// Calls are started by the agent; this only announces the request.
    pub fn request_voice_video_call(&mut self) {
        let notice = if self.voice_video_ready {
            CALL_REQUESTED_NOTICE
        } else {
            CALL_UNAVAILABLE_NOTICE
        };
        self.sink.render(RenderInstruction::notice(notice));
    }
}

fn failure_reason(error: &Error) -> String {
    match error {
        Error::Transport { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::render::ConversationLog;
    use crate::transport::{Script, ScriptedTransport};

    fn session(script: Script) -> ChatSession<ScriptedTransport, ConversationLog> {
        let (transport, _handle) = ScriptedTransport::new(script);
        ChatSession::new(Some(transport), ConversationLog::new(), &WidgetConfig::default())
    }

    #[tokio::test]
    async fn start_reaches_chat_active_and_backfills() {
        let mut session = session(Script {
            history: vec![json!({ "content": "Welcome!", "role": "bot" })],
            ..Script::default()
        });
        session.start().await;

        assert_eq!(session.state(), SessionState::ChatActive);
        assert_eq!(session.sink().len(), 1);
        assert_eq!(session.record_log().len(), 1);
    }

    #[tokio::test]
    async fn missing_transport_is_unavailable() {
        let mut session: ChatSession<ScriptedTransport, _> =
            ChatSession::new(None, ConversationLog::new(), &WidgetConfig::default());
        session.start().await;
        assert_eq!(session.state(), SessionState::Unavailable);

        session.send_message("  still echoed  ").await;
        assert_eq!(session.sink().entries()[0].text(), "still echoed");
        assert_eq!(session.sink().len(), 1);
    }

    #[tokio::test]
    async fn initialize_failure_leaves_uninitialized() {
        let mut session = session(Script {
            fail: vec!["initialize".to_string()],
            history: vec![json!({ "content": "never fetched" })],
            ..Script::default()
        });
        session.start().await;

        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(session.sink().is_empty());
        assert!(session.next_event().await.is_none());
    }

    #[tokio::test]
    async fn start_runs_once() {
        let mut session = session(Script {
            history: vec![json!({ "content": "Welcome!" })],
            ..Script::default()
        });
        session.start().await;
        session.start().await;
        assert_eq!(session.sink().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_ids_render_once_when_enabled() {
        let (transport, _handle) = ScriptedTransport::new(Script::default());
        let config = WidgetConfig {
            dedup_by_id: true,
            ..WidgetConfig::default()
        };
        let mut session = ChatSession::new(Some(transport), ConversationLog::new(), &config);
        session.start().await;

        session.ingest(json!({ "id": "m1", "content": "Hello" }));
        session.ingest(json!({ "id": "m1", "content": "Hello" }));
        session.ingest(json!({ "content": "no id" }));
        session.ingest(json!({ "content": "no id" }));

        assert_eq!(session.sink().len(), 3);
        assert_eq!(session.record_log().len(), 4);
        assert_eq!(
            session.record_log().records().next(),
            Some(&json!({ "id": "m1", "content": "Hello" }))
        );
    }

    #[tokio::test]
    async fn duplicates_render_by_default() {
        let mut session = session(Script::default());
        session.start().await;

        session.ingest(json!({ "id": "m1", "content": "Hello" }));
        session.ingest(json!({ "id": "m1", "content": "Hello" }));
        assert_eq!(session.sink().len(), 2);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let mut session = session(Script::default());
        session.start().await;
        session.send_message("   ").await;
        assert!(session.sink().is_empty());
    }

    #[test]
    fn empty_queue_processes_nothing() {
        let mut session = session(Script::default());
        tokio_test::block_on(session.start());
        assert_eq!(session.process_pending(), 0);
        assert_eq!(session.state(), SessionState::ChatActive);
    }

    #[test]
    fn failure_reason_prefers_transport_message() {
        assert_eq!(
            failure_reason(&Error::transport("upload_file_attachment", "too large")),
            "too large"
        );
        assert_eq!(
            failure_reason(&Error::Attachment("bad name".to_string())),
            "attachment error: bad name"
        );
    }
}
