//! Drive a full session from a [`Script`]
//!
//! Starts a [`ChatSession`] over a [`ScriptedTransport`], then walks the
//! script's steps in order: live events go through the transport's hooks and
//! are pumped before the next step, user actions call the session directly,
//! and panel clicks move the [`WidgetState`].

use crate::config::WidgetConfig;
use crate::render::RenderSink;
use crate::session::{ChatSession, SessionState};
use crate::transport::{FileAttachment, Script, ScriptStep, ScriptedTransport, TransportEvent};
use crate::widget::WidgetState;

const FALLBACK_MIME: &str = "application/octet-stream";

/// What a replay left behind
#[derive(Debug)]
pub struct ReplayOutcome<S> {
    /// The sink after every step was rendered
    pub sink: S,

    /// Final session state
    pub state: SessionState,

    /// Texts that reached the transport
    pub sent: Vec<String>,

    /// Files that reached the transport
    pub uploads: Vec<String>,

    /// Last transcript downloaded, if any
    pub transcript: Option<String>,

    /// Panel state after the last click
    pub widget: WidgetState,
}

/// Replay a script into `sink`
///
/// With `connect` set, the transport refuses to initialize unless the
/// configured connection is complete.
pub async fn replay<S: RenderSink>(
    mut script: Script,
    sink: S,
    config: &WidgetConfig,
    connect: bool,
) -> ReplayOutcome<S> {
    let steps = std::mem::take(&mut script.steps);
    let (transport, handle) = ScriptedTransport::new(script);
    let transport = if connect {
        transport.with_connection(config.connection.clone())
    } else {
        transport
    };

    let mut session = ChatSession::new(Some(transport), sink, config);
    session.start().await;
    session.process_pending();

    let mut transcript = None;
    let mut widget = WidgetState::new();
    for step in steps {
        let event = match step {
            ScriptStep::Message { payload } => TransportEvent::NewMessage(payload),
            ScriptStep::Typing { payload } => TransportEvent::Typing(payload),
            ScriptStep::AgentEnded => TransportEvent::AgentEndedSession,
            ScriptStep::CallAdded => TransportEvent::CallAdded,
            ScriptStep::CallDisconnected => TransportEvent::CallDisconnected,
            ScriptStep::User { text } => {
                session.send_message(&text).await;
                continue;
            }
            ScriptStep::Upload {
                name,
                mime_type,
                content,
            } => {
                let mime_type = mime_type.unwrap_or_else(|| FALLBACK_MIME.to_string());
                let file = FileAttachment::from_data(name, mime_type, content.into_bytes());
                session.upload_attachment(&file).await;
                continue;
            }
            ScriptStep::Transcript => {
                if let Some(text) = session.download_transcript().await {
                    transcript = Some(text);
                }
                continue;
            }
            ScriptStep::CallRequest => {
                session.request_voice_video_call();
                continue;
            }
            click @ (ScriptStep::Toggle
            | ScriptStep::Close
            | ScriptStep::Minimize
            | ScriptStep::ToggleDrawer
            | ScriptStep::DismissDrawer) => {
                apply_click(&mut widget, &click);
                continue;
            }
        };

        if !handle.emit(event) {
            tracing::debug!("scripted event dropped, no hook registered");
        }
        session.process_pending();
    }

    handle.close();
    session.run().await;

    ReplayOutcome {
        state: session.state(),
        sent: handle.sent_messages(),
        uploads: handle.uploaded_files(),
        transcript,
        widget,
        sink: session.into_sink(),
    }
}

fn apply_click(widget: &mut WidgetState, click: &ScriptStep) {
    match click {
        ScriptStep::Toggle => widget.toggle(),
        ScriptStep::Close => widget.close(),
        ScriptStep::Minimize => widget.minimize(),
        ScriptStep::ToggleDrawer => widget.toggle_drawer(),
        ScriptStep::DismissDrawer => widget.dismiss_drawer(),
        _ => return,
    }
    tracing::debug!(?widget, "widget state changed");
}
