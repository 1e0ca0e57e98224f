//! Support Widget - message classification and session core for a customer-support chat widget
//!
//! This library provides the core functionality for the widget:
//! - Parsing loosely-typed inbound records from the conversation transport
//! - Sender attribution and the display/suppress decision
//! - Rendering to an append-only conversation sink
//! - The chat session lifecycle that feeds it
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Transport (external)                │
//! │  initialize │ start chat │ history │ send │ hooks   │
//! └────────────────────┬────────────────────────────────┘
//!                      │ TransportEvent (mpsc)
//! ┌────────────────────▼────────────────────────────────┐
//! │                   ChatSession                       │
//! │   Lifecycle  │  Dedup  │  Send/Upload  │  Calls     │
//! └────────────────────┬────────────────────────────────┘
//!                      │ InboundRecord
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Classifier                        │
//! │   Suppress  │  Attribute  │  Notice  │  Bubble      │
//! └────────────────────┬────────────────────────────────┘
//!                      │ RenderInstruction
//! ┌────────────────────▼────────────────────────────────┐
//! │                  RenderSink                         │
//! │   ConversationLog  │  TerminalSink  │  HTML         │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod messages;
pub mod render;
pub mod replay;
pub mod session;
pub mod transport;
pub mod widget;

pub use config::{ConnectionConfig, WidgetConfig};
pub use error::{Error, Result};
pub use messages::{Classification, Classifier, InboundRecord, SenderInfo, SuppressReason};
pub use render::{AgentHeader, ConversationLog, RenderInstruction, RenderSink, TerminalSink};
pub use replay::{ReplayOutcome, replay};
pub use session::{ChatSession, RecordLog, SessionState};
pub use transport::{
    ConversationDetails, FileAttachment, Script, ScriptHandle, ScriptStep, ScriptedTransport,
    Transport, TransportEvent,
};
pub use widget::WidgetState;
