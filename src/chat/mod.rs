mod reconcile;

#[cfg(test)]
mod chat_test;

pub use reconcile::{
    MessageMeta, MetaStatus, RenderKind, RenderMessage, RenderRole, STREAMING_MESSAGE_ID,
    message_meta, reconcile, referenced_run_ids, tool_count,
};

use crate::api::StreamEvent;
use uuid::Uuid;

/// Optimistic copy of what the user just sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMessage {
    pub id: String,
    pub text: String,
}

impl PendingMessage {
    fn new(text: String) -> Self {
        Self {
            id: format!("pending-{}", Uuid::new_v4()),
            text,
        }
    }
}

/// Assistant output accumulated from the live stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamBuffer {
    pub text: String,
    pub status: Option<String>,
}

impl StreamBuffer {
    pub fn is_visible(&self) -> bool {
        !self.text.is_empty() || self.status.is_some()
    }

    fn clear(&mut self) {
        self.text.clear();
        self.status = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("message is empty")]
    Empty,
    #[error("a reply is still streaming")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Continue,
    /// A `done` arrived; the owner should call `finish_stream` and refresh history.
    Finished,
    /// An `error` arrived; the send has already been failed.
    Failed(String),
}

/// Transient chat state owned by one session view.
///
/// `busy` is held from `begin_send` until the stream finishes or fails, so at
/// most one reply streams at a time. The pending message outlives the stream:
/// it is dropped only once a message list fetched after the stream ended has
/// landed, so the user's turn is never shown twice nor missing.
#[derive(Debug, Default)]
pub struct ChatState {
    pending: Option<PendingMessage>,
    buffer: StreamBuffer,
    busy: bool,
    notice: Option<String>,
    awaiting_revision: Option<u64>,
}

impl ChatState {
    pub fn pending(&self) -> Option<&PendingMessage> {
        self.pending.as_ref()
    }

    pub fn buffer(&self) -> &StreamBuffer {
        &self.buffer
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Returns the trimmed text to send.
    pub fn begin_send(&mut self, text: &str) -> Result<String, SendRejected> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendRejected::Empty);
        }
        if self.busy {
            return Err(SendRejected::Busy);
        }

        self.pending = Some(PendingMessage::new(text.to_string()));
        self.buffer.clear();
        self.busy = true;
        self.notice = None;
        self.awaiting_revision = None;
        Ok(text.to_string())
    }

    pub fn apply_event(&mut self, event: StreamEvent) -> EventOutcome {
        if !self.busy {
            log::debug!("ignoring stream event with no send in progress: {event:?}");
            return EventOutcome::Continue;
        }

        match event {
            StreamEvent::Content { content } => {
                self.buffer.text.push_str(&content);
            }
            StreamEvent::ToolStart { tool } => {
                self.buffer.status = Some(format!("Running tool: {tool}"));
            }
            StreamEvent::ToolEnd => {
                self.buffer.status = None;
            }
            StreamEvent::Handoff { agent_id } => {
                self.buffer.status = Some(format!("Handing off to agent {agent_id}"));
            }
            StreamEvent::Done => return EventOutcome::Finished,
            StreamEvent::Error { content } => {
                let message = if content.trim().is_empty() {
                    "The agent reported an error".to_string()
                } else {
                    content
                };
                self.fail_send(message.clone());
                return EventOutcome::Failed(message);
            }
        }

        EventOutcome::Continue
    }

    /// Ends the stream normally. `revision` is the message-list revision at
    /// this moment; the pending message waits for a newer one.
    pub fn finish_stream(&mut self, revision: u64) {
        self.busy = false;
        self.buffer.clear();
        if self.pending.is_some() {
            self.awaiting_revision = Some(revision);
        }
    }

    pub fn on_messages_revision(&mut self, revision: u64) {
        if let Some(awaiting) = self.awaiting_revision
            && revision > awaiting
        {
            self.pending = None;
            self.awaiting_revision = None;
        }
    }

    pub fn fail_send(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("send failed: {message}");
        self.pending = None;
        self.buffer.clear();
        self.busy = false;
        self.awaiting_revision = None;
        self.notice = Some(message);
    }
}
