use std::collections::{HashMap, HashSet};

use crate::api::{PersistedMessage, Role, Run, RunStatus, RunStep};

use super::{PendingMessage, StreamBuffer};

pub const STREAMING_MESSAGE_ID: &str = "streaming";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Persisted,
    Pending,
    Streaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaStatus {
    Success,
    Failed,
    Running,
}

impl From<RunStatus> for MetaStatus {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Running => MetaStatus::Running,
            RunStatus::Failed | RunStatus::Cancelled => MetaStatus::Failed,
            _ => MetaStatus::Success,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageMeta {
    pub status: MetaStatus,
    pub tool_count: usize,
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderMessage {
    pub id: String,
    pub role: RenderRole,
    pub text: String,
    pub run_id: Option<String>,
    pub meta: Option<MessageMeta>,
    pub kind: RenderKind,
    /// Transient "Running tool: ..." line, streaming entry only.
    pub activity: Option<String>,
}

impl RenderMessage {
    /// Only persisted assistant replies with a known run open a trace.
    pub fn trace_run_id(&self) -> Option<&str> {
        match (&self.meta, self.kind) {
            (Some(_), RenderKind::Persisted) => self.run_id.as_deref(),
            _ => None,
        }
    }
}

/// Counts the run's direct `tool` steps. Tools nested under a sub-run belong
/// to that sub-run.
pub fn tool_count(steps: &[RunStep]) -> usize {
    steps
        .iter()
        .filter(|step| step.step_type == "tool")
        .count()
}

pub fn message_meta(run: &Run, steps: Option<&[RunStep]>) -> MessageMeta {
    MessageMeta {
        status: run.status.into(),
        tool_count: steps.map(tool_count).unwrap_or(0),
        latency_ms: run.latency_ms(),
    }
}

/// Distinct run ids referenced by displayable messages, in first-seen order.
pub fn referenced_run_ids(messages: &[PersistedMessage]) -> Vec<String> {
    let mut seen = HashSet::new();
    messages
        .iter()
        .filter_map(PersistedMessage::run_ref)
        .filter(|run_id| seen.insert(*run_id))
        .map(str::to_string)
        .collect()
}

/// Builds the list the chat view renders: persisted history, then the
/// optimistic user message, then the live reply.
pub fn reconcile(
    persisted: &[PersistedMessage],
    runs: &[Run],
    steps_by_run: &HashMap<String, Vec<RunStep>>,
    pending: Option<&PendingMessage>,
    buffer: &StreamBuffer,
) -> Vec<RenderMessage> {
    let runs_by_id: HashMap<&str, &Run> = runs.iter().map(|run| (run.id.as_str(), run)).collect();

    let mut rendered: Vec<RenderMessage> = persisted
        .iter()
        .filter(|message| message.is_displayable())
        .map(|message| {
            let run_id = message.run_ref();
            let meta = run_id.and_then(|run_id| {
                let run = runs_by_id.get(run_id)?;
                Some(message_meta(
                    run,
                    steps_by_run.get(run_id).map(Vec::as_slice),
                ))
            });

            RenderMessage {
                id: message.id.clone(),
                role: match message.role {
                    Role::User => RenderRole::User,
                    _ => RenderRole::Assistant,
                },
                text: message.content.display_text(),
                run_id: run_id.map(str::to_string),
                meta,
                kind: RenderKind::Persisted,
                activity: None,
            }
        })
        .collect();

    if let Some(pending) = pending {
        rendered.push(RenderMessage {
            id: pending.id.clone(),
            role: RenderRole::User,
            text: pending.text.clone(),
            run_id: None,
            meta: None,
            kind: RenderKind::Pending,
            activity: None,
        });
    }

    if buffer.is_visible() {
        rendered.push(RenderMessage {
            id: STREAMING_MESSAGE_ID.to_string(),
            role: RenderRole::Assistant,
            text: buffer.text.clone(),
            run_id: None,
            meta: None,
            kind: RenderKind::Streaming,
            activity: buffer.status.clone(),
        });
    }

    rendered
}
