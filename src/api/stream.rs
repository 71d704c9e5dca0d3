use eventsource_stream::{EventStreamError, Eventsource};
use futures::{
    Stream, StreamExt,
    future::{AbortHandle, Abortable},
    stream,
};
use reqwest::{Method, header};
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    fmt::Display,
    pin::Pin,
    sync::{Arc, Mutex},
};

use super::{ApiClient, ApiError, SendChatRequest};

/// One frame of the chat stream, `data: {"type": ...}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Content {
        #[serde(default)]
        content: String,
    },
    ToolStart {
        #[serde(default)]
        tool: String,
    },
    ToolEnd,
    Handoff {
        #[serde(default)]
        agent_id: String,
    },
    Error {
        #[serde(default, alias = "error")]
        content: String,
    },
    Done,
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Error { .. } | StreamEvent::Done)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    #[error("stream decode error: {0}")]
    Decode(String),
    #[error("stream transport error: {0}")]
    Transport(String),
}

fn source_error<E: Display>(err: EventStreamError<E>) -> StreamError {
    match err {
        EventStreamError::Utf8(err) => StreamError::Decode(err.to_string()),
        EventStreamError::Parser(err) => StreamError::Decode(err.to_string()),
        EventStreamError::Transport(err) => StreamError::Transport(err.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamPhase {
    Opening,
    Reading,
    Done,
    Failed(String),
    Aborted,
}

impl StreamPhase {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            StreamPhase::Done | StreamPhase::Failed(_) | StreamPhase::Aborted
        )
    }
}

/// What the reader hands to its owner, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    Event(StreamEvent),
    /// The body ended without a terminal event.
    Closed,
    Failed(String),
}

type SourceEvents =
    Pin<Box<dyn Stream<Item = Result<eventsource_stream::Event, StreamError>> + Send>>;

/// Appended after the body so a last `data:` line without a blank-line
/// terminator is still dispatched.
const BODY_TRAILER: &[u8] = b"\n\n";

pub struct ChatStream {
    events: SourceEvents,
    /// Data lines of the current frame not yet handed out.
    lines: VecDeque<String>,
    phase: StreamPhase,
    ended_by_event: bool,
}

impl ChatStream {
    /// Wraps any chunked byte source. UTF-8 sequences and lines split across
    /// chunks are reassembled before parsing. Every `data:` line is one event,
    /// even when the server sends several of them without a blank line between.
    pub fn from_bytes<S, B, E>(bytes: S) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + 'static,
        E: Display + Send + 'static,
    {
        let trailer = stream::iter(std::iter::once(Ok::<_, E>(BODY_TRAILER.to_vec())));
        let events = bytes
            .map(|chunk| chunk.map(|chunk| chunk.as_ref().to_vec()))
            .chain(trailer)
            .eventsource()
            .map(|item| item.map_err(source_error));
        Self {
            events: Box::pin(events),
            lines: VecDeque::new(),
            phase: StreamPhase::Reading,
            ended_by_event: false,
        }
    }

    pub fn phase(&self) -> &StreamPhase {
        &self.phase
    }

    /// Next well-formed event. `None` once the stream is finished; malformed
    /// lines are logged and skipped.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent, StreamError>> {
        loop {
            if self.phase.is_finished() {
                return None;
            }

            let Some(line) = self.lines.pop_front() else {
                match self.events.next().await {
                    None => {
                        self.phase = StreamPhase::Done;
                        return None;
                    }
                    Some(Err(err)) => {
                        self.phase = StreamPhase::Failed(err.to_string());
                        return Some(Err(err));
                    }
                    Some(Ok(frame)) => {
                        self.lines.extend(frame.data.lines().map(str::to_string));
                        continue;
                    }
                }
            };

            match parse_event_data(&line) {
                None => continue,
                Some(Err(err)) => {
                    log::warn!("skipping malformed stream line {line:?}: {err}");
                    continue;
                }
                Some(Ok(event)) => {
                    if event.is_terminal() {
                        self.phase = StreamPhase::Done;
                        self.ended_by_event = true;
                        self.lines.clear();
                    }
                    return Some(Ok(event));
                }
            }
        }
    }
}

/// `None` for an empty payload.
pub fn parse_event_data(data: &str) -> Option<Result<StreamEvent, serde_json::Error>> {
    let data = data.trim();
    if data.is_empty() {
        return None;
    }
    Some(serde_json::from_str(data))
}

/// Reads the stream to its end, handing every update to `sink`. A sink that
/// returns false has gone away; reading stops right there.
pub async fn drive<F>(mut stream: ChatStream, mut sink: F) -> StreamPhase
where
    F: FnMut(StreamUpdate) -> bool,
{
    while let Some(item) = stream.next_event().await {
        let update = match item {
            Ok(event) => StreamUpdate::Event(event),
            Err(err) => StreamUpdate::Failed(err.to_string()),
        };
        if !sink(update) {
            log::debug!("stream receiver dropped, abandoning stream");
            return StreamPhase::Aborted;
        }
    }

    if stream.phase == StreamPhase::Done && !stream.ended_by_event && !sink(StreamUpdate::Closed) {
        return StreamPhase::Aborted;
    }

    stream.phase
}

impl ApiClient {
    pub async fn open_stream(&self, session_id: &str, content: &str) -> Result<ChatStream, ApiError> {
        let request = SendChatRequest {
            content: content.to_string(),
        };
        let response = self
            .request(
                Method::POST,
                &format!("/api/sessions/{session_id}/chat/stream"),
            )
            .header(header::ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match self.unwrap_envelope(status, &body) {
                Err(err) => err,
                Ok(_) => ApiError::Transport(format!("stream request failed with status {status}")),
            });
        }

        Ok(ChatStream::from_bytes(response.bytes_stream()))
    }
}

/// Owner's grip on a running stream task. Dropping it cancels the task and
/// releases the connection.
pub struct StreamHandle {
    abort: AbortHandle,
    phase: Arc<Mutex<StreamPhase>>,
}

impl StreamHandle {
    pub fn phase(&self) -> StreamPhase {
        match self.phase.lock() {
            Ok(phase) => phase.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn abort(&self) {
        self.abort.abort();
        set_phase(&self.phase, StreamPhase::Aborted);
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if !self.phase().is_finished() {
            log::debug!("stream handle dropped while reading, aborting");
        }
        self.abort();
    }
}

fn set_phase(shared: &Mutex<StreamPhase>, next: StreamPhase) {
    let mut phase = match shared.lock() {
        Ok(phase) => phase,
        Err(poisoned) => poisoned.into_inner(),
    };
    if *phase == StreamPhase::Aborted || (phase.is_finished() && next == StreamPhase::Aborted) {
        return;
    }
    *phase = next;
}

/// Opens the chat stream on the runtime and forwards updates to `sink`.
pub fn spawn_chat_stream<F>(
    client: ApiClient,
    session_id: String,
    content: String,
    sink: F,
) -> StreamHandle
where
    F: FnMut(StreamUpdate) -> bool + Send + 'static,
{
    let phase = Arc::new(Mutex::new(StreamPhase::Opening));
    let (abort, registration) = AbortHandle::new_pair();

    let task_phase = Arc::clone(&phase);
    let task = async move {
        let mut sink = sink;
        let stream = match client.open_stream(&session_id, &content).await {
            Ok(stream) => stream,
            Err(err) => {
                log::warn!("failed to open chat stream for session {session_id}: {err}");
                set_phase(&task_phase, StreamPhase::Failed(err.to_string()));
                sink(StreamUpdate::Failed(err.to_string()));
                return;
            }
        };

        set_phase(&task_phase, StreamPhase::Reading);
        let finished = drive(stream, &mut sink).await;
        log::debug!("chat stream for session {session_id} finished: {finished:?}");
        set_phase(&task_phase, finished);
    };

    tokio::spawn(async move {
        if Abortable::new(task, registration).await.is_err() {
            log::debug!("chat stream task aborted");
        }
    });

    StreamHandle { abort, phase }
}
