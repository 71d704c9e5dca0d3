use crate::api::{Agent, ChatSession, PersistedMessage, Run, RunStep};
use std::collections::{HashMap, HashSet};

use super::{Loadable, QueryKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum KeyStatus {
    Missing,
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone)]
pub(super) struct LiveQueryStore {
    pub(super) sessions: Loadable<Vec<ChatSession>>,
    pub(super) session_states: HashMap<String, Loadable<ChatSession>>,
    pub(super) message_states: HashMap<String, Loadable<Vec<PersistedMessage>>>,
    pub(super) runs: Loadable<Vec<Run>>,
    pub(super) trace_states: HashMap<String, Loadable<Vec<RunStep>>>,
    pub(super) agent_states: HashMap<String, Loadable<Agent>>,
    generations: HashMap<QueryKey, u64>,
    /// Generation of every key without its own entry. Only ever grows.
    epoch: u64,
    revisions: HashMap<QueryKey, u64>,
    stale: HashSet<QueryKey>,
}

impl Default for LiveQueryStore {
    fn default() -> Self {
        Self {
            sessions: Loadable::Idle,
            session_states: HashMap::new(),
            message_states: HashMap::new(),
            runs: Loadable::Idle,
            trace_states: HashMap::new(),
            agent_states: HashMap::new(),
            generations: HashMap::new(),
            epoch: 0,
            revisions: HashMap::new(),
            stale: HashSet::new(),
        }
    }
}

impl LiveQueryStore {
    /// Applies a fetch result. Returns the keys whose fetch is now complete;
    /// results from a fetch started before the last invalidation are dropped.
    pub(super) fn apply(&mut self, message: StoreMessage) -> Vec<QueryKey> {
        let key = message.key();
        if message.generation() != self.generation(&key) {
            log::debug!("dropping superseded result for {key:?}");
            return vec![];
        }

        match message {
            StoreMessage::SessionsLoaded { sessions, .. } => {
                self.sessions = Loadable::Ready(sessions);
            }
            StoreMessage::SessionLoaded { id, session, .. } => {
                self.session_states.insert(id, Loadable::Ready(session));
            }
            StoreMessage::MessagesLoaded {
                session_id,
                messages,
                ..
            } => {
                self.message_states
                    .insert(session_id, Loadable::Ready(messages));
            }
            StoreMessage::RunsLoaded { runs, .. } => {
                self.runs = Loadable::Ready(runs);
            }
            StoreMessage::RunTraceLoaded { run_id, steps, .. } => {
                self.trace_states.insert(run_id, Loadable::Ready(steps));
            }
            StoreMessage::AgentLoaded { id, agent, .. } => {
                self.agent_states.insert(id, Loadable::Ready(agent));
            }
            StoreMessage::QueryFailed { key, message, .. } => {
                log::warn!("query {key:?} failed: {message}");
                self.set_error(&key, message);
                self.stale.remove(&key);
                return vec![key];
            }
        }

        self.stale.remove(&key);
        *self.revisions.entry(key.clone()).or_insert(0) += 1;
        vec![key]
    }

    /// Drops every cached value. Fetches started before the reset carry an
    /// older generation than any key has afterwards, so their results are
    /// ignored when they land.
    pub(super) fn reset(&mut self) {
        let epoch = self.generations.values().copied().fold(self.epoch, u64::max) + 1;
        let revisions = std::mem::take(&mut self.revisions);
        *self = LiveQueryStore {
            epoch,
            revisions,
            ..LiveQueryStore::default()
        };
    }

    /// Marks a key for re-fetch. Ready data stays visible until the new
    /// result lands.
    pub(super) fn invalidate(&mut self, key: QueryKey) {
        let epoch = self.epoch;
        *self.generations.entry(key.clone()).or_insert(epoch) += 1;

        match self.status(&key) {
            KeyStatus::Ready => {
                self.stale.insert(key);
            }
            KeyStatus::Missing => {}
            KeyStatus::Idle | KeyStatus::Loading | KeyStatus::Error => self.set_idle(&key),
        }
    }

    pub(super) fn needs_load(&self, key: &QueryKey) -> bool {
        match self.status(key) {
            KeyStatus::Missing | KeyStatus::Idle => true,
            KeyStatus::Ready => self.stale.contains(key),
            KeyStatus::Loading | KeyStatus::Error => false,
        }
    }

    pub(super) fn mark_loading(&mut self, key: &QueryKey) {
        if self.status(key) == KeyStatus::Ready {
            return;
        }
        match key {
            QueryKey::Sessions => self.sessions = Loadable::Loading,
            QueryKey::Session(id) => {
                self.session_states.insert(id.clone(), Loadable::Loading);
            }
            QueryKey::Messages(session_id) => {
                self.message_states
                    .insert(session_id.clone(), Loadable::Loading);
            }
            QueryKey::Runs => self.runs = Loadable::Loading,
            QueryKey::RunTrace(run_id) => {
                self.trace_states.insert(run_id.clone(), Loadable::Loading);
            }
            QueryKey::Agent(id) => {
                self.agent_states.insert(id.clone(), Loadable::Loading);
            }
        }
    }

    pub(super) fn generation(&self, key: &QueryKey) -> u64 {
        self.generations.get(key).copied().unwrap_or(self.epoch)
    }

    pub(super) fn revision(&self, key: &QueryKey) -> u64 {
        self.revisions.get(key).copied().unwrap_or(0)
    }

    pub(super) fn is_stale(&self, key: &QueryKey) -> bool {
        self.stale.contains(key)
    }

    pub(super) fn status(&self, key: &QueryKey) -> KeyStatus {
        match key {
            QueryKey::Sessions => status_of(Some(&self.sessions)),
            QueryKey::Session(id) => status_of(self.session_states.get(id)),
            QueryKey::Messages(session_id) => status_of(self.message_states.get(session_id)),
            QueryKey::Runs => status_of(Some(&self.runs)),
            QueryKey::RunTrace(run_id) => status_of(self.trace_states.get(run_id)),
            QueryKey::Agent(id) => status_of(self.agent_states.get(id)),
        }
    }

    fn set_idle(&mut self, key: &QueryKey) {
        match key {
            QueryKey::Sessions => self.sessions = Loadable::Idle,
            QueryKey::Session(id) => {
                self.session_states.insert(id.clone(), Loadable::Idle);
            }
            QueryKey::Messages(session_id) => {
                self.message_states.insert(session_id.clone(), Loadable::Idle);
            }
            QueryKey::Runs => self.runs = Loadable::Idle,
            QueryKey::RunTrace(run_id) => {
                self.trace_states.insert(run_id.clone(), Loadable::Idle);
            }
            QueryKey::Agent(id) => {
                self.agent_states.insert(id.clone(), Loadable::Idle);
            }
        }
    }

    fn set_error(&mut self, key: &QueryKey, message: String) {
        match key {
            QueryKey::Sessions => self.sessions = Loadable::Error(message),
            QueryKey::Session(id) => {
                self.session_states
                    .insert(id.clone(), Loadable::Error(message));
            }
            QueryKey::Messages(session_id) => {
                self.message_states
                    .insert(session_id.clone(), Loadable::Error(message));
            }
            QueryKey::Runs => self.runs = Loadable::Error(message),
            QueryKey::RunTrace(run_id) => {
                self.trace_states
                    .insert(run_id.clone(), Loadable::Error(message));
            }
            QueryKey::Agent(id) => {
                self.agent_states
                    .insert(id.clone(), Loadable::Error(message));
            }
        }
    }
}

fn status_of<T>(state: Option<&Loadable<T>>) -> KeyStatus {
    match state {
        None => KeyStatus::Missing,
        Some(Loadable::Idle) => KeyStatus::Idle,
        Some(Loadable::Loading) => KeyStatus::Loading,
        Some(Loadable::Ready(_)) => KeyStatus::Ready,
        Some(Loadable::Error(_)) => KeyStatus::Error,
    }
}

#[derive(Debug, Clone)]
pub(super) enum StoreMessage {
    SessionsLoaded {
        generation: u64,
        sessions: Vec<ChatSession>,
    },
    SessionLoaded {
        id: String,
        generation: u64,
        session: ChatSession,
    },
    MessagesLoaded {
        session_id: String,
        generation: u64,
        messages: Vec<PersistedMessage>,
    },
    RunsLoaded {
        generation: u64,
        runs: Vec<Run>,
    },
    RunTraceLoaded {
        run_id: String,
        generation: u64,
        steps: Vec<RunStep>,
    },
    AgentLoaded {
        id: String,
        generation: u64,
        agent: Agent,
    },
    QueryFailed {
        key: QueryKey,
        generation: u64,
        message: String,
    },
}

impl StoreMessage {
    fn key(&self) -> QueryKey {
        match self {
            StoreMessage::SessionsLoaded { .. } => QueryKey::Sessions,
            StoreMessage::SessionLoaded { id, .. } => QueryKey::Session(id.clone()),
            StoreMessage::MessagesLoaded { session_id, .. } => {
                QueryKey::Messages(session_id.clone())
            }
            StoreMessage::RunsLoaded { .. } => QueryKey::Runs,
            StoreMessage::RunTraceLoaded { run_id, .. } => QueryKey::RunTrace(run_id.clone()),
            StoreMessage::AgentLoaded { id, .. } => QueryKey::Agent(id.clone()),
            StoreMessage::QueryFailed { key, .. } => key.clone(),
        }
    }

    fn generation(&self) -> u64 {
        match self {
            StoreMessage::SessionsLoaded { generation, .. }
            | StoreMessage::SessionLoaded { generation, .. }
            | StoreMessage::MessagesLoaded { generation, .. }
            | StoreMessage::RunsLoaded { generation, .. }
            | StoreMessage::RunTraceLoaded { generation, .. }
            | StoreMessage::AgentLoaded { generation, .. }
            | StoreMessage::QueryFailed { generation, .. } => *generation,
        }
    }
}
