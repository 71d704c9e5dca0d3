use crate::api::{ChatSession, PersistedMessage};

use super::store::StoreMessage;
use super::{LiveQueryClient, Loadable, QueryKey};

impl LiveQueryClient {
    pub fn sessions(&self) -> Loadable<Vec<ChatSession>> {
        self.load_if_needed(
            QueryKey::Sessions,
            |client| async move { client.list_sessions().await },
            |generation, sessions| StoreMessage::SessionsLoaded {
                generation,
                sessions,
            },
        );

        self.store.borrow().sessions.clone()
    }

    pub fn session(&self, session_id: &str) -> Loadable<ChatSession> {
        let id = session_id.to_string();
        self.load_if_needed(
            QueryKey::Session(id.clone()),
            {
                let id = id.clone();
                move |client| async move { client.get_session(&id).await }
            },
            {
                let id = id.clone();
                move |generation, session| StoreMessage::SessionLoaded {
                    id,
                    generation,
                    session,
                }
            },
        );

        self.store
            .borrow()
            .session_states
            .get(&id)
            .cloned()
            .unwrap_or(Loadable::Idle)
    }

    pub fn messages(&self, session_id: &str) -> Loadable<Vec<PersistedMessage>> {
        let session_id = session_id.to_string();
        self.load_if_needed(
            QueryKey::Messages(session_id.clone()),
            {
                let session_id = session_id.clone();
                move |client| async move { client.list_session_messages(&session_id).await }
            },
            {
                let session_id = session_id.clone();
                move |generation, messages| StoreMessage::MessagesLoaded {
                    session_id,
                    generation,
                    messages,
                }
            },
        );

        self.store
            .borrow()
            .message_states
            .get(&session_id)
            .cloned()
            .unwrap_or(Loadable::Idle)
    }

    pub fn messages_revision(&self, session_id: &str) -> u64 {
        self.revision(&QueryKey::Messages(session_id.to_string()))
    }

    pub fn invalidate_sessions(&self) {
        self.invalidate(QueryKey::Sessions);
    }

    pub fn invalidate_session(&self, session_id: &str) {
        self.invalidate(QueryKey::Session(session_id.to_string()));
    }

    pub fn invalidate_messages(&self, session_id: &str) {
        self.invalidate(QueryKey::Messages(session_id.to_string()));
    }
}
