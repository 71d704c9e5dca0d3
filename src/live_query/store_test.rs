use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::api::{ChatSession, MessageContent, PersistedMessage, Role};

use super::store::{LiveQueryStore, StoreMessage};
use super::{Loadable, QueryKey};

fn session(id: &str) -> ChatSession {
    let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    ChatSession {
        id: id.to_string(),
        title: format!("session {id}"),
        agent_id: "a1".to_string(),
        created_at: at,
        updated_at: at,
    }
}

fn message(id: &str, text: &str) -> PersistedMessage {
    PersistedMessage {
        id: id.to_string(),
        role: Role::User,
        content: MessageContent::text(text),
        run_id: None,
        tool_call_id: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
    }
}

fn messages_loaded(generation: u64, messages: Vec<PersistedMessage>) -> StoreMessage {
    StoreMessage::MessagesLoaded {
        session_id: "s1".to_string(),
        generation,
        messages,
    }
}

#[test]
fn first_read_needs_load_and_loading_does_not() {
    let mut store = LiveQueryStore::default();
    let key = QueryKey::Messages("s1".to_string());

    assert!(store.needs_load(&key));
    store.mark_loading(&key);
    assert!(!store.needs_load(&key));
    assert_eq!(store.message_states.get("s1"), Some(&Loadable::Loading));
}

#[test]
fn loaded_result_is_ready_and_bumps_revision() {
    let mut store = LiveQueryStore::default();
    let key = QueryKey::Messages("s1".to_string());
    store.mark_loading(&key);

    let completed = store.apply(messages_loaded(0, vec![message("m1", "hello")]));

    assert_eq!(completed, vec![key.clone()]);
    assert_eq!(store.revision(&key), 1);
    assert!(!store.needs_load(&key));
    let Some(Loadable::Ready(messages)) = store.message_states.get("s1") else {
        panic!("messages should be ready");
    };
    assert_eq!(messages.len(), 1);
}

#[test]
fn invalidated_ready_data_stays_visible_until_refetched() {
    let mut store = LiveQueryStore::default();
    let key = QueryKey::Messages("s1".to_string());
    store.apply(messages_loaded(0, vec![message("m1", "hello")]));

    store.invalidate(key.clone());

    assert!(store.needs_load(&key));
    assert!(store.is_stale(&key));
    store.mark_loading(&key);
    assert!(matches!(store.message_states.get("s1"), Some(Loadable::Ready(_))));

    store.apply(messages_loaded(
        1,
        vec![message("m1", "hello"), message("m2", "again")],
    ));

    assert!(!store.is_stale(&key));
    assert_eq!(store.revision(&key), 2);
    assert!(matches!(
        store.message_states.get("s1"),
        Some(Loadable::Ready(messages)) if messages.len() == 2
    ));
}

#[test]
fn result_from_before_invalidation_is_dropped() {
    let mut store = LiveQueryStore::default();
    let key = QueryKey::Messages("s1".to_string());
    store.mark_loading(&key);
    store.invalidate(key.clone());

    let completed = store.apply(messages_loaded(0, vec![message("old", "stale")]));

    assert!(completed.is_empty());
    assert_eq!(store.revision(&key), 0);
    assert_eq!(store.message_states.get("s1"), Some(&Loadable::Idle));
}

#[test]
fn failure_is_reported_as_error_not_empty_data() {
    let mut store = LiveQueryStore::default();
    store.mark_loading(&QueryKey::Sessions);

    store.apply(StoreMessage::QueryFailed {
        key: QueryKey::Sessions,
        generation: 0,
        message: "transport error: connection refused".to_string(),
    });

    assert_eq!(
        store.sessions,
        Loadable::Error("transport error: connection refused".to_string())
    );
    assert!(!store.needs_load(&QueryKey::Sessions));

    store.invalidate(QueryKey::Sessions);
    assert!(store.needs_load(&QueryKey::Sessions));
}

#[test]
fn keys_are_tracked_independently() {
    let mut store = LiveQueryStore::default();
    store.apply(StoreMessage::SessionsLoaded {
        generation: 0,
        sessions: vec![session("s1"), session("s2")],
    });
    store.apply(StoreMessage::RunTraceLoaded {
        run_id: "r1".to_string(),
        generation: 0,
        steps: serde_json::from_value(json!([{"id": "st1", "step_type": "tool"}]))
            .expect("steps should parse"),
    });

    store.invalidate(QueryKey::RunTrace("r1".to_string()));

    assert!(!store.needs_load(&QueryKey::Sessions));
    assert!(store.needs_load(&QueryKey::RunTrace("r1".to_string())));
    assert!(store.needs_load(&QueryKey::RunTrace("r2".to_string())));
    assert_eq!(store.revision(&QueryKey::Sessions), 1);
}

#[test]
fn failure_arriving_after_reset_is_ignored() {
    let mut store = LiveQueryStore::default();
    store.mark_loading(&QueryKey::Sessions);
    let started_with = store.generation(&QueryKey::Sessions);

    store.reset();
    let completed = store.apply(StoreMessage::QueryFailed {
        key: QueryKey::Sessions,
        generation: started_with,
        message: "unauthorized".to_string(),
    });

    assert!(completed.is_empty());
    assert_eq!(store.sessions, Loadable::Idle);
    assert!(store.needs_load(&QueryKey::Sessions));
}

#[test]
fn previous_users_data_arriving_after_reset_is_ignored() {
    let mut store = LiveQueryStore::default();
    let key = QueryKey::Messages("s1".to_string());
    store.apply(messages_loaded(0, vec![message("m1", "hello")]));
    store.invalidate(key.clone());
    store.mark_loading(&key);
    let started_with = store.generation(&key);

    store.reset();
    store.apply(messages_loaded(started_with, vec![message("m2", "someone else's")]));

    assert_eq!(store.message_states.get("s1"), None);
    assert!(store.needs_load(&key));
    assert!(store.generation(&key) > started_with);
}

#[test]
fn fetch_started_after_reset_still_lands() {
    let mut store = LiveQueryStore::default();
    store.reset();
    store.mark_loading(&QueryKey::Sessions);
    let generation = store.generation(&QueryKey::Sessions);

    store.apply(StoreMessage::SessionsLoaded {
        generation,
        sessions: vec![session("s1")],
    });

    assert!(matches!(store.sessions, Loadable::Ready(ref sessions) if sessions.len() == 1));
}
