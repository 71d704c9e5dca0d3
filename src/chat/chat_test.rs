use crate::api::StreamEvent;

use super::{ChatState, EventOutcome, SendRejected};

fn content(text: &str) -> StreamEvent {
    StreamEvent::Content {
        content: text.to_string(),
    }
}

#[test]
fn begin_send_trims_and_sets_pending() {
    let mut chat = ChatState::default();

    let text = chat.begin_send("  hello  ").expect("send should start");

    assert_eq!(text, "hello");
    assert!(chat.is_busy());
    let pending = chat.pending().expect("pending should be set");
    assert_eq!(pending.text, "hello");
    assert!(pending.id.starts_with("pending-"));
}

#[test]
fn empty_text_is_rejected() {
    let mut chat = ChatState::default();

    assert_eq!(chat.begin_send("   \n"), Err(SendRejected::Empty));
    assert!(!chat.is_busy());
    assert!(chat.pending().is_none());
}

#[test]
fn second_send_while_streaming_is_rejected() {
    let mut chat = ChatState::default();
    chat.begin_send("first").expect("first send should start");
    chat.apply_event(content("partial"));

    assert_eq!(chat.begin_send("second"), Err(SendRejected::Busy));
    assert_eq!(chat.pending().map(|p| p.text.as_str()), Some("first"));
    assert_eq!(chat.buffer().text, "partial");

    chat.finish_stream(0);
    assert!(chat.begin_send("second").is_ok());
}

#[test]
fn content_accumulates_and_status_follows_tools_and_handoffs() {
    let mut chat = ChatState::default();
    chat.begin_send("hi").expect("send should start");

    chat.apply_event(content("Hel"));
    chat.apply_event(content("lo"));
    chat.apply_event(StreamEvent::ToolStart {
        tool: "search".to_string(),
    });
    assert_eq!(chat.buffer().status.as_deref(), Some("Running tool: search"));

    chat.apply_event(StreamEvent::ToolEnd);
    assert_eq!(chat.buffer().status, None);

    chat.apply_event(StreamEvent::Handoff {
        agent_id: "billing".to_string(),
    });
    assert_eq!(
        chat.buffer().status.as_deref(),
        Some("Handing off to agent billing")
    );
    assert_eq!(chat.buffer().text, "Hello");
}

#[test]
fn done_finishes_but_pending_waits_for_fresh_history() {
    let mut chat = ChatState::default();
    chat.begin_send("hi").expect("send should start");
    chat.apply_event(content("hello"));

    assert_eq!(chat.apply_event(StreamEvent::Done), EventOutcome::Finished);
    chat.finish_stream(3);

    assert!(!chat.is_busy());
    assert!(!chat.buffer().is_visible());
    assert!(chat.pending().is_some());

    chat.on_messages_revision(3);
    assert!(chat.pending().is_some());

    chat.on_messages_revision(4);
    assert!(chat.pending().is_none());
}

#[test]
fn error_event_fails_the_send_with_one_notice() {
    let mut chat = ChatState::default();
    chat.begin_send("hi").expect("send should start");
    chat.apply_event(content("partial"));

    let outcome = chat.apply_event(StreamEvent::Error {
        content: "model overloaded".to_string(),
    });

    assert_eq!(outcome, EventOutcome::Failed("model overloaded".to_string()));
    assert!(!chat.is_busy());
    assert!(chat.pending().is_none());
    assert!(!chat.buffer().is_visible());
    assert_eq!(chat.notice(), Some("model overloaded"));
}

#[test]
fn events_after_failure_are_ignored() {
    let mut chat = ChatState::default();
    chat.begin_send("hi").expect("send should start");
    chat.fail_send("connection reset");

    assert_eq!(chat.apply_event(content("late")), EventOutcome::Continue);
    assert!(!chat.buffer().is_visible());
}

#[test]
fn new_send_clears_previous_notice() {
    let mut chat = ChatState::default();
    chat.begin_send("hi").expect("send should start");
    chat.fail_send("boom");

    chat.begin_send("again").expect("send should start");

    assert_eq!(chat.notice(), None);
}
