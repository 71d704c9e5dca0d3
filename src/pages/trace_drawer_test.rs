use egui_kittest::{Harness, kittest::Queryable};
use serde_json::json;

use crate::api::RunStep;
use crate::trace::{self, TraceNode, TraceViewState};

use super::trace_drawer::trace_panel_ui;

struct DrawerState {
    nodes: Vec<TraceNode>,
    view: TraceViewState,
}

fn drawer_state() -> DrawerState {
    let steps: Vec<RunStep> = serde_json::from_value(json!([
        {"id": "s1", "step_type": "thought", "name": "plan", "latency_ms": 12,
         "output_payload": {"plan": "search first"}},
        {"id": "s2", "step_type": "run", "name": "researcher", "latency_ms": 900, "children": [
            {"id": "s2a", "step_type": "tool", "name": "web_search", "latency_ms": 240,
             "input_payload": {"q": "rust"}},
            {"id": "s2b", "step_type": "tool", "name": "calculator", "latency_ms": 3,
             "input_payload": {"expr": "6*7"}, "output_payload": {"result": 42}}
        ]}
    ]))
    .expect("steps should parse");

    DrawerState {
        nodes: trace::build(&steps),
        view: TraceViewState::default(),
    }
}

fn harness() -> Harness<'static, DrawerState> {
    Harness::new_ui_state(
        |ui, state: &mut DrawerState| trace_panel_ui(ui, &state.nodes, &mut state.view),
        drawer_state(),
    )
}

#[test]
fn nodes_start_collapsed() {
    let harness = harness();

    assert!(harness.query_by_label("plan").is_some());
    assert!(harness.query_by_label("researcher").is_some());
    assert!(harness.query_by_label("web_search").is_none());
}

#[test]
fn clicking_a_node_expands_only_that_node() {
    let mut harness = harness();

    harness.get_by_label("researcher").click();
    harness.run();

    assert!(harness.state().view.is_expanded("s2"));
    assert!(!harness.state().view.is_expanded("s1"));
    assert!(harness.query_by_label("web_search").is_some());
    assert!(harness.query_by_label("calculator").is_some());

    harness.get_by_label("web_search").click();
    harness.run();

    assert!(harness.state().view.is_expanded("s2a"));
    assert!(!harness.state().view.is_expanded("s2b"));
    assert!(harness.state().view.is_expanded("s2"));
}

#[test]
fn expanded_node_shows_input_tab_first() {
    let mut harness = harness();

    harness.get_by_label("researcher").click();
    harness.run();
    harness.get_by_label("web_search").click();
    harness.run();

    assert!(harness.query_by_label_contains("\"q\": \"rust\"").is_some());
    assert!(harness.query_by_label("Input").is_some());
    assert!(harness.query_by_label("Output").is_none());
}

#[test]
fn both_tabs_switch_between_input_and_output() {
    let mut harness = harness();

    harness.get_by_label("researcher").click();
    harness.run();
    harness.get_by_label("calculator").click();
    harness.run();

    assert!(harness.query_by_label_contains("\"expr\": \"6*7\"").is_some());

    harness.get_by_label("Output").click();
    harness.run();

    assert!(harness.query_by_label_contains("\"result\": 42").is_some());
    assert!(harness.query_by_label_contains("\"expr\"").is_none());
}

#[test]
fn output_only_node_shows_no_input_tab() {
    let mut harness = harness();

    harness.get_by_label("plan").click();
    harness.run();

    assert!(harness.query_by_label_contains("search first").is_some());
    assert!(harness.query_by_label("Output").is_some());
    assert!(harness.query_by_label("Input").is_none());
}

#[test]
fn expand_all_and_collapse_all() {
    let mut harness = harness();

    harness.get_by_label_contains("Expand all").click();
    harness.run();

    assert!(harness.state().view.is_expanded("s2b"));
    assert!(harness.query_by_label("calculator").is_some());

    harness.get_by_label_contains("Collapse all").click();
    harness.run();

    assert!(!harness.state().view.is_expanded("s2"));
    assert!(harness.query_by_label("calculator").is_none());
}

#[test]
fn empty_trace_shows_placeholder() {
    let harness = Harness::new_ui_state(
        |ui, state: &mut DrawerState| trace_panel_ui(ui, &state.nodes, &mut state.view),
        DrawerState {
            nodes: Vec::new(),
            view: TraceViewState::default(),
        },
    );

    assert!(
        harness
            .query_by_label("No steps were recorded for this run")
            .is_some()
    );
}
