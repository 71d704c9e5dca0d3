mod view_state;


pub use view_state::{TraceTab, TraceViewState};

use crate::api::RunStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Thought,
    Tool,
    Run,
}

impl TraceKind {
    /// Anything the server sends that we don't know is shown as a thought.
    pub fn from_step_type(step_type: &str) -> Self {
        match step_type {
            "tool" => TraceKind::Tool,
            "run" => TraceKind::Run,
            _ => TraceKind::Thought,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TraceKind::Thought => "Thought",
            TraceKind::Tool => "Tool",
            TraceKind::Run => "Run",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStatus {
    Success,
    Failed,
    Running,
}

impl TraceStatus {
    pub fn from_step_status(status: &str) -> Self {
        match status {
            "failed" => TraceStatus::Failed,
            "running" => TraceStatus::Running,
            _ => TraceStatus::Success,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceNode {
    pub id: String,
    pub kind: TraceKind,
    pub name: String,
    pub status: TraceStatus,
    pub duration: String,
    pub input: Option<String>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

pub fn build(steps: &[RunStep]) -> Vec<TraceNode> {
    steps.iter().map(build_node).collect()
}

fn build_node(step: &RunStep) -> TraceNode {
    TraceNode {
        id: step.id.clone(),
        kind: TraceKind::from_step_type(&step.step_type),
        name: step.name.clone(),
        status: TraceStatus::from_step_status(&step.status),
        duration: format_duration(step.latency_ms),
        input: format_payload(step.input_payload.as_ref()),
        output: format_payload(step.output_payload.as_ref()),
        error: step
            .error_message
            .clone()
            .filter(|message| !message.is_empty()),
        children: build(&step.children),
    }
}

pub fn format_duration(latency_ms: i64) -> String {
    format!("{}ms", latency_ms.max(0))
}

/// Pretty JSON, or `None` for a missing or `null` payload.
pub fn format_payload(payload: Option<&serde_json::Value>) -> Option<String> {
    match payload? {
        serde_json::Value::Null => None,
        value => serde_json::to_string_pretty(value).ok(),
    }
}

/// Every node id in the tree, parents before children.
pub fn node_ids(nodes: &[TraceNode]) -> Vec<String> {
    let mut ids = Vec::new();
    collect_ids(nodes, &mut ids);
    ids
}

fn collect_ids(nodes: &[TraceNode], ids: &mut Vec<String>) {
    for node in nodes {
        ids.push(node.id.clone());
        collect_ids(&node.children, ids);
    }
}
