use std::collections::HashMap;

use super::{TraceNode, node_ids};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceTab {
    Input,
    Output,
}

impl TraceTab {
    pub fn default_for(node: &TraceNode) -> Self {
        if node.input.is_some() {
            TraceTab::Input
        } else {
            TraceTab::Output
        }
    }
}

/// Per-node presentation state of one open trace drawer.
///
/// Keyed flat by node id, so toggling a node never touches its siblings or
/// ancestors. Dropped with the drawer; a reopened drawer starts collapsed.
#[derive(Debug, Clone, Default)]
pub struct TraceViewState {
    expanded: HashMap<String, bool>,
    tabs: HashMap<String, TraceTab>,
    copied: Option<String>,
}

impl TraceViewState {
    pub fn is_expanded(&self, node_id: &str) -> bool {
        self.expanded.get(node_id).copied().unwrap_or(false)
    }

    pub fn toggle(&mut self, node_id: &str) {
        let expanded = self.expanded.entry(node_id.to_string()).or_insert(false);
        *expanded = !*expanded;
    }

    pub fn expand_all(&mut self, nodes: &[TraceNode]) {
        for id in node_ids(nodes) {
            self.expanded.insert(id, true);
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn active_tab(&self, node: &TraceNode) -> TraceTab {
        self.tabs
            .get(&node.id)
            .copied()
            .unwrap_or_else(|| TraceTab::default_for(node))
    }

    pub fn set_tab(&mut self, node_id: &str, tab: TraceTab) {
        self.tabs.insert(node_id.to_string(), tab);
    }

    pub fn mark_copied(&mut self, node_id: &str) {
        self.copied = Some(node_id.to_string());
    }

    pub fn is_copied(&self, node_id: &str) -> bool {
        self.copied.as_deref() == Some(node_id)
    }
}
