use crate::components::button::{ButtonSize, ButtonVariant, StyledButton};
use crate::live_query::{LiveQueryClient, Loadable};
use crate::theme::{
    AMBER_400, BG_50, BG_300, BG_500, BG_700, BG_800, BG_900, EMERALD_400, RADIUS_MD, RED_400,
    STROKE_WIDTH,
};
use crate::trace::{self, TraceKind, TraceNode, TraceStatus, TraceTab, TraceViewState};
use egui::{
    Button, Color32, Frame, Id, Label, RichText, ScrollArea, SidePanel, Spinner, Stroke, Ui,
};
use egui_phosphor::regular;

/// Right-hand drawer showing the execution trace of one run. Its view state
/// lives and dies with the drawer.
pub struct TraceDrawer {
    run_id: String,
    state: TraceViewState,
}

impl TraceDrawer {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            state: TraceViewState::default(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Returns false once the user closed the drawer.
    pub fn show(&mut self, ctx: &egui::Context, live_query: &LiveQueryClient) -> bool {
        let mut open = true;

        SidePanel::right(Id::new("trace_drawer"))
            .resizable(true)
            .default_width(420.0)
            .frame(
                Frame::new()
                    .fill(BG_900)
                    .stroke(Stroke::new(STROKE_WIDTH, BG_700))
                    .inner_margin(12.0),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(format!("{} Execution trace", regular::TREE_STRUCTURE))
                            .color(BG_50)
                            .strong(),
                    );
                    ui.label(RichText::new(&self.run_id).size(11.0).color(BG_500));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if StyledButton::new("")
                            .icon(regular::X)
                            .size(ButtonSize::Xs)
                            .variant(ButtonVariant::Ghost)
                            .show(ui)
                            .on_hover_text("Close")
                            .clicked()
                        {
                            open = false;
                        }
                    });
                });
                ui.separator();

                match live_query.run_trace(&self.run_id) {
                    Loadable::Idle | Loadable::Loading => {
                        ui.add(Spinner::new());
                    }
                    Loadable::Error(error) => {
                        ui.label(RichText::new(error).color(RED_400));
                        if StyledButton::new("Retry")
                            .size(ButtonSize::Sm)
                            .variant(ButtonVariant::Secondary)
                            .show(ui)
                            .clicked()
                        {
                            live_query.invalidate_run_trace(&self.run_id);
                        }
                    }
                    Loadable::Ready(steps) => {
                        let nodes = trace::build(&steps);
                        trace_panel_ui(ui, &nodes, &mut self.state);
                    }
                }
            });

        open
    }
}

/// Toolbar plus the node tree.
pub fn trace_panel_ui(ui: &mut Ui, nodes: &[TraceNode], state: &mut TraceViewState) {
    if nodes.is_empty() {
        ui.label(RichText::new("No steps were recorded for this run").color(BG_500));
        return;
    }

    ui.horizontal(|ui| {
        if StyledButton::new("Expand all")
            .size(ButtonSize::Xs)
            .variant(ButtonVariant::Ghost)
            .icon(regular::ARROWS_OUT_SIMPLE)
            .show(ui)
            .clicked()
        {
            state.expand_all(nodes);
        }
        if StyledButton::new("Collapse all")
            .size(ButtonSize::Xs)
            .variant(ButtonVariant::Ghost)
            .icon(regular::ARROWS_IN_SIMPLE)
            .show(ui)
            .clicked()
        {
            state.collapse_all();
        }
    });
    ui.add_space(4.0);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for node in nodes {
                node_ui(ui, node, state);
            }
        });
}

fn node_ui(ui: &mut Ui, node: &TraceNode, state: &mut TraceViewState) {
    let expanded = state.is_expanded(&node.id);

    ui.push_id(&node.id, |ui| {
        ui.horizontal(|ui| {
            let expandable = node.has_children()
                || node.input.is_some()
                || node.output.is_some()
                || node.error.is_some();
            let caret = if !expandable {
                regular::DOT
            } else if expanded {
                regular::CARET_DOWN
            } else {
                regular::CARET_RIGHT
            };
            ui.add(Label::new(RichText::new(caret).color(BG_500)).selectable(false));
            ui.add(
                Label::new(RichText::new(kind_icon(node.kind)).color(kind_color(node.kind)))
                    .selectable(false),
            )
            .on_hover_text(node.kind.label());

            let name = if node.name.is_empty() {
                node.kind.label()
            } else {
                node.name.as_str()
            };
            if ui
                .add(Button::new(RichText::new(name).color(BG_50)).frame(false))
                .clicked()
            {
                state.toggle(&node.id);
            }

            ui.label(
                RichText::new(status_icon(node.status)).color(status_color(node.status)),
            );
            ui.label(RichText::new(&node.duration).size(11.0).color(BG_500));
        });

        if !expanded {
            return;
        }

        ui.indent(("trace_node_body", &node.id), |ui| {
            if let Some(error) = &node.error {
                ui.label(RichText::new(error).color(RED_400));
            }

            if node.input.is_some() || node.output.is_some() {
                payload_ui(ui, node, state);
            }

            for child in &node.children {
                node_ui(ui, child, state);
            }
        });
    });
}

fn payload_ui(ui: &mut Ui, node: &TraceNode, state: &mut TraceViewState) {
    let active = state.active_tab(node);

    let tabs = [
        (TraceTab::Input, "Input", node.input.as_deref()),
        (TraceTab::Output, "Output", node.output.as_deref()),
    ];

    ui.horizontal(|ui| {
        for (tab, label, payload) in tabs {
            if payload.is_some() && ui.selectable_label(active == tab, label).clicked() {
                state.set_tab(&node.id, tab);
            }
        }
    });

    let Some(payload) = tabs
        .into_iter()
        .find(|(tab, _, _)| *tab == active)
        .and_then(|(_, _, payload)| payload)
    else {
        return;
    };

    Frame::new()
        .fill(BG_800)
        .corner_radius(RADIUS_MD)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(payload).monospace().size(11.0).color(BG_300));
        });

    let copy_label = if state.is_copied(&node.id) {
        "Copied"
    } else {
        "Copy"
    };
    let copy_icon = if state.is_copied(&node.id) {
        regular::CHECK
    } else {
        regular::COPY
    };
    if StyledButton::new(copy_label)
        .icon(copy_icon)
        .size(ButtonSize::Xs)
        .variant(ButtonVariant::Ghost)
        .show(ui)
        .clicked()
    {
        ui.ctx().copy_text(payload.to_string());
        state.mark_copied(&node.id);
    }
}

fn kind_icon(kind: TraceKind) -> &'static str {
    match kind {
        TraceKind::Thought => regular::BRAIN,
        TraceKind::Tool => regular::WRENCH,
        TraceKind::Run => regular::ROBOT,
    }
}

fn kind_color(kind: TraceKind) -> Color32 {
    match kind {
        TraceKind::Thought => BG_300,
        TraceKind::Tool => AMBER_400,
        TraceKind::Run => EMERALD_400,
    }
}

fn status_icon(status: TraceStatus) -> &'static str {
    match status {
        TraceStatus::Success => regular::CHECK_CIRCLE,
        TraceStatus::Failed => regular::X_CIRCLE,
        TraceStatus::Running => regular::CIRCLE_NOTCH,
    }
}

fn status_color(status: TraceStatus) -> Color32 {
    match status {
        TraceStatus::Success => EMERALD_400,
        TraceStatus::Failed => RED_400,
        TraceStatus::Running => AMBER_400,
    }
}
