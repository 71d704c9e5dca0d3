use std::collections::HashMap;

use crate::api::{ApiClient, ChatSession, StreamHandle, StreamUpdate, spawn_chat_stream};
use crate::chat::{
    ChatState, EventOutcome, MetaStatus, RenderKind, RenderMessage, RenderRole, SendRejected,
    reconcile, referenced_run_ids,
};
use crate::components::button::{ButtonSize, ButtonVariant, StyledButton};
use crate::components::text_input::StyledTextInput;
use crate::live_query::{LiveQueryClient, Loadable, QueryKey};
use crate::pages::{PageContext, Route};
use crate::theme::{
    AMBER_400, BG_50, BG_500, BG_700, BG_800, BG_900, BG_950, EMERALD_500, RADIUS_LG, RED_400,
    RED_500, STROKE_WIDTH,
};
use egui::{
    Align, CentralPanel, Frame, Key, Label, Layout, RichText, ScrollArea, Spinner, Stroke,
    TopBottomPanel, Ui,
};
use egui_flex::{Flex, FlexAlign, item};
use egui_inbox::UiInbox;
use egui_phosphor::regular;

use super::sessions::short_id;
use super::trace_drawer::TraceDrawer;

pub struct SessionPage {
    session_id: String,
    chat: ChatState,
    composer: String,
    stream: Option<StreamHandle>,
    stream_updates: UiInbox<StreamUpdate>,
    legacy_results: UiInbox<Result<(), String>>,
    trace_drawer: Option<TraceDrawer>,
    mounted: bool,
}

impl SessionPage {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            chat: ChatState::default(),
            composer: String::new(),
            stream: None,
            stream_updates: UiInbox::new(),
            legacy_results: UiInbox::new(),
            trace_drawer: None,
            mounted: false,
        }
    }

    /// History may have changed while the view was closed, e.g. a reply that
    /// kept streaming server-side after the user left.
    fn mount(&mut self, live_query: &LiveQueryClient) {
        self.mounted = true;
        log::debug!("mounting session {}, refreshing history", self.session_id);
        live_query.invalidate_session(&self.session_id);
        live_query.invalidate_messages(&self.session_id);
        live_query.invalidate_runs();
    }

    pub fn render(&mut self, ctx: &egui::Context, page_ctx: &mut PageContext) {
        let live_query = page_ctx.live_query;
        if !self.mounted {
            self.mount(live_query);
        }
        self.drain_updates(ctx, live_query);
        self.chat
            .on_messages_revision(live_query.messages_revision(&self.session_id));

        TopBottomPanel::top("session_navbar")
            .frame(Frame::new().fill(BG_950).inner_margin(8.0))
            .show(ctx, |ui| {
                self.render_navbar(ui, page_ctx, live_query.session(&self.session_id));
            });

        TopBottomPanel::bottom("session_composer")
            .show_separator_line(false)
            .frame(Frame::new().fill(BG_950).inner_margin(8.0))
            .show(ctx, |ui| self.render_composer(ui, page_ctx));

        if let Some(drawer) = self.trace_drawer.as_mut()
            && !drawer.show(ctx, live_query)
        {
            self.trace_drawer = None;
        }

        CentralPanel::default()
            .frame(
                Frame::central_panel(&ctx.style())
                    .fill(BG_950)
                    .inner_margin(16.0),
            )
            .show(ctx, |ui| self.render_messages(ui, live_query));
    }

    fn drain_updates(&mut self, ctx: &egui::Context, live_query: &LiveQueryClient) {
        let updates: Vec<StreamUpdate> = self.stream_updates.read(ctx).collect();
        for update in updates {
            match update {
                StreamUpdate::Event(event) => match self.chat.apply_event(event) {
                    EventOutcome::Continue => {}
                    EventOutcome::Finished => self.finish_send(live_query),
                    EventOutcome::Failed(_) => {
                        self.stream = None;
                        live_query.invalidate_messages(&self.session_id);
                    }
                },
                StreamUpdate::Closed => self.finish_send(live_query),
                StreamUpdate::Failed(message) => {
                    self.stream = None;
                    self.chat
                        .fail_send(format!("Failed to send message: {message}"));
                }
            }
        }

        let results: Vec<Result<(), String>> = self.legacy_results.read(ctx).collect();
        for result in results {
            match result {
                Ok(()) => self.finish_send(live_query),
                Err(message) => self
                    .chat
                    .fail_send(format!("Failed to send message: {message}")),
            }
        }
    }

    fn finish_send(&mut self, live_query: &LiveQueryClient) {
        self.stream = None;
        self.chat
            .finish_stream(live_query.messages_revision(&self.session_id));
        live_query.invalidate_messages(&self.session_id);
        live_query.invalidate_runs();
    }

    fn send(&mut self, page_ctx: &PageContext) {
        let text = match self.chat.begin_send(&self.composer) {
            Ok(text) => text,
            Err(SendRejected::Empty) => return,
            Err(SendRejected::Busy) => {
                log::debug!("send ignored, a reply is still streaming");
                return;
            }
        };
        self.composer.clear();

        let client = page_ctx.live_query.api().clone();
        if page_ctx.config.streaming {
            self.start_stream(client, text);
        } else {
            self.start_legacy_send(client, text);
        }
    }

    fn start_stream(&mut self, client: ApiClient, text: String) {
        let sender = self.stream_updates.sender();
        self.stream = Some(spawn_chat_stream(
            client,
            self.session_id.clone(),
            text,
            move |update| sender.send(update).is_ok(),
        ));
    }

    fn start_legacy_send(&mut self, client: ApiClient, text: String) {
        let session_id = self.session_id.clone();
        let sender = self.legacy_results.sender();
        tokio::spawn(async move {
            let result = client
                .send_message(&session_id, &text)
                .await
                .map(|_| ())
                .map_err(|err| err.to_string());
            sender.send(result).ok();
        });
    }

    fn render_navbar(&self, ui: &mut Ui, page_ctx: &PageContext, session: Loadable<ChatSession>) {
        ui.horizontal(|ui| {
            let back = ui.add(
                Label::new(RichText::new(format!("{} Sessions", regular::CARET_LEFT)).color(BG_500))
                    .sense(egui::Sense::click()),
            );
            if back.clicked() {
                page_ctx.navigate(Route::Sessions);
            }
            ui.label(RichText::new("/").color(BG_500));

            match session {
                Loadable::Ready(session) => {
                    let title = if session.title.trim().is_empty() {
                        "Chat session".to_string()
                    } else {
                        session.title.clone()
                    };
                    ui.label(RichText::new(title).color(BG_50).strong());
                    if !session.agent_id.is_empty() {
                        let agent = match page_ctx.live_query.agent(&session.agent_id) {
                            Loadable::Ready(agent) if !agent.name.is_empty() => agent.name,
                            _ => format!("{}...", short_id(&session.agent_id)),
                        };
                        ui.label(
                            RichText::new(format!("{} {agent}", regular::ROBOT))
                                .size(12.0)
                                .color(BG_500),
                        );
                    }
                }
                Loadable::Error(error) => {
                    ui.label(RichText::new(error).color(RED_400));
                }
                Loadable::Idle | Loadable::Loading => {
                    ui.add(Spinner::new().size(12.0));
                }
            }

            let history = QueryKey::Messages(self.session_id.clone());
            if page_ctx.live_query.is_refreshing(&history) {
                ui.add(Spinner::new().size(12.0).color(BG_500))
                    .on_hover_text("Refreshing history");
            }
        });
    }

    fn render_messages(&mut self, ui: &mut Ui, live_query: &LiveQueryClient) {
        let persisted = match live_query.messages(&self.session_id) {
            Loadable::Ready(messages) => messages,
            Loadable::Idle | Loadable::Loading => {
                ui.centered_and_justified(|ui| ui.add(Spinner::new().size(24.0).color(EMERALD_500)));
                return;
            }
            Loadable::Error(error) => {
                ui.label(RichText::new(format!("Could not load messages: {error}")).color(RED_400));
                if StyledButton::new("Retry")
                    .size(ButtonSize::Sm)
                    .variant(ButtonVariant::Secondary)
                    .show(ui)
                    .clicked()
                {
                    live_query.invalidate_messages(&self.session_id);
                }
                return;
            }
        };

        let runs = match live_query.runs() {
            Loadable::Ready(runs) => runs,
            Loadable::Error(error) => {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(format!("Run details unavailable: {error}"))
                            .size(12.0)
                            .color(AMBER_400),
                    );
                    if ui.small_button("Retry").clicked() {
                        live_query.invalidate_runs();
                    }
                });
                Vec::new()
            }
            Loadable::Idle | Loadable::Loading => Vec::new(),
        };

        let mut steps_by_run = HashMap::new();
        for run_id in referenced_run_ids(&persisted) {
            if let Loadable::Ready(steps) = live_query.run_trace(&run_id) {
                steps_by_run.insert(run_id, steps);
            }
        }

        let rendered = reconcile(
            &persisted,
            &runs,
            &steps_by_run,
            self.chat.pending(),
            self.chat.buffer(),
        );

        let mut open_trace = None;
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                if rendered.is_empty() {
                    ui.label(RichText::new("Say hello to start the conversation").color(BG_500));
                }
                for message in &rendered {
                    if let Some(run_id) = message_ui(ui, message) {
                        open_trace = Some(run_id);
                    }
                    ui.add_space(12.0);
                }
            });

        if let Some(run_id) = open_trace {
            let already_open = self
                .trace_drawer
                .as_ref()
                .is_some_and(|drawer| drawer.run_id() == run_id);
            if !already_open {
                log::debug!("opening trace for run {run_id}");
                self.trace_drawer = Some(TraceDrawer::new(run_id));
            }
        }
    }

    fn render_composer(&mut self, ui: &mut Ui, page_ctx: &PageContext) {
        if let Some(notice) = self.chat.notice().map(str::to_string) {
            ui.horizontal(|ui| {
                ui.label(RichText::new(notice).color(RED_400));
                if ui.small_button(regular::X).clicked() {
                    self.chat.dismiss_notice();
                }
            });
        }

        let busy = self.chat.is_busy();
        Frame::new()
            .fill(BG_900)
            .stroke(Stroke::new(STROKE_WIDTH, BG_700))
            .corner_radius(RADIUS_LG)
            .inner_margin(8.0)
            .show(ui, |ui| {
                Flex::horizontal()
                    .w_full()
                    .align_items(FlexAlign::End)
                    .show(ui, |flex| {
                        let input = flex.add(
                            item().grow(1.0),
                            StyledTextInput::new(&mut self.composer)
                                .hint_text("Type your message...")
                                .multiline(2),
                        );
                        let submit_by_key = input.has_focus()
                            && input
                                .ctx
                                .input(|i| i.key_pressed(Key::Enter) && !i.modifiers.shift);

                        let send = flex.add(
                            item(),
                            StyledButton::new("")
                                .icon(if busy { regular::SPINNER } else { regular::PAPER_PLANE_RIGHT })
                                .enabled(!busy && !self.composer.trim().is_empty())
                                .id("send_button"),
                        );

                        if send.clicked() || (submit_by_key && !busy) {
                            self.send(page_ctx);
                        }
                    });
            });
    }
}

/// Draws one chat bubble. Returns the run id when its trace was requested.
fn message_ui(ui: &mut Ui, message: &RenderMessage) -> Option<String> {
    let layout = match message.role {
        RenderRole::User => Layout::top_down(Align::Max),
        RenderRole::Assistant => Layout::top_down(Align::Min),
    };

    let mut open_trace = None;
    ui.with_layout(layout, |ui| {
        let max_width = ui.available_width() * 0.75;
        let stroke = match message.kind {
            RenderKind::Pending => Stroke::new(STROKE_WIDTH, BG_500),
            _ => Stroke::new(STROKE_WIDTH, BG_700),
        };

        Frame::new()
            .fill(BG_800)
            .stroke(stroke)
            .corner_radius(RADIUS_LG)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_max_width(max_width);
                ui.with_layout(Layout::top_down(Align::Min), |ui| {
                    if !message.text.is_empty() {
                        ui.add(Label::new(RichText::new(&message.text).color(BG_50)).wrap());
                    }

                    if let Some(activity) = &message.activity {
                        ui.horizontal(|ui| {
                            ui.add(Spinner::new().size(12.0).color(AMBER_400));
                            ui.label(RichText::new(activity).size(12.0).color(AMBER_400));
                        });
                    } else if message.kind == RenderKind::Streaming {
                        ui.add(Spinner::new().size(12.0).color(EMERALD_500));
                    }

                    if let (Some(meta), Some(run_id)) = (&message.meta, message.trace_run_id()) {
                        ui.separator();
                        let (dot_color, status) = match meta.status {
                            MetaStatus::Success => (EMERALD_500, "success"),
                            MetaStatus::Failed => (RED_500, "failed"),
                            MetaStatus::Running => (AMBER_400, "running"),
                        };
                        let mut footer = format!("{} {}", regular::CIRCLE, tools_label(meta.tool_count));
                        if let Some(latency) = meta.latency_ms {
                            footer.push_str(&format!("  ·  {}", format_latency(latency)));
                        }
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(footer).size(12.0).color(dot_color))
                                .on_hover_text(status);
                            if ui
                                .small_button(format!("View trace {}", regular::ARROW_RIGHT))
                                .clicked()
                            {
                                open_trace = Some(run_id.to_string());
                            }
                        });
                    }
                });
            });
    });
    open_trace
}

fn tools_label(tool_count: usize) -> String {
    match tool_count {
        0 => "No tools".to_string(),
        1 => "Used 1 Tool".to_string(),
        n => format!("Used {n} Tools"),
    }
}

fn format_latency(latency_ms: u64) -> String {
    if latency_ms < 1000 {
        format!("{latency_ms}ms")
    } else {
        format!("{:.1}s", latency_ms as f64 / 1000.0)
    }
}
