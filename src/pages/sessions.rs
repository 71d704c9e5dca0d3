use crate::api::ChatSession;
use crate::components::button::{ButtonSize, ButtonVariant, StyledButton};
use crate::live_query::Loadable;
use crate::pages::{PageAction, PageContext, Route};
use crate::theme::{BG_50, BG_500, BG_700, BG_900, BG_950, RADIUS_MD, RED_400, STROKE_WIDTH};
use egui::{
    CentralPanel, Frame, Label, RichText, ScrollArea, Sense, Spinner, Stroke, TopBottomPanel, Ui,
    vec2,
};
use egui_flex::{Flex, FlexAlign, FlexJustify, item};
use egui_phosphor::regular;

pub struct SessionsPage {}

impl SessionsPage {
    pub fn new() -> Self {
        Self {}
    }

    pub fn render(&mut self, ctx: &egui::Context, page_ctx: &mut PageContext) {
        TopBottomPanel::top("sessions_navbar")
            .frame(Frame::new().fill(BG_950).inner_margin(8.0))
            .show(ctx, |ui| self.render_navbar(ui, page_ctx));

        CentralPanel::default()
            .frame(
                Frame::central_panel(&ctx.style())
                    .fill(BG_950)
                    .inner_margin(16.0),
            )
            .show(ctx, |ui| match page_ctx.live_query.sessions() {
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
                        page_ctx.live_query.invalidate_sessions();
                    }
                }
                Loadable::Ready(sessions) if sessions.is_empty() => {
                    ui.label(RichText::new("No chat sessions yet").color(BG_500));
                }
                Loadable::Ready(sessions) => self.render_list(ui, page_ctx, &sessions),
            });
    }

    fn render_navbar(&self, ui: &mut Ui, page_ctx: &mut PageContext) {
        Flex::horizontal()
            .w_full()
            .justify(FlexJustify::SpaceBetween)
            .align_items(FlexAlign::Center)
            .show(ui, |flex| {
                flex.add(
                    item(),
                    Label::new(RichText::new("Chat sessions").size(16.0).color(BG_50)),
                );
                flex.add_flex(item(), Flex::horizontal().gap(vec2(8.0, 0.0)), |flex| {
                    let refresh = flex.add(
                        item(),
                        StyledButton::new("Refresh")
                            .size(ButtonSize::Sm)
                            .variant(ButtonVariant::Ghost)
                            .icon(regular::ARROWS_CLOCKWISE),
                    );
                    if refresh.clicked() {
                        page_ctx.live_query.invalidate_sessions();
                    }

                    let logout = flex.add(
                        item(),
                        StyledButton::new("Log out")
                            .size(ButtonSize::Sm)
                            .variant(ButtonVariant::Secondary)
                            .icon(regular::SIGN_OUT),
                    );
                    if logout.clicked() {
                        page_ctx.action_sender.send(PageAction::Logout).ok();
                    }
                });
            });
    }

    fn render_list(&self, ui: &mut Ui, page_ctx: &mut PageContext, sessions: &[ChatSession]) {
        ScrollArea::vertical().show(ui, |ui| {
            ui.spacing_mut().item_spacing.y = 8.0;
            for session in sessions {
                let row = Frame::new()
                    .fill(BG_900)
                    .stroke(Stroke::new(STROKE_WIDTH, BG_700))
                    .corner_radius(RADIUS_MD)
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        let title = if session.title.trim().is_empty() {
                            "Untitled session"
                        } else {
                            session.title.as_str()
                        };
                        ui.label(RichText::new(title).color(BG_50).strong());
                        ui.label(
                            RichText::new(format!(
                                "{} {}  ·  updated {}",
                                regular::ROBOT,
                                short_id(&session.agent_id),
                                session.updated_at.format("%Y-%m-%d %H:%M")
                            ))
                            .size(12.0)
                            .color(BG_500),
                        );
                    })
                    .response
                    .interact(Sense::click());

                if row.clicked() {
                    page_ctx.navigate(Route::Session(session.id.clone()));
                }
            }
        });
    }
}

pub(super) fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}
