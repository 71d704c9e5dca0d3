use crate::components::button::StyledButton;
use crate::components::text_input::StyledTextInput;
use crate::theme::{BG_50, BG_500, BG_700, BG_900, BG_950, RADIUS_LG, RED_400, STROKE_WIDTH};
use egui::{CentralPanel, Frame, Label, RichText, Stroke, Ui, vec2};
use egui_flex::{Flex, FlexAlign, FlexJustify, item};
use egui_form::garde::{GardeReport, field_path};
use egui_form::{Form, FormField};
use egui_inbox::UiInbox;
use egui_phosphor::regular;
use garde::Validate;

use super::{PageContext, Route};

#[derive(Debug, Default, Validate)]
struct LoginFormFields {
    #[garde(email)]
    email: String,
    #[garde(length(min = 1))]
    password: String,
}

pub struct LoginPage {
    form_fields: LoginFormFields,
    submitting: bool,
    error: Option<String>,
    results: UiInbox<Result<(), String>>,
}

impl LoginPage {
    pub fn new() -> Self {
        Self {
            form_fields: LoginFormFields::default(),
            submitting: false,
            error: None,
            results: UiInbox::new(),
        }
    }

    pub fn render(&mut self, ctx: &egui::Context, page_ctx: &mut PageContext) {
        for result in self.results.read(ctx) {
            self.submitting = false;
            match result {
                Ok(()) => {
                    log::info!("logged in as {}", self.form_fields.email);
                    self.form_fields.password.clear();
                    page_ctx.live_query.clear();
                    page_ctx.navigate(Route::Sessions);
                }
                Err(message) => self.error = Some(message),
            }
        }

        CentralPanel::default()
            .frame(Frame::central_panel(&ctx.style()).fill(BG_950))
            .show(ctx, |ui| {
                Flex::vertical()
                    .w_full()
                    .h_full()
                    .justify(FlexJustify::Center)
                    .align_items(FlexAlign::Center)
                    .show(ui, |flex| {
                        flex.add_ui(item(), |ui| self.render_card(ui, page_ctx));
                    });
            });
    }

    fn render_card(&mut self, ui: &mut Ui, page_ctx: &mut PageContext) {
        Frame::new()
            .fill(BG_900)
            .stroke(Stroke::new(STROKE_WIDTH, BG_700))
            .inner_margin(24.0)
            .corner_radius(RADIUS_LG)
            .show(ui, |ui| {
                ui.set_width(360.0);
                ui.spacing_mut().item_spacing.y = 6.0;

                ui.heading(RichText::new("Sign in").color(BG_50).strong());
                ui.add(Label::new(
                    RichText::new(page_ctx.live_query.api().server_url()).color(BG_500),
                ));
                ui.add_space(16.0);

                let mut form =
                    Form::new().add_report(GardeReport::new(self.form_fields.validate()));

                FormField::new(&mut form, field_path!("email"))
                    .label("Email")
                    .ui(
                        ui,
                        StyledTextInput::new(&mut self.form_fields.email)
                            .hint_text("admin@example.com"),
                    );
                ui.add_space(8.0);
                FormField::new(&mut form, field_path!("password"))
                    .label("Password")
                    .ui(
                        ui,
                        StyledTextInput::new(&mut self.form_fields.password).password(true),
                    );
                ui.add_space(12.0);

                if let Some(error) = &self.error {
                    ui.label(RichText::new(error).color(RED_400));
                    ui.add_space(8.0);
                }

                ui.spacing_mut().item_spacing = vec2(8.0, 8.0);
                let response = StyledButton::new(if self.submitting {
                    "Signing in..."
                } else {
                    "Sign in"
                })
                .icon(regular::SIGN_IN)
                .enabled(!self.submitting)
                .show(ui);

                if let Some(Ok(())) = form.handle_submit(&response, ui) {
                    self.submit(page_ctx);
                }
            });
    }

    fn submit(&mut self, page_ctx: &PageContext) {
        if self.submitting {
            return;
        }
        self.submitting = true;
        self.error = None;

        let client = page_ctx.live_query.api().clone();
        let email = self.form_fields.email.trim().to_string();
        let password = self.form_fields.password.clone();
        let sender = self.results.sender();
        tokio::spawn(async move {
            let result = client
                .login(&email, &password)
                .await
                .map(|_| ())
                .map_err(|err| err.to_string());
            sender.send(result).ok();
        });
    }
}
