use crate::theme::{BG_50, BG_700, BG_800, EMERALD_500, RADIUS_MD, STROKE_WIDTH};
use egui::{Frame, Margin, Response, Stroke, TextEdit, Ui, Widget};
use egui_flex::{FlexInstance, FlexItem, FlexWidget};

#[derive(Default, Clone, Copy)]
pub enum TextInputSize {
    Sm,
    #[default]
    Md,
}

impl TextInputSize {
    fn margin(self) -> Margin {
        match self {
            TextInputSize::Sm => Margin::symmetric(6, 5),
            TextInputSize::Md => Margin::symmetric(10, 8),
        }
    }
}

/// Framed single-line input. `multiline` turns it into the chat composer.
pub struct StyledTextInput<'a> {
    text: &'a mut String,
    hint_text: String,
    desired_width: f32,
    size: TextInputSize,
    password: bool,
    rows: Option<usize>,
}

impl<'a> StyledTextInput<'a> {
    pub fn new(text: &'a mut String) -> Self {
        Self {
            text,
            hint_text: String::new(),
            desired_width: f32::INFINITY,
            size: TextInputSize::default(),
            password: false,
            rows: None,
        }
    }

    pub fn hint_text(mut self, hint: impl Into<String>) -> Self {
        self.hint_text = hint.into();
        self
    }

    pub fn desired_width(mut self, width: f32) -> Self {
        self.desired_width = width;
        self
    }

    pub fn size(mut self, size: TextInputSize) -> Self {
        self.size = size;
        self
    }

    pub fn password(mut self, password: bool) -> Self {
        self.password = password;
        self
    }

    pub fn multiline(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn show(self, ui: &mut Ui) -> Response {
        let margin = self.size.margin();

        let inner_response = Frame::new()
            .fill(BG_800)
            .inner_margin(margin)
            .corner_radius(RADIUS_MD)
            .stroke(Stroke::new(STROKE_WIDTH, BG_700))
            .show(ui, |ui| {
                let edit = match self.rows {
                    Some(rows) => TextEdit::multiline(self.text).desired_rows(rows),
                    None => TextEdit::singleline(self.text).password(self.password),
                };
                ui.add(
                    edit.frame(false)
                        .hint_text(self.hint_text)
                        .desired_width(self.desired_width)
                        .text_color(BG_50),
                )
            });

        let response = inner_response.inner;
        if response.has_focus() {
            ui.painter().rect_stroke(
                inner_response.response.rect,
                RADIUS_MD,
                Stroke::new(STROKE_WIDTH, EMERALD_500),
                egui::StrokeKind::Inside,
            );
        }
        response
    }
}

impl<'a> Widget for StyledTextInput<'a> {
    fn ui(self, ui: &mut Ui) -> Response {
        self.show(ui)
    }
}

impl<'a> FlexWidget for StyledTextInput<'a> {
    type Response = Response;

    fn flex_ui(self, item: FlexItem, instance: &mut FlexInstance) -> Self::Response {
        instance.add_widget(item, self).inner
    }
}
