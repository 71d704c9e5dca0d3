use crate::theme::{
    BG_50, BG_300, BG_500, BG_700, BG_800, EMERALD_300, EMERALD_600, RADIUS_MD, STROKE_WIDTH,
};
use egui::{Button, Color32, Id, Response, RichText, Stroke, StrokeKind, Ui, Vec2, Widget, vec2};
use egui_flex::{FlexInstance, FlexItem, FlexWidget};

#[derive(Default, Clone, Copy)]
pub enum ButtonSize {
    Xs,
    Sm,
    #[default]
    Md,
}

impl ButtonSize {
    fn padding(self) -> Vec2 {
        match self {
            ButtonSize::Xs => vec2(6.0, 3.0),
            ButtonSize::Sm => vec2(12.0, 7.0),
            ButtonSize::Md => vec2(16.0, 10.0),
        }
    }

    fn text_size(self) -> f32 {
        match self {
            ButtonSize::Xs => 11.0,
            ButtonSize::Sm => 13.0,
            ButtonSize::Md => 14.0,
        }
    }
}

#[derive(Default, Clone, Copy)]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    /// No fill until hovered, for toolbar and inline actions.
    Ghost,
}

pub struct StyledButton<'a> {
    text: &'a str,
    icon: Option<&'a str>,
    size: ButtonSize,
    variant: ButtonVariant,
    enabled: bool,
    id: Option<Id>,
}

impl<'a> StyledButton<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            icon: None,
            size: ButtonSize::default(),
            variant: ButtonVariant::default(),
            enabled: true,
            id: None,
        }
    }

    pub fn size(mut self, size: ButtonSize) -> Self {
        self.size = size;
        self
    }

    pub fn variant(mut self, variant: ButtonVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Phosphor glyph drawn before the label.
    pub fn icon(mut self, icon: &'a str) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn id(mut self, id: impl std::hash::Hash) -> Self {
        self.id = Some(Id::new(id));
        self
    }

    pub fn show(self, ui: &mut Ui) -> Response {
        let prev_padding = ui.spacing().button_padding;
        ui.spacing_mut().button_padding = self.size.padding();

        let (fill, stroke, focus_stroke, text_color) = match self.variant {
            ButtonVariant::Primary => (
                EMERALD_600,
                Stroke::NONE,
                Stroke::new(STROKE_WIDTH, EMERALD_300),
                BG_50,
            ),
            ButtonVariant::Secondary => (
                BG_800,
                Stroke::new(STROKE_WIDTH, BG_700),
                Stroke::new(STROKE_WIDTH, BG_50),
                BG_50,
            ),
            ButtonVariant::Ghost => (
                Color32::TRANSPARENT,
                Stroke::NONE,
                Stroke::new(STROKE_WIDTH, BG_700),
                BG_300,
            ),
        };
        let text_color = if self.enabled { text_color } else { BG_500 };

        let label = match self.icon {
            Some(icon) if self.text.is_empty() => icon.to_string(),
            Some(icon) => format!("{icon} {}", self.text),
            None => self.text.to_string(),
        };

        let button = Button::new(
            RichText::new(label)
                .color(text_color)
                .size(self.size.text_size()),
        )
        .fill(fill)
        .stroke(stroke)
        .corner_radius(RADIUS_MD);

        let response = match self.id {
            Some(id) => ui.push_id(id, |ui| ui.add_enabled(self.enabled, button)).inner,
            None => ui.add_enabled(self.enabled, button),
        };

        if response.has_focus() {
            let rect = response.rect;
            ui.painter()
                .rect_stroke(rect, RADIUS_MD, focus_stroke, StrokeKind::Outside);
        }

        ui.spacing_mut().button_padding = prev_padding;

        response
    }
}

impl<'a> Widget for StyledButton<'a> {
    fn ui(self, ui: &mut Ui) -> Response {
        self.show(ui)
    }
}

impl<'a> FlexWidget for StyledButton<'a> {
    type Response = Response;

    fn flex_ui(self, item: FlexItem, instance: &mut FlexInstance) -> Self::Response {
        instance.add_widget(item, self).inner
    }
}
