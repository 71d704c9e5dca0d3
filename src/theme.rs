use egui::{Color32, Context, Visuals};

pub const EMERALD_300: Color32 = Color32::from_rgb(110, 231, 183);
pub const EMERALD_400: Color32 = Color32::from_rgb(52, 211, 153);
pub const EMERALD_500: Color32 = Color32::from_rgb(16, 185, 129);
pub const EMERALD_600: Color32 = Color32::from_rgb(5, 150, 105);

pub const RED_400: Color32 = Color32::from_rgb(248, 113, 113);
pub const RED_500: Color32 = Color32::from_rgb(239, 68, 68);
pub const AMBER_400: Color32 = Color32::from_rgb(251, 191, 36);

pub const BG_50: Color32 = Color32::from_rgb(250, 250, 250);
pub const BG_300: Color32 = Color32::from_rgb(212, 212, 212);
pub const BG_500: Color32 = Color32::from_rgb(115, 115, 115);
pub const BG_700: Color32 = Color32::from_rgb(64, 64, 64);
pub const BG_800: Color32 = Color32::from_rgb(38, 38, 38);
pub const BG_900: Color32 = Color32::from_rgb(23, 23, 23);
pub const BG_950: Color32 = Color32::from_rgb(10, 10, 10);

pub const RADIUS_MD: f32 = 8.0;
pub const RADIUS_LG: f32 = 14.0;
pub const STROKE_WIDTH: f32 = 1.0;

pub fn apply(ctx: &Context) {
    let mut visuals = Visuals::dark();
    visuals.panel_fill = BG_950;
    visuals.window_fill = BG_900;
    visuals.extreme_bg_color = BG_900;
    visuals.selection.bg_fill = EMERALD_600;
    visuals.hyperlink_color = EMERALD_400;
    ctx.set_visuals(visuals);
}
