//! Application theme: a fixed dark palette suited to radiology viewing.

use eframe::egui::{self, Color32, Rounding, Stroke, Visuals};

pub mod colors {
    use eframe::egui::Color32;

    pub const BG_DARK: Color32 = Color32::from_rgb(0x12, 0x16, 0x1d);
    pub const BG_PANEL: Color32 = Color32::from_rgb(0x18, 0x1d, 0x26);
    pub const BG_INPUT: Color32 = Color32::from_rgb(0x22, 0x29, 0x35);
    pub const BG_HOVER: Color32 = Color32::from_rgb(0x2a, 0x33, 0x42);

    pub const BORDER: Color32 = Color32::from_rgb(0x2e, 0x37, 0x46);
    pub const BORDER_LIGHT: Color32 = Color32::from_rgb(0x3d, 0x49, 0x5c);

    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(0xe2, 0xe8, 0xf0);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(0x94, 0xa3, 0xb8);

    pub const ACCENT: Color32 = Color32::from_rgb(0x3b, 0x82, 0xf6);
    pub const SUCCESS: Color32 = Color32::from_rgb(0x22, 0xc5, 0x5e);
    pub const WARNING: Color32 = Color32::from_rgb(0xf5, 0x9e, 0x0b);
    pub const DANGER: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);
}

/// Applies the dark theme once at startup.
pub fn apply(ctx: &egui::Context) {
    ctx.set_visuals(build_visuals());
    configure_spacing(ctx);
}

fn build_visuals() -> Visuals {
    let mut visuals = Visuals::dark();

    visuals.window_fill = colors::BG_PANEL;
    visuals.panel_fill = colors::BG_PANEL;
    visuals.faint_bg_color = colors::BG_DARK;
    visuals.extreme_bg_color = colors::BG_INPUT;

    visuals.widgets.noninteractive.bg_fill = colors::BG_INPUT;
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, colors::TEXT_MUTED);
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, colors::BORDER);
    visuals.widgets.noninteractive.rounding = Rounding::same(4.0);

    visuals.widgets.inactive.bg_fill = colors::BG_INPUT;
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, colors::TEXT_PRIMARY);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, colors::BORDER_LIGHT);
    visuals.widgets.inactive.rounding = Rounding::same(4.0);

    visuals.widgets.hovered.bg_fill = colors::BG_HOVER;
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, colors::TEXT_PRIMARY);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, colors::ACCENT);
    visuals.widgets.hovered.rounding = Rounding::same(4.0);

    visuals.widgets.active.bg_fill = colors::ACCENT;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, colors::ACCENT);
    visuals.widgets.active.rounding = Rounding::same(4.0);

    visuals.widgets.open.bg_fill = colors::BG_INPUT;
    visuals.widgets.open.fg_stroke = Stroke::new(1.0, colors::TEXT_PRIMARY);
    visuals.widgets.open.bg_stroke = Stroke::new(1.0, colors::BORDER_LIGHT);
    visuals.widgets.open.rounding = Rounding::same(4.0);

    visuals.selection.bg_fill = colors::ACCENT.gamma_multiply(0.3);
    visuals.selection.stroke = Stroke::new(1.0, colors::ACCENT);

    visuals
}

fn configure_spacing(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);
    style.spacing.indent = 16.0;
    ctx.set_style(style);
}

/// Filled button for the screen's main action.
pub fn primary_button(text: &str) -> egui::Button<'_> {
    egui::Button::new(egui::RichText::new(text).color(Color32::WHITE))
        .fill(colors::ACCENT)
        .rounding(Rounding::same(4.0))
}

/// Filled button for destructive actions.
pub fn danger_button(text: &str) -> egui::Button<'_> {
    egui::Button::new(egui::RichText::new(text).color(Color32::WHITE))
        .fill(colors::DANGER)
        .rounding(Rounding::same(4.0))
}
