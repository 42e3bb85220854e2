//! Small shared widgets and formatting helpers used across screens.

use eframe::egui::{self, Align2, Color32, Margin, Rounding, Stroke};

use crate::ui::theme::{self, colors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Success,
    Warning,
    Error,
}

impl BannerKind {
    fn color(self) -> Color32 {
        match self {
            BannerKind::Info => colors::ACCENT,
            BannerKind::Success => colors::SUCCESS,
            BannerKind::Warning => colors::WARNING,
            BannerKind::Error => colors::DANGER,
        }
    }
}

/// Dismissible message strip under the navigation bar. Returns true when the
/// user closes it.
pub fn banner(ui: &mut egui::Ui, kind: BannerKind, text: &str) -> bool {
    let mut dismissed = false;
    let color = kind.color();
    egui::Frame::none()
        .fill(color.gamma_multiply(0.15))
        .stroke(Stroke::new(1.0, color))
        .rounding(Rounding::same(4.0))
        .inner_margin(Margin::same(8.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(color, text);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✕").clicked() {
                        dismissed = true;
                    }
                });
            });
        });
    dismissed
}

/// Centered modal asking to confirm a destructive action.
/// `Some(true)` confirms, `Some(false)` cancels, `None` leaves it open.
pub fn confirm_window(
    ctx: &egui::Context,
    title: &str,
    body: &str,
    confirm_label: &str,
) -> Option<bool> {
    let mut outcome = None;
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.set_max_width(360.0);
            ui.label(body);
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui.button("Cancelar").clicked() {
                    outcome = Some(false);
                }
                if ui.add(theme::danger_button(confirm_label)).clicked() {
                    outcome = Some(true);
                }
            });
        });
    outcome
}

pub fn section_heading(ui: &mut egui::Ui, text: &str) {
    ui.add_space(4.0);
    ui.heading(text);
    ui.separator();
}

pub fn loading_row(ui: &mut egui::Ui, text: &str) {
    ui.horizontal(|ui| {
        ui.add(egui::Spinner::new());
        ui.weak(text);
    });
}

pub fn empty_state(ui: &mut egui::Ui, text: &str) {
    ui.add_space(24.0);
    ui.vertical_centered(|ui| {
        ui.weak(text);
    });
    ui.add_space(24.0);
}

pub fn format_bytes(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let bytes = bytes.max(0) as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{bytes:.0} B")
    }
}

/// First eight characters of a session id, enough to tell series apart in
/// lists and headers.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Renders a backend timestamp for display. The backend emits naive ISO-8601
/// timestamps; anything unparseable is shown as received.
pub fn format_fecha(raw: &str) -> String {
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%d/%m/%Y %H:%M").to_string();
    }
    if let Ok(parsed) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%d/%m/%Y %H:%M").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_scale_through_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(-3), "0 B");
    }

    #[test]
    fn naive_backend_timestamps_are_rendered() {
        assert_eq!(format_fecha("2024-05-12T10:30:00"), "12/05/2024 10:30");
        assert_eq!(
            format_fecha("2024-05-12T10:30:00.123456"),
            "12/05/2024 10:30"
        );
    }

    #[test]
    fn rfc3339_and_garbage_timestamps() {
        assert_eq!(format_fecha("2024-05-12T10:30:00+00:00"), "12/05/2024 10:30");
        assert_eq!(format_fecha("ayer"), "ayer");
    }

    #[test]
    fn short_id_truncates_long_ids() {
        assert_eq!(short_id("0a1b2c3d-4e5f-6789"), "0a1b2c3d");
        assert_eq!(short_id("corto"), "corto");
    }
}
