//! Dashboard: greeting plus navigation cards for the main workflows.

use eframe::egui::{self, Margin, RichText, Rounding, Stroke};

use crate::ui::app::{Screen, VisorApp};
use crate::ui::theme::{self, colors};

impl VisorApp {
    pub(crate) fn render_dashboard(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(28.0);
            let nombre = self
                .auth
                .as_ref()
                .map(|session| session.nombre_completo.clone())
                .unwrap_or_default();
            ui.vertical_centered(|ui| {
                ui.heading(format!("Hola, {nombre}"));
                ui.weak("Seleccione una opción para comenzar");
            });
            ui.add_space(28.0);

            let mut destino = None;
            ui.columns(3, |cols| {
                if action_card(
                    &mut cols[0],
                    "📤",
                    "Subir serie",
                    "Cargue un archivo ZIP con una serie DICOM y ábrala en el visor",
                ) {
                    destino = Some(Screen::Upload);
                }
                if action_card(
                    &mut cols[1],
                    "🗂",
                    "Historial",
                    "Revise las series cargadas, sus segmentaciones y modelos 3D",
                ) {
                    destino = Some(Screen::Historial);
                }
                if action_card(
                    &mut cols[2],
                    "🧑",
                    "Pacientes",
                    "Gestione pacientes y vincule estudios a sus historias",
                ) {
                    destino = Some(Screen::Pacientes);
                }
            });

            match destino {
                Some(Screen::Upload) => self.screen = Screen::Upload,
                Some(Screen::Historial) => self.goto_historial(),
                Some(Screen::Pacientes) => self.goto_pacientes(),
                _ => {}
            }
        });
    }
}

fn action_card(ui: &mut egui::Ui, icon: &str, title: &str, subtitle: &str) -> bool {
    let mut clicked = false;
    egui::Frame::none()
        .fill(colors::BG_DARK)
        .rounding(Rounding::same(8.0))
        .stroke(Stroke::new(1.0, colors::BORDER))
        .inner_margin(Margin::same(16.0))
        .show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(icon).size(28.0));
                ui.label(RichText::new(title).strong().size(16.0));
                ui.add_space(4.0);
                ui.weak(subtitle);
                ui.add_space(10.0);
                if ui.add(theme::primary_button("Abrir")).clicked() {
                    clicked = true;
                }
            });
        });
    clicked
}
