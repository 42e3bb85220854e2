//! History screen: every series the user has uploaded, with open,
//! segmentation browsing, and delete actions.

use eframe::egui::{self, Align2};

use shared::domain::SessionId;
use shared::protocol::ArchivoSerie;

use crate::backend_bridge::commands::BackendCommand;
use crate::ui::app::VisorApp;
use crate::ui::theme::{self, colors};
use crate::ui::widgets::{self, short_id};
use crate::viewer::session::ViewerOrigin;

#[derive(Default)]
pub struct HistorialState {
    pub rows: Option<Vec<ArchivoSerie>>,
    pub loading: bool,
    pub filtro: String,
    /// Session whose frames are being fetched for the viewer.
    pub abriendo: Option<SessionId>,
    pub confirm_delete: Option<SessionId>,
    pub deleting: Option<SessionId>,
    pub conflict: Option<ConflictDialog>,
    pub last_refresh: Option<chrono::DateTime<chrono::Local>>,
}

/// Shown when the backend refuses to delete a series that still has
/// segmentations attached.
#[derive(Clone)]
pub struct ConflictDialog {
    pub session_id: SessionId,
    pub detail: String,
}

fn row_matches(row: &ArchivoSerie, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let contains = |s: &str| s.to_lowercase().contains(needle);
    contains(&row.nombrearchivo)
        || row.rutaarchivo.as_deref().is_some_and(contains)
        || row
            .fechacarga
            .as_deref()
            .is_some_and(|f| contains(&widgets::format_fecha(f)))
        || row.session_id.as_ref().is_some_and(|s| contains(s.as_str()))
}

impl VisorApp {
    pub(crate) fn render_historial(&mut self, ctx: &egui::Context) {
        let mut refresh = false;
        let mut open_session: Option<SessionId> = None;
        let mut goto_segs: Option<SessionId> = None;
        let mut ask_delete: Option<SessionId> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Historial de series");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(!self.historial.loading, egui::Button::new("⟳ Actualizar"))
                        .clicked()
                    {
                        refresh = true;
                    }
                    if let Some(at) = &self.historial.last_refresh {
                        ui.weak(format!("Actualizado {}", at.format("%H:%M:%S")));
                    }
                });
            });
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label("Buscar:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.historial.filtro)
                        .hint_text("nombre, fecha o sesión")
                        .desired_width(260.0),
                );
                if !self.historial.filtro.is_empty() && ui.small_button("✕").clicked() {
                    self.historial.filtro.clear();
                }
            });
            ui.separator();

            if self.historial.loading && self.historial.rows.is_none() {
                widgets::loading_row(ui, "Cargando historial...");
                return;
            }
            let Some(rows) = &self.historial.rows else {
                widgets::empty_state(ui, "El historial aún no se ha cargado.");
                return;
            };
            if rows.is_empty() {
                widgets::empty_state(ui, "Aún no ha subido ninguna serie.");
                return;
            }

            let needle = self.historial.filtro.trim().to_lowercase();
            let visibles: Vec<&ArchivoSerie> =
                rows.iter().filter(|row| row_matches(row, &needle)).collect();
            if visibles.is_empty() {
                widgets::empty_state(ui, "Ninguna serie coincide con la búsqueda.");
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    egui::Grid::new("historial_rows")
                        .num_columns(5)
                        .striped(true)
                        .min_col_width(80.0)
                        .show(ui, |ui| {
                            ui.strong("Archivo");
                            ui.strong("Fecha de carga");
                            ui.strong("Seg.");
                            ui.strong("Sesión");
                            ui.strong("");
                            ui.end_row();

                            for row in visibles {
                                ui.label(&row.nombrearchivo);
                                match row.fechacarga.as_deref() {
                                    Some(fecha) => {
                                        ui.label(widgets::format_fecha(fecha));
                                    }
                                    None => {
                                        ui.weak("-");
                                    }
                                }
                                if row.seg_count > 0 {
                                    ui.colored_label(colors::SUCCESS, row.seg_count.to_string());
                                } else {
                                    ui.weak("0");
                                }
                                match &row.session_id {
                                    Some(session_id) => {
                                        ui.monospace(short_id(session_id.as_str()));
                                    }
                                    None => {
                                        ui.weak("sin sesión");
                                    }
                                }
                                ui.horizontal(|ui| match &row.session_id {
                                    Some(session_id) => {
                                        if self.historial.abriendo.as_ref() == Some(session_id) {
                                            widgets::loading_row(ui, "Abriendo...");
                                        } else if ui
                                            .add_enabled(
                                                self.historial.abriendo.is_none(),
                                                egui::Button::new("Ver"),
                                            )
                                            .clicked()
                                        {
                                            open_session = Some(session_id.clone());
                                        }
                                        if ui.button("Segmentaciones").clicked() {
                                            goto_segs = Some(session_id.clone());
                                        }
                                        if self.historial.deleting.as_ref() == Some(session_id) {
                                            ui.add(egui::Spinner::new());
                                        } else if ui
                                            .add(theme::danger_button("Eliminar"))
                                            .clicked()
                                        {
                                            ask_delete = Some(session_id.clone());
                                        }
                                    }
                                    None => {
                                        ui.weak("serie sin sesión asociada");
                                    }
                                });
                                ui.end_row();
                            }
                        });
                });
        });

        if let Some(session_id) = self.historial.confirm_delete.clone() {
            let body = format!(
                "Se eliminará la serie {} con todas sus imágenes del servidor.",
                short_id(session_id.as_str())
            );
            match widgets::confirm_window(ctx, "Eliminar serie", &body, "Eliminar") {
                Some(true) => {
                    self.historial.confirm_delete = None;
                    self.historial.deleting = Some(session_id.clone());
                    self.dispatch(BackendCommand::DeleteSerie { session_id });
                }
                Some(false) => self.historial.confirm_delete = None,
                None => {}
            }
        }

        if let Some(conflict) = self.historial.conflict.clone() {
            let mut open = true;
            let mut action: Option<bool> = None;
            egui::Window::new("No se puede eliminar")
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.set_max_width(380.0);
                    ui.label(&conflict.detail);
                    ui.add_space(8.0);
                    ui.weak("Elimine primero sus segmentaciones si desea borrar la serie.");
                    ui.add_space(12.0);
                    ui.horizontal(|ui| {
                        if ui.button("Cancelar").clicked() {
                            action = Some(false);
                        }
                        if ui.add(theme::primary_button("Ver segmentaciones")).clicked() {
                            action = Some(true);
                        }
                    });
                });
            if !open || action.is_some() {
                self.historial.conflict = None;
            }
            if action == Some(true) {
                goto_segs = Some(conflict.session_id);
            }
        }

        if refresh {
            self.refresh_historial();
        }
        if let Some(session_id) = ask_delete {
            self.historial.confirm_delete = Some(session_id);
        }
        if let Some(session_id) = open_session {
            self.historial.abriendo = Some(session_id.clone());
            self.dispatch(BackendCommand::LoadSeries {
                session_id,
                origin: ViewerOrigin::Historial,
            });
        }
        if let Some(session_id) = goto_segs {
            self.goto_segmentaciones(session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::ArchivoDicomId;

    fn fila(nombre: &str, fecha: Option<&str>, session: Option<&str>) -> ArchivoSerie {
        ArchivoSerie {
            archivodicomid: ArchivoDicomId(7),
            nombrearchivo: nombre.to_string(),
            rutaarchivo: None,
            fechacarga: fecha.map(str::to_string),
            sistemaid: None,
            session_id: session.map(SessionId::from),
            has_segmentations: false,
            seg_count: 0,
        }
    }

    #[test]
    fn empty_needle_matches_everything() {
        assert!(row_matches(&fila("craneo.zip", None, None), ""));
    }

    #[test]
    fn needle_matches_name_case_insensitive() {
        let row = fila("Craneo_TC.zip", None, None);
        assert!(row_matches(&row, "craneo"));
        assert!(!row_matches(&row, "torax"));
    }

    #[test]
    fn needle_matches_rendered_date_and_session() {
        let row = fila(
            "serie.zip",
            Some("2024-05-12T10:30:00"),
            Some("f00dcafe-1234"),
        );
        // The user searches what is on screen, not the raw ISO form.
        assert!(row_matches(&row, "12/05/2024"));
        assert!(row_matches(&row, "f00dcafe"));
    }
}
