//! 3-D models screen: STL models exported from a series, with download
//! and delete actions.

use eframe::egui;

use shared::domain::{ModeloId, SessionId};
use shared::protocol::Modelo3d;

use crate::backend_bridge::commands::BackendCommand;
use crate::ui::app::VisorApp;
use crate::ui::theme;
use crate::ui::widgets::{self, short_id};

pub struct ModelosState {
    pub session_id: SessionId,
    pub rows: Option<Vec<Modelo3d>>,
    pub loading: bool,
    pub confirm_delete: Option<ModeloId>,
    /// True from the download dispatch until the file lands on disk.
    pub descargando: bool,
}

impl ModelosState {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            rows: None,
            loading: true,
            confirm_delete: None,
            descargando: false,
        }
    }
}

fn opt_count(ui: &mut egui::Ui, value: Option<i64>) {
    match value {
        Some(value) => {
            ui.label(value.to_string());
        }
        None => {
            ui.weak("-");
        }
    }
}

impl VisorApp {
    pub(crate) fn render_modelos(&mut self, ctx: &egui::Context) {
        let Some(mut state) = self.modelos.take() else {
            self.goto_historial();
            return;
        };
        let mut back = false;
        let mut refresh = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("← Volver a segmentaciones").clicked() {
                    back = true;
                }
                ui.separator();
                ui.heading(format!(
                    "Modelos 3D de la serie {}",
                    short_id(state.session_id.as_str())
                ));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(!state.loading, egui::Button::new("⟳ Actualizar"))
                        .clicked()
                    {
                        refresh = true;
                    }
                });
            });
            ui.separator();

            if state.loading {
                widgets::loading_row(ui, "Cargando modelos...");
                return;
            }
            let rows = match &state.rows {
                Some(rows) if rows.is_empty() => {
                    widgets::empty_state(
                        ui,
                        "Esta serie no tiene modelos exportados. Expórtelos desde la pantalla de segmentaciones.",
                    );
                    return;
                }
                Some(rows) => rows.clone(),
                None => {
                    widgets::empty_state(ui, "No se pudieron cargar los modelos.");
                    return;
                }
            };

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    egui::Grid::new("modelos_rows")
                        .num_columns(6)
                        .striped(true)
                        .min_col_width(70.0)
                        .show(ui, |ui| {
                            ui.strong("Archivo");
                            ui.strong("Vértices");
                            ui.strong("Caras");
                            ui.strong("Tamaño");
                            ui.strong("Fecha");
                            ui.strong("");
                            ui.end_row();

                            for modelo in &rows {
                                ui.monospace(modelo.file_name());
                                opt_count(ui, modelo.num_vertices);
                                opt_count(ui, modelo.num_caras);
                                match modelo.file_size_bytes {
                                    Some(bytes) => {
                                        ui.label(widgets::format_bytes(bytes));
                                    }
                                    None => {
                                        ui.weak("-");
                                    }
                                }
                                match modelo.created_at.as_deref() {
                                    Some(fecha) => {
                                        ui.label(widgets::format_fecha(fecha));
                                    }
                                    None => {
                                        ui.weak("-");
                                    }
                                }
                                ui.horizontal(|ui| {
                                    if ui
                                        .add_enabled(
                                            !state.descargando,
                                            theme::primary_button("Descargar"),
                                        )
                                        .clicked()
                                    {
                                        if let Some(target) = rfd::FileDialog::new()
                                            .set_file_name(modelo.file_name())
                                            .add_filter("Modelos STL", &["stl"])
                                            .save_file()
                                        {
                                            state.descargando = true;
                                            self.dispatch(BackendCommand::DownloadStl {
                                                path_stl: modelo.path_stl.clone(),
                                                target,
                                            });
                                        }
                                    }
                                    if ui.add(theme::danger_button("Eliminar")).clicked() {
                                        state.confirm_delete = Some(modelo.id);
                                    }
                                });
                                ui.end_row();
                            }
                        });
                    if state.descargando {
                        ui.add_space(8.0);
                        widgets::loading_row(ui, "Descargando el modelo...");
                    }
                });
        });

        if let Some(modelo) = state.confirm_delete {
            match widgets::confirm_window(
                ctx,
                "Eliminar modelo",
                "Se eliminará el archivo STL del servidor.",
                "Eliminar",
            ) {
                Some(true) => {
                    state.confirm_delete = None;
                    self.dispatch(BackendCommand::DeleteModelo { modelo });
                }
                Some(false) => state.confirm_delete = None,
                None => {}
            }
        }

        if refresh {
            state.loading = true;
            self.dispatch(BackendCommand::ListModelos {
                session_id: state.session_id.clone(),
            });
        }

        if back {
            let session_id = state.session_id.clone();
            self.modelos = None;
            self.goto_segmentaciones(session_id);
        } else {
            self.modelos = Some(state);
        }
    }
}
