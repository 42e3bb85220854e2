//! Segmentations screen: the stored 2-D and 3-D segmentations of one
//! series, with delete and STL export actions.

use eframe::egui::{self, Margin, Rounding};

use shared::domain::{ArchivoDicomId, Seg3dId, SessionId};
use shared::protocol::{Seg3dRegistro, SegmentacionGuardada};

use crate::backend_bridge::commands::BackendCommand;
use crate::ui::app::VisorApp;
use crate::ui::theme::{self, colors};
use crate::ui::widgets::{self, short_id};

pub struct SegScreenState {
    pub session_id: SessionId,
    pub seg2d: Option<Vec<SegmentacionGuardada>>,
    pub seg3d: Option<Vec<Seg3dRegistro>>,
    pub loading2d: bool,
    pub loading3d: bool,
    pub confirm2d: Option<ArchivoDicomId>,
    pub confirm3d: Option<Seg3dId>,
    /// 3-D segmentation whose STL export is running.
    pub exportando: Option<Seg3dId>,
}

impl SegScreenState {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            seg2d: None,
            seg3d: None,
            loading2d: true,
            loading3d: true,
            confirm2d: None,
            confirm3d: None,
            exportando: None,
        }
    }
}

fn medida(ui: &mut egui::Ui, label: &str, value: Option<f64>, unidad: &str) {
    match value {
        Some(value) => {
            ui.label(format!("{label}: {value:.2} {unidad}"));
        }
        None => {
            ui.weak(format!("{label}: -"));
        }
    }
}

impl VisorApp {
    pub(crate) fn render_segmentaciones(&mut self, ctx: &egui::Context) {
        let Some(mut state) = self.segmentaciones.take() else {
            self.goto_historial();
            return;
        };
        let mut back = false;
        let mut refresh = false;
        let mut goto_modelos = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("← Volver al historial").clicked() {
                    back = true;
                }
                ui.separator();
                ui.heading(format!("Serie {}", short_id(state.session_id.as_str())));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Modelos 3D").clicked() {
                        goto_modelos = true;
                    }
                    let loading = state.loading2d || state.loading3d;
                    if ui
                        .add_enabled(!loading, egui::Button::new("⟳ Actualizar"))
                        .clicked()
                    {
                        refresh = true;
                    }
                });
            });
            ui.separator();

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    widgets::section_heading(ui, "Segmentaciones 2D");
                    self.seg2d_section(ui, &mut state);
                    ui.add_space(12.0);
                    widgets::section_heading(ui, "Segmentaciones 3D");
                    self.seg3d_section(ui, &mut state);
                });
        });

        if let Some(archivo) = state.confirm2d {
            match widgets::confirm_window(
                ctx,
                "Eliminar segmentación 2D",
                "Se eliminará la segmentación y sus medidas del servidor.",
                "Eliminar",
            ) {
                Some(true) => {
                    state.confirm2d = None;
                    self.dispatch(BackendCommand::DeleteSegmentacion {
                        session_id: state.session_id.clone(),
                        archivo,
                    });
                }
                Some(false) => state.confirm2d = None,
                None => {}
            }
        }
        if let Some(seg3d) = state.confirm3d {
            match widgets::confirm_window(
                ctx,
                "Eliminar segmentación 3D",
                "Se eliminará la reconstrucción 3D del servidor. Los modelos STL ya exportados no se tocan.",
                "Eliminar",
            ) {
                Some(true) => {
                    state.confirm3d = None;
                    self.dispatch(BackendCommand::DeleteSegmentacion3d {
                        session_id: state.session_id.clone(),
                        seg3d,
                    });
                }
                Some(false) => state.confirm3d = None,
                None => {}
            }
        }

        if refresh {
            state.loading2d = true;
            state.loading3d = true;
            self.dispatch(BackendCommand::ListSegmentaciones {
                session_id: state.session_id.clone(),
            });
        }

        if back {
            self.segmentaciones = None;
            self.goto_historial();
        } else if goto_modelos {
            let session_id = state.session_id.clone();
            self.segmentaciones = Some(state);
            self.goto_modelos(session_id);
        } else {
            self.segmentaciones = Some(state);
        }
    }

    fn seg2d_section(&mut self, ui: &mut egui::Ui, state: &mut SegScreenState) {
        if state.loading2d {
            widgets::loading_row(ui, "Cargando segmentaciones 2D...");
            return;
        }
        let rows = match &state.seg2d {
            Some(rows) if rows.is_empty() => {
                widgets::empty_state(ui, "Esta serie no tiene segmentaciones 2D.");
                return;
            }
            Some(rows) => rows.clone(),
            None => {
                widgets::empty_state(ui, "No se pudieron cargar las segmentaciones 2D.");
                return;
            }
        };
        for seg in &rows {
            egui::Frame::none()
                .fill(colors::BG_PANEL)
                .rounding(Rounding::same(6.0))
                .inner_margin(Margin::same(10.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        if let Some(mask) = &seg.mask_path {
                            self.static_image(ui, mask, egui::vec2(96.0, 96.0), "máscara");
                        }
                        ui.vertical(|ui| {
                            ui.horizontal(|ui| {
                                ui.strong(format!("Imagen #{}", seg.archivodicomid));
                                if let Some(fecha) = &seg.fechasegmentacion {
                                    ui.weak(widgets::format_fecha(fecha));
                                }
                            });
                            let unidad = seg.unidad.as_deref().unwrap_or("mm");
                            ui.horizontal(|ui| {
                                medida(ui, "Altura", seg.altura, unidad);
                                medida(ui, "Longitud", seg.longitud, unidad);
                                medida(ui, "Ancho", seg.ancho, unidad);
                                medida(ui, "Volumen", seg.volumen, &format!("{unidad}³"));
                            });
                            if let Some(tipo) = &seg.tipoprotesis {
                                ui.label(format!("Prótesis sugerida: {tipo}"));
                            }
                        });
                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                if ui.add(theme::danger_button("Eliminar")).clicked() {
                                    state.confirm2d = Some(seg.archivodicomid);
                                }
                            },
                        );
                    });
                });
            ui.add_space(6.0);
        }
    }

    fn seg3d_section(&mut self, ui: &mut egui::Ui, state: &mut SegScreenState) {
        if state.loading3d {
            widgets::loading_row(ui, "Cargando segmentaciones 3D...");
            return;
        }
        let rows = match &state.seg3d {
            Some(rows) if rows.is_empty() => {
                widgets::empty_state(ui, "Esta serie no tiene segmentaciones 3D.");
                return;
            }
            Some(rows) => rows.clone(),
            None => {
                widgets::empty_state(ui, "No se pudieron cargar las segmentaciones 3D.");
                return;
            }
        };
        for seg in &rows {
            egui::Frame::none()
                .fill(colors::BG_PANEL)
                .rounding(Rounding::same(6.0))
                .inner_margin(Margin::same(10.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        for (label, path) in seg.thumbs() {
                            ui.vertical(|ui| {
                                self.static_image(ui, path, egui::vec2(84.0, 84.0), label);
                                ui.weak(label);
                            });
                        }
                        ui.vertical(|ui| {
                            ui.horizontal(|ui| {
                                ui.strong(format!("Reconstrucción #{}", seg.id));
                                if let Some(fecha) = &seg.created_at {
                                    ui.weak(widgets::format_fecha(fecha));
                                }
                            });
                            ui.horizontal(|ui| {
                                medida(ui, "Volumen", seg.volume_mm3, "mm³");
                                medida(ui, "Superficie", seg.surface_mm2, "mm²");
                                if let Some(n_slices) = seg.n_slices {
                                    ui.label(format!("Cortes: {n_slices}"));
                                }
                            });
                            if let (Some(x), Some(y), Some(z)) =
                                (seg.bbox_x_mm, seg.bbox_y_mm, seg.bbox_z_mm)
                            {
                                ui.label(format!(
                                    "Caja: {x:.1} × {y:.1} × {z:.1} mm"
                                ));
                            }
                        });
                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                if ui.add(theme::danger_button("Eliminar")).clicked() {
                                    state.confirm3d = Some(seg.id);
                                }
                                if state.exportando == Some(seg.id) {
                                    widgets::loading_row(ui, "Exportando...");
                                } else if ui
                                    .add_enabled(
                                        state.exportando.is_none(),
                                        theme::primary_button("Exportar STL"),
                                    )
                                    .clicked()
                                {
                                    state.exportando = Some(seg.id);
                                    self.dispatch(BackendCommand::ExportStl {
                                        session_id: state.session_id.clone(),
                                        seg3d: seg.id,
                                    });
                                }
                            },
                        );
                    });
                });
            ui.add_space(6.0);
        }
    }
}
