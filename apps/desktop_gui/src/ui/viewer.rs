//! Viewer screen: the current frame with display adjustments, frame
//! navigation, and the 2-D / 3-D segmentation triggers.

use eframe::egui::{
    self, Align2, ColorImage, Key, RichText, TextureHandle, TextureOptions,
};
use shared::domain::ThresholdPreset;
use shared::protocol::{Seg3dParams, Segmentacion2d};

use crate::backend_bridge::commands::BackendCommand;
use crate::ui::app::{ImageState, Screen, VisorApp};
use crate::ui::theme::{self, colors};
use crate::ui::widgets::{self, short_id};
use crate::viewer::display::{DisplayTransform, ADJUST_MAX, ADJUST_MIN, ZOOM_MAX, ZOOM_MIN};
use crate::viewer::progress::RequestProgress;
use crate::viewer::session::{ViewerOrigin, ViewerSession};

pub struct ViewerScreenState {
    pub session: ViewerSession,
    pub transform: DisplayTransform,
    pub tuned: Option<TunedTexture>,
    pub seg2d: RequestProgress,
    pub seg3d: RequestProgress,
    /// Frame name of the in-flight 2-D request; answers for anything else
    /// are stale and dropped.
    pub seg2d_target: Option<String>,
    pub seg2d_result: Option<Seg2dResultView>,
    pub seg3d_panel: Seg3dPanel,
}

impl ViewerScreenState {
    pub fn new(session: ViewerSession) -> Self {
        Self {
            session,
            transform: DisplayTransform::default(),
            tuned: None,
            seg2d: RequestProgress::default(),
            seg3d: RequestProgress::default(),
            seg2d_target: None,
            seg2d_result: None,
            seg3d_panel: Seg3dPanel::default(),
        }
    }
}

/// Current frame's texture with brightness/contrast baked in. Rebuilt when
/// the frame or either adjustment changes; zoom and rotation are geometric
/// and reuse it.
pub struct TunedTexture {
    path: String,
    brillo: i32,
    contraste: i32,
    pub texture: TextureHandle,
}

#[derive(Clone)]
pub struct Seg2dResultView {
    pub image_name: String,
    pub seg: Segmentacion2d,
}

pub struct Seg3dPanel {
    pub use_preset: bool,
    pub preset: ThresholdPreset,
    pub thr_min: String,
    pub thr_max: String,
    pub error: Option<String>,
}

impl Default for Seg3dPanel {
    fn default() -> Self {
        Self {
            use_preset: true,
            preset: ThresholdPreset::Hueso,
            thr_min: "300".to_string(),
            thr_max: "2000".to_string(),
            error: None,
        }
    }
}

impl Seg3dPanel {
    pub fn params(&self) -> Result<Seg3dParams, String> {
        if self.use_preset {
            return Ok(Seg3dParams::Preset(self.preset));
        }
        let thr_min: f64 = self
            .thr_min
            .trim()
            .parse()
            .map_err(|_| "Los umbrales deben ser números".to_string())?;
        let thr_max: f64 = self
            .thr_max
            .trim()
            .parse()
            .map_err(|_| "Los umbrales deben ser números".to_string())?;
        if thr_min >= thr_max {
            return Err("El umbral mínimo debe ser menor que el máximo".to_string());
        }
        Ok(Seg3dParams::Manual { thr_min, thr_max })
    }
}

impl VisorApp {
    pub(crate) fn render_viewer(&mut self, ctx: &egui::Context) {
        // Taken out of self for the duration of the frame so screen code can
        // borrow the app (image cache, dispatch) and the viewer state at once.
        let Some(mut state) = self.viewer.take() else {
            self.screen = Screen::Dashboard;
            return;
        };
        let mut exit: Option<ViewerOrigin> = None;

        let mut wanted: Vec<String> = Vec::new();
        if let Some(path) = state.session.current_frame() {
            wanted.push(path.to_string());
        }
        if let Some(path) = state.session.frame_at(state.session.current_index() + 1) {
            wanted.push(path.to_string());
        }
        if let Some(view) = &state.seg2d_result {
            wanted.push(view.seg.mask_path.clone());
        }
        for path in &wanted {
            self.request_image(path);
        }

        if state.seg2d_result.is_none() {
            if ctx.input(|i| i.key_pressed(Key::ArrowRight)) {
                state.session.next();
            }
            if ctx.input(|i| i.key_pressed(Key::ArrowLeft)) {
                state.session.prev();
            }
        }

        if !state.session.is_empty() {
            self.viewer_controls(ctx, &mut state);
        }
        self.viewer_central(ctx, &mut state, &mut exit);
        self.seg2d_result_window(ctx, &mut state);

        match exit {
            Some(ViewerOrigin::Upload) => {
                self.viewer = None;
                self.screen = Screen::Upload;
            }
            Some(ViewerOrigin::Historial) => {
                self.viewer = None;
                self.goto_historial();
            }
            None => self.viewer = Some(state),
        }
    }

    fn viewer_controls(&mut self, ctx: &egui::Context, state: &mut ViewerScreenState) {
        egui::SidePanel::right("viewer_controls")
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| {
                widgets::section_heading(ui, "Ajustes de imagen");
                ui.add(
                    egui::Slider::new(&mut state.transform.brillo, ADJUST_MIN..=ADJUST_MAX)
                        .text("Brillo")
                        .suffix("%"),
                );
                ui.add(
                    egui::Slider::new(&mut state.transform.contraste, ADJUST_MIN..=ADJUST_MAX)
                        .text("Contraste")
                        .suffix("%"),
                );
                ui.horizontal(|ui| {
                    if ui.button("−").clicked() {
                        state.transform.zoom_out();
                    }
                    ui.add(
                        egui::Slider::new(&mut state.transform.zoom, ZOOM_MIN..=ZOOM_MAX)
                            .fixed_decimals(2),
                    );
                    if ui.button("+").clicked() {
                        state.transform.zoom_in();
                    }
                    ui.label("Zoom");
                });
                ui.horizontal(|ui| {
                    if ui.button("⟲ Rotar izq.").clicked() {
                        state.transform.rotate_left();
                    }
                    if ui.button("⟳ Rotar der.").clicked() {
                        state.transform.rotate_right();
                    }
                });
                if ui
                    .add_enabled(
                        !state.transform.is_neutral(),
                        egui::Button::new("Restablecer ajustes"),
                    )
                    .clicked()
                {
                    state.transform.reset();
                }

                ui.separator();
                if ui.button("Quitar imagen de la serie").clicked() {
                    if let Some(removed) = state.session.remove_current() {
                        self.images.remove(&removed);
                        state.tuned = None;
                    }
                }
                ui.weak("Solo la quita del visor; el servidor no se modifica.");

                ui.separator();
                widgets::section_heading(ui, "Segmentación 2D");
                let seg2d_busy = state.seg2d.in_flight();
                let has_frame = state.session.current_image_name().is_some();
                if ui
                    .add_enabled(
                        has_frame && !seg2d_busy,
                        theme::primary_button("Segmentar esta imagen"),
                    )
                    .clicked()
                {
                    self.trigger_seg2d(state);
                }
                if seg2d_busy {
                    ui.add(egui::ProgressBar::new(state.seg2d.fraction()).show_percentage());
                }

                ui.separator();
                widgets::section_heading(ui, "Segmentación 3D");
                ui.horizontal(|ui| {
                    ui.radio_value(&mut state.seg3d_panel.use_preset, true, "Preset");
                    ui.radio_value(&mut state.seg3d_panel.use_preset, false, "Manual");
                });
                if state.seg3d_panel.use_preset {
                    egui::ComboBox::from_id_salt("seg3d_preset")
                        .selected_text(state.seg3d_panel.preset.label())
                        .show_ui(ui, |ui| {
                            for preset in ThresholdPreset::ALL {
                                ui.selectable_value(
                                    &mut state.seg3d_panel.preset,
                                    preset,
                                    preset.label(),
                                );
                            }
                        });
                } else {
                    ui.horizontal(|ui| {
                        ui.label("Mín");
                        ui.add(
                            egui::TextEdit::singleline(&mut state.seg3d_panel.thr_min)
                                .desired_width(56.0),
                        );
                        ui.label("Máx");
                        ui.add(
                            egui::TextEdit::singleline(&mut state.seg3d_panel.thr_max)
                                .desired_width(56.0),
                        );
                    });
                    ui.weak("Umbrales en unidades Hounsfield");
                }
                if let Some(error) = &state.seg3d_panel.error {
                    ui.colored_label(colors::DANGER, error);
                }
                let seg3d_busy = state.seg3d.in_flight();
                if ui
                    .add_enabled(!seg3d_busy, theme::primary_button("Segmentar serie 3D"))
                    .clicked()
                {
                    self.trigger_seg3d(state);
                }
                if seg3d_busy {
                    ui.add(egui::ProgressBar::new(state.seg3d.fraction()).show_percentage());
                    ui.weak("Reconstruyendo el volumen...");
                }
            });
    }

    fn viewer_central(
        &mut self,
        ctx: &egui::Context,
        state: &mut ViewerScreenState,
        exit: &mut Option<ViewerOrigin>,
    ) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                let back_label = match state.session.origin() {
                    ViewerOrigin::Upload => "← Subir otra serie",
                    ViewerOrigin::Historial => "← Volver al historial",
                };
                if ui.button(back_label).clicked() {
                    *exit = Some(state.session.origin());
                }
                ui.separator();
                ui.label(
                    RichText::new(format!("Serie {}", short_id(state.session.session_id().as_str())))
                        .strong(),
                );
                if ui.small_button("Copiar ID").clicked() {
                    self.copy_session_id(state);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(state.session.counter_label());
                });
            });
            ui.separator();

            if state.session.is_empty() {
                ui.add_space(48.0);
                ui.vertical_centered(|ui| {
                    ui.heading("No hay imágenes en esta serie");
                    ui.weak("La serie no contiene imágenes o su índice no pudo cargarse.");
                    ui.add_space(12.0);
                    let (label, origin) = match state.session.origin() {
                        ViewerOrigin::Upload => ("Ir a subir serie", ViewerOrigin::Upload),
                        ViewerOrigin::Historial => {
                            ("Volver al historial", ViewerOrigin::Historial)
                        }
                    };
                    if ui.add(theme::primary_button(label)).clicked() {
                        *exit = Some(origin);
                    }
                });
                return;
            }

            let nav_height = 40.0;
            let image_area =
                egui::vec2(ui.available_width(), (ui.available_height() - nav_height).max(60.0));
            ui.allocate_ui(image_area, |ui| {
                ui.centered_and_justified(|ui| {
                    self.frame_view(ui, state);
                });
            });

            ui.horizontal(|ui| {
                let last = state.session.frame_count().saturating_sub(1);
                if ui
                    .add_enabled(state.session.current_index() > 0, egui::Button::new("◀ Anterior"))
                    .clicked()
                {
                    state.session.prev();
                }
                if last > 0 {
                    ui.spacing_mut().slider_width = (ui.available_width() - 140.0).max(120.0);
                    let mut pos = state.session.current_index();
                    if ui
                        .add(egui::Slider::new(&mut pos, 0..=last).show_value(false))
                        .changed()
                    {
                        state.session.seek(pos);
                    }
                }
                if ui
                    .add_enabled(
                        state.session.current_index() < last,
                        egui::Button::new("Siguiente ▶"),
                    )
                    .clicked()
                {
                    state.session.next();
                }
            });
        });
    }

    fn frame_view(&mut self, ui: &mut egui::Ui, state: &mut ViewerScreenState) {
        let Some(path) = state.session.current_frame().map(str::to_string) else {
            return;
        };
        match self.images.get(&path) {
            None | Some(ImageState::Loading) => {
                widgets::loading_row(ui, "Cargando imagen...");
            }
            Some(ImageState::Failed(reason)) => {
                ui.colored_label(
                    colors::DANGER,
                    format!("No se pudo cargar la imagen: {reason}"),
                );
            }
            Some(ImageState::Ready(loaded)) => {
                let rebuild = match &state.tuned {
                    Some(tuned) => {
                        tuned.path != path
                            || tuned.brillo != state.transform.brillo
                            || tuned.contraste != state.transform.contraste
                    }
                    None => true,
                };
                if rebuild {
                    let rgba = state.transform.apply_to_rgba(&loaded.rgba);
                    let color =
                        ColorImage::from_rgba_unmultiplied([loaded.width, loaded.height], &rgba);
                    let texture =
                        ui.ctx()
                            .load_texture(format!("frame:{path}"), color, TextureOptions::LINEAR);
                    state.tuned = Some(TunedTexture {
                        path: path.clone(),
                        brillo: state.transform.brillo,
                        contraste: state.transform.contraste,
                        texture,
                    });
                }
                if let Some(tuned) = &state.tuned {
                    let size = tuned.texture.size_vec2();
                    let avail = ui.available_size();
                    let base = (avail.x / size.x).min(avail.y / size.y).min(1.0);
                    let drawn = size * base * state.transform.zoom;
                    ui.add(
                        egui::Image::new(&tuned.texture)
                            .rotate(state.transform.rotation_radians(), egui::Vec2::splat(0.5))
                            .fit_to_exact_size(drawn),
                    );
                }
            }
        }
    }

    fn seg2d_result_window(&mut self, ctx: &egui::Context, state: &mut ViewerScreenState) {
        let Some(view) = state.seg2d_result.clone() else {
            return;
        };
        let mut open = true;
        let mut close_clicked = false;
        egui::Window::new("Resultado de segmentación")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                ui.monospace(&view.image_name);
                ui.separator();
                ui.horizontal(|ui| {
                    self.static_image(ui, &view.seg.mask_path, egui::vec2(260.0, 260.0), "máscara");
                    ui.separator();
                    ui.vertical(|ui| {
                        ui.strong("Medidas");
                        if let Some(error) = view.seg.dimension_error() {
                            ui.colored_label(colors::WARNING, error);
                        } else {
                            egui::Grid::new("medidas").num_columns(2).striped(true).show(
                                ui,
                                |ui| {
                                    for (name, value) in view.seg.medidas() {
                                        ui.label(name);
                                        ui.monospace(value.to_string());
                                        ui.end_row();
                                    }
                                },
                            );
                        }
                        ui.add_space(6.0);
                        ui.weak(&view.seg.mensaje);
                    });
                });
                ui.add_space(8.0);
                if ui.button("Cerrar").clicked() {
                    close_clicked = true;
                }
            });
        if !open || close_clicked {
            state.seg2d_result = None;
        }
    }

    fn trigger_seg2d(&mut self, state: &mut ViewerScreenState) {
        let Some(image_name) = state.session.current_image_name().map(str::to_string) else {
            return;
        };
        if !state.seg2d.begin() {
            return;
        }
        state.seg2d_target = Some(image_name.clone());
        let cmd = BackendCommand::SegmentFrame {
            session_id: state.session.session_id().clone(),
            image_name,
        };
        self.dispatch(cmd);
    }

    fn trigger_seg3d(&mut self, state: &mut ViewerScreenState) {
        match state.seg3d_panel.params() {
            Ok(params) => {
                if !state.seg3d.begin() {
                    return;
                }
                state.seg3d_panel.error = None;
                let cmd = BackendCommand::SegmentSeries3d {
                    session_id: state.session.session_id().clone(),
                    params,
                };
                self.dispatch(cmd);
            }
            Err(error) => state.seg3d_panel.error = Some(error),
        }
    }

    fn copy_session_id(&mut self, state: &ViewerScreenState) {
        let text = state.session.session_id().to_string();
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => self.status = "ID de sesión copiado al portapapeles".to_string(),
            Err(err) => {
                tracing::warn!("clipboard unavailable: {err}");
                self.status = "No se pudo copiar el ID".to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_mode_builds_preset_params() {
        let panel = Seg3dPanel::default();
        assert_eq!(
            panel.params(),
            Ok(Seg3dParams::Preset(ThresholdPreset::Hueso))
        );
    }

    #[test]
    fn manual_mode_parses_thresholds() {
        let panel = Seg3dPanel {
            use_preset: false,
            thr_min: " -120.5 ".to_string(),
            thr_max: "240".to_string(),
            ..Seg3dPanel::default()
        };
        assert_eq!(
            panel.params(),
            Ok(Seg3dParams::Manual {
                thr_min: -120.5,
                thr_max: 240.0,
            })
        );
    }

    #[test]
    fn manual_mode_rejects_bad_input() {
        let mut panel = Seg3dPanel {
            use_preset: false,
            thr_min: "bajo".to_string(),
            ..Seg3dPanel::default()
        };
        assert!(panel.params().is_err());

        panel.thr_min = "500".to_string();
        panel.thr_max = "100".to_string();
        assert!(panel.params().is_err());
    }
}
