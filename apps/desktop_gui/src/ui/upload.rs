//! Series upload screen: pick a ZIP, validate it client-side, upload it as
//! multipart, and jump into the viewer on success.

use std::path::{Path, PathBuf};

use eframe::egui::{self, Margin, Rounding, Stroke};

use crate::backend_bridge::commands::BackendCommand;
use crate::ui::app::VisorApp;
use crate::ui::theme::{self, colors};
use crate::viewer::progress::RequestProgress;

#[derive(Default)]
pub struct UploadState {
    pub picked: Option<PathBuf>,
    pub progress: RequestProgress,
    pub error: Option<String>,
}

fn looks_like_zip(path: &Path) -> bool {
    mime_guess::from_path(path)
        .iter()
        .any(|mime| mime.essence_str() == "application/zip")
}

impl VisorApp {
    pub(crate) fn render_upload(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            let card_width = avail.x.clamp(420.0, 560.0);
            ui.add_space((avail.y * 0.10).clamp(16.0, 80.0));

            ui.vertical_centered(|ui| {
                ui.set_width(card_width);
                egui::Frame::none()
                    .fill(colors::BG_DARK)
                    .rounding(Rounding::same(10.0))
                    .stroke(Stroke::new(1.0, colors::BORDER))
                    .inner_margin(Margin::same(20.0))
                    .show(ui, |ui| {
                        ui.heading("Subir serie DICOM");
                        ui.weak(
                            "Seleccione un archivo ZIP con las imágenes DICOM de la serie. \
                             El servidor la procesará y la abrirá en el visor.",
                        );
                        ui.add_space(12.0);

                        let uploading = self.upload.progress.in_flight();

                        ui.horizontal(|ui| {
                            if ui
                                .add_enabled(!uploading, egui::Button::new("Seleccionar archivo..."))
                                .clicked()
                            {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("Archivos ZIP", &["zip"])
                                    .pick_file()
                                {
                                    if looks_like_zip(&path) {
                                        self.upload.picked = Some(path);
                                        self.upload.error = None;
                                    } else {
                                        self.upload.picked = None;
                                        self.upload.error = Some(
                                            "El archivo seleccionado no es un ZIP".to_string(),
                                        );
                                    }
                                }
                            }
                            match &self.upload.picked {
                                Some(path) => {
                                    let name = path
                                        .file_name()
                                        .and_then(|n| n.to_str())
                                        .unwrap_or("(archivo)");
                                    ui.monospace(name);
                                }
                                None => {
                                    ui.weak("Ningún archivo seleccionado");
                                }
                            }
                        });

                        if let Some(error) = &self.upload.error {
                            ui.colored_label(colors::DANGER, error);
                        }

                        ui.add_space(12.0);
                        let can_upload = self.upload.picked.is_some() && !uploading;
                        let button = theme::primary_button("Subir y abrir en el visor")
                            .min_size(egui::vec2(ui.available_width(), 36.0));
                        if ui.add_enabled(can_upload, button).clicked() {
                            self.start_upload();
                        }

                        if uploading {
                            ui.add_space(8.0);
                            ui.add(
                                egui::ProgressBar::new(self.upload.progress.fraction())
                                    .show_percentage(),
                            );
                            ui.weak("Procesando la serie en el servidor...");
                        }
                    });
            });
        });
    }

    fn start_upload(&mut self) {
        let Some(path) = self.upload.picked.clone() else {
            return;
        };
        if !self.upload.progress.begin() {
            return;
        }
        self.upload.error = None;
        self.banner = None;
        self.dispatch(BackendCommand::UploadSeries { path });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_extension_check() {
        assert!(looks_like_zip(Path::new("serie.zip")));
        assert!(looks_like_zip(Path::new("SERIE.ZIP")));
        assert!(!looks_like_zip(Path::new("serie.rar")));
        assert!(!looks_like_zip(Path::new("serie")));
    }
}
