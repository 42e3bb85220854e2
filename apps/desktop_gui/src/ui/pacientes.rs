//! Patients screen: the patient registry with create/edit/delete and the
//! studies dialog that links uploaded series to a patient.

use eframe::egui::{self, Align2};

use shared::domain::{EstudioId, PacienteId, SessionId};
use shared::protocol::{EstudioDraft, EstudioPaciente, Paciente, PacienteDraft};

use crate::backend_bridge::commands::BackendCommand;
use crate::ui::app::VisorApp;
use crate::ui::theme;
use crate::ui::widgets::{self, short_id};
use crate::viewer::session::ViewerOrigin;

#[derive(Default)]
pub struct PacientesState {
    pub rows: Option<Vec<Paciente>>,
    pub loading: bool,
    pub filtro: String,
    pub form: Option<PacienteForm>,
    pub saving: bool,
    pub confirm_delete: Option<PacienteId>,
    pub estudios: Option<EstudiosModal>,
}

/// Create/edit dialog state. Everything is edited as free text and only
/// validated on submit.
pub struct PacienteForm {
    pub editing: Option<PacienteId>,
    pub nombre_completo: String,
    pub documento: String,
    pub tipo_documento: String,
    pub fecha_nacimiento: String,
    pub edad: String,
    pub sexo: String,
    pub telefono: String,
    pub email: String,
    pub direccion: String,
    pub ciudad: String,
    pub notas: String,
    pub error: Option<String>,
}

impl PacienteForm {
    pub fn new() -> Self {
        Self {
            editing: None,
            nombre_completo: String::new(),
            documento: String::new(),
            tipo_documento: String::new(),
            fecha_nacimiento: String::new(),
            edad: String::new(),
            sexo: String::new(),
            telefono: String::new(),
            email: String::new(),
            direccion: String::new(),
            ciudad: String::new(),
            notas: String::new(),
            error: None,
        }
    }

    pub fn from_paciente(paciente: &Paciente) -> Self {
        let opt = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            editing: Some(paciente.id),
            nombre_completo: paciente.nombre_completo.clone(),
            documento: opt(&paciente.documento),
            tipo_documento: opt(&paciente.tipo_documento),
            fecha_nacimiento: opt(&paciente.fecha_nacimiento),
            edad: paciente.edad.map(|e| e.to_string()).unwrap_or_default(),
            sexo: opt(&paciente.sexo),
            telefono: opt(&paciente.telefono),
            email: opt(&paciente.email),
            direccion: opt(&paciente.direccion),
            ciudad: opt(&paciente.ciudad),
            notas: opt(&paciente.notas),
            error: None,
        }
    }

    pub fn to_draft(&self) -> Result<PacienteDraft, String> {
        let nombre_completo = self.nombre_completo.trim();
        if nombre_completo.is_empty() {
            return Err("El nombre es obligatorio".to_string());
        }
        let edad = match self.edad.trim() {
            "" => None,
            raw => Some(
                raw.parse::<i64>()
                    .map_err(|_| "La edad debe ser un número".to_string())?,
            ),
        };
        let opt = |raw: &str| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        Ok(PacienteDraft {
            nombre_completo: nombre_completo.to_string(),
            documento: opt(&self.documento),
            tipo_documento: opt(&self.tipo_documento),
            fecha_nacimiento: opt(&self.fecha_nacimiento),
            edad,
            sexo: opt(&self.sexo),
            telefono: opt(&self.telefono),
            email: opt(&self.email),
            direccion: opt(&self.direccion),
            ciudad: opt(&self.ciudad),
            notas: opt(&self.notas),
        })
    }
}

/// Studies dialog: the series linked to one patient plus the link form.
pub struct EstudiosModal {
    pub paciente: PacienteId,
    pub paciente_nombre: String,
    pub estudios: Option<Vec<EstudioPaciente>>,
    pub loading: bool,
    pub session_input: String,
    pub descripcion_input: String,
    pub vinculando: bool,
    pub error: Option<String>,
}

impl EstudiosModal {
    pub fn new(paciente: PacienteId, paciente_nombre: String) -> Self {
        Self {
            paciente,
            paciente_nombre,
            estudios: None,
            loading: true,
            session_input: String::new(),
            descripcion_input: String::new(),
            vinculando: false,
            error: None,
        }
    }
}

fn paciente_matches(paciente: &Paciente, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let contains = |s: &str| s.to_lowercase().contains(needle);
    contains(&paciente.nombre_completo)
        || paciente.documento.as_deref().is_some_and(contains)
        || paciente.email.as_deref().is_some_and(contains)
        || paciente.ciudad.as_deref().is_some_and(contains)
}

impl VisorApp {
    pub(crate) fn render_pacientes(&mut self, ctx: &egui::Context) {
        let mut refresh = false;
        let mut open_form: Option<PacienteForm> = None;
        let mut ask_delete: Option<PacienteId> = None;
        let mut open_estudios: Option<(PacienteId, String)> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Pacientes");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.add(theme::primary_button("Nuevo paciente")).clicked() {
                        open_form = Some(PacienteForm::new());
                    }
                    if ui
                        .add_enabled(!self.pacientes.loading, egui::Button::new("⟳ Actualizar"))
                        .clicked()
                    {
                        refresh = true;
                    }
                });
            });
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label("Buscar:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.pacientes.filtro)
                        .hint_text("nombre, documento, email o ciudad")
                        .desired_width(260.0),
                );
                if !self.pacientes.filtro.is_empty() && ui.small_button("✕").clicked() {
                    self.pacientes.filtro.clear();
                }
            });
            ui.separator();

            if self.pacientes.loading && self.pacientes.rows.is_none() {
                widgets::loading_row(ui, "Cargando pacientes...");
                return;
            }
            let Some(rows) = &self.pacientes.rows else {
                widgets::empty_state(ui, "El listado de pacientes aún no se ha cargado.");
                return;
            };
            if rows.is_empty() {
                widgets::empty_state(ui, "No hay pacientes registrados.");
                return;
            }

            let needle = self.pacientes.filtro.trim().to_lowercase();
            let visibles: Vec<&Paciente> = rows
                .iter()
                .filter(|paciente| paciente_matches(paciente, &needle))
                .collect();
            if visibles.is_empty() {
                widgets::empty_state(ui, "Ningún paciente coincide con la búsqueda.");
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    egui::Grid::new("pacientes_rows")
                        .num_columns(6)
                        .striped(true)
                        .min_col_width(80.0)
                        .show(ui, |ui| {
                            ui.strong("Nombre");
                            ui.strong("Documento");
                            ui.strong("Edad");
                            ui.strong("Teléfono");
                            ui.strong("Registro");
                            ui.strong("");
                            ui.end_row();

                            for paciente in visibles {
                                ui.label(&paciente.nombre_completo);
                                match (&paciente.tipo_documento, &paciente.documento) {
                                    (Some(tipo), Some(documento)) => {
                                        ui.label(format!("{tipo} {documento}"));
                                    }
                                    (None, Some(documento)) => {
                                        ui.label(documento);
                                    }
                                    _ => {
                                        ui.weak("-");
                                    }
                                }
                                opt_cell(ui, paciente.edad.map(|e| e.to_string()));
                                opt_cell(ui, paciente.telefono.clone());
                                opt_cell(
                                    ui,
                                    paciente
                                        .fecha_registro
                                        .as_deref()
                                        .map(widgets::format_fecha),
                                );
                                ui.horizontal(|ui| {
                                    if ui.button("Estudios").clicked() {
                                        open_estudios = Some((
                                            paciente.id,
                                            paciente.nombre_completo.clone(),
                                        ));
                                    }
                                    if ui.button("Editar").clicked() {
                                        open_form = Some(PacienteForm::from_paciente(paciente));
                                    }
                                    if ui.add(theme::danger_button("Eliminar")).clicked() {
                                        ask_delete = Some(paciente.id);
                                    }
                                });
                                ui.end_row();
                            }
                        });
                });
        });

        self.paciente_form_window(ctx);
        self.estudios_window(ctx);

        if let Some(paciente) = self.pacientes.confirm_delete {
            match widgets::confirm_window(
                ctx,
                "Eliminar paciente",
                "Se eliminará el paciente y los vínculos con sus estudios.",
                "Eliminar",
            ) {
                Some(true) => {
                    self.pacientes.confirm_delete = None;
                    self.dispatch(BackendCommand::DeletePaciente { paciente });
                }
                Some(false) => self.pacientes.confirm_delete = None,
                None => {}
            }
        }

        if refresh {
            self.refresh_pacientes();
        }
        if let Some(form) = open_form {
            self.pacientes.form = Some(form);
        }
        if let Some(paciente) = ask_delete {
            self.pacientes.confirm_delete = Some(paciente);
        }
        if let Some((paciente, nombre)) = open_estudios {
            self.pacientes.estudios = Some(EstudiosModal::new(paciente, nombre));
            self.dispatch(BackendCommand::ListEstudios { paciente });
        }
    }

    fn paciente_form_window(&mut self, ctx: &egui::Context) {
        let Some(mut form) = self.pacientes.form.take() else {
            return;
        };
        let saving = self.pacientes.saving;
        let title = if form.editing.is_some() {
            "Editar paciente"
        } else {
            "Nuevo paciente"
        };
        let mut open = true;
        let mut cancel = false;
        let mut submit = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                ui.set_max_width(440.0);
                egui::Grid::new("paciente_form")
                    .num_columns(2)
                    .min_col_width(130.0)
                    .show(ui, |ui| {
                        ui.label("Nombre completo *");
                        ui.text_edit_singleline(&mut form.nombre_completo);
                        ui.end_row();
                        ui.label("Tipo de documento");
                        ui.add(
                            egui::TextEdit::singleline(&mut form.tipo_documento)
                                .hint_text("CC, TI, pasaporte..."),
                        );
                        ui.end_row();
                        ui.label("Documento");
                        ui.text_edit_singleline(&mut form.documento);
                        ui.end_row();
                        ui.label("Fecha de nacimiento");
                        ui.add(
                            egui::TextEdit::singleline(&mut form.fecha_nacimiento)
                                .hint_text("AAAA-MM-DD"),
                        );
                        ui.end_row();
                        ui.label("Edad");
                        ui.text_edit_singleline(&mut form.edad);
                        ui.end_row();
                        ui.label("Sexo");
                        ui.add(
                            egui::TextEdit::singleline(&mut form.sexo).hint_text("M / F / otro"),
                        );
                        ui.end_row();
                        ui.label("Teléfono");
                        ui.text_edit_singleline(&mut form.telefono);
                        ui.end_row();
                        ui.label("Email");
                        ui.text_edit_singleline(&mut form.email);
                        ui.end_row();
                        ui.label("Dirección");
                        ui.text_edit_singleline(&mut form.direccion);
                        ui.end_row();
                        ui.label("Ciudad");
                        ui.text_edit_singleline(&mut form.ciudad);
                        ui.end_row();
                        ui.label("Notas");
                        ui.add(
                            egui::TextEdit::multiline(&mut form.notas).desired_rows(2),
                        );
                        ui.end_row();
                    });
                if let Some(error) = &form.error {
                    ui.colored_label(theme::colors::DANGER, error);
                }
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancelar").clicked() {
                        cancel = true;
                    }
                    if ui
                        .add_enabled(!saving, theme::primary_button("Guardar"))
                        .clicked()
                    {
                        submit = true;
                    }
                    if saving {
                        widgets::loading_row(ui, "Guardando...");
                    }
                });
            });

        if submit {
            match form.to_draft() {
                Ok(draft) => {
                    form.error = None;
                    self.pacientes.saving = true;
                    match form.editing {
                        Some(paciente) => {
                            self.dispatch(BackendCommand::UpdatePaciente { paciente, draft });
                        }
                        None => self.dispatch(BackendCommand::CreatePaciente { draft }),
                    }
                    self.pacientes.form = Some(form);
                }
                Err(error) => {
                    form.error = Some(error);
                    self.pacientes.form = Some(form);
                }
            }
        } else if cancel || !open {
            self.pacientes.form = None;
        } else {
            self.pacientes.form = Some(form);
        }
    }

    fn estudios_window(&mut self, ctx: &egui::Context) {
        let Some(mut modal) = self.pacientes.estudios.take() else {
            return;
        };
        let mut open = true;
        let mut cerrar = false;
        let mut abrir: Option<SessionId> = None;
        let mut quitar: Option<EstudioId> = None;
        let mut vincular = false;
        egui::Window::new(format!("Estudios de {}", modal.paciente_nombre))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                ui.set_max_width(460.0);
                if modal.loading {
                    widgets::loading_row(ui, "Cargando estudios...");
                } else {
                    match &modal.estudios {
                        Some(rows) if rows.is_empty() => {
                            ui.weak("Este paciente no tiene estudios vinculados.");
                        }
                        Some(rows) => {
                            egui::Grid::new("estudios_rows").num_columns(4).striped(true).show(
                                ui,
                                |ui| {
                                    for estudio in rows {
                                        ui.monospace(short_id(estudio.session_id.as_str()));
                                        match estudio.descripcion.as_deref() {
                                            Some(descripcion) => {
                                                ui.label(descripcion);
                                            }
                                            None => {
                                                ui.weak("sin descripción");
                                            }
                                        }
                                        let opening = self.historial.abriendo.is_some();
                                        if ui
                                            .add_enabled(!opening, egui::Button::new("Abrir"))
                                            .clicked()
                                        {
                                            abrir = Some(estudio.session_id.clone());
                                        }
                                        if ui.small_button("Quitar").clicked() {
                                            quitar = Some(estudio.id);
                                        }
                                        ui.end_row();
                                    }
                                },
                            );
                        }
                        None => {
                            ui.weak("No se pudieron cargar los estudios.");
                        }
                    }
                }

                ui.separator();
                ui.strong("Vincular serie");
                ui.add(
                    egui::TextEdit::singleline(&mut modal.session_input)
                        .hint_text("ID de sesión de la serie")
                        .desired_width(f32::INFINITY),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut modal.descripcion_input)
                        .hint_text("Descripción (opcional)")
                        .desired_width(f32::INFINITY),
                );
                if let Some(error) = &modal.error {
                    ui.colored_label(theme::colors::DANGER, error);
                }
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    let puede = !modal.vinculando && !modal.session_input.trim().is_empty();
                    if ui.add_enabled(puede, theme::primary_button("Vincular")).clicked() {
                        vincular = true;
                    }
                    if modal.vinculando {
                        widgets::loading_row(ui, "Vinculando...");
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Cerrar").clicked() {
                            cerrar = true;
                        }
                    });
                });
            });

        if vincular {
            let descripcion = modal.descripcion_input.trim();
            let draft = EstudioDraft {
                session_id: SessionId::from(modal.session_input.trim()),
                descripcion: (!descripcion.is_empty()).then(|| descripcion.to_string()),
            };
            modal.vinculando = true;
            modal.error = None;
            self.dispatch(BackendCommand::LinkEstudio {
                paciente: modal.paciente,
                draft,
            });
        }
        if let Some(estudio) = quitar {
            modal.loading = true;
            self.dispatch(BackendCommand::UnlinkEstudio {
                paciente: modal.paciente,
                estudio,
            });
        }

        if let Some(session_id) = abrir {
            self.pacientes.estudios = None;
            self.historial.abriendo = Some(session_id.clone());
            self.dispatch(BackendCommand::LoadSeries {
                session_id,
                origin: ViewerOrigin::Historial,
            });
        } else if cerrar || !open {
            self.pacientes.estudios = None;
        } else {
            self.pacientes.estudios = Some(modal);
        }
    }
}

fn opt_cell(ui: &mut egui::Ui, value: Option<String>) {
    match value {
        Some(value) => {
            ui.label(value);
        }
        None => {
            ui.weak("-");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_requires_a_name() {
        let mut form = PacienteForm::new();
        assert_eq!(form.to_draft().unwrap_err(), "El nombre es obligatorio");
        form.nombre_completo = "   ".to_string();
        assert!(form.to_draft().is_err());
    }

    #[test]
    fn draft_validates_age() {
        let mut form = PacienteForm::new();
        form.nombre_completo = "Ana Pérez".to_string();
        form.edad = "treinta".to_string();
        assert_eq!(form.to_draft().unwrap_err(), "La edad debe ser un número");

        form.edad = " 34 ".to_string();
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.edad, Some(34));
    }

    #[test]
    fn draft_trims_and_drops_empty_optionals() {
        let mut form = PacienteForm::new();
        form.nombre_completo = "  Ana Pérez  ".to_string();
        form.ciudad = "  Bogotá ".to_string();
        form.telefono = "   ".to_string();
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.nombre_completo, "Ana Pérez");
        assert_eq!(draft.ciudad, Some("Bogotá".to_string()));
        assert_eq!(draft.telefono, None);
        assert_eq!(draft.edad, None);
    }

    #[test]
    fn form_round_trips_an_existing_patient() {
        let paciente = Paciente {
            id: PacienteId(4),
            nombre_completo: "Luis Gómez".to_string(),
            documento: Some("1020".to_string()),
            tipo_documento: Some("CC".to_string()),
            fecha_nacimiento: None,
            edad: Some(51),
            sexo: None,
            telefono: None,
            email: Some("luis@example.com".to_string()),
            direccion: None,
            ciudad: None,
            notas: None,
            fecha_registro: None,
        };
        let form = PacienteForm::from_paciente(&paciente);
        assert_eq!(form.editing, Some(PacienteId(4)));
        assert_eq!(form.edad, "51");
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.nombre_completo, "Luis Gómez");
        assert_eq!(draft.documento, Some("1020".to_string()));
        assert_eq!(draft.email, Some("luis@example.com".to_string()));
    }
}
