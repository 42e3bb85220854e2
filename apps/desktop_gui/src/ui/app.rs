//! Application state and the per-frame update loop: screen routing, the
//! backend event pump, and the shared image cache.

use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};

use client_core::Seg3dOutcome;
use shared::domain::SessionId;

use crate::backend_bridge::commands::BackendCommand;
use crate::config::Settings;
use crate::controller::events::{AuthSession, UiError, UiErrorCategory, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::historial::{ConflictDialog, HistorialState};
use crate::ui::login::{AuthMode, LoginState};
use crate::ui::modelos::ModelosState;
use crate::ui::pacientes::PacientesState;
use crate::ui::segmentaciones::SegScreenState;
use crate::ui::upload::UploadState;
use crate::ui::viewer::{Seg2dResultView, ViewerScreenState};
use crate::ui::widgets::{self, BannerKind};
use crate::viewer::session::{ViewerOrigin, ViewerSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Upload,
    Viewer,
    Historial,
    Segmentaciones,
    Modelos,
    Pacientes,
}

/// A backend-served image in the shared cache, keyed by its static path.
pub enum ImageState {
    Loading,
    Ready(LoadedImage),
    Failed(String),
}

pub struct LoadedImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
    /// Plain texture for thumbnails and masks, uploaded on first draw. The
    /// viewer bakes its own adjusted texture instead.
    pub texture: Option<TextureHandle>,
}

pub struct VisorApp {
    settings: Settings,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    pub(crate) screen: Screen,
    pub(crate) auth: Option<AuthSession>,
    pub(crate) status: String,
    pub(crate) banner: Option<(BannerKind, String)>,
    pub(crate) images: HashMap<String, ImageState>,
    pub(crate) login: LoginState,
    pub(crate) upload: UploadState,
    pub(crate) viewer: Option<ViewerScreenState>,
    pub(crate) historial: HistorialState,
    pub(crate) segmentaciones: Option<SegScreenState>,
    pub(crate) modelos: Option<ModelosState>,
    pub(crate) pacientes: PacientesState,
}

impl VisorApp {
    pub fn new(
        settings: Settings,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Self {
        Self {
            settings,
            cmd_tx,
            ui_rx,
            screen: Screen::Login,
            auth: None,
            status: "Iniciando...".to_string(),
            banner: None,
            images: HashMap::new(),
            login: LoginState::default(),
            upload: UploadState::default(),
            viewer: None,
            historial: HistorialState::default(),
            segmentaciones: None,
            modelos: None,
            pacientes: PacientesState::default(),
        }
    }

    pub(crate) fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    /// Fetches a backend image into the cache unless already requested.
    pub(crate) fn request_image(&mut self, path: &str) {
        if self.images.contains_key(path) {
            return;
        }
        self.images.insert(path.to_string(), ImageState::Loading);
        self.dispatch(BackendCommand::FetchImage {
            path: path.to_string(),
        });
    }

    /// Draws a cached backend image at thumbnail size, with a spinner while
    /// it loads.
    pub(crate) fn static_image(
        &mut self,
        ui: &mut egui::Ui,
        path: &str,
        max_size: egui::Vec2,
        alt: &str,
    ) {
        self.request_image(path);
        match self.images.get_mut(path) {
            Some(ImageState::Ready(loaded)) => {
                if loaded.texture.is_none() {
                    let color = ColorImage::from_rgba_unmultiplied(
                        [loaded.width, loaded.height],
                        &loaded.rgba,
                    );
                    loaded.texture =
                        Some(ui.ctx().load_texture(path.to_string(), color, TextureOptions::LINEAR));
                }
                if let Some(texture) = &loaded.texture {
                    ui.add(egui::Image::new(texture).max_size(max_size));
                }
            }
            Some(ImageState::Failed(_)) => {
                ui.weak(format!("({alt} no disponible)"));
            }
            _ => {
                ui.add(egui::Spinner::new());
            }
        }
    }

    pub(crate) fn goto_historial(&mut self) {
        self.screen = Screen::Historial;
        self.refresh_historial();
    }

    pub(crate) fn refresh_historial(&mut self) {
        self.historial.loading = true;
        self.dispatch(BackendCommand::ListHistorial);
    }

    pub(crate) fn goto_pacientes(&mut self) {
        self.screen = Screen::Pacientes;
        self.refresh_pacientes();
    }

    pub(crate) fn refresh_pacientes(&mut self) {
        self.pacientes.loading = true;
        self.dispatch(BackendCommand::ListPacientes);
    }

    pub(crate) fn goto_segmentaciones(&mut self, session_id: SessionId) {
        self.segmentaciones = Some(SegScreenState::new(session_id.clone()));
        self.screen = Screen::Segmentaciones;
        self.dispatch(BackendCommand::ListSegmentaciones { session_id });
    }

    pub(crate) fn goto_modelos(&mut self, session_id: SessionId) {
        self.modelos = Some(ModelosState::new(session_id.clone()));
        self.screen = Screen::Modelos;
        self.dispatch(BackendCommand::ListModelos { session_id });
    }

    fn logout(&mut self) {
        self.dispatch(BackendCommand::Logout);
        self.auth = None;
        self.reset_session_state();
        self.login = LoginState::default();
        self.banner = None;
        self.screen = Screen::Login;
        self.status = "Sesión cerrada".to_string();
    }

    fn reset_session_state(&mut self) {
        self.viewer = None;
        self.segmentaciones = None;
        self.modelos = None;
        self.historial = HistorialState::default();
        self.pacientes = PacientesState::default();
        self.upload = UploadState::default();
        self.images.clear();
    }

    fn note_error(&mut self, err: &UiError) {
        tracing::warn!(
            category = ?err.category(),
            context = ?err.context(),
            "backend error: {}",
            err.message()
        );
        if err.requires_reauth() {
            self.auth = None;
            self.reset_session_state();
            self.login.busy = false;
            self.screen = Screen::Login;
            self.banner = Some((
                BannerKind::Warning,
                "La sesión ha caducado. Inicie sesión de nuevo.".to_string(),
            ));
        } else {
            let kind = match err.category() {
                UiErrorCategory::Conflict => BannerKind::Warning,
                _ => BannerKind::Error,
            };
            self.banner = Some((kind, err.message().to_string()));
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::WorkerInfo(text) => self.status = text,
            UiEvent::Error(err) => self.note_error(&err),

            UiEvent::LoginDone(result) => {
                self.login.busy = false;
                match result {
                    Ok(session) => {
                        tracing::info!(user_id = %session.user_id, "login ok");
                        self.auth = Some(session);
                        self.banner = None;
                        self.login = LoginState::default();
                        self.screen = Screen::Dashboard;
                        self.status = "Sesión iniciada".to_string();
                    }
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::RegisterDone(result) => {
                self.login.busy = false;
                match result {
                    Ok(message) => {
                        self.login.mode = AuthMode::Login;
                        self.login.password.clear();
                        self.login.confirm.clear();
                        self.login.notice = Some(message);
                    }
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::UploadDone(result) => match result {
                Ok(series) => {
                    self.upload.progress.finish();
                    self.upload.picked = None;
                    self.upload.error = None;
                    if let Some(message) = &series.message {
                        self.status = message.clone();
                    }
                    if series.frames.is_empty() {
                        // Older upload responses omit the frame list; the
                        // mapping document has it.
                        self.historial.abriendo = Some(series.session_id.clone());
                        self.dispatch(BackendCommand::LoadSeries {
                            session_id: series.session_id,
                            origin: ViewerOrigin::Upload,
                        });
                    } else {
                        self.open_viewer(series.session_id, series.frames, ViewerOrigin::Upload);
                    }
                }
                Err(err) => {
                    self.upload.progress.fail();
                    self.note_error(&err);
                }
            },

            UiEvent::SeriesLoaded {
                session_id,
                origin,
                result,
            } => {
                if self.historial.abriendo.as_ref() == Some(&session_id) {
                    self.historial.abriendo = None;
                }
                match result {
                    Ok(frames) => self.open_viewer(session_id, frames, origin),
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::ImageLoaded { path, result } => {
                let state = match result {
                    Ok(decoded) => ImageState::Ready(LoadedImage {
                        width: decoded.width,
                        height: decoded.height,
                        rgba: decoded.rgba,
                        texture: None,
                    }),
                    Err(reason) => {
                        tracing::warn!(path, "image fetch failed: {reason}");
                        ImageState::Failed(reason)
                    }
                };
                self.images.insert(path, state);
            }

            UiEvent::Seg2dDone {
                session_id,
                image_name,
                result,
            } => {
                let Some(viewer) = self.viewer.as_mut() else {
                    return;
                };
                if viewer.session.session_id() != &session_id
                    || viewer.seg2d_target.as_deref() != Some(image_name.as_str())
                {
                    tracing::debug!("dropping stale 2-D segmentation answer");
                    return;
                }
                viewer.seg2d_target = None;
                match result {
                    Ok(seg) => {
                        viewer.seg2d.finish();
                        viewer.seg2d_result = Some(Seg2dResultView { image_name, seg });
                    }
                    Err(err) => {
                        viewer.seg2d.fail();
                        self.note_error(&err);
                    }
                }
            }

            UiEvent::Seg3dDone { session_id, result } => {
                let Some(viewer) = self.viewer.as_mut() else {
                    return;
                };
                if viewer.session.session_id() != &session_id {
                    tracing::debug!("dropping stale 3-D segmentation answer");
                    return;
                }
                match result {
                    Ok(Seg3dOutcome::Creada(creada)) => {
                        viewer.seg3d.finish();
                        let message = creada
                            .message
                            .unwrap_or_else(|| "Segmentación 3D completada".to_string());
                        self.banner = Some((BannerKind::Success, message));
                        self.goto_segmentaciones(session_id);
                    }
                    Ok(Seg3dOutcome::Aviso(text)) => {
                        viewer.seg3d.fail();
                        self.banner = Some((BannerKind::Warning, text));
                    }
                    Err(err) => {
                        viewer.seg3d.fail();
                        self.note_error(&err);
                    }
                }
            }

            UiEvent::HistorialLoaded(result) => {
                self.historial.loading = false;
                match result {
                    Ok(rows) => {
                        self.historial.rows = Some(rows);
                        self.historial.last_refresh = Some(chrono::Local::now());
                    }
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::SerieDeleted { session_id, result } => {
                if self.historial.deleting.as_ref() == Some(&session_id) {
                    self.historial.deleting = None;
                }
                match result {
                    Ok(()) => {
                        self.status = "Serie eliminada".to_string();
                        self.refresh_historial();
                    }
                    Err(err) if err.category() == UiErrorCategory::Conflict => {
                        self.historial.conflict = Some(ConflictDialog {
                            session_id,
                            detail: err.message().to_string(),
                        });
                    }
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::Seg2dListLoaded { session_id, result } => {
                let Some(segs) = self.segmentaciones.as_mut() else {
                    return;
                };
                if segs.session_id != session_id {
                    return;
                }
                segs.loading2d = false;
                match result {
                    Ok(rows) => segs.seg2d = Some(rows),
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::Seg3dListLoaded { session_id, result } => {
                let Some(segs) = self.segmentaciones.as_mut() else {
                    return;
                };
                if segs.session_id != session_id {
                    return;
                }
                segs.loading3d = false;
                match result {
                    Ok(rows) => segs.seg3d = Some(rows),
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::Seg2dDeleted { session_id, result } => match result {
                Ok(()) => {
                    self.status = "Segmentación eliminada".to_string();
                    self.reload_segmentaciones(&session_id);
                }
                Err(err) => self.note_error(&err),
            },

            UiEvent::Seg3dDeleted { session_id, result } => match result {
                Ok(()) => {
                    self.status = "Segmentación 3D eliminada".to_string();
                    self.reload_segmentaciones(&session_id);
                }
                Err(err) => self.note_error(&err),
            },

            UiEvent::StlExported { session_id, result } => {
                if let Some(segs) = self.segmentaciones.as_mut() {
                    segs.exportando = None;
                }
                match result {
                    Ok(exportado) => {
                        let message = exportado
                            .message
                            .clone()
                            .unwrap_or_else(|| "Modelo STL exportado".to_string());
                        self.banner = Some((BannerKind::Success, message));
                        self.goto_modelos(session_id);
                    }
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::ModelosLoaded { session_id, result } => {
                let Some(modelos) = self.modelos.as_mut() else {
                    return;
                };
                if modelos.session_id != session_id {
                    return;
                }
                modelos.loading = false;
                match result {
                    Ok(rows) => modelos.rows = Some(rows),
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::ModeloDeleted { result } => match result {
                Ok(()) => {
                    self.status = "Modelo eliminado".to_string();
                    let session_id = self.modelos.as_ref().map(|m| m.session_id.clone());
                    if let Some(session_id) = session_id {
                        if let Some(modelos) = self.modelos.as_mut() {
                            modelos.loading = true;
                        }
                        self.dispatch(BackendCommand::ListModelos { session_id });
                    }
                }
                Err(err) => self.note_error(&err),
            },

            UiEvent::StlSaved { result } => {
                if let Some(modelos) = self.modelos.as_mut() {
                    modelos.descargando = false;
                }
                match result {
                    Ok(path) => self.status = format!("Modelo guardado en {}", path.display()),
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::PacientesLoaded(result) => {
                self.pacientes.loading = false;
                match result {
                    Ok(rows) => self.pacientes.rows = Some(rows),
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::PacienteSaved { result } => {
                self.pacientes.saving = false;
                match result {
                    Ok(message) => {
                        self.pacientes.form = None;
                        self.status = message;
                        self.refresh_pacientes();
                    }
                    Err(err) => {
                        // Validation failures stay inline in the dialog.
                        if let Some(form) = self.pacientes.form.as_mut() {
                            form.error = Some(err.message().to_string());
                        }
                        if err.requires_reauth() {
                            self.note_error(&err);
                        }
                    }
                }
            }

            UiEvent::PacienteDeleted { result } => match result {
                Ok(()) => {
                    self.status = "Paciente eliminado".to_string();
                    self.refresh_pacientes();
                }
                Err(err) => self.note_error(&err),
            },

            UiEvent::EstudiosLoaded { paciente, result } => {
                let Some(modal) = self.pacientes.estudios.as_mut() else {
                    return;
                };
                if modal.paciente != paciente {
                    return;
                }
                modal.loading = false;
                match result {
                    Ok(rows) => modal.estudios = Some(rows),
                    Err(err) => self.note_error(&err),
                }
            }

            UiEvent::EstudioLinked { paciente, result } => {
                let modal_open = self
                    .pacientes
                    .estudios
                    .as_ref()
                    .is_some_and(|modal| modal.paciente == paciente);
                match result {
                    Ok(()) => {
                        self.status = "Estudio vinculado".to_string();
                        if let Some(modal) = self.pacientes.estudios.as_mut() {
                            if modal.paciente == paciente {
                                modal.vinculando = false;
                                modal.session_input.clear();
                                modal.descripcion_input.clear();
                                modal.error = None;
                                modal.loading = true;
                            }
                        }
                        if modal_open {
                            self.dispatch(BackendCommand::ListEstudios { paciente });
                        }
                    }
                    Err(err) => {
                        if let Some(modal) = self.pacientes.estudios.as_mut() {
                            if modal.paciente == paciente {
                                modal.vinculando = false;
                                modal.error = Some(err.message().to_string());
                            }
                        }
                        if err.requires_reauth() {
                            self.note_error(&err);
                        }
                    }
                }
            }

            UiEvent::EstudioUnlinked { paciente, result } => {
                let modal_open = self
                    .pacientes
                    .estudios
                    .as_ref()
                    .is_some_and(|modal| modal.paciente == paciente);
                match result {
                    Ok(()) => {
                        self.status = "Estudio desvinculado".to_string();
                        if modal_open {
                            self.dispatch(BackendCommand::ListEstudios { paciente });
                        }
                    }
                    Err(err) => {
                        if let Some(modal) = self.pacientes.estudios.as_mut() {
                            if modal.paciente == paciente {
                                modal.loading = false;
                            }
                        }
                        self.note_error(&err);
                    }
                }
            }
        }
    }

    fn open_viewer(&mut self, session_id: SessionId, frames: Vec<String>, origin: ViewerOrigin) {
        let session = ViewerSession::new(session_id, frames, origin);
        self.viewer = Some(ViewerScreenState::new(session));
        self.screen = Screen::Viewer;
    }

    fn reload_segmentaciones(&mut self, session_id: &SessionId) {
        let showing = self
            .segmentaciones
            .as_ref()
            .is_some_and(|segs| &segs.session_id == session_id);
        if !showing {
            return;
        }
        if let Some(segs) = self.segmentaciones.as_mut() {
            segs.loading2d = true;
            segs.loading3d = true;
        }
        self.dispatch(BackendCommand::ListSegmentaciones {
            session_id: session_id.clone(),
        });
    }

    fn tick_progress(&mut self) {
        self.upload.progress.tick();
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.seg2d.tick();
            viewer.seg3d.tick();
        }
    }

    fn has_pending_work(&self) -> bool {
        self.upload.progress.in_flight()
            || self
                .viewer
                .as_ref()
                .is_some_and(|v| v.seg2d.in_flight() || v.seg3d.in_flight())
            || self
                .images
                .values()
                .any(|img| matches!(img, ImageState::Loading))
            || self.historial.loading
            || self.historial.abriendo.is_some()
            || self.historial.deleting.is_some()
            || self.pacientes.loading
            || self.pacientes.saving
            || self
                .segmentaciones
                .as_ref()
                .is_some_and(|s| s.loading2d || s.loading3d || s.exportando.is_some())
            || self
                .modelos
                .as_ref()
                .is_some_and(|m| m.loading || m.descargando)
            || self
                .pacientes
                .estudios
                .as_ref()
                .is_some_and(|m| m.loading || m.vinculando)
    }

    fn top_nav(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("nav").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Visor DICOM");
                ui.separator();
                let mut goto: Option<Screen> = None;
                if ui
                    .selectable_label(self.screen == Screen::Dashboard, "Inicio")
                    .clicked()
                {
                    goto = Some(Screen::Dashboard);
                }
                if ui
                    .selectable_label(self.screen == Screen::Upload, "Subir serie")
                    .clicked()
                {
                    goto = Some(Screen::Upload);
                }
                let en_historial = matches!(
                    self.screen,
                    Screen::Historial | Screen::Segmentaciones | Screen::Modelos
                );
                if ui.selectable_label(en_historial, "Historial").clicked() {
                    goto = Some(Screen::Historial);
                }
                if ui
                    .selectable_label(self.screen == Screen::Pacientes, "Pacientes")
                    .clicked()
                {
                    goto = Some(Screen::Pacientes);
                }
                match goto {
                    Some(Screen::Historial) => self.goto_historial(),
                    Some(Screen::Pacientes) => self.goto_pacientes(),
                    Some(screen) => self.screen = screen,
                    None => {}
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Cerrar sesión").clicked() {
                        self.logout();
                    }
                    if let Some(auth) = &self.auth {
                        ui.weak(&auth.nombre_completo);
                    }
                });
            });
        });
    }

    fn banner_strip(&mut self, ctx: &egui::Context) {
        let Some((kind, text)) = self.banner.clone() else {
            return;
        };
        let mut dismissed = false;
        egui::TopBottomPanel::top("banner").show(ctx, |ui| {
            dismissed = widgets::banner(ui, kind, &text);
        });
        if dismissed {
            self.banner = None;
        }
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.weak(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(&self.settings.api_url);
                });
            });
        });
    }
}

impl eframe::App for VisorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.tick_progress();

        if self.auth.is_some() {
            self.top_nav(ctx);
        }
        self.status_bar(ctx);
        self.banner_strip(ctx);

        match self.screen {
            Screen::Login => self.render_login(ctx),
            Screen::Dashboard => self.render_dashboard(ctx),
            Screen::Upload => self.render_upload(ctx),
            Screen::Viewer => self.render_viewer(ctx),
            Screen::Historial => self.render_historial(ctx),
            Screen::Segmentaciones => self.render_segmentaciones(ctx),
            Screen::Modelos => self.render_modelos(ctx),
            Screen::Pacientes => self.render_pacientes(ctx),
        }

        if self.has_pending_work() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
