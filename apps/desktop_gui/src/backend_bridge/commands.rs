//! Backend commands queued from UI to the backend worker.

use std::path::PathBuf;

use shared::domain::{ArchivoDicomId, EstudioId, ModeloId, PacienteId, Seg3dId, SessionId};
use shared::protocol::{EstudioDraft, PacienteDraft, Seg3dParams};

use crate::viewer::session::ViewerOrigin;

pub enum BackendCommand {
    Login {
        email: String,
        password: String,
    },
    Register {
        nombre_completo: String,
        email: String,
        password: String,
    },
    Logout,
    UploadSeries {
        path: PathBuf,
    },
    LoadSeries {
        session_id: SessionId,
        origin: ViewerOrigin,
    },
    FetchImage {
        path: String,
    },
    SegmentFrame {
        session_id: SessionId,
        image_name: String,
    },
    SegmentSeries3d {
        session_id: SessionId,
        params: Seg3dParams,
    },
    ListHistorial,
    DeleteSerie {
        session_id: SessionId,
    },
    ListSegmentaciones {
        session_id: SessionId,
    },
    DeleteSegmentacion {
        session_id: SessionId,
        archivo: ArchivoDicomId,
    },
    DeleteSegmentacion3d {
        session_id: SessionId,
        seg3d: Seg3dId,
    },
    ExportStl {
        session_id: SessionId,
        seg3d: Seg3dId,
    },
    ListModelos {
        session_id: SessionId,
    },
    DeleteModelo {
        modelo: ModeloId,
    },
    DownloadStl {
        path_stl: String,
        target: PathBuf,
    },
    ListPacientes,
    CreatePaciente {
        draft: PacienteDraft,
    },
    UpdatePaciente {
        paciente: PacienteId,
        draft: PacienteDraft,
    },
    DeletePaciente {
        paciente: PacienteId,
    },
    ListEstudios {
        paciente: PacienteId,
    },
    LinkEstudio {
        paciente: PacienteId,
        draft: EstudioDraft,
    },
    UnlinkEstudio {
        paciente: PacienteId,
        estudio: EstudioId,
    },
}

impl BackendCommand {
    /// Stable name for queue/worker log lines.
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Login { .. } => "login",
            BackendCommand::Register { .. } => "register",
            BackendCommand::Logout => "logout",
            BackendCommand::UploadSeries { .. } => "upload_series",
            BackendCommand::LoadSeries { .. } => "load_series",
            BackendCommand::FetchImage { .. } => "fetch_image",
            BackendCommand::SegmentFrame { .. } => "segment_frame",
            BackendCommand::SegmentSeries3d { .. } => "segment_series_3d",
            BackendCommand::ListHistorial => "list_historial",
            BackendCommand::DeleteSerie { .. } => "delete_serie",
            BackendCommand::ListSegmentaciones { .. } => "list_segmentaciones",
            BackendCommand::DeleteSegmentacion { .. } => "delete_segmentacion",
            BackendCommand::DeleteSegmentacion3d { .. } => "delete_segmentacion_3d",
            BackendCommand::ExportStl { .. } => "export_stl",
            BackendCommand::ListModelos { .. } => "list_modelos",
            BackendCommand::DeleteModelo { .. } => "delete_modelo",
            BackendCommand::DownloadStl { .. } => "download_stl",
            BackendCommand::ListPacientes => "list_pacientes",
            BackendCommand::CreatePaciente { .. } => "create_paciente",
            BackendCommand::UpdatePaciente { .. } => "update_paciente",
            BackendCommand::DeletePaciente { .. } => "delete_paciente",
            BackendCommand::ListEstudios { .. } => "list_estudios",
            BackendCommand::LinkEstudio { .. } => "link_estudio",
            BackendCommand::UnlinkEstudio { .. } => "unlink_estudio",
        }
    }
}
