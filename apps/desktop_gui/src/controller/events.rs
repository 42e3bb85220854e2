//! Backend-to-UI events and error modeling for the desktop controller.

use std::path::PathBuf;

use client_core::{ApiError, Seg3dOutcome};
use shared::domain::{PacienteId, SessionId, UserId};
use shared::protocol::{
    ArchivoSerie, EstudioPaciente, Modelo3d, Paciente, Seg3dRegistro, Segmentacion2d,
    SegmentacionGuardada, StlExportado, UploadedSeries,
};

use crate::viewer::session::ViewerOrigin;

/// The logged-in user as reported by the backend.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: UserId,
    pub nombre_completo: String,
    pub email: String,
}

/// RGBA pixels decoded off the UI thread, ready for texture upload.
pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub enum UiEvent {
    WorkerInfo(String),
    Error(UiError),
    LoginDone(Result<AuthSession, UiError>),
    RegisterDone(Result<String, UiError>),
    UploadDone(Result<UploadedSeries, UiError>),
    SeriesLoaded {
        session_id: SessionId,
        origin: ViewerOrigin,
        result: Result<Vec<String>, UiError>,
    },
    ImageLoaded {
        path: String,
        result: Result<DecodedImage, String>,
    },
    Seg2dDone {
        session_id: SessionId,
        image_name: String,
        result: Result<Segmentacion2d, UiError>,
    },
    Seg3dDone {
        session_id: SessionId,
        result: Result<Seg3dOutcome, UiError>,
    },
    HistorialLoaded(Result<Vec<ArchivoSerie>, UiError>),
    SerieDeleted {
        session_id: SessionId,
        result: Result<(), UiError>,
    },
    Seg2dListLoaded {
        session_id: SessionId,
        result: Result<Vec<SegmentacionGuardada>, UiError>,
    },
    Seg3dListLoaded {
        session_id: SessionId,
        result: Result<Vec<Seg3dRegistro>, UiError>,
    },
    Seg2dDeleted {
        session_id: SessionId,
        result: Result<(), UiError>,
    },
    Seg3dDeleted {
        session_id: SessionId,
        result: Result<(), UiError>,
    },
    StlExported {
        session_id: SessionId,
        result: Result<StlExportado, UiError>,
    },
    ModelosLoaded {
        session_id: SessionId,
        result: Result<Vec<Modelo3d>, UiError>,
    },
    ModeloDeleted {
        result: Result<(), UiError>,
    },
    StlSaved {
        result: Result<PathBuf, UiError>,
    },
    PacientesLoaded(Result<Vec<Paciente>, UiError>),
    PacienteSaved {
        result: Result<String, UiError>,
    },
    PacienteDeleted {
        result: Result<(), UiError>,
    },
    EstudiosLoaded {
        paciente: PacienteId,
        result: Result<Vec<EstudioPaciente>, UiError>,
    },
    EstudioLinked {
        paciente: PacienteId,
        result: Result<(), UiError>,
    },
    EstudioUnlinked {
        paciente: PacienteId,
        result: Result<(), UiError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    /// The operation is blocked by dependent records (e.g. a series that
    /// still has segmentations).
    Conflict,
    /// The backend accepted the request but its pipeline reported a failure.
    Backend,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Login,
    Register,
    Upload,
    LoadSeries,
    Viewer,
    Segmentacion,
    Historial,
    Segmentaciones,
    Modelos,
    Pacientes,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn new(
        category: UiErrorCategory,
        context: UiErrorContext,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            context,
            message: message.into(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self::new(UiErrorCategory::Unknown, context, message)
    }

    pub fn from_api(context: UiErrorContext, err: &ApiError) -> Self {
        let category = if err.is_auth() {
            UiErrorCategory::Auth
        } else {
            match err {
                ApiError::Transport(_) => UiErrorCategory::Transport,
                ApiError::SeriesHasSegmentations { .. } => UiErrorCategory::Conflict,
                ApiError::Backend { .. } => UiErrorCategory::Backend,
                ApiError::Status { status, .. } if status.as_u16() == 422 => {
                    UiErrorCategory::Validation
                }
                ApiError::Url(_) => UiErrorCategory::Validation,
                _ => UiErrorCategory::Unknown,
            }
        };
        Self::new(category, context, err.user_message())
    }

    /// Auth failures drop the app back to the login screen.
    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_force_reauth() {
        let err = UiError::from_api(UiErrorContext::Historial, &ApiError::NotLoggedIn);
        assert_eq!(err.category(), UiErrorCategory::Auth);
        assert!(err.requires_reauth());
    }

    #[test]
    fn backend_failures_keep_their_detail() {
        let err = UiError::from_api(
            UiErrorContext::Segmentacion,
            &ApiError::Backend {
                detail: "No se encontró hueso en la imagen".into(),
            },
        );
        assert_eq!(err.category(), UiErrorCategory::Backend);
        assert!(!err.requires_reauth());
        assert_eq!(err.message(), "No se encontró hueso en la imagen");
    }

    #[test]
    fn series_conflicts_are_flagged_for_guided_cleanup() {
        let err = UiError::from_api(
            UiErrorContext::Historial,
            &ApiError::SeriesHasSegmentations {
                detail: "La serie tiene 3 segmentaciones asociadas".into(),
            },
        );
        assert_eq!(err.category(), UiErrorCategory::Conflict);
    }
}
