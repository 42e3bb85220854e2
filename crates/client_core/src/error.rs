use reqwest::StatusCode;
use shared::error::PayloadError;
use thiserror::Error;

/// Failure of one backend call.
///
/// The split matters to the UI: transport failures invite a retry, 401/403
/// drop the session, the series-delete conflict opens the guided dialog, and
/// [`ApiError::Backend`] carries the processing failures the backend reports
/// inside 2xx bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),
    #[error("server rejected the request ({status}): {detail}")]
    Status { status: StatusCode, detail: String },
    #[error("series still has segmentations: {detail}")]
    SeriesHasSegmentations { detail: String },
    #[error("backend reported a processing failure: {detail}")]
    Backend { detail: String },
    #[error("unexpected response shape: {0}")]
    Decode(String),
    #[error("no user session, log in first")]
    NotLoggedIn,
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }
}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl ApiError {
    /// True when the server no longer accepts this user session.
    pub fn is_auth(&self) -> bool {
        match self {
            ApiError::NotLoggedIn => true,
            ApiError::Status { status, .. } => {
                *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
            }
            _ => false,
        }
    }

    /// Spanish rendering for screens and banners. Backend-authored detail
    /// text is passed through untouched.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => {
                "No se pudo conectar con el servidor. Verifique que el backend esté en ejecución."
                    .to_string()
            }
            ApiError::Status { detail, .. } => detail.clone(),
            ApiError::SeriesHasSegmentations { detail } => detail.clone(),
            ApiError::Backend { detail } => detail.clone(),
            ApiError::Decode(_) => "El servidor devolvió una respuesta inesperada.".to_string(),
            ApiError::NotLoggedIn => "La sesión ha expirado. Inicie sesión nuevamente.".to_string(),
            ApiError::Url(_) => "La URL del servidor no es válida.".to_string(),
        }
    }
}
