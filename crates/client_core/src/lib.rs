//! Async client of the imaging backend.
//!
//! One method per endpoint, all request/response. The client owns the base
//! URL and, after [`ApiClient::login`], the user id it stamps into the
//! `X-User-Id` header of every authenticated call. It is `Clone` and cheap to
//! share: concurrent tasks may fire requests through the same instance.

use std::sync::{Arc, RwLock};

use reqwest::{multipart, Client, Response, StatusCode};
use shared::domain::{ArchivoDicomId, EstudioId, ModeloId, PacienteId, Seg3dId, SessionId, UserId};
use shared::error::ErrorBody;
use shared::protocol::{
    ArchivoSerie, EstudioDraft, EstudioPaciente, LoginRequest, LoginResponse, MessageResponse,
    Modelo3d, Paciente, PacienteCreado, PacienteDraft, RegisterRequest, Seg3dCreada, Seg3dParams,
    Seg3dRegistro, Seg3dResponse, Segmentacion2d, Segmentacion2dResponse, SegmentacionGuardada,
    SeriesMapping, StlExportado, UploadSeriesResponse, UploadedSeries,
};
use tracing::debug;
use url::Url;

pub mod error;

pub use error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Outcome of a 3-D segmentation request that the server accepted.
#[derive(Debug, Clone)]
pub enum Seg3dOutcome {
    Creada(Seg3dCreada),
    /// The server processed the series but produced nothing, typically a
    /// threshold window that selects no voxels. The text is shown verbatim.
    Aviso(String),
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    user_id: Arc<RwLock<Option<UserId>>>,
}

impl ApiClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
            user_id: Arc::new(RwLock::new(None)),
        }
    }

    /// Parses and validates the configured base URL.
    pub fn from_base_url(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self::new(Url::parse(base_url)?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_id(&self) -> Option<UserId> {
        *self.user_id.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_user(&self, user: Option<UserId>) {
        *self
            .user_id
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = user;
    }

    pub fn logout(&self) {
        self.set_user(None);
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    fn require_user(&self) -> Result<UserId, ApiError> {
        self.user_id().ok_or(ApiError::NotLoggedIn)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ApiError> {
        let user = self.require_user()?;
        Ok(builder.header(USER_ID_HEADER, user.to_string()))
    }

    async fn error_from(response: Response) -> ApiError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message())
            .or_else(|| {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| format!("HTTP {status}"));
        ApiError::Status { status, detail }
    }

    async fn ensure_ok(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    // -- auth ---------------------------------------------------------------

    /// `POST /auth/login`. On success the user id is retained for the
    /// `X-User-Id` header of later calls.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint("/auth/login")?;
        let response = self
            .http
            .post(url)
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let body: LoginResponse = Self::ensure_ok(response).await?.json().await?;
        self.set_user(Some(body.user_id));
        debug!(user_id = body.user_id.0, "login accepted");
        Ok(body)
    }

    /// `POST /auth/register`.
    pub async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint("/auth/register")?;
        let response = self.http.post(url).json(request).send().await?;
        Ok(Self::ensure_ok(response).await?.json().await?)
    }

    // -- series upload and frames -------------------------------------------

    /// `POST /upload-dicom-series/` with the ZIP as a multipart file part.
    /// The response is normalized before it reaches the caller; see
    /// [`UploadSeriesResponse::into_series`].
    pub async fn upload_series(
        &self,
        file_name: &str,
        zip_bytes: Vec<u8>,
    ) -> Result<UploadedSeries, ApiError> {
        let url = self.endpoint("/upload-dicom-series/")?;
        debug!(file_name, bytes = zip_bytes.len(), "uploading series");
        let part = multipart::Part::bytes(zip_bytes)
            .file_name(file_name.to_string())
            .mime_str("application/zip")?;
        let form = multipart::Form::new().part("file", part);
        let response = self.authed(self.http.post(url))?.multipart(form).send().await?;
        let raw: UploadSeriesResponse = Self::ensure_ok(response).await?.json().await?;
        Ok(raw.into_series()?)
    }

    /// `GET /static/series/{id}/mapping.json`, the slice-ordered frame index
    /// of a series.
    pub async fn fetch_mapping(&self, session_id: &SessionId) -> Result<SeriesMapping, ApiError> {
        let url = self.endpoint(&format!("/static/series/{session_id}/mapping.json"))?;
        let response = self.http.get(url).send().await?;
        Ok(Self::ensure_ok(response).await?.json().await?)
    }

    /// Fetches a static asset (frame, mask, thumbnail, STL) by the path the
    /// backend reported.
    pub async fn fetch_static(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(path)?;
        let response = self.http.get(url).send().await?;
        let bytes = Self::ensure_ok(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    // -- series history -----------------------------------------------------

    /// `GET /historial/archivos`, one row per uploaded series.
    pub async fn list_historial(&self) -> Result<Vec<ArchivoSerie>, ApiError> {
        let url = self.endpoint("/historial/archivos")?;
        let response = self.authed(self.http.get(url))?.send().await?;
        Ok(Self::ensure_ok(response).await?.json().await?)
    }

    /// `DELETE /historial/series/{id}`. A 409 means the series still has
    /// segmentations and becomes [`ApiError::SeriesHasSegmentations`] so the
    /// caller can walk the user through deleting those first.
    pub async fn delete_serie(&self, session_id: &SessionId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/historial/series/{session_id}"))?;
        let response = self.authed(self.http.delete(url))?.send().await?;
        if response.status() == StatusCode::CONFLICT {
            return match Self::error_from(response).await {
                ApiError::Status { detail, .. } => Err(ApiError::SeriesHasSegmentations { detail }),
                other => Err(other),
            };
        }
        Self::ensure_ok(response).await?;
        Ok(())
    }

    // -- 2-D segmentation ---------------------------------------------------

    /// `POST /segmentar-desde-mapping/` for one frame of a series. The route
    /// reports pipeline failures inside a 2xx body; those surface as
    /// [`ApiError::Backend`].
    pub async fn segment_frame(
        &self,
        session_id: &SessionId,
        image_name: &str,
    ) -> Result<Segmentacion2d, ApiError> {
        let url = self.endpoint("/segmentar-desde-mapping/")?;
        debug!(%session_id, image_name, "requesting 2-D segmentation");
        let response = self
            .authed(self.http.post(url))?
            .form(&[("session_id", session_id.as_str()), ("image_name", image_name)])
            .send()
            .await?;
        let body: Segmentacion2dResponse = Self::ensure_ok(response).await?.json().await?;
        match body {
            Segmentacion2dResponse::Ok(seg) => Ok(seg),
            Segmentacion2dResponse::Fallo { error } => Err(ApiError::Backend { detail: error }),
        }
    }

    /// `GET /historial/series/{id}/segmentaciones`.
    pub async fn list_segmentaciones(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<SegmentacionGuardada>, ApiError> {
        let url = self.endpoint(&format!("/historial/series/{session_id}/segmentaciones"))?;
        let response = self.authed(self.http.get(url))?.send().await?;
        Ok(Self::ensure_ok(response).await?.json().await?)
    }

    /// `DELETE /historial/series/{id}/segmentaciones/{archivo}`.
    pub async fn delete_segmentacion(
        &self,
        session_id: &SessionId,
        archivo: ArchivoDicomId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!(
            "/historial/series/{session_id}/segmentaciones/{archivo}"
        ))?;
        let response = self.authed(self.http.delete(url))?.send().await?;
        Self::ensure_ok(response).await?;
        Ok(())
    }

    // -- 3-D segmentation ---------------------------------------------------

    /// `POST /segmentar-serie-3d/` over the whole series.
    pub async fn segment_series_3d(
        &self,
        session_id: &SessionId,
        params: &Seg3dParams,
    ) -> Result<Seg3dOutcome, ApiError> {
        let url = self.endpoint("/segmentar-serie-3d/")?;
        debug!(%session_id, ?params, "requesting 3-D segmentation");
        let response = self
            .authed(self.http.post(url))?
            .form(&params.form_fields(session_id))
            .send()
            .await?;
        let body: Seg3dResponse = Self::ensure_ok(response).await?.json().await?;
        match body {
            Seg3dResponse::Creada(creada) => Ok(Seg3dOutcome::Creada(creada)),
            Seg3dResponse::Aviso { message } => Ok(Seg3dOutcome::Aviso(message)),
            Seg3dResponse::Fallo { error } => Err(ApiError::Backend { detail: error }),
        }
    }

    /// `GET /historial/series/{id}/segmentaciones-3d`.
    pub async fn list_segmentaciones_3d(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Seg3dRegistro>, ApiError> {
        let url = self.endpoint(&format!("/historial/series/{session_id}/segmentaciones-3d"))?;
        let response = self.authed(self.http.get(url))?.send().await?;
        Ok(Self::ensure_ok(response).await?.json().await?)
    }

    /// `DELETE /historial/series/{id}/segmentaciones-3d/{seg3d}`.
    pub async fn delete_segmentacion_3d(
        &self,
        session_id: &SessionId,
        seg3d: Seg3dId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!(
            "/historial/series/{session_id}/segmentaciones-3d/{seg3d}"
        ))?;
        let response = self.authed(self.http.delete(url))?.send().await?;
        Self::ensure_ok(response).await?;
        Ok(())
    }

    // -- STL export and models ----------------------------------------------

    /// `POST /series/{id}/export-stl` with `seg3d_id` as a form field.
    pub async fn export_stl(
        &self,
        session_id: &SessionId,
        seg3d: Seg3dId,
    ) -> Result<StlExportado, ApiError> {
        let url = self.endpoint(&format!("/series/{session_id}/export-stl"))?;
        debug!(%session_id, seg3d_id = seg3d.0, "exporting STL");
        let form = multipart::Form::new().text("seg3d_id", seg3d.to_string());
        let response = self.authed(self.http.post(url))?.multipart(form).send().await?;
        Ok(Self::ensure_ok(response).await?.json().await?)
    }

    /// `GET /series/{id}/modelos3d`.
    pub async fn list_modelos(&self, session_id: &SessionId) -> Result<Vec<Modelo3d>, ApiError> {
        let url = self.endpoint(&format!("/series/{session_id}/modelos3d"))?;
        let response = self.authed(self.http.get(url))?.send().await?;
        Ok(Self::ensure_ok(response).await?.json().await?)
    }

    /// `DELETE /series/modelos3d/{id}`.
    pub async fn delete_modelo(&self, modelo: ModeloId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/series/modelos3d/{modelo}"))?;
        let response = self.authed(self.http.delete(url))?.send().await?;
        Self::ensure_ok(response).await?;
        Ok(())
    }

    // -- patients -----------------------------------------------------------

    /// `GET /pacientes/`.
    pub async fn list_pacientes(&self) -> Result<Vec<Paciente>, ApiError> {
        let url = self.endpoint("/pacientes/")?;
        let response = self.authed(self.http.get(url))?.send().await?;
        Ok(Self::ensure_ok(response).await?.json().await?)
    }

    /// `POST /pacientes/`.
    pub async fn create_paciente(&self, draft: &PacienteDraft) -> Result<PacienteCreado, ApiError> {
        let url = self.endpoint("/pacientes/")?;
        let response = self.authed(self.http.post(url))?.json(draft).send().await?;
        Ok(Self::ensure_ok(response).await?.json().await?)
    }

    /// `PUT /pacientes/{id}`.
    pub async fn update_paciente(
        &self,
        paciente: PacienteId,
        draft: &PacienteDraft,
    ) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint(&format!("/pacientes/{paciente}"))?;
        let response = self.authed(self.http.put(url))?.json(draft).send().await?;
        Ok(Self::ensure_ok(response).await?.json().await?)
    }

    /// `DELETE /pacientes/{id}`.
    pub async fn delete_paciente(&self, paciente: PacienteId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/pacientes/{paciente}"))?;
        let response = self.authed(self.http.delete(url))?.send().await?;
        Self::ensure_ok(response).await?;
        Ok(())
    }

    /// `GET /pacientes/{id}/estudios`, the series linked to a patient.
    pub async fn list_estudios(
        &self,
        paciente: PacienteId,
    ) -> Result<Vec<EstudioPaciente>, ApiError> {
        let url = self.endpoint(&format!("/pacientes/{paciente}/estudios"))?;
        let response = self.authed(self.http.get(url))?.send().await?;
        Ok(Self::ensure_ok(response).await?.json().await?)
    }

    /// `POST /pacientes/{id}/estudios`, linking a series to a patient.
    pub async fn link_estudio(
        &self,
        paciente: PacienteId,
        draft: &EstudioDraft,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/pacientes/{paciente}/estudios"))?;
        let response = self.authed(self.http.post(url))?.json(draft).send().await?;
        Self::ensure_ok(response).await?;
        Ok(())
    }

    /// `DELETE /pacientes/estudios/{id}`.
    pub async fn unlink_estudio(&self, estudio: EstudioId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/pacientes/estudios/{estudio}"))?;
        let response = self.authed(self.http.delete(url))?.send().await?;
        Self::ensure_ok(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
