//! Request and response payloads of the imaging backend.
//!
//! Field names follow the wire exactly, which means the backend's Spanish
//! (`nombre_completo`, `archivodicomid`, ...). Timestamps stay `String`: the
//! backend emits naive `isoformat()` values that no single chrono type
//! accepts, so rendering is left to the caller.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{
    ArchivoDicomId, EstudioId, ModeloId, PacienteId, Seg3dId, SessionId, ThresholdPreset, UserId,
};
use crate::error::PayloadError;

// ---------------------------------------------------------------------------
// Auth

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user_id: UserId,
    pub nombre_completo: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub nombre_completo: String,
    pub email: String,
    pub password: String,
    pub rol: String,
}

/// Generic `{"message": ...}` acknowledgement. A few routes answer with the
/// Spanish key instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(alias = "mensaje")]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Ordered JSON objects

/// JSON object whose entry order is meaningful. The mapping document lists
/// frames in slice order and the measurement table is rendered in the order
/// the backend wrote it, so neither may be sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap {
            entries: Vec::new(),
        }
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        OrderedMap {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(OrderedMap { entries })
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

// ---------------------------------------------------------------------------
// Series upload and mapping

/// Raw body of `POST /upload-dicom-series/`. Two shapes exist in the wild:
/// the current one carries `session_id` and a flat `image_series` path list
/// at the top level, the older one nests both inside `image_series`.
/// [`UploadSeriesResponse::into_series`] reduces either to one shape.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSeriesResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub image_series: Option<ImageSeriesField>,
    #[serde(default)]
    pub mapping_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageSeriesField {
    Paths(Vec<String>),
    Nested(NestedImageSeries),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NestedImageSeries {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub image_series: Vec<String>,
    #[serde(default)]
    pub mapping_url: Option<String>,
}

/// Normalized result of a series upload.
#[derive(Debug, Clone)]
pub struct UploadedSeries {
    pub session_id: SessionId,
    /// Static paths of the rendered frames, in slice order. May be empty.
    pub frames: Vec<String>,
    pub message: Option<String>,
    pub mapping_url: Option<String>,
}

impl UploadSeriesResponse {
    pub fn into_series(self) -> Result<UploadedSeries, PayloadError> {
        let UploadSeriesResponse {
            message,
            session_id,
            image_series,
            mapping_url,
        } = self;
        let (nested_session, nested_mapping, frames) = match image_series {
            Some(ImageSeriesField::Paths(paths)) => (None, None, paths),
            Some(ImageSeriesField::Nested(nested)) => {
                (nested.session_id, nested.mapping_url, nested.image_series)
            }
            None => (None, None, Vec::new()),
        };
        let session_id = session_id
            .or(nested_session)
            .ok_or(PayloadError::MissingSessionId)?;
        Ok(UploadedSeries {
            session_id,
            frames,
            message,
            mapping_url: mapping_url.or(nested_mapping),
        })
    }
}

/// `mapping.json` of a series: PNG file name to source-DICOM metadata, in
/// slice order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SeriesMapping(pub OrderedMap<FrameMeta>);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FrameMeta {
    #[serde(default)]
    pub dicom_name: Option<String>,
    #[serde(default)]
    pub archivodicomid: Option<ArchivoDicomId>,
}

impl SeriesMapping {
    /// Static paths of the frames, in document order.
    pub fn frame_paths(&self, session_id: &SessionId) -> Vec<String> {
        self.0
            .keys()
            .map(|png| format!("/static/series/{session_id}/{png}"))
            .collect()
    }

    pub fn meta_for(&self, png_name: &str) -> Option<&FrameMeta> {
        self.0.get(png_name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Series history

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivoSerie {
    pub archivodicomid: ArchivoDicomId,
    pub nombrearchivo: String,
    #[serde(default)]
    pub rutaarchivo: Option<String>,
    #[serde(default)]
    pub fechacarga: Option<String>,
    #[serde(default)]
    pub sistemaid: Option<i64>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub has_segmentations: bool,
    #[serde(default)]
    pub seg_count: i64,
}

// ---------------------------------------------------------------------------
// 2-D segmentation

/// Body of `POST /segmentar-desde-mapping/`. The route answers 200 even when
/// the pipeline fails, with `{"error": ...}` instead of a result.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Segmentacion2dResponse {
    Fallo { error: String },
    Ok(Segmentacion2d),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Segmentacion2d {
    #[serde(alias = "message")]
    pub mensaje: String,
    pub mask_path: String,
    /// Measurement name to value, in backend order. May itself carry a
    /// single `error` entry when measurement failed after masking succeeded.
    #[serde(default)]
    pub dimensiones: OrderedMap<MedidaValor>,
}

impl Segmentacion2d {
    /// Measurement failure text, if the backend produced a mask but could
    /// not measure it.
    pub fn dimension_error(&self) -> Option<&str> {
        match self.dimensiones.get("error") {
            Some(MedidaValor::Texto(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn medidas(&self) -> impl Iterator<Item = (&str, &MedidaValor)> {
        self.dimensiones.iter().filter(|(name, _)| *name != "error")
    }
}

/// A measurement value: usually a number in millimetre units, occasionally
/// free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MedidaValor {
    Numero(f64),
    Texto(String),
}

impl fmt::Display for MedidaValor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedidaValor::Numero(value) => write!(f, "{value:.2}"),
            MedidaValor::Texto(text) => f.write_str(text),
        }
    }
}

/// Stored 2-D segmentation of one frame, as listed by
/// `GET /historial/series/{id}/segmentaciones`.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentacionGuardada {
    pub archivodicomid: ArchivoDicomId,
    #[serde(default)]
    pub segmentacionid: Option<i64>,
    #[serde(default)]
    pub altura: Option<f64>,
    #[serde(default)]
    pub longitud: Option<f64>,
    #[serde(default)]
    pub ancho: Option<f64>,
    #[serde(default)]
    pub volumen: Option<f64>,
    #[serde(default)]
    pub unidad: Option<String>,
    #[serde(default)]
    pub tipoprotesis: Option<String>,
    #[serde(default)]
    pub mask_path: Option<String>,
    #[serde(default)]
    pub fechasegmentacion: Option<String>,
}

// ---------------------------------------------------------------------------
// 3-D segmentation

/// Parameters of `POST /segmentar-serie-3d/`. Exactly one of preset or
/// explicit thresholds is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Seg3dParams {
    Preset(ThresholdPreset),
    Manual { thr_min: f64, thr_max: f64 },
}

impl Seg3dParams {
    /// Form fields for the request body, `session_id` included.
    pub fn form_fields(&self, session_id: &SessionId) -> Vec<(&'static str, String)> {
        let mut fields = vec![("session_id", session_id.to_string())];
        match self {
            Seg3dParams::Preset(preset) => {
                fields.push(("preset", preset.form_value().to_string()));
            }
            Seg3dParams::Manual { thr_min, thr_max } => {
                fields.push(("thr_min", thr_min.to_string()));
                fields.push(("thr_max", thr_max.to_string()));
            }
        }
        fields
    }
}

/// Body of `POST /segmentar-serie-3d/`. Success carries the new record; a
/// threshold window that selects no voxels still answers 200, with a
/// warning and no record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Seg3dResponse {
    Fallo {
        error: String,
    },
    Creada(Seg3dCreada),
    Aviso {
        #[serde(alias = "mensaje", alias = "warning")]
        message: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Seg3dCreada {
    #[serde(default, alias = "mensaje")]
    pub message: Option<String>,
    pub seg3d_id: Seg3dId,
    #[serde(default)]
    pub volume_mm3: Option<f64>,
    #[serde(default)]
    pub surface_mm2: Option<f64>,
    #[serde(default)]
    pub thumbs: Option<Seg3dThumbs>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seg3dThumbs {
    #[serde(default)]
    pub axial: Option<String>,
    #[serde(default)]
    pub sagittal: Option<String>,
    #[serde(default)]
    pub coronal: Option<String>,
}

/// Stored 3-D segmentation, as listed by
/// `GET /historial/series/{id}/segmentaciones-3d`.
#[derive(Debug, Clone, Deserialize)]
pub struct Seg3dRegistro {
    pub id: Seg3dId,
    #[serde(default)]
    pub n_slices: Option<i64>,
    #[serde(default)]
    pub volume_mm3: Option<f64>,
    #[serde(default)]
    pub surface_mm2: Option<f64>,
    #[serde(default)]
    pub bbox_x_mm: Option<f64>,
    #[serde(default)]
    pub bbox_y_mm: Option<f64>,
    #[serde(default)]
    pub bbox_z_mm: Option<f64>,
    #[serde(default)]
    pub mask_npy_path: Option<String>,
    #[serde(default)]
    pub thumb_axial: Option<String>,
    #[serde(default)]
    pub thumb_sagittal: Option<String>,
    #[serde(default)]
    pub thumb_coronal: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Seg3dRegistro {
    /// Labelled thumbnail paths, skipping planes the backend did not render.
    pub fn thumbs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("Axial", self.thumb_axial.as_deref()),
            ("Sagital", self.thumb_sagittal.as_deref()),
            ("Coronal", self.thumb_coronal.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, path)| path.map(|p| (label, p)))
    }
}

// ---------------------------------------------------------------------------
// STL export and 3-D models

#[derive(Debug, Clone, Deserialize)]
pub struct Modelo3d {
    pub id: ModeloId,
    #[serde(default)]
    pub seg3d_id: Option<Seg3dId>,
    pub path_stl: String,
    #[serde(default)]
    pub num_vertices: Option<i64>,
    #[serde(default)]
    pub num_caras: Option<i64>,
    #[serde(default)]
    pub file_size_bytes: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Modelo3d {
    /// File name component of the STL path, used as the default name when
    /// saving the download.
    pub fn file_name(&self) -> &str {
        self.path_stl
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("modelo.stl")
    }
}

/// Body of `POST /series/{id}/export-stl`: the stored model plus an
/// acknowledgement message.
#[derive(Debug, Clone, Deserialize)]
pub struct StlExportado {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub modelo: Modelo3d,
}

// ---------------------------------------------------------------------------
// Patients

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paciente {
    pub id: PacienteId,
    pub nombre_completo: String,
    #[serde(default)]
    pub documento: Option<String>,
    #[serde(default)]
    pub tipo_documento: Option<String>,
    #[serde(default)]
    pub fecha_nacimiento: Option<String>,
    #[serde(default)]
    pub edad: Option<i64>,
    #[serde(default)]
    pub sexo: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub ciudad: Option<String>,
    #[serde(default)]
    pub notas: Option<String>,
    #[serde(default)]
    pub fecha_registro: Option<String>,
}

/// Create/update body for a patient. Empty optional fields are omitted
/// rather than sent as empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacienteDraft {
    pub nombre_completo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documento: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_documento: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_nacimiento: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edad: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sexo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciudad: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PacienteCreado {
    #[serde(default)]
    pub message: Option<String>,
    pub id: PacienteId,
}

// ---------------------------------------------------------------------------
// Patient studies (series linked to a patient)

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstudioPaciente {
    pub id: EstudioId,
    #[serde(default)]
    pub paciente_id: Option<PacienteId>,
    pub session_id: SessionId,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub fecha_estudio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstudioDraft {
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_response_flat_shape_normalizes() {
        let raw: UploadSeriesResponse = serde_json::from_str(
            r#"{
                "message": "Serie procesada",
                "session_id": "serie-1",
                "image_series": ["/static/series/serie-1/image_0.png",
                                 "/static/series/serie-1/image_1.png"],
                "mapping_url": "/static/series/serie-1/mapping.json"
            }"#,
        )
        .unwrap();
        let series = raw.into_series().unwrap();
        assert_eq!(series.session_id.as_str(), "serie-1");
        assert_eq!(series.frames.len(), 2);
        assert_eq!(
            series.mapping_url.as_deref(),
            Some("/static/series/serie-1/mapping.json")
        );
    }

    #[test]
    fn upload_response_nested_legacy_shape_normalizes() {
        let raw: UploadSeriesResponse = serde_json::from_str(
            r#"{
                "message": "ok",
                "image_series": {
                    "session_id": "serie-2",
                    "image_series": ["/static/series/serie-2/image_0.png"]
                }
            }"#,
        )
        .unwrap();
        let series = raw.into_series().unwrap();
        assert_eq!(series.session_id.as_str(), "serie-2");
        assert_eq!(series.frames, vec!["/static/series/serie-2/image_0.png"]);
    }

    #[test]
    fn upload_response_without_session_id_is_rejected() {
        let raw: UploadSeriesResponse =
            serde_json::from_str(r#"{"message": "ok", "image_series": []}"#).unwrap();
        assert_eq!(
            raw.into_series().unwrap_err(),
            PayloadError::MissingSessionId
        );
    }

    #[test]
    fn mapping_preserves_document_order() {
        // Lexicographic order would put image_10 before image_2.
        let mapping: SeriesMapping = serde_json::from_str(
            r#"{
                "image_2.png": {"dicom_name": "c.dcm", "archivodicomid": 3},
                "image_10.png": {"dicom_name": "k.dcm", "archivodicomid": 11},
                "image_1.png": {"dicom_name": "b.dcm", "archivodicomid": 2}
            }"#,
        )
        .unwrap();
        let paths = mapping.frame_paths(&SessionId::from("s9"));
        assert_eq!(
            paths,
            vec![
                "/static/series/s9/image_2.png",
                "/static/series/s9/image_10.png",
                "/static/series/s9/image_1.png",
            ]
        );
        assert_eq!(
            mapping.meta_for("image_10.png").unwrap().archivodicomid,
            Some(ArchivoDicomId(11))
        );
    }

    #[test]
    fn segmentation_response_splits_error_from_result() {
        let failed: Segmentacion2dResponse =
            serde_json::from_str(r#"{"error": "imagen no encontrada"}"#).unwrap();
        assert!(matches!(failed, Segmentacion2dResponse::Fallo { error } if error.contains("imagen")));

        let ok: Segmentacion2dResponse = serde_json::from_str(
            r#"{
                "mensaje": "Segmentación completada",
                "mask_path": "/static/series/s1/masks/image_0_mask.png",
                "dimensiones": {"altura_mm": 41.25, "volumen_mm3": 1532.8, "unidad": "mm"}
            }"#,
        )
        .unwrap();
        let Segmentacion2dResponse::Ok(seg) = ok else {
            panic!("expected success payload");
        };
        assert_eq!(seg.mask_path, "/static/series/s1/masks/image_0_mask.png");
        assert_eq!(seg.dimension_error(), None);
        let medidas: Vec<(&str, String)> = seg
            .medidas()
            .map(|(name, value)| (name, value.to_string()))
            .collect();
        assert_eq!(
            medidas,
            vec![
                ("altura_mm", "41.25".to_string()),
                ("volumen_mm3", "1532.80".to_string()),
                ("unidad", "mm".to_string()),
            ]
        );
    }

    #[test]
    fn measurement_error_entry_is_surfaced() {
        let seg: Segmentacion2d = serde_json::from_str(
            r#"{
                "mensaje": "Segmentación completada",
                "mask_path": "/static/x.png",
                "dimensiones": {"error": "sin contorno cerrado"}
            }"#,
        )
        .unwrap();
        assert_eq!(seg.dimension_error(), Some("sin contorno cerrado"));
        assert_eq!(seg.medidas().count(), 0);
    }

    #[test]
    fn seg3d_response_distinguishes_created_warning_and_error() {
        let created: Seg3dResponse = serde_json::from_str(
            r#"{
                "message": "Segmentación 3D completada",
                "seg3d_id": 42,
                "volume_mm3": 10250.5,
                "surface_mm2": 2210.0,
                "thumbs": {"axial": "/static/a.png", "sagittal": "/static/s.png", "coronal": "/static/c.png"}
            }"#,
        )
        .unwrap();
        assert!(
            matches!(created, Seg3dResponse::Creada(ref c) if c.seg3d_id == Seg3dId(42)
                && c.thumbs.as_ref().and_then(|t| t.axial.as_deref()) == Some("/static/a.png"))
        );

        let warned: Seg3dResponse = serde_json::from_str(
            r#"{"warning": "El umbral no seleccionó ningún vóxel"}"#,
        )
        .unwrap();
        assert!(matches!(warned, Seg3dResponse::Aviso { ref message } if message.contains("vóxel")));

        let failed: Seg3dResponse =
            serde_json::from_str(r#"{"error": "serie incompleta"}"#).unwrap();
        assert!(matches!(failed, Seg3dResponse::Fallo { .. }));
    }

    #[test]
    fn seg3d_params_build_expected_form_fields() {
        let session = SessionId::from("s3");
        let preset = Seg3dParams::Preset(ThresholdPreset::Hueso).form_fields(&session);
        assert_eq!(
            preset,
            vec![
                ("session_id", "s3".to_string()),
                ("preset", "hueso".to_string()),
            ]
        );

        let manual = Seg3dParams::Manual {
            thr_min: 300.0,
            thr_max: 1500.0,
        }
        .form_fields(&session);
        assert_eq!(manual[0], ("session_id", "s3".to_string()));
        assert_eq!(manual[1], ("thr_min", "300".to_string()));
        assert_eq!(manual[2], ("thr_max", "1500".to_string()));
    }

    #[test]
    fn stl_export_response_flattens_model_fields() {
        let exported: StlExportado = serde_json::from_str(
            r#"{
                "message": "STL generado",
                "id": 7,
                "seg3d_id": 42,
                "path_stl": "/static/series/s1/stl/seg42.stl",
                "num_vertices": 120034,
                "num_caras": 240060,
                "file_size_bytes": 6001700,
                "created_at": "2025-03-01T10:02:11"
            }"#,
        )
        .unwrap();
        assert_eq!(exported.modelo.id, ModeloId(7));
        assert_eq!(exported.modelo.file_name(), "seg42.stl");
    }

    #[test]
    fn patient_draft_omits_empty_optionals() {
        let draft = PacienteDraft {
            nombre_completo: "Ana Pérez".to_string(),
            documento: Some("123".to_string()),
            ..PacienteDraft::default()
        };
        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(body["nombre_completo"], "Ana Pérez");
        assert_eq!(body["documento"], "123");
        assert!(body.get("telefono").is_none());
        assert!(body.get("edad").is_none());
    }
}
