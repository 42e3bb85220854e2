use std::collections::HashMap;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use shared::domain::ThresholdPreset;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

use super::*;

#[derive(Clone)]
struct CaptureState<T> {
    tx: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> CaptureState<T> {
    fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    async fn send(&self, value: T) {
        if let Some(tx) = self.tx.lock().await.take() {
            let _ = tx.send(value);
        }
    }
}

async fn spawn_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn client_for(server_url: &str) -> ApiClient {
    ApiClient::from_base_url(server_url).expect("client")
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

async fn handle_login(Json(_body): Json<Value>) -> Json<Value> {
    Json(json!({
        "message": "Login exitoso",
        "user_id": 7,
        "nombre_completo": "Ana Pérez",
        "email": "ana@clinica.test"
    }))
}

async fn handle_historial(headers: HeaderMap) -> axum::response::Response {
    if header_value(&headers, USER_ID_HEADER).as_deref() != Some("7") {
        return (
            reqwest::StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Usuario no autenticado"})),
        )
            .into_response();
    }
    Json(json!([{
        "archivodicomid": 31,
        "nombrearchivo": "rodilla.zip",
        "rutaarchivo": "/data/series/s1",
        "fechacarga": "2025-02-11T09:30:00",
        "session_id": "s1",
        "has_segmentations": true,
        "seg_count": 2
    }]))
    .into_response()
}

#[tokio::test]
async fn login_stores_user_and_stamps_later_requests() {
    let app = Router::new()
        .route("/auth/login", post(handle_login))
        .route("/historial/archivos", get(handle_historial));
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);

    let login = client.login("ana@clinica.test", "Secreta1!").await.expect("login");
    assert_eq!(login.user_id, UserId(7));
    assert_eq!(client.user_id(), Some(UserId(7)));

    let series = client.list_historial().await.expect("historial");
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].session_id.as_ref().map(|s| s.as_str()), Some("s1"));
    assert!(series[0].has_segmentations);
}

#[tokio::test]
async fn login_failure_surfaces_backend_detail() {
    async fn reject(Json(_): Json<Value>) -> impl IntoResponse {
        (
            reqwest::StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Credenciales incorrectas"})),
        )
    }
    let app = Router::new().route("/auth/login", post(reject));
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);

    let err = client.login("ana@clinica.test", "mala").await.expect_err("must fail");
    match &err {
        ApiError::Status { status, detail } => {
            assert_eq!(*status, StatusCode::UNAUTHORIZED);
            assert_eq!(detail, "Credenciales incorrectas");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_auth());
    assert!(client.user_id().is_none());
}

#[tokio::test]
async fn authenticated_calls_require_login_first() {
    // Port 9 is never contacted: the user check fails before any request.
    let client = client_for("http://127.0.0.1:9");

    assert!(matches!(
        client.list_historial().await.expect_err("no user"),
        ApiError::NotLoggedIn
    ));
    assert!(matches!(
        client.upload_series("serie.zip", vec![1, 2, 3]).await.expect_err("no user"),
        ApiError::NotLoggedIn
    ));
    assert!(matches!(
        client
            .segment_frame(&SessionId::from("s1"), "image_0.png")
            .await
            .expect_err("no user"),
        ApiError::NotLoggedIn
    ));
}

#[derive(Debug, Clone)]
struct CapturedUpload {
    user_header: Option<String>,
    field_name: Option<String>,
    file_name: Option<String>,
    bytes_len: usize,
}

async fn handle_upload(
    State(state): State<CaptureState<CapturedUpload>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut captured = CapturedUpload {
        user_header: header_value(&headers, USER_ID_HEADER),
        field_name: None,
        file_name: None,
        bytes_len: 0,
    };
    while let Some(field) = multipart.next_field().await.expect("field") {
        captured.field_name = field.name().map(|n| n.to_string());
        captured.file_name = field.file_name().map(|n| n.to_string());
        captured.bytes_len = field.bytes().await.expect("bytes").len();
    }
    state.send(captured).await;
    Json(json!({
        "message": "Serie procesada correctamente",
        "session_id": "serie-abc",
        "image_series": [
            "/static/series/serie-abc/image_0.png",
            "/static/series/serie-abc/image_1.png"
        ],
        "mapping_url": "/static/series/serie-abc/mapping.json"
    }))
}

#[tokio::test]
async fn upload_series_sends_multipart_and_parses_flat_shape() {
    let (capture, rx) = CaptureState::new();
    let app = Router::new()
        .route("/upload-dicom-series/", post(handle_upload))
        .with_state(capture);
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);
    client.set_user(Some(UserId(7)));

    let series = client
        .upload_series("rodilla.zip", vec![0u8; 2048])
        .await
        .expect("upload");
    assert_eq!(series.session_id.as_str(), "serie-abc");
    assert_eq!(series.frames.len(), 2);

    let captured = rx.await.expect("captured");
    assert_eq!(captured.user_header.as_deref(), Some("7"));
    assert_eq!(captured.field_name.as_deref(), Some("file"));
    assert_eq!(captured.file_name.as_deref(), Some("rodilla.zip"));
    assert_eq!(captured.bytes_len, 2048);
}

#[tokio::test]
async fn upload_series_parses_legacy_nested_shape() {
    async fn nested(mut multipart: Multipart) -> Json<Value> {
        while let Some(field) = multipart.next_field().await.expect("field") {
            let _ = field.bytes().await;
        }
        Json(json!({
            "message": "ok",
            "image_series": {
                "session_id": "serie-legacy",
                "image_series": ["/static/series/serie-legacy/image_0.png"]
            }
        }))
    }
    let app = Router::new().route("/upload-dicom-series/", post(nested));
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);
    client.set_user(Some(UserId(7)));

    let series = client
        .upload_series("serie.zip", vec![1, 2, 3])
        .await
        .expect("upload");
    assert_eq!(series.session_id.as_str(), "serie-legacy");
    assert_eq!(series.frames, vec!["/static/series/serie-legacy/image_0.png"]);
}

#[tokio::test]
async fn mapping_fetch_preserves_document_order() {
    // Serve the document as a raw string: Json(Value) would re-sort the keys
    // and hide exactly the bug this guards against.
    async fn mapping(Path(session): Path<String>) -> impl IntoResponse {
        assert_eq!(session, "s9");
        (
            [(header::CONTENT_TYPE, "application/json")],
            r#"{
                "image_0.png": {"dicom_name": "a.dcm", "archivodicomid": 1},
                "image_2.png": {"dicom_name": "c.dcm", "archivodicomid": 3},
                "image_10.png": {"dicom_name": "k.dcm", "archivodicomid": 11}
            }"#,
        )
    }
    let app = Router::new().route("/static/series/:session/mapping.json", get(mapping));
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);

    let mapping = client.fetch_mapping(&SessionId::from("s9")).await.expect("mapping");
    assert_eq!(
        mapping.frame_paths(&SessionId::from("s9")),
        vec![
            "/static/series/s9/image_0.png",
            "/static/series/s9/image_2.png",
            "/static/series/s9/image_10.png",
        ]
    );
}

#[tokio::test]
async fn delete_serie_maps_conflict_to_typed_error() {
    async fn conflict(Path(_session): Path<String>) -> impl IntoResponse {
        (
            reqwest::StatusCode::CONFLICT,
            Json(json!({"detail": "SERIE_CON_SEGMENTACIONES: elimine primero las segmentaciones"})),
        )
    }
    let app = Router::new().route("/historial/series/:session", delete(conflict));
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);
    client.set_user(Some(UserId(7)));

    let err = client
        .delete_serie(&SessionId::from("s1"))
        .await
        .expect_err("conflict");
    match &err {
        ApiError::SeriesHasSegmentations { detail } => {
            assert!(detail.contains("SERIE_CON_SEGMENTACIONES"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_auth());
}

#[tokio::test]
async fn segment_frame_submits_form_and_parses_measurements() {
    let (capture, rx) = CaptureState::new();
    async fn segment(
        State(state): State<CaptureState<HashMap<String, String>>>,
        Form(form): Form<HashMap<String, String>>,
    ) -> Json<Value> {
        state.send(form).await;
        Json(json!({
            "mensaje": "Segmentación completada",
            "mask_path": "/static/series/s1/masks/image_3_mask.png",
            "dimensiones": {"altura_mm": 41.257, "ancho_mm": 18.5, "unidad": "mm"}
        }))
    }
    let app = Router::new()
        .route("/segmentar-desde-mapping/", post(segment))
        .with_state(capture);
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);
    client.set_user(Some(UserId(7)));

    let seg = client
        .segment_frame(&SessionId::from("s1"), "image_3.png")
        .await
        .expect("segmentation");
    assert_eq!(seg.mask_path, "/static/series/s1/masks/image_3_mask.png");
    assert_eq!(seg.dimension_error(), None);
    let rendered: Vec<(String, String)> = seg
        .medidas()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    assert_eq!(rendered[0], ("altura_mm".to_string(), "41.26".to_string()));

    let form = rx.await.expect("form");
    assert_eq!(form.get("session_id").map(String::as_str), Some("s1"));
    assert_eq!(form.get("image_name").map(String::as_str), Some("image_3.png"));
}

#[tokio::test]
async fn segment_frame_maps_backend_error_body() {
    async fn failing(Form(_): Form<HashMap<String, String>>) -> Json<Value> {
        Json(json!({"error": "No se encontró la imagen en el mapping"}))
    }
    let app = Router::new().route("/segmentar-desde-mapping/", post(failing));
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);
    client.set_user(Some(UserId(7)));

    let err = client
        .segment_frame(&SessionId::from("s1"), "image_0.png")
        .await
        .expect_err("backend failure");
    assert!(matches!(err, ApiError::Backend { ref detail } if detail.contains("mapping")));
}

#[tokio::test]
async fn segment_series_3d_round_trips_preset_and_warning() {
    async fn segment3d(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
        if form.get("preset").map(String::as_str) == Some("hueso") {
            Json(json!({
                "message": "Segmentación 3D completada",
                "seg3d_id": 42,
                "volume_mm3": 10250.5,
                "surface_mm2": 2210.0,
                "thumbs": {
                    "axial": "/static/series/s1/seg3d/42/axial.png",
                    "sagittal": "/static/series/s1/seg3d/42/sagittal.png",
                    "coronal": "/static/series/s1/seg3d/42/coronal.png"
                }
            }))
        } else {
            Json(json!({
                "warning": "El rango de umbral no seleccionó ningún vóxel"
            }))
        }
    }
    let app = Router::new().route("/segmentar-serie-3d/", post(segment3d));
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);
    client.set_user(Some(UserId(7)));

    let created = client
        .segment_series_3d(
            &SessionId::from("s1"),
            &Seg3dParams::Preset(ThresholdPreset::Hueso),
        )
        .await
        .expect("seg3d");
    match created {
        Seg3dOutcome::Creada(creada) => {
            assert_eq!(creada.seg3d_id, Seg3dId(42));
            assert_eq!(creada.volume_mm3, Some(10250.5));
        }
        other => panic!("expected created outcome, got {other:?}"),
    }

    let warned = client
        .segment_series_3d(
            &SessionId::from("s1"),
            &Seg3dParams::Manual {
                thr_min: 5000.0,
                thr_max: 5001.0,
            },
        )
        .await
        .expect("seg3d warning");
    assert!(matches!(warned, Seg3dOutcome::Aviso(ref text) if text.contains("vóxel")));
}

#[tokio::test]
async fn export_stl_posts_form_and_parses_model() {
    let (capture, rx) = CaptureState::new();
    async fn export(
        State(state): State<CaptureState<(String, String)>>,
        Path(session): Path<String>,
        mut multipart: Multipart,
    ) -> Json<Value> {
        let mut seg3d_id = String::new();
        while let Some(field) = multipart.next_field().await.expect("field") {
            if field.name() == Some("seg3d_id") {
                seg3d_id = field.text().await.expect("text");
            }
        }
        state.send((session, seg3d_id)).await;
        Json(json!({
            "message": "STL generado",
            "id": 9,
            "seg3d_id": 42,
            "path_stl": "/static/series/s1/stl/seg42.stl",
            "num_vertices": 120034,
            "num_caras": 240060,
            "file_size_bytes": 6001700,
            "created_at": "2025-03-01T10:02:11"
        }))
    }
    let app = Router::new()
        .route("/series/:session/export-stl", post(export))
        .with_state(capture);
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);
    client.set_user(Some(UserId(7)));

    let exported = client
        .export_stl(&SessionId::from("s1"), Seg3dId(42))
        .await
        .expect("export");
    assert_eq!(exported.modelo.id, ModeloId(9));
    assert_eq!(exported.modelo.file_name(), "seg42.stl");

    let (session, seg3d_id) = rx.await.expect("captured");
    assert_eq!(session, "s1");
    assert_eq!(seg3d_id, "42");
}

#[tokio::test]
async fn static_fetch_returns_raw_bytes() {
    async fn frame() -> impl IntoResponse {
        ([(header::CONTENT_TYPE, "image/png")], vec![0x89u8, b'P', b'N', b'G'])
    }
    let app = Router::new().route("/static/series/s1/image_0.png", get(frame));
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);

    let bytes = client
        .fetch_static("/static/series/s1/image_0.png")
        .await
        .expect("bytes");
    assert_eq!(bytes, vec![0x89u8, b'P', b'N', b'G']);
}

#[tokio::test]
async fn paciente_crud_round_trip() {
    let (capture, rx) = CaptureState::new();
    async fn create(
        State(state): State<CaptureState<Value>>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        state.send(body).await;
        Json(json!({"message": "Paciente creado", "id": 9}))
    }
    async fn list() -> Json<Value> {
        Json(json!([{
            "id": 9,
            "nombre_completo": "Luis Gómez",
            "documento": "CC-1020",
            "edad": 54,
            "ciudad": "Bogotá"
        }]))
    }
    async fn update(Path(id): Path<i64>, Json(_): Json<Value>) -> Json<Value> {
        Json(json!({"message": format!("Paciente {id} actualizado")}))
    }
    async fn remove(Path(_id): Path<i64>) -> Json<Value> {
        Json(json!({"message": "Paciente eliminado"}))
    }
    async fn estudios(Path(_id): Path<i64>) -> Json<Value> {
        Json(json!([{
            "id": 3,
            "paciente_id": 9,
            "session_id": "s1",
            "descripcion": "TC rodilla izquierda"
        }]))
    }
    async fn link(Path(_id): Path<i64>, Json(_): Json<Value>) -> Json<Value> {
        Json(json!({"message": "Estudio vinculado", "id": 4}))
    }
    async fn unlink(Path(_id): Path<i64>) -> Json<Value> {
        Json(json!({"message": "Estudio desvinculado"}))
    }

    let app = Router::new()
        .route("/pacientes/", get(list).post(create))
        .route("/pacientes/:id", put(update).delete(remove))
        .route("/pacientes/:id/estudios", get(estudios).post(link))
        .route("/pacientes/estudios/:id", delete(unlink))
        .with_state(capture);
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);
    client.set_user(Some(UserId(7)));

    let pacientes = client.list_pacientes().await.expect("list");
    assert_eq!(pacientes.len(), 1);
    assert_eq!(pacientes[0].nombre_completo, "Luis Gómez");

    let draft = PacienteDraft {
        nombre_completo: "Luis Gómez".to_string(),
        documento: Some("CC-1020".to_string()),
        ..PacienteDraft::default()
    };
    let created = client.create_paciente(&draft).await.expect("create");
    assert_eq!(created.id, PacienteId(9));
    let body = rx.await.expect("captured body");
    assert_eq!(body["nombre_completo"], "Luis Gómez");
    assert!(body.get("telefono").is_none());

    client.update_paciente(PacienteId(9), &draft).await.expect("update");
    let estudios = client.list_estudios(PacienteId(9)).await.expect("estudios");
    assert_eq!(estudios[0].session_id.as_str(), "s1");
    client
        .link_estudio(
            PacienteId(9),
            &EstudioDraft {
                session_id: SessionId::from("s2"),
                descripcion: Some("Control".to_string()),
            },
        )
        .await
        .expect("link");
    client.unlink_estudio(EstudioId(3)).await.expect("unlink");
    client.delete_paciente(PacienteId(9)).await.expect("delete");
}
