//! Backend worker: an OS thread that owns a tokio runtime and the API client,
//! drains the UI command queue, and reports results back as [`UiEvent`]s.
//!
//! Every command is spawned on its own task, so a slow 3-D segmentation never
//! holds up frame fetches or list refreshes queued after it.

use std::thread;

use client_core::ApiClient;
use crossbeam_channel::{Receiver, Sender};
use shared::protocol::RegisterRequest;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{
    AuthSession, DecodedImage, UiError, UiErrorCategory, UiErrorContext, UiEvent,
};

pub struct WorkerConfig {
    pub api_url: String,
}

pub fn launch(config: WorkerConfig, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || run_worker(config, cmd_rx, ui_tx));
}

fn run_worker(config: WorkerConfig, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let _ = ui_tx.try_send(UiEvent::WorkerInfo("Conectando con el backend...".to_string()));
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!("failed to build backend runtime: {err}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                "No se pudo iniciar el procesador de tareas. Reinicie la aplicación.",
            )));
            return;
        }
    };

    runtime.block_on(async move {
        let client = match ApiClient::from_base_url(&config.api_url) {
            Ok(client) => client,
            Err(err) => {
                tracing::error!("invalid backend url '{}': {err}", config.api_url);
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_api(
                    UiErrorContext::BackendStartup,
                    &err,
                )));
                return;
            }
        };

        let _ = ui_tx.try_send(UiEvent::WorkerInfo("Backend listo".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            tracing::debug!(command = cmd.name(), "processing backend command");
            tokio::spawn(handle_command(client.clone(), cmd, ui_tx.clone()));
        }
    });
}

async fn handle_command(client: ApiClient, cmd: BackendCommand, ui_tx: Sender<UiEvent>) {
    match cmd {
        BackendCommand::Login { email, password } => {
            let result = match client.login(&email, &password).await {
                Ok(body) => Ok(AuthSession {
                    user_id: body.user_id,
                    nombre_completo: body.nombre_completo,
                    email: body.email,
                }),
                Err(err) => Err(UiError::from_api(UiErrorContext::Login, &err)),
            };
            let _ = ui_tx.try_send(UiEvent::LoginDone(result));
        }
        BackendCommand::Register {
            nombre_completo,
            email,
            password,
        } => {
            let request = RegisterRequest {
                nombre_completo,
                email,
                password,
                rol: "usuario".to_string(),
            };
            let result = match client.register(&request).await {
                Ok(body) => Ok(body.message),
                Err(err) => Err(UiError::from_api(UiErrorContext::Register, &err)),
            };
            let _ = ui_tx.try_send(UiEvent::RegisterDone(result));
        }
        BackendCommand::Logout => {
            client.logout();
            let _ = ui_tx.try_send(UiEvent::WorkerInfo("Sesión cerrada".to_string()));
        }
        BackendCommand::UploadSeries { path } => {
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("serie.zip")
                .to_string();
            let result = match tokio::fs::read(&path).await {
                Ok(bytes) => client
                    .upload_series(&file_name, bytes)
                    .await
                    .map_err(|err| UiError::from_api(UiErrorContext::Upload, &err)),
                Err(err) => {
                    tracing::warn!("failed to read '{}': {err}", path.display());
                    Err(UiError::new(
                        UiErrorCategory::Validation,
                        UiErrorContext::Upload,
                        format!("No se pudo leer el archivo seleccionado: {err}"),
                    ))
                }
            };
            let _ = ui_tx.try_send(UiEvent::UploadDone(result));
        }
        BackendCommand::LoadSeries { session_id, origin } => {
            let result = match client.fetch_mapping(&session_id).await {
                Ok(mapping) => Ok(mapping.frame_paths(&session_id)),
                Err(err) => Err(UiError::from_api(UiErrorContext::LoadSeries, &err)),
            };
            let _ = ui_tx.try_send(UiEvent::SeriesLoaded {
                session_id,
                origin,
                result,
            });
        }
        BackendCommand::FetchImage { path } => {
            let result = match client.fetch_static(&path).await {
                Ok(bytes) => decode_image(&bytes),
                Err(err) => Err(UiError::from_api(UiErrorContext::Viewer, &err)
                    .message()
                    .to_string()),
            };
            let _ = ui_tx.try_send(UiEvent::ImageLoaded { path, result });
        }
        BackendCommand::SegmentFrame {
            session_id,
            image_name,
        } => {
            let result = client
                .segment_frame(&session_id, &image_name)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Segmentacion, &err));
            let _ = ui_tx.try_send(UiEvent::Seg2dDone {
                session_id,
                image_name,
                result,
            });
        }
        BackendCommand::SegmentSeries3d { session_id, params } => {
            let result = client
                .segment_series_3d(&session_id, &params)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Segmentacion, &err));
            let _ = ui_tx.try_send(UiEvent::Seg3dDone { session_id, result });
        }
        BackendCommand::ListHistorial => {
            let result = client
                .list_historial()
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Historial, &err));
            let _ = ui_tx.try_send(UiEvent::HistorialLoaded(result));
        }
        BackendCommand::DeleteSerie { session_id } => {
            let result = client
                .delete_serie(&session_id)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Historial, &err));
            let _ = ui_tx.try_send(UiEvent::SerieDeleted { session_id, result });
        }
        BackendCommand::ListSegmentaciones { session_id } => {
            let (seg2d, seg3d) = tokio::join!(
                client.list_segmentaciones(&session_id),
                client.list_segmentaciones_3d(&session_id),
            );
            let _ = ui_tx.try_send(UiEvent::Seg2dListLoaded {
                session_id: session_id.clone(),
                result: seg2d
                    .map_err(|err| UiError::from_api(UiErrorContext::Segmentaciones, &err)),
            });
            let _ = ui_tx.try_send(UiEvent::Seg3dListLoaded {
                session_id,
                result: seg3d
                    .map_err(|err| UiError::from_api(UiErrorContext::Segmentaciones, &err)),
            });
        }
        BackendCommand::DeleteSegmentacion {
            session_id,
            archivo,
        } => {
            let result = client
                .delete_segmentacion(&session_id, archivo)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Segmentaciones, &err));
            let _ = ui_tx.try_send(UiEvent::Seg2dDeleted { session_id, result });
        }
        BackendCommand::DeleteSegmentacion3d { session_id, seg3d } => {
            let result = client
                .delete_segmentacion_3d(&session_id, seg3d)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Segmentaciones, &err));
            let _ = ui_tx.try_send(UiEvent::Seg3dDeleted { session_id, result });
        }
        BackendCommand::ExportStl { session_id, seg3d } => {
            let result = client
                .export_stl(&session_id, seg3d)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Modelos, &err));
            let _ = ui_tx.try_send(UiEvent::StlExported { session_id, result });
        }
        BackendCommand::ListModelos { session_id } => {
            let result = client
                .list_modelos(&session_id)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Modelos, &err));
            let _ = ui_tx.try_send(UiEvent::ModelosLoaded { session_id, result });
        }
        BackendCommand::DeleteModelo { modelo } => {
            let result = client
                .delete_modelo(modelo)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Modelos, &err));
            let _ = ui_tx.try_send(UiEvent::ModeloDeleted { result });
        }
        BackendCommand::DownloadStl { path_stl, target } => {
            let result = match client.fetch_static(&path_stl).await {
                Ok(bytes) => match tokio::fs::write(&target, &bytes).await {
                    Ok(()) => Ok(target),
                    Err(err) => Err(UiError::from_message(
                        UiErrorContext::Modelos,
                        format!("No se pudo guardar el archivo: {err}"),
                    )),
                },
                Err(err) => Err(UiError::from_api(UiErrorContext::Modelos, &err)),
            };
            let _ = ui_tx.try_send(UiEvent::StlSaved { result });
        }
        BackendCommand::ListPacientes => {
            let result = client
                .list_pacientes()
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Pacientes, &err));
            let _ = ui_tx.try_send(UiEvent::PacientesLoaded(result));
        }
        BackendCommand::CreatePaciente { draft } => {
            let result = match client.create_paciente(&draft).await {
                Ok(body) => Ok(body
                    .message
                    .unwrap_or_else(|| "Paciente creado".to_string())),
                Err(err) => Err(UiError::from_api(UiErrorContext::Pacientes, &err)),
            };
            let _ = ui_tx.try_send(UiEvent::PacienteSaved { result });
        }
        BackendCommand::UpdatePaciente { paciente, draft } => {
            let result = match client.update_paciente(paciente, &draft).await {
                Ok(body) => Ok(body.message),
                Err(err) => Err(UiError::from_api(UiErrorContext::Pacientes, &err)),
            };
            let _ = ui_tx.try_send(UiEvent::PacienteSaved { result });
        }
        BackendCommand::DeletePaciente { paciente } => {
            let result = client
                .delete_paciente(paciente)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Pacientes, &err));
            let _ = ui_tx.try_send(UiEvent::PacienteDeleted { result });
        }
        BackendCommand::ListEstudios { paciente } => {
            let result = client
                .list_estudios(paciente)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Pacientes, &err));
            let _ = ui_tx.try_send(UiEvent::EstudiosLoaded { paciente, result });
        }
        BackendCommand::LinkEstudio { paciente, draft } => {
            let result = client
                .link_estudio(paciente, &draft)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Pacientes, &err));
            let _ = ui_tx.try_send(UiEvent::EstudioLinked { paciente, result });
        }
        BackendCommand::UnlinkEstudio { paciente, estudio } => {
            let result = client
                .unlink_estudio(estudio)
                .await
                .map_err(|err| UiError::from_api(UiErrorContext::Pacientes, &err));
            let _ = ui_tx.try_send(UiEvent::EstudioUnlinked { paciente, result });
        }
    }
}

fn decode_image(bytes: &[u8]) -> Result<DecodedImage, String> {
    let image = image::load_from_memory(bytes).map_err(|err| format!("imagen no válida: {err}"))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width: width as usize,
        height: height as usize,
        rgba: rgba.into_raw(),
    })
}
