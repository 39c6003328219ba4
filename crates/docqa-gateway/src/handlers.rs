use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::IntoResponse;

use super::error::ApiError;
use super::server::AppState;

pub(crate) const PDF_CONTENT_TYPE: &str = "application/pdf";
const FILE_FIELD: &str = "file";
const UPLOAD_OK_TEXT: &str = "file uploaded successfully for Q&A";

#[derive(serde::Serialize)]
struct UploadResponse {
    status: &'static str,
    session_id: String,
    text: &'static str,
    vectorstore: bool,
    chunks: usize,
}

#[derive(serde::Deserialize)]
pub(crate) struct AskParams {
    #[serde(default)]
    question: Option<String>,
}

#[derive(serde::Serialize)]
struct AskResponse {
    answer: String,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    sessions: usize,
}

struct UploadedFile {
    content_type: Option<String>,
    file_name: Option<String>,
    bytes: axum::body::Bytes,
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?;
        return Ok(Some(UploadedFile {
            content_type,
            file_name,
            bytes,
        }));
    }
    Ok(None)
}

pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart?;
    let Some(upload) = read_file_field(&mut multipart).await? else {
        return Err(ApiError::invalid_input("missing multipart field 'file'"));
    };

    if upload.content_type.as_deref() != Some(PDF_CONTENT_TYPE) {
        tracing::info!(
            content_type = upload.content_type.as_deref().unwrap_or("none"),
            "rejected non-PDF upload"
        );
        return Err(ApiError::unsupported_media_type(format!(
            "unsupported content type '{}', expected {PDF_CONTENT_TYPE}",
            upload.content_type.as_deref().unwrap_or("none")
        )));
    }

    // Removed when `temp` drops, on every return path below.
    let temp = tempfile::Builder::new()
        .prefix("docqa-upload-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| ApiError::internal(format!("failed to create temp file: {e}")))?;
    tokio::fs::write(temp.path(), &upload.bytes)
        .await
        .map_err(|e| ApiError::internal(format!("failed to write temp file: {e}")))?;

    tracing::info!(
        file_name = upload.file_name.as_deref().unwrap_or("unnamed"),
        bytes = upload.bytes.len(),
        "upload received"
    );

    let result = state.service.upload_file(temp.path()).await;
    drop(temp);
    let uploaded = result?;

    Ok(Json(UploadResponse {
        status: "ok",
        session_id: uploaded.session_id,
        text: UPLOAD_OK_TEXT,
        vectorstore: true,
        chunks: uploaded.chunks,
    }))
}

pub(crate) async fn ask_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<AskParams>,
) -> Result<impl IntoResponse, ApiError> {
    let question = params.question.unwrap_or_default();
    let answer = state.service.ask(&session_id, &question).await?;
    Ok(Json(AskResponse { answer }))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        sessions: state.service.sessions().len().await,
    })
}
