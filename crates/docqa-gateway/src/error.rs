use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use docqa_core::ServiceError;
use docqa_core::pipeline::PipelineError;
use docqa_memory::DocumentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// Request failure rendered as `{"status":"error","kind":..,"answer":..}`.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

#[derive(serde::Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    kind: &'a str,
    answer: &'a str,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_input", message)
    }

    pub(crate) fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported_media_type",
            message,
        )
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            kind: self.kind,
            answer: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn kind_for_status(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "unsupported_media_type",
        s if s.is_client_error() => "invalid_input",
        _ => "internal",
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        let status = e.status();
        Self::new(status, kind_for_status(status), e.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        let status = e.status();
        Self::new(status, kind_for_status(status), e.body_text())
    }
}

const MAX_ERROR_TEXT: usize = 16 * 1024;

fn is_json(resp: &Response) -> bool {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Rewrites plain-text error responses from layers, extractors and the
/// router fallback into the JSON error body. Other headers are kept.
pub(crate) async fn json_error_bodies(resp: Response) -> Response {
    let status = resp.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&resp) {
        return resp;
    }

    let (parts, body) = resp.into_parts();
    let message = match axum::body::to_bytes(body, MAX_ERROR_TEXT).await {
        Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).trim().to_owned(),
        _ => status.canonical_reason().unwrap_or("request failed").to_owned(),
    };

    let mut rewritten = ApiError::new(status, kind_for_status(status), message).into_response();
    for (name, value) in &parts.headers {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rewritten.headers_mut().append(name.clone(), value.clone());
        }
    }
    rewritten
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let message = e.to_string();
        match e {
            ServiceError::UnknownSession(_) => Self::new(StatusCode::NOT_FOUND, "not_found", message),
            ServiceError::Pipeline(p) => match p {
                PipelineError::InvalidInput(_)
                | PipelineError::MissingInput(_)
                | PipelineError::Document(
                    DocumentError::FileTooLarge(_)
                    | DocumentError::Pdf(_)
                    | DocumentError::Join(_),
                ) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_input", message),
                PipelineError::ExternalService(_) | PipelineError::Timeout { .. } => {
                    Self::new(StatusCode::BAD_GATEWAY, "external_service", message)
                }
                PipelineError::Document(_) | PipelineError::Index(_) => Self::internal(message),
            },
        }
    }
}
