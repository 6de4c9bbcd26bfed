//! API handlers for the Murmur server.

use crate::orchestrator::ActionError;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension, Json, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use murmur_storage::{SignedUrlParams, StorageError};
use murmur_types::{ActionRequest, MessageResponse, RequestError};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<RequestError> for ApiError {
    fn from(e: RequestError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        let message = rejection.body_text();
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(message)
        } else {
            ApiError::BadRequest(message)
        }
    }
}

impl From<ActionError> for ApiError {
    fn from(e: ActionError) -> Self {
        tracing::error!(error = %e, "action failed");
        ApiError::InternalServerError(e.to_string())
    }
}

/// Handler for `POST /api/actions`.
///
/// The body is parsed by hand rather than through `Json` so that envelope
/// bodies, oversized bodies and every malformed payload share the `{error}`
/// shape.
pub async fn actions_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let body = body?;
    let request = ActionRequest::from_json(&body).map_err(|e| {
        tracing::warn!(error = %e, "rejected action request");
        ApiError::from(e)
    })?;

    let action = request.action();
    tracing::debug!(action = %action, session_id = %request.session_id(), "dispatching action");
    let orchestrator = &state.orchestrator;

    let response = match request {
        ActionRequest::InvokeAgent {
            session_id,
            message,
        } => Json(orchestrator.invoke_agent(session_id, &message).await?).into_response(),
        ActionRequest::LogConversation {
            session_id,
            message,
        } => {
            orchestrator.log_conversation(session_id, &message).await?;
            Json(MessageResponse::new("Conversation logged.")).into_response()
        }
        ActionRequest::EndSession { session_id } => {
            orchestrator.end_session(&session_id).await?;
            Json(MessageResponse::new(
                "Session ended, logs merged and analyzed.",
            ))
            .into_response()
        }
        ActionRequest::DeleteSession { session_id } => {
            orchestrator.delete_session(&session_id).await?;
            Json(MessageResponse::new("Session S3 logs deleted.")).into_response()
        }
    };

    Ok(response)
}

/// Query string of a signed object URL.
#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: Option<String>,
    pub signature: Option<String>,
}

/// Handler for `GET /objects/{bucket}/{*key}`.
///
/// Serves one object to holders of a valid, unexpired signed URL.
pub async fn object_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, ApiError> {
    let expires = query
        .expires
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| ApiError::Forbidden("missing or invalid expires".to_string()))?;
    let signature = query
        .signature
        .ok_or_else(|| ApiError::Forbidden("missing signature".to_string()))?;

    state
        .signer
        .verify(&bucket, &key, &SignedUrlParams { expires, signature })
        .map_err(|e| {
            tracing::warn!(bucket = %bucket, key = %key, error = %e, "signed url rejected");
            ApiError::Forbidden(e.to_string())
        })?;

    let object = state
        .objects
        .get_object(&bucket, &key)
        .await
        .map_err(|e| match e {
            StorageError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            StorageError::InvalidKey(_) => ApiError::BadRequest(e.to_string()),
            other => ApiError::InternalServerError(other.to_string()),
        })?;

    Ok(([(header::CONTENT_TYPE, object.content_type)], object.body).into_response())
}
