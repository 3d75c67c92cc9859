use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use panelerp_infra::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Rejected { status, message } => json_error(
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
            message,
        ),
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "Rol no encontrado"),
        StoreError::Decode(msg) => json_error(StatusCode::BAD_REQUEST, msg),
        StoreError::Transport(msg) => {
            tracing::error!(error = %msg, "role store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error interno del servidor")
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
        })),
    )
        .into_response()
}
