use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shelfkeeper_auth::AuthError;
use shelfkeeper_core::CatalogError;

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::NotFound(level) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{level} not found")),
        CatalogError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        CatalogError::Archive(msg) => {
            tracing::warn!(reason = %msg, "backup import rejected");
            json_error(StatusCode::BAD_REQUEST, "archive_error", msg)
        }
        e @ CatalogError::Storage { .. } => {
            tracing::error!(error = %e, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "storage failure")
        }
        CatalogError::Document(e) => {
            tracing::error!(error = %e, "catalog document unreadable");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "document_error", "catalog document unreadable")
        }
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    let (status, code) = match err {
        AuthError::InvalidCaptcha => (StatusCode::BAD_REQUEST, "invalid_captcha"),
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
        AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
    };
    json_error(status, code, err.to_string())
}

pub fn internal_error(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
