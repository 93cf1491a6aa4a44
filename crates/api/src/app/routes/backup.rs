use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::app::errors;
use crate::app::routes::common;
use crate::app::services::AppServices;

/// Zip of the document and every asset, as `backup.zip`.
pub async fn download(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let backups = services.backups.clone();
    let archive = match common::blocking(move || backups.export()).await {
        Ok(bytes) => bytes,
        Err(resp) => return resp,
    };

    (
        [
            (header::CONTENT_TYPE, "application/zip"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"backup.zip\""),
        ],
        archive,
    )
        .into_response()
}

/// Restore from an uploaded `.zip` (multipart field `file`).
pub async fn upload(
    Extension(services): Extension<Arc<AppServices>>,
    mut multipart: Multipart,
) -> Response {
    let mut archive: Option<Vec<u8>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => return common::multipart_error(e),
        };
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_ascii_lowercase();
        if file_name.is_empty() {
            continue;
        }
        if !file_name.ends_with(".zip") {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_file_type", "backup must be a .zip file");
        }

        match field.bytes().await {
            Ok(bytes) => archive = Some(bytes.to_vec()),
            Err(e) => return common::multipart_error(e),
        }
    }

    let Some(archive) = archive else {
        return errors::json_error(StatusCode::BAD_REQUEST, "no_file", "no file uploaded");
    };

    let backups = services.backups.clone();
    match common::blocking(move || backups.import(&archive)).await {
        Ok(summary) => common::message("Backup restored", Some(("summary", serde_json::json!(summary)))),
        Err(resp) => resp,
    }
}
