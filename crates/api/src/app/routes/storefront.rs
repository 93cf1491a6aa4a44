use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    Json,
};

use shelfkeeper_core::{AssetRef, CatalogError};

use crate::app::errors;
use crate::app::routes::common;
use crate::app::services::AppServices;

/// Public view: active products only.
pub async fn storefront(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let store = services.catalog.clone();
    match common::blocking(move || store.storefront()).await {
        Ok(catalog) => Json(catalog).into_response(),
        Err(resp) => resp,
    }
}

/// Admin view: the whole catalog, inactive products included.
pub async fn dashboard(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let store = services.catalog.clone();
    match common::blocking(move || store.snapshot()).await {
        Ok(catalog) => Json(catalog).into_response(),
        Err(resp) => resp,
    }
}

fn content_type(file: &str) -> &'static str {
    let ext = file.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

pub async fn asset(
    Extension(services): Extension<Arc<AppServices>>,
    Path(file): Path<String>,
) -> Response {
    let not_found = || errors::json_error(StatusCode::NOT_FOUND, "not_found", "asset not found");
    if file.starts_with('.') {
        return not_found();
    }

    let asset = AssetRef::for_file(&file);
    let store = services.catalog.clone();
    let read = tokio::task::spawn_blocking(move || store.read_asset(&asset)).await;

    let bytes = match read {
        Ok(Ok(Some(bytes))) => bytes,
        Ok(Ok(None)) | Ok(Err(CatalogError::Validation(_))) => return not_found(),
        Ok(Err(e)) => return errors::catalog_error_to_response(e),
        Err(e) => {
            tracing::error!(error = %e, "asset read task failed");
            return errors::internal_error("task failed");
        }
    };

    (
        [
            (header::CONTENT_TYPE, content_type(&file)),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type("a_runner.PNG"), "image/png");
        assert_eq!(content_type("b.jpeg"), "image/jpeg");
        assert_eq!(content_type("c.svg"), "application/octet-stream");
        assert_eq!(content_type("noext"), "application/octet-stream");
    }
}
