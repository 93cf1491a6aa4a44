use axum::{
    extract::{Multipart, multipart::MultipartError},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use shelfkeeper_core::{CatalogResult, NewProduct, ProductPatch};
use shelfkeeper_store::AssetUpload;

use crate::app::errors;

/// Run a store call on the blocking pool and map its error to a response.
pub async fn blocking<T, F>(f: F) -> Result<T, Response>
where
    F: FnOnce() -> CatalogResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(errors::catalog_error_to_response(e)),
        Err(e) => {
            tracing::error!(error = %e, "blocking task failed");
            Err(errors::internal_error("task failed"))
        }
    }
}

pub fn message(text: &str, extra: Option<(&str, serde_json::Value)>) -> Response {
    let mut body = serde_json::Map::new();
    body.insert("message".to_string(), serde_json::Value::from(text));
    if let Some((key, value)) = extra {
        body.insert(key.to_string(), value);
    }
    Json(serde_json::Value::Object(body)).into_response()
}

pub fn multipart_error(e: MultipartError) -> Response {
    errors::json_error(e.status(), "invalid_multipart", e.body_text())
}

/// Single `name` form field (brands, categories).
#[derive(Debug, Deserialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: String,
}

/// Product multipart form. Absent text fields stay `None`; an `image` part
/// without a file name or without bytes counts as no upload.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub title: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<AssetUpload>,
}

impl ProductForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, Response> {
        let mut form = ProductForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "title" => form.title = Some(field.text().await.map_err(multipart_error)?),
                "name" => form.name = Some(field.text().await.map_err(multipart_error)?),
                "description" => form.description = Some(field.text().await.map_err(multipart_error)?),
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    if !file_name.is_empty() && !bytes.is_empty() {
                        form.image = Some(AssetUpload::new(file_name, bytes.to_vec()));
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    pub fn into_new_product(self) -> (NewProduct, Option<AssetUpload>) {
        let fields = NewProduct {
            title: self.title.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        };
        (fields, self.image)
    }

    pub fn into_patch(self) -> (ProductPatch, Option<AssetUpload>) {
        let patch = ProductPatch {
            title: self.title.into(),
            name: self.name.into(),
            description: self.description.into(),
        };
        (patch, self.image)
    }
}
