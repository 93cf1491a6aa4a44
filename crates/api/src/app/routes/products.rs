use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, Path},
    response::{IntoResponse, Response},
    routing::{get, patch, put},
    Json, Router,
};

use crate::app::routes::common::{self, ProductForm};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/:brand/:category", get(list_products).post(add_product))
        .route("/:brand/:category/:product", put(update_product).delete(delete_product))
        .route("/:brand/:category/:product/toggle", patch(toggle_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Path((brand, category)): Path<(String, String)>,
) -> Response {
    let store = services.catalog.clone();
    match common::blocking(move || store.list_products(&brand, &category)).await {
        Ok(products) => Json(products).into_response(),
        Err(resp) => resp,
    }
}

pub async fn add_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path((brand, category)): Path<(String, String)>,
    multipart: Multipart,
) -> Response {
    let form = match ProductForm::read(multipart).await {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let (fields, image) = form.into_new_product();

    let store = services.catalog.clone();
    let product = match common::blocking(move || store.add_product(&brand, &category, fields, image)).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    common::message("Product added", Some(("product", serde_json::json!(product))))
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path((brand, category, product)): Path<(String, String, String)>,
    multipart: Multipart,
) -> Response {
    let form = match ProductForm::read(multipart).await {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let (patch, image) = form.into_patch();

    let store = services.catalog.clone();
    let updated =
        match common::blocking(move || store.update_product(&brand, &category, &product, patch, image)).await {
            Ok(p) => p,
            Err(resp) => return resp,
        };

    common::message("Product updated", Some(("product", serde_json::json!(updated))))
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path((brand, category, product)): Path<(String, String, String)>,
) -> Response {
    let store = services.catalog.clone();
    match common::blocking(move || store.delete_product(&brand, &category, &product)).await {
        Ok(()) => common::message("Product deleted", None),
        Err(resp) => resp,
    }
}

pub async fn toggle_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path((brand, category, product)): Path<(String, String, String)>,
) -> Response {
    let store = services.catalog.clone();
    match common::blocking(move || store.toggle_product(&brand, &category, &product)).await {
        Ok(active) => common::message("Status toggled", Some(("active", serde_json::Value::Bool(active)))),
        Err(resp) => resp,
    }
}
