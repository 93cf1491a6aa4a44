use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    routing::{delete, post},
    Form, Router,
};

use crate::app::routes::common::{self, NameForm};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/:brand", post(add_category))
        .route("/:brand/:category", delete(delete_category))
}

pub async fn add_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(brand): Path<String>,
    Form(form): Form<NameForm>,
) -> Response {
    let store = services.catalog.clone();
    match common::blocking(move || store.add_category(&brand, &form.name)).await {
        Ok(category) => common::message("Category added", Some(("category", serde_json::json!(category)))),
        Err(resp) => resp,
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path((brand, category)): Path<(String, String)>,
) -> Response {
    let store = services.catalog.clone();
    match common::blocking(move || store.delete_category(&brand, &category)).await {
        Ok(()) => common::message("Category deleted", None),
        Err(resp) => resp,
    }
}
