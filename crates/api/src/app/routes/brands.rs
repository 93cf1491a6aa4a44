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
        .route("/", post(add_brand))
        .route("/:brand", delete(delete_brand))
}

pub async fn add_brand(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<NameForm>,
) -> Response {
    let store = services.catalog.clone();
    match common::blocking(move || store.add_brand(&form.name)).await {
        Ok(brand) => common::message("Brand added", Some(("brand", serde_json::json!(brand)))),
        Err(resp) => resp,
    }
}

pub async fn delete_brand(
    Extension(services): Extension<Arc<AppServices>>,
    Path(brand): Path<String>,
) -> Response {
    let store = services.catalog.clone();
    match common::blocking(move || store.delete_brand(&brand)).await {
        Ok(()) => common::message("Brand deleted", None),
        Err(resp) => resp,
    }
}
