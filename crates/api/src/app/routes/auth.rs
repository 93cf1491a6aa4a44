use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;

use shelfkeeper_auth::AuthError;

use crate::app::errors;
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::SessionContext;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub captcha: String,
}

fn cookie_header(value: String) -> Result<HeaderValue, Response> {
    HeaderValue::from_str(&value).map_err(|_| errors::internal_error("invalid cookie"))
}

/// Issue a challenge for the caller's session, creating the session first if
/// needed, and return it rendered.
pub async fn captcha(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    let (session, created) = services.gate.ensure_session(ctx.session());
    let text = match services.gate.issue_challenge(&session) {
        Ok(t) => t,
        Err(e) => return errors::auth_error_to_response(e),
    };
    let rendered = services.renderer.render(&text);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(rendered.content_type));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if created {
        match cookie_header(services.cookie.set_cookie(session.as_str())) {
            Ok(v) => headers.insert(header::SET_COOKIE, v),
            Err(resp) => return resp,
        };
    }

    (headers, rendered.body).into_response()
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Form(form): Form<LoginForm>,
) -> Response {
    // Without a session there is no challenge to answer.
    let Some(session) = ctx.session().cloned() else {
        return errors::auth_error_to_response(AuthError::InvalidCaptcha);
    };

    let gate = services.gate.clone();
    let verified = tokio::task::spawn_blocking(move || {
        gate.verify_login(&session, &form.username, &form.password, &form.captcha)
    })
    .await;

    let authed = match verified {
        Ok(Ok(id)) => id,
        Ok(Err(e)) => return errors::auth_error_to_response(e),
        Err(e) => {
            tracing::error!(error = %e, "login task failed");
            return errors::internal_error("task failed");
        }
    };

    let cookie = match cookie_header(services.cookie.set_cookie(authed.as_str())) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ([(header::SET_COOKIE, cookie)], common::message("Logged in", None)).into_response()
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    if let Some(session) = ctx.session() {
        services.gate.logout(session);
    }

    let cookie = match cookie_header(services.cookie.clear_cookie()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ([(header::SET_COOKIE, cookie)], common::message("Logged out", None)).into_response()
}
