//! Failure responders and the error-body layer.
//!
//! Every error leaves the service as
//! `{timestamp, status, error, message, path}` (+ `code`, + `user` on 403).
//! Handlers return `AppError`, which only carries an `ErrorReport`; this layer
//! knows the request path and turns the report into the body.
//! Error responses built elsewhere without a JSON body (axum's 405, the body
//! limit's 413, the timeout's 408) are rewritten here too. This layer sits
//! outermost so it sees them.

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::ErrorReport;

pub const UNAUTHENTICATED_MESSAGE: &str = "Invalid or expired authentication token";
pub const FORBIDDEN_MESSAGE: &str = "Access Denied (Insufficient Permissions)";

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    timestamp: String,
    status: u16,
    error: &'a str,
    message: &'a str,
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
}

pub fn apply(router: Router) -> Router {
    router.layer(middleware::from_fn(render_failures))
}

async fn render_failures(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let res = next.run(req).await;

    let report = match res.extensions().get::<ErrorReport>().cloned() {
        Some(report) => report,
        None if lacks_json_body(&res) => ErrorReport::from_status(res.status()),
        None => return res,
    };

    let mut rendered = respond(&method, &path, report);
    carry_headers(res.headers(), rendered.headers_mut());
    rendered
}

fn lacks_json_body(res: &Response) -> bool {
    let status = res.status();
    (status.is_client_error() || status.is_server_error())
        && !res
            .headers()
            .get(header::CONTENT_TYPE)
            .is_some_and(|v| v.as_bytes().starts_with(b"application/json"))
}

// request id, CORS and security headers set by inner layers survive the rewrite
fn carry_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH && !to.contains_key(name) {
            to.append(name, value.clone());
        }
    }
}

fn respond(method: &Method, path: &str, report: ErrorReport) -> Response {
    match report.status {
        StatusCode::UNAUTHORIZED if report.message.is_empty() => unauthenticated(path),
        StatusCode::FORBIDDEN => {
            if let Some(reason) = report.reason {
                tracing::warn!(user = ?report.user, %path, reason, "authorization check failed");
            }
            forbidden(path, report.user.as_deref())
        }
        status => {
            let code = report.code.unwrap_or("-");
            if status.is_server_error() {
                tracing::error!("{method} {path} -> {status} (code = {code}) - {}", report.message);
            } else if status == StatusCode::NOT_FOUND {
                tracing::info!("{method} {path} -> {status} (code = {code}) - {}", report.message);
            } else {
                tracing::warn!("{method} {path} -> {status} (code = {code}) - {}", report.message);
            }
            render(status, &report.message, path, report.code, None)
        }
    }
}

/// 401: no usable identity. The body never says which check failed.
pub fn unauthenticated(path: &str) -> Response {
    tracing::warn!(%path, "unauthenticated request rejected");
    render(
        StatusCode::UNAUTHORIZED,
        UNAUTHENTICATED_MESSAGE,
        path,
        None,
        None,
    )
}

/// 403: identity known, access denied.
pub fn forbidden(path: &str, user: Option<&str>) -> Response {
    tracing::warn!(%path, user = user.unwrap_or("-"), "access denied");
    render(StatusCode::FORBIDDEN, FORBIDDEN_MESSAGE, path, None, user)
}

fn render(
    status: StatusCode,
    message: &str,
    path: &str,
    code: Option<&str>,
    user: Option<&str>,
) -> Response {
    let body = ErrorBody {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        status: status.as_u16(),
        error: status.canonical_reason().unwrap_or("Unknown"),
        message,
        path,
        code,
        user,
    };

    match serde_json::to_vec(&body) {
        Ok(bytes) => {
            let mut res = (status, bytes).into_response();
            res.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            res
        }
        Err(err) => {
            tracing::error!(error = ?err, %path, "failed to write error body");
            status.into_response()
        }
    }
}
