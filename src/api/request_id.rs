//! `X-Request-ID` propagation.
//!
//! Every inbound request gets an ID: the caller's own `X-Request-ID` when it
//! sends a non-empty one, otherwise a fresh UUID v4. The ID is stored as a
//! request extension, recorded on a tracing span wrapping the rest of the
//! stack, and echoed back in the response header. Lines in the access log and
//! the server log can then be matched against what the client saw.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument as _;
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID assigned by [`request_id_middleware`], readable from handlers
/// via `Extension<RequestId>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(id.clone()));

    let span = tracing::info_span!("request", request_id = %id);
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, routing::get, Extension, Router};

    use super::*;
    use crate::api::test_support::{body_bytes, send};

    fn echo_app() -> Router {
        Router::new()
            .route(
                "/",
                get(|Extension(id): Extension<RequestId>| async move { id.0 }),
            )
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    fn request(id: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(id) = id {
            builder = builder.header("x-request-id", id);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn generates_uuid_when_header_absent() {
        let resp = send(echo_app(), request(None)).await;
        let header = resp.headers()["x-request-id"].to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&header).is_ok(), "not a uuid: {header}");

        // Handler saw the same ID that was echoed.
        let body = body_bytes(resp.into_body()).await;
        assert_eq!(String::from_utf8(body).unwrap(), header);
    }

    #[tokio::test]
    async fn preserves_caller_supplied_id() {
        let resp = send(echo_app(), request(Some("trace-abc-123"))).await;
        assert_eq!(resp.headers()["x-request-id"], "trace-abc-123");
    }

    #[tokio::test]
    async fn replaces_empty_id() {
        let resp = send(echo_app(), request(Some(""))).await;
        let header = resp.headers()["x-request-id"].to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&header).is_ok(), "not a uuid: {header}");
    }

    #[tokio::test]
    async fn keeps_padded_and_long_ids_verbatim() {
        let resp = send(echo_app(), request(Some(" padded "))).await;
        assert_eq!(resp.headers()["x-request-id"], " padded ");

        let long = "x".repeat(512);
        let resp = send(echo_app(), request(Some(&long))).await;
        assert_eq!(resp.headers()["x-request-id"], long.as_str());
        assert_eq!(String::from_utf8(body_bytes(resp.into_body()).await).unwrap(), long);
    }

    #[tokio::test]
    async fn full_app_echoes_request_id_on_healthz() {
        let app = crate::api::app(crate::state::AppState::for_tests(
            crate::config::Config::default(),
        ));
        let req = Request::builder()
            .uri("/healthz")
            .header("x-request-id", "req-1")
            .body(Body::empty())
            .unwrap();
        let resp = send(app, req).await;
        assert_eq!(resp.headers()["x-request-id"], "req-1");
    }
}
