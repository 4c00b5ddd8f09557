//! HTTP surface of demo-api.
//!
//! [`router`] holds the routes only; [`app`] wraps them in the middleware stack
//! the server actually runs with. Tests drive [`app`] so the layers are
//! exercised too.

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{access_log::access_log_middleware, state::AppState};

pub mod apps;
pub mod health;
pub mod request_id;
pub mod users;
pub mod version;

/// Build the route table.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/healthcheck", get(health::healthz))
        .route("/health", get(health::readiness))
        .route("/version", get(version::version))
        .nest("/v1", apps::router())
        .merge(users::router())
        .with_state(state)
}

/// Build the full application: routes plus access log, request ID, timeout
/// and request tracing.
///
/// From the outside in: trace, request ID, access log, timeout, routes. The
/// timeout sits innermost so a 408 still passes through the access log and
/// gets an `X-Request-ID`, and the request-ID span encloses the access log.
pub fn app(state: Arc<AppState>) -> Router {
    let timeout = state.config.server.request_timeout();
    let mut app = router(Arc::clone(&state)).layer(TimeoutLayer::new(timeout));

    if state.config.access_log.enabled {
        app = app.layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            access_log_middleware,
        ));
    }

    app.layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
}
