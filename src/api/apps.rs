//! `/v1` sample application endpoints, used to check path-based routing
//! through a load balancer: each answers with its own name.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/foo", get(foo))
        .route("/bar", get(bar))
}

/// `GET /v1/foo`
pub async fn foo() -> Json<Value> {
    Json(json!({ "application": "foo" }))
}

/// `GET /v1/bar`
pub async fn bar() -> Json<Value> {
    Json(json!({ "application": "bar" }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{
        api::test_support::{body_json, get},
        config::Config,
        state::AppState,
    };

    #[tokio::test]
    async fn each_application_reports_its_name() {
        for name in ["foo", "bar"] {
            let app = crate::api::app(AppState::for_tests(Config::default()));
            let resp = get(app, &format!("/v1/{name}")).await;
            assert_eq!(resp.status(), StatusCode::OK);

            let json = body_json(resp.into_body()).await;
            assert_eq!(json["application"], name);
        }
    }

    #[tokio::test]
    async fn unknown_application_is_404() {
        let app = crate::api::app(AppState::for_tests(Config::default()));
        let resp = get(app, "/v1/baz").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
