//! Unified HTTP error type for axum request handlers.
//!
//! Every handler that can fail returns `Result<T, AppError>` and propagates
//! errors with `?`. [`AppError`] picks the status code and renders the body as
//! `{"error": "<message>"}` via [`IntoResponse`].
//!
//! # Example
//!
//! ```rust,ignore
//! async fn get_user(
//!     State(state): State<Arc<AppState>>,
//!     Path(id): Path<String>,
//! ) -> Result<Json<User>, AppError> {
//!     let user = state.store.get(&id).await?;
//!     Ok(Json(user))
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The request body or path was rejected before reaching the store.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Anything unexpected. Rendered as 500.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// The canonical rejection for unparseable or incomplete input.
    pub fn invalid_input() -> Self {
        Self::BadRequest("Invalid input".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "handler error");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
