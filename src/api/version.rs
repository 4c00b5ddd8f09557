//! `GET /version` — reports the configured application name and version.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
}

pub async fn version(State(state): State<Arc<AppState>>) -> Json<VersionInfo> {
    let app = &state.config.app;
    Json(VersionInfo {
        name: app.name.clone(),
        version: app.version.clone(),
    })
}
