//! `/users` resource: create, read, update and delete [`User`] records.
//!
//! Reads go through the [`UserCache`](crate::cache::UserCache) first and fall
//! back to the store on a miss; writes go straight to the store and drop the
//! cached copy so the next read sees the new value. A read that overlaps a
//! write does not cache what it fetched.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{error::AppError, state::AppState, store::User};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub name: String,
}

/// Unwrap a JSON body, collapsing every extractor rejection (bad syntax,
/// missing fields, wrong content type) into a plain 400.
fn parse<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        debug!(error = %rejection, "rejected request body");
        AppError::invalid_input()
    })
}

/// Trimmed, non-empty field value.
fn required(value: &str) -> Result<&str, AppError> {
    match value.trim() {
        "" => Err(AppError::invalid_input()),
        trimmed => Ok(trimmed),
    }
}

/// `GET /users/{id}`
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    if let Some(user) = state.cache.get(&id) {
        debug!(%id, "user cache hit");
        return Ok(Json(user));
    }

    let generation = state.cache.generation(&id);
    let user = state.store.get(&id).await?;
    if !state.cache.put(user.clone(), generation) {
        debug!(%id, "user changed during read, not cached");
    }
    Ok(Json(user))
}

/// `POST /users` — 201 with the created user.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let body = parse(payload)?;
    let user = User::new(required(&body.id)?, required(&body.name)?);

    state.store.insert(user.clone()).await?;
    info!(id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /users/{id}` — replaces the user's name. The path id is used as
/// given, the same way GET and DELETE address the record.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUser>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let body = parse(payload)?;
    let user = User::new(id, required(&body.name)?);

    state.store.update(user.clone()).await?;
    state.cache.invalidate(&user.id);
    info!(id = %user.id, "user updated");
    Ok(Json(user))
}

/// `DELETE /users/{id}`
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.store.delete(&id).await?;
    state.cache.invalidate(&id);
    info!(%id, "user deleted");
    Ok(Json(json!({ "message": "User deleted" })))
}
