//! Users-related HTTP API, one route per store operation.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Result, TransportError};
use crate::user::User;

/// Answer of `POST /users`.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Created {
    pub created: bool,
}

/// Answer of `PATCH /users`.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Updated {
    pub updated: bool,
}

/// Body of `PATCH /users`.
///
/// The email travels in the body, any string is a valid identity.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateBody {
    pub email: String,
    pub field: String,
    pub value: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        // `POST /users` goes to `create`, `GET /users` to `read`,
        // `PATCH /users` to `update`.
        .route("/", get(read).post(create).patch(update))
        // pictures travel inline, whatever their size.
        .layer(DefaultBodyLimit::disable())
}

/// Run a store call on its own task.
///
/// Once started, the call completes even if the request is dropped.
async fn detached<T, F>(call: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(call).await.map_err(TransportError::from)?
}

async fn create(
    State(state): State<AppState>,
    body: std::result::Result<Json<User>, JsonRejection>,
) -> Result<Json<Created>> {
    let Json(user) = body?;
    let users = Arc::clone(&state.users);
    let created = detached(async move { users.create(user).await }).await?;

    Ok(Json(Created { created }))
}

async fn read(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let users = Arc::clone(&state.users);

    Ok(Json(detached(async move { users.read().await }).await?))
}

async fn update(
    State(state): State<AppState>,
    body: std::result::Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<Updated>> {
    let Json(body) = body?;
    let users = Arc::clone(&state.users);
    let updated = detached(async move {
        users
            .update(&body.email, &body.field, &body.value)
            .await
    })
    .await?;

    Ok(Json(Updated { updated }))
}
