//! Public status page for operators and callers.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;

/// Structured status.
#[derive(Debug, Serialize, Deserialize)]
pub struct Status {
    version: String,
    name: String,
    debug: bool,
    users: usize,
}

/// Public server status.
pub async fn status(State(state): State<AppState>) -> Result<Json<Status>> {
    Ok(Json(Status {
        version: env!("CARGO_PKG_VERSION").into(),
        name: state.config.name.clone(),
        debug: state.config.debug,
        users: state.records.len().await,
    }))
}
