pub mod status;
pub mod users;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::extract::State;

use crate::AppState;

/// Prometheus exposition, when the recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Application state backed by a fresh in-memory store.
#[cfg(test)]
pub fn state(debug: bool) -> AppState {
    let config = crate::config::Configuration {
        debug,
        ..Default::default()
    };

    crate::initialize_state(std::sync::Arc::new(config), None)
}

/// Store whose calls wait for a permit of `gate` before reaching `inner`.
#[cfg(test)]
pub struct GatedStore {
    inner: std::sync::Arc<crate::store::MemoryUserStore>,
    gate: std::sync::Arc<tokio::sync::Semaphore>,
}

#[cfg(test)]
#[async_trait::async_trait]
impl crate::store::UserStore for GatedStore {
    async fn create(&self, user: crate::user::User) -> crate::Result<bool> {
        let _permit = self.gate.acquire().await;
        self.inner.create(user).await
    }

    async fn read(&self) -> crate::Result<Vec<crate::user::User>> {
        let _permit = self.gate.acquire().await;
        self.inner.read().await
    }

    async fn update(&self, email: &str, key: &str, value: &str) -> crate::Result<bool> {
        let _permit = self.gate.acquire().await;
        self.inner.update(email, key, value).await
    }
}

/// Application state whose store calls block until the returned gate opens.
#[cfg(test)]
pub fn gated_state() -> (AppState, std::sync::Arc<tokio::sync::Semaphore>) {
    use std::sync::Arc;

    let records = Arc::new(crate::store::MemoryUserStore::new());
    let gate = Arc::new(tokio::sync::Semaphore::new(0));
    let users = GatedStore {
        inner: Arc::clone(&records),
        gate: Arc::clone(&gate),
    };

    let state = AppState {
        config: Arc::new(crate::config::Configuration::default()),
        users: Arc::new(users),
        records,
        metrics: None,
    };
    (state, gate)
}
