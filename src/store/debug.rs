//! Timing decorator for any user store.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::store::UserStore;
use crate::user::User;

/// `tracing` target of the timing events.
pub const DEBUG_TARGET: &str = "userbase::debug";

/// Decorator logging entry and exit timestamps of every store call.
///
/// Results and errors of the wrapped store are returned untouched.
pub struct DebugUserStore<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: UserStore> DebugUserStore<S> {
    /// Create a new [`DebugUserStore`] timed with the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Get a reference to the wrapped store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    async fn timed<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let entered_at = self.clock.now_millis();
        tracing::info!(target: DEBUG_TARGET, operation, entered_at, "entering store call");

        let result = call.await;

        let exited_at = self.clock.now_millis();
        tracing::info!(
            target: DEBUG_TARGET,
            operation,
            entered_at,
            exited_at,
            success = result.is_ok(),
            "leaving store call"
        );

        result
    }
}

#[async_trait]
impl<S: UserStore> UserStore for DebugUserStore<S> {
    async fn create(&self, user: User) -> Result<bool> {
        self.timed("create", self.store.create(user)).await
    }

    async fn read(&self) -> Result<Vec<User>> {
        self.timed("read", self.store.read()).await
    }

    async fn update(&self, email: &str, key: &str, value: &str) -> Result<bool> {
        self.timed("update", self.store.update(email, key, value))
            .await
    }
}
