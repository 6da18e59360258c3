//! Name-to-endpoint directory letting callers locate a store by name.
mod client;

pub use client::*;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use crate::error::{Result, TransportError};

/// Default port of the directory.
pub const DEFAULT_PORT: u16 = 1099;
/// Name the user store is published under.
pub const DEFAULT_SERVICE_NAME: &str = "UserManager";

/// HTTP endpoint of `host:port`, IPv6 literals bracketed.
pub fn http_endpoint(host: &str, port: u16) -> Result<Url> {
    let authority = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port).to_string(),
        Err(_) => format!("{host}:{port}"),
    };

    Ok(Url::parse(&format!("http://{authority}")).map_err(TransportError::InvalidEndpoint)?)
}

/// Bound names and their endpoints.
#[derive(Debug, Default)]
pub struct Directory {
    names: Mutex<BTreeMap<String, Url>>,
}

impl Directory {
    /// Create an empty [`Directory`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `endpoint` unless it is already bound.
    pub async fn bind(&self, name: &str, endpoint: Url) -> Result<()> {
        match self.names.lock().await.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(TransportError::AlreadyBound(name.to_owned()).into()),
            Entry::Vacant(entry) => {
                tracing::info!(%name, %endpoint, "name bound");
                entry.insert(endpoint);
                Ok(())
            },
        }
    }

    /// Bind `name` to `endpoint`, replacing any previous binding.
    pub async fn rebind(&self, name: &str, endpoint: Url) {
        tracing::info!(%name, %endpoint, "name rebound");
        self.names.lock().await.insert(name.to_owned(), endpoint);
    }

    pub async fn unbind(&self, name: &str) -> Result<()> {
        match self.names.lock().await.remove(name) {
            Some(_) => {
                tracing::info!(%name, "name unbound");
                Ok(())
            },
            None => Err(TransportError::NotBound(name.to_owned()).into()),
        }
    }

    pub async fn lookup(&self, name: &str) -> Result<Url> {
        self.names
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| TransportError::NotBound(name.to_owned()).into())
    }

    /// Every bound name, sorted.
    pub async fn list(&self) -> Vec<String> {
        self.names.lock().await.keys().cloned().collect()
    }
}

/// Body of bind, rebind and lookup.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub endpoint: Url,
}

/// Create the directory router.
pub fn router(directory: Arc<Directory>) -> Router {
    Router::new()
        // `GET /names` lists bound names.
        .route("/names", get(list))
        // `GET|POST|PUT|DELETE /names/{name}`.
        .route(
            "/names/{name}",
            get(lookup).post(bind).put(rebind).delete(unbind),
        )
        .with_state(directory)
}

async fn list(State(directory): State<Arc<Directory>>) -> Json<Vec<String>> {
    Json(directory.list().await)
}

async fn lookup(
    State(directory): State<Arc<Directory>>,
    Path(name): Path<String>,
) -> Result<Json<Binding>> {
    let endpoint = directory.lookup(&name).await?;
    Ok(Json(Binding { endpoint }))
}

async fn bind(
    State(directory): State<Arc<Directory>>,
    Path(name): Path<String>,
    body: std::result::Result<Json<Binding>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(binding) = body?;
    directory.bind(&name, binding.endpoint).await?;
    Ok(StatusCode::CREATED)
}

async fn rebind(
    State(directory): State<Arc<Directory>>,
    Path(name): Path<String>,
    body: std::result::Result<Json<Binding>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(binding) = body?;
    directory.rebind(&name, binding.endpoint).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn unbind(
    State(directory): State<Arc<Directory>>,
    Path(name): Path<String>,
) -> Result<StatusCode> {
    directory.unbind(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
