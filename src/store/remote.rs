//! Caller-side handle on a user store served over HTTP.

use async_trait::async_trait;
use reqwest::{Client, Response};
use url::Url;

use crate::directory::DirectoryClient;
use crate::error::{ResponseError, Result, TransportError};
use crate::router::users::{Created, UpdateBody, Updated};
use crate::store::UserStore;
use crate::user::User;

/// Remote user store located through a directory.
#[derive(Debug, Clone)]
pub struct RemoteUserStore {
    endpoint: Url,
    http: Client,
}

/// Resolve the directory at `host:port`, look up `name` and return a handle
/// on the store bound to it.
///
/// # Errors
///
/// Returns a transport error if the directory is unreachable or `name` is
/// not bound.
pub async fn connect(host: &str, port: u16, name: &str) -> Result<RemoteUserStore> {
    let directory = DirectoryClient::locate(host, port)?;
    let endpoint = directory.lookup(name).await?;

    tracing::info!(%name, %endpoint, "user store located");

    Ok(RemoteUserStore::new(endpoint))
}

impl RemoteUserStore {
    /// Create a new [`RemoteUserStore`] talking to `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            http: Client::new(),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn users_url(&self) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::InvalidEndpoint(
                    url::ParseError::RelativeUrlWithCannotBeABaseBase,
                )
            })?
            .pop_if_empty()
            .push("users");
        Ok(url)
    }
}

/// Turn a non-success answer into the matching caller-side error.
pub(crate) async fn check(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    match response.json::<ResponseError>().await {
        Ok(problem) => Err(problem.into_error()),
        Err(_) => Err(TransportError::Status {
            status: status.as_u16(),
            detail: status.to_string(),
        }
        .into()),
    }
}

#[async_trait]
impl UserStore for RemoteUserStore {
    async fn create(&self, user: User) -> Result<bool> {
        let response = self
            .http
            .post(self.users_url()?)
            .json(&user)
            .send()
            .await?;

        Ok(check(response).await?.json::<Created>().await?.created)
    }

    async fn read(&self) -> Result<Vec<User>> {
        let response = self.http.get(self.users_url()?).send().await?;

        Ok(check(response).await?.json::<Vec<User>>().await?)
    }

    async fn update(&self, email: &str, key: &str, value: &str) -> Result<bool> {
        let response = self
            .http
            .patch(self.users_url()?)
            .json(&UpdateBody {
                email: email.to_owned(),
                field: key.to_owned(),
                value: value.to_owned(),
            })
            .send()
            .await?;

        Ok(check(response).await?.json::<Updated>().await?.updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_with_path() {
        let store = RemoteUserStore::new(Url::parse("http://127.0.0.1:8080/api/").unwrap());
        let url = store.users_url().unwrap();

        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/users");
    }
}
