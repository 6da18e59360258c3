//! Caller-side access to a remote directory.

use reqwest::Client;
use url::Url;

use crate::directory::{Binding, http_endpoint};
use crate::error::{Result, TransportError};
use crate::store::check;

/// Handle on the directory served at a given host.
///
/// Creating it performs no network call; failures surface on first use.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    base: Url,
    http: Client,
}

impl DirectoryClient {
    /// Locate the directory listening on `host:port`.
    pub fn locate(host: &str, port: u16) -> Result<Self> {
        let base = http_endpoint(host, port)?;

        Ok(Self {
            base,
            http: Client::new(),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, name: Option<&str>) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransportError::InvalidEndpoint(
                    url::ParseError::RelativeUrlWithCannotBeABaseBase,
                )
            })?;
            segments.pop_if_empty().push("names");
            if let Some(name) = name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    /// Endpoint bound to `name`.
    pub async fn lookup(&self, name: &str) -> Result<Url> {
        let response = self.http.get(self.url(Some(name))?).send().await?;
        Ok(check(response).await?.json::<Binding>().await?.endpoint)
    }

    /// Bind `name`, failing if it is already bound.
    pub async fn bind(&self, name: &str, endpoint: &Url) -> Result<()> {
        let response = self
            .http
            .post(self.url(Some(name))?)
            .json(&Binding {
                endpoint: endpoint.clone(),
            })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Bind `name`, replacing any previous binding.
    pub async fn rebind(&self, name: &str, endpoint: &Url) -> Result<()> {
        let response = self
            .http
            .put(self.url(Some(name))?)
            .json(&Binding {
                endpoint: endpoint.clone(),
            })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn unbind(&self, name: &str) -> Result<()> {
        let response = self.http.delete(self.url(Some(name))?).send().await?;
        check(response).await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<String>> {
        let response = self.http.get(self.url(None)?).send().await?;
        Ok(check(response).await?.json::<Vec<String>>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_builds_urls() {
        let directory = DirectoryClient::locate("localhost", 1099).unwrap();

        assert_eq!(directory.base().as_str(), "http://localhost:1099/");
        assert_eq!(
            directory.url(Some("UserManager")).unwrap().as_str(),
            "http://localhost:1099/names/UserManager"
        );
        assert_eq!(
            directory.url(None).unwrap().as_str(),
            "http://localhost:1099/names"
        );
    }

    #[test]
    fn test_locate_ipv6_host() {
        let directory = DirectoryClient::locate("::1", 1099).unwrap();

        assert_eq!(
            directory.url(None).unwrap().as_str(),
            "http://[::1]:1099/names"
        );
    }

    #[test]
    fn test_locate_rejects_garbage_host() {
        let err = DirectoryClient::locate("not a host", 1099).unwrap_err();
        assert!(err.is_transport());
    }
}
