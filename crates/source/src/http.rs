use std::time::Duration;

use exn::ResultExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Shared `reqwest` client for all sources.
///
/// Cloning is cheap (the connection pool is reference counted).
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::InvalidRequest("could not build HTTP client".to_string()))?;
        Ok(Self { client })
    }

    /// `GET` a URL and return the body text. Any non-2xx status is an error.
    #[instrument(level = "debug", skip(self, query), fields(url = %url))]
    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| exn::Exn::from(ErrorKind::transport(&e)))?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "unsuccessful response");
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        response.text().await.map_err(|e| exn::Exn::from(ErrorKind::transport(&e)))
    }
}

/// Join a base URL and a path without doubling or dropping the slash.
pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
