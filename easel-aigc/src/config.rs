//! Client configuration and shared HTTP plumbing.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::aigc::AigcClient;
use crate::error::{ClientError, ClientResult};
use crate::upload::UploadClient;

/// Default `user-agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("easel-aigc/", env!("CARGO_PKG_VERSION"));

/// Application code that marks a successful envelope.
pub(crate) const SUCCESS_CODE: i64 = 200;

/// Deserialize a field, reading an explicit `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Connection settings for both clients.
///
/// The library never reads the environment; hosts resolve these values.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the AIGC service (`/api/v2/image_generation/...`).
    pub aigc_url: String,
    /// Base URL of the business backend (`/backend/aigc/...`).
    pub backend_url: String,
    /// `user-agent` header value.
    pub user_agent: String,
    /// Optional per-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a configuration for the given service base URLs.
    #[must_use]
    pub fn new(aigc_url: impl Into<String>, backend_url: impl Into<String>) -> Self {
        Self {
            aigc_url: aigc_url.into(),
            backend_url: backend_url.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: None,
        }
    }

    /// Override the `user-agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Bound every request by a timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build both clients over one shared connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if either base URL is malformed.
    /// Returns [`ClientError::Http`] if the HTTP client fails to build.
    pub fn clients(&self) -> ClientResult<(AigcClient, UploadClient)> {
        let http = build_http(&self.user_agent, self.request_timeout)?;
        let aigc = AigcClient::with_http(&self.aigc_url, http.clone())?;
        let upload = UploadClient::with_http(&self.backend_url, http)?;
        Ok((aigc, upload))
    }
}

/// Build the shared `reqwest` client.
pub(crate) fn build_http(user_agent: &str, timeout: Option<Duration>) -> ClientResult<Client> {
    let mut builder = Client::builder()
        .user_agent(user_agent)
        // Disable proxy detection to avoid macOS system-configuration panic
        .no_proxy();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Parse and validate a service base URL.
pub(crate) fn parse_base_url(raw: &str) -> ClientResult<Url> {
    let mut url = Url::parse(raw).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl(format!("{raw}: cannot be a base URL")));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Append path segments to a base URL, keeping any base path prefix.
///
/// Segments are percent-encoded, so ids may contain `/` safely.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> ClientResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ClientError::InvalidUrl(format!("{base}: cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-2xx response into [`ClientError::Status`].
pub(crate) fn ensure_success(response: &Response) -> ClientResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Status { status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_on_bare_host() {
        let base = parse_base_url("http://localhost:8056").expect("base");
        let url = endpoint(&base, &["backend", "aigc", "common"]).expect("endpoint");
        assert_eq!(url.as_str(), "http://localhost:8056/backend/aigc/common");
    }

    #[test]
    fn test_endpoint_keeps_base_prefix() {
        let base = parse_base_url("https://gateway.local/proxy/?debug=1").expect("base");
        let url = endpoint(&base, &["api", "v2"]).expect("endpoint");
        assert_eq!(url.as_str(), "https://gateway.local/proxy/api/v2");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = parse_base_url("http://localhost").expect("base");
        let url = endpoint(&base, &["history", "a/b c"]).expect("endpoint");
        assert_eq!(url.path(), "/history/a%2Fb%20c");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_base_url("mailto:dev@example.com"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_config_builds_clients() {
        let config = ClientConfig::new("http://localhost:9890", "http://localhost:8056")
            .with_request_timeout(Duration::from_secs(30));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.clients().is_ok());

        let bad = ClientConfig::new("::", "http://localhost:8056");
        assert!(matches!(bad.clients(), Err(ClientError::InvalidUrl(_))));
    }
}
