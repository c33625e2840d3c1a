//! HTTP client builder shared by every outbound call.

use std::time::Duration;

use crate::error::Error;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Total request timeout, including reading the body.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(5),
            user_agent: format!("federation-auth/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for the HTTP client used by the token exchange, profile fetch and
/// transliteration clients.
///
/// Every request made through the built client is bounded by both timeouts. A request
/// that exceeds them fails like any other transport error.
pub struct HttpClientBuilder {
    config: HttpClientConfig,
}

impl HttpClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
        }
    }

    /// Set both the connect and the total request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self.config.timeout = timeout;
        self
    }

    /// Set the connect timeout only.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<reqwest::Client, Error> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent)
            .build()?;

        Ok(client)
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
