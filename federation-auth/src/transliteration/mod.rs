//! Name transliteration.
//!
//! Display names coming back from DingTalk are usually Chinese. Usernames must be
//! portable identifiers, so the nick is sent to a transliteration service that answers
//! with a Latin-script rendering (pinyin) as a plain-text body.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{identity_error, with_kind, Error, ErrorKind, IdentityErrorKind};

/// Converts free text into a Latin-script identifier.
#[async_trait]
pub trait Transliterator: Send + Sync {
    /// Transliterate `text`. Fails with `IdentityErrorKind::TransliterationFailed`.
    async fn transliterate(&self, text: &str) -> Result<String, Error>;
}

/// HTTP client for the transliteration service.
pub struct Client {
    http_client: reqwest::Client,
    url: String,
}

impl Client {
    /// Create a new transliteration client.
    ///
    /// # Arguments
    ///
    /// * `http_client` - Shared client; its timeouts bound every call
    /// * `url` - Transliteration endpoint, queried as `<url>?text=<text>`
    pub fn new(http_client: reqwest::Client, url: String) -> Self {
        Self { http_client, url }
    }

    async fn request(&self, text: &str) -> Result<String, Error> {
        let response = self
            .http_client
            .get(&self.url)
            .query(&[("text", text)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(identity_error(
                IdentityErrorKind::TransliterationFailed,
                &format!("transliteration service returned {}", status),
            ));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Transliterator for Client {
    async fn transliterate(&self, text: &str) -> Result<String, Error> {
        let body = self.request(text).await.map_err(|e| {
            warn!("Transliteration request failed: {}", e);
            match e.error_kind {
                ErrorKind::Identity(IdentityErrorKind::TransliterationFailed) => e,
                _ => with_kind(
                    ErrorKind::Identity(IdentityErrorKind::TransliterationFailed),
                    e,
                ),
            }
        })?;

        let transliterated = body.trim();
        if transliterated.is_empty() {
            return Err(identity_error(
                IdentityErrorKind::TransliterationFailed,
                "transliteration service returned an empty result",
            ));
        }

        debug!("Transliterated {} to {}", text, transliterated);
        Ok(transliterated.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpClientBuilder;
    use mockito::{Matcher, Server};
    use std::io::Write;
    use std::time::Duration;

    fn client(url: String) -> Client {
        client_with_timeout(url, Duration::from_secs(2))
    }

    fn client_with_timeout(url: String, timeout: Duration) -> Client {
        let http_client = HttpClientBuilder::new()
            .with_timeout(timeout)
            .build()
            .unwrap();
        Client::new(http_client, url)
    }

    #[tokio::test]
    async fn test_transliterate_returns_trimmed_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/topinyin")
            .match_query(Matcher::UrlEncoded("text".into(), "张伟".into()))
            .with_status(200)
            .with_body("zhangwei\n")
            .create_async()
            .await;

        let client = client(format!("{}/topinyin", server.url()));
        let result = client.transliterate("张伟").await.unwrap();

        assert_eq!(result, "zhangwei");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transliterate_fails_on_server_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/topinyin")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = client(format!("{}/topinyin", server.url()));
        let err = client.transliterate("张伟").await.unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Identity(IdentityErrorKind::TransliterationFailed)
        );
    }

    #[tokio::test]
    async fn test_transliterate_fails_on_empty_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/topinyin")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("   ")
            .create_async()
            .await;

        let client = client(format!("{}/topinyin", server.url()));
        let err = client.transliterate("张伟").await.unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Identity(IdentityErrorKind::TransliterationFailed)
        );
    }

    #[tokio::test]
    async fn test_transliterate_fails_when_service_unreachable() {
        // Nothing listens on the discard port.
        let client = client("http://127.0.0.1:9/topinyin".to_string());
        let err = client.transliterate("张伟").await.unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Identity(IdentityErrorKind::TransliterationFailed)
        );
    }

    #[tokio::test]
    async fn test_transliterate_fails_when_service_is_too_slow() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/topinyin")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(2));
                w.write_all(b"zhangwei")
            })
            .expect(1)
            .create_async()
            .await;

        let client = client_with_timeout(
            format!("{}/topinyin", server.url()),
            Duration::from_secs(1),
        );
        let err = client.transliterate("张伟").await.unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Identity(IdentityErrorKind::TransliterationFailed)
        );
        mock.assert_async().await;
    }
}
