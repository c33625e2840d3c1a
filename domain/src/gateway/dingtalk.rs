use crate::error::Error;
use federation_auth::http::HttpClientBuilder;
use federation_auth::oauth::providers::dingtalk::{DingTalkConfig, Provider};
use federation_auth::oauth::token::CacheRegistry;
use federation_auth::transliteration;
use log::*;
use secrecy::SecretString;
use service::config::Config;
use std::sync::Arc;
use std::time::Duration;

/// Sent on every outbound request: DingTalk, and the transliteration service.
pub fn user_agent() -> String {
    format!("dingtalk-broker/{}", env!("CARGO_PKG_VERSION"))
}

/// Reads the DingTalk client settings out of the process configuration.
pub fn provider_config(config: &Config) -> Result<DingTalkConfig, Error> {
    let client_id = config.dingtalk_client_id().ok_or_else(|| {
        warn!("Failed to get DingTalk client id from config");
        Error::config("DingTalk client id is not configured")
    })?;
    let client_secret = config.dingtalk_client_secret().ok_or_else(|| {
        warn!("Failed to get DingTalk client secret from config");
        Error::config("DingTalk client secret is not configured")
    })?;

    let mut provider_config = DingTalkConfig::new(client_id, SecretString::new(client_secret));
    provider_config.alias = config.provider_alias().to_string();
    provider_config.auth_url = config.dingtalk_auth_url().to_string();
    provider_config.token_url = config.dingtalk_token_url().to_string();
    provider_config.profile_url = config.dingtalk_profile_url().to_string();
    provider_config.scope = config.dingtalk_scope().to_string();
    provider_config.email_domain = config.email_domain().to_string();
    Ok(provider_config)
}

/// Builds the DingTalk provider, sharing one HTTP client between DingTalk and the
/// transliteration service. `token_caches` is owned by the caller so every provider
/// built for the same client id writes to the same cache.
pub fn new_provider(config: &Config, token_caches: Arc<CacheRegistry>) -> Result<Provider, Error> {
    let provider_config = provider_config(config)?;

    let http_client = HttpClientBuilder::new()
        .with_timeout(Duration::from_secs(config.http_timeout_secs))
        .with_user_agent(user_agent())
        .build()?;
    let transliterator = Arc::new(transliteration::Client::new(
        http_client.clone(),
        config.transliteration_url().to_string(),
    ));

    info!(
        "Configured DingTalk provider {} for client {}",
        provider_config.alias, provider_config.client_id
    );
    Ok(Provider::new(
        provider_config,
        http_client,
        token_caches,
        transliterator,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use clap::Parser;
    use federation_auth::oauth::IdentityProvider;
    use mockito::{Matcher, Server};
    use secrecy::ExposeSecret;
    use serde_json::json;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["dingtalk_broker"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_provider_config_requires_credentials() {
        let err = provider_config(&parse(&[])).unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
    }

    #[test]
    fn test_provider_config_copies_overrides() {
        let config = parse(&[
            "--provider-alias",
            "dingtalk-corp",
            "--dingtalk-token-url",
            "http://127.0.0.1:9/token",
            "--email-domain",
            "corp.example",
        ])
        .set_dingtalk_credentials("ding-client".to_string(), "ding-secret".to_string());

        let provider_config = provider_config(&config).unwrap();

        assert_eq!(provider_config.alias, "dingtalk-corp");
        assert_eq!(provider_config.client_id, "ding-client");
        assert_eq!(provider_config.client_secret.expose_secret(), "ding-secret");
        assert_eq!(provider_config.token_url, "http://127.0.0.1:9/token");
        assert_eq!(provider_config.scope, "openid corpid");
        assert_eq!(provider_config.email_domain, "corp.example");
    }

    #[test]
    fn test_new_provider_shares_token_caches() {
        let config = parse(&[])
            .set_dingtalk_credentials("ding-client".to_string(), "ding-secret".to_string());
        let caches = Arc::new(CacheRegistry::new());

        let first = new_provider(&config, caches.clone()).unwrap();
        let second = new_provider(&config, caches.clone()).unwrap();
        first.cached_access_token();
        second.cached_access_token();

        assert_eq!(first.alias(), "dingtalk");
        assert_eq!(caches.created_count(), 1);
    }

    #[tokio::test]
    async fn test_new_provider_sends_broker_user_agent() {
        let mut server = Server::new_async().await;
        let pinyin_mock = server
            .mock("GET", "/topinyin")
            .match_query(Matcher::Any)
            .match_header("user-agent", user_agent().as_str())
            .with_status(200)
            .with_body("zhangwei")
            .expect(1)
            .create_async()
            .await;
        let config = parse(&[])
            .set_dingtalk_credentials("ding-client".to_string(), "ding-secret".to_string())
            .set_transliteration_url(format!("{}/topinyin", server.url()));

        let provider = new_provider(&config, Arc::new(CacheRegistry::new())).unwrap();
        let identity = provider
            .normalize(json!({ "unionId": "U1", "openId": "O1", "nick": "张伟" }))
            .await
            .unwrap();

        assert_eq!(identity.username, "zhangwei");
        pinyin_mock.assert_async().await;
    }
}
