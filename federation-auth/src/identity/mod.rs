//! Canonical identity records and profile normalization.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{identity_error, Error, IdentityErrorKind};
use crate::transliteration::Transliterator;

/// Default domain for synthesized email addresses.
pub const DEFAULT_EMAIL_DOMAIN: &str = "dcx.com";

/// User attribute holding the mobile number. Only contact-book apps receive it.
pub const MOBILE_ATTRIBUTE: &str = "mobile";

const UNION_ID_FIELD: &str = "unionId";
const OPEN_ID_FIELD: &str = "openId";
const NICK_FIELD: &str = "nick";
const EMAIL_FIELD: &str = "email";
const MOBILE_FIELD: &str = "mobile";

/// Normalized, framework-agnostic representation of a federated user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FederatedIdentity {
    /// Lowercased DingTalk union id. Never empty.
    pub federated_id: String,
    /// Lowercased DingTalk open id, scoped to the app.
    pub open_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub attributes: BTreeMap<String, String>,
}

impl FederatedIdentity {
    /// Attributes to write onto the local user on every login.
    pub fn user_attributes(&self) -> BTreeMap<String, String> {
        let mut attributes = self.attributes.clone();
        attributes.insert("username".to_string(), self.username.clone());
        attributes.insert("firstName".to_string(), self.first_name.clone());
        attributes.insert("lastName".to_string(), self.last_name.clone());
        attributes.insert("email".to_string(), self.email.clone());
        attributes
    }
}

/// Split a display name into `(last_name, first_name)`.
///
/// The family name is the first character and the given name is the rest, which is
/// how Chinese names are written. An empty nick gives two empty parts.
pub fn split_nick(nick: &str) -> (String, String) {
    let mut chars = nick.chars();
    match chars.next() {
        Some(first) => (first.to_string(), chars.as_str().to_string()),
        None => (String::new(), String::new()),
    }
}

fn string_field<'a>(profile: &'a Value, field: &str) -> Option<&'a str> {
    profile.get(field).and_then(Value::as_str)
}

/// Map a raw DingTalk profile onto a [`FederatedIdentity`].
///
/// The username is the transliterated nick; a transliteration failure fails the whole
/// normalization rather than falling back to the raw nick. When the nick is empty
/// there is nothing to transliterate and the open id (or union id) is used instead.
///
/// # Errors
///
/// * `MalformedProfile` - `unionId` is absent or empty
/// * `TransliterationFailed` - the transliterator failed or returned nothing
pub async fn normalize(
    profile: Value,
    transliterator: &dyn Transliterator,
    email_domain: &str,
) -> Result<FederatedIdentity, Error> {
    let federated_id = string_field(&profile, UNION_ID_FIELD)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_lowercase)
        .ok_or_else(|| {
            identity_error(
                IdentityErrorKind::MalformedProfile,
                "profile has no unionId",
            )
        })?;

    let open_id = string_field(&profile, OPEN_ID_FIELD)
        .unwrap_or_default()
        .to_lowercase();
    let nick = string_field(&profile, NICK_FIELD).unwrap_or_default();
    let mobile = string_field(&profile, MOBILE_FIELD).unwrap_or_default();

    let (last_name, first_name) = split_nick(nick);

    let username = if nick.is_empty() {
        if open_id.is_empty() {
            federated_id.clone()
        } else {
            open_id.clone()
        }
    } else {
        let transliterated = transliterator.transliterate(nick).await?;
        let username = transliterated.trim().to_lowercase();
        if username.is_empty() {
            return Err(identity_error(
                IdentityErrorKind::TransliterationFailed,
                "transliteration produced an empty username",
            ));
        }
        username
    };

    let email = match string_field(&profile, EMAIL_FIELD).map(str::trim) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ => format!("{}@{}", username, email_domain),
    };

    let mut attributes = BTreeMap::new();
    attributes.insert(MOBILE_ATTRIBUTE.to_string(), mobile.to_string());

    debug!(
        "Normalized profile {} as username={} lastName={} firstName={} email={}",
        federated_id, username, last_name, first_name, email
    );

    Ok(FederatedIdentity {
        federated_id,
        open_id,
        username,
        first_name,
        last_name,
        email,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers with a fixed result and counts calls.
    struct StubTransliterator {
        result: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl StubTransliterator {
        fn answering(result: &'static str) -> Self {
            Self {
                result: Some(result),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                result: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Transliterator for StubTransliterator {
        async fn transliterate(&self, _text: &str) -> Result<String, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.map(str::to_string).ok_or_else(|| {
                identity_error(IdentityErrorKind::TransliterationFailed, "service down")
            })
        }
    }

    #[test]
    fn test_split_nick() {
        assert_eq!(split_nick("张伟"), ("张".to_string(), "伟".to_string()));
        assert_eq!(
            split_nick("欧阳娜娜"),
            ("欧".to_string(), "阳娜娜".to_string())
        );
        assert_eq!(split_nick("伟"), ("伟".to_string(), String::new()));
        assert_eq!(split_nick(""), (String::new(), String::new()));
    }

    #[test]
    fn test_split_nick_concatenates_back() {
        for nick in ["张伟", "a", "Zoë Smith", "李", "🙂ok", "司马相如"] {
            let (last_name, first_name) = split_nick(nick);
            assert_eq!(format!("{}{}", last_name, first_name), nick);
            assert_eq!(last_name.chars().count(), 1);
        }
    }

    #[tokio::test]
    async fn test_normalize_full_profile() {
        let transliterator = StubTransliterator::answering("zhangwei");
        let profile = json!({
            "unionId": "U1",
            "openId": "O1",
            "nick": "张伟",
            "mobile": "123"
        });

        let identity = normalize(profile, &transliterator, DEFAULT_EMAIL_DOMAIN)
            .await
            .unwrap();

        assert_eq!(identity.federated_id, "u1");
        assert_eq!(identity.open_id, "o1");
        assert_eq!(identity.username, "zhangwei");
        assert_eq!(identity.last_name, "张");
        assert_eq!(identity.first_name, "伟");
        assert_eq!(identity.email, "zhangwei@dcx.com");
        assert_eq!(identity.attributes.get("mobile").unwrap(), "123");
    }

    #[tokio::test]
    async fn test_normalize_keeps_upstream_email() {
        let transliterator = StubTransliterator::answering("liming");
        let profile = json!({
            "unionId": "U2",
            "openId": "O2",
            "nick": "李明",
            "email": "ming.li@example.com"
        });

        let identity = normalize(profile, &transliterator, "corp.example")
            .await
            .unwrap();

        assert_eq!(identity.email, "ming.li@example.com");
        assert_eq!(identity.attributes.get("mobile").unwrap(), "");
    }

    #[tokio::test]
    async fn test_normalize_synthesizes_email_with_configured_domain() {
        let transliterator = StubTransliterator::answering("LiMing ");
        let profile = json!({ "unionId": "U2", "nick": "李明", "email": "" });

        let identity = normalize(profile, &transliterator, "corp.example")
            .await
            .unwrap();

        assert_eq!(identity.username, "liming");
        assert_eq!(identity.email, "liming@corp.example");
    }

    #[tokio::test]
    async fn test_normalize_fails_without_union_id() {
        let profiles = [
            json!({ "openId": "O1", "nick": "张伟" }),
            json!({ "unionId": "", "openId": "O1", "nick": "张伟" }),
            json!({ "unionId": 42, "openId": "O1", "nick": "张伟" }),
            json!({}),
        ];

        for profile in profiles {
            let transliterator = StubTransliterator::answering("zhangwei");
            let err = normalize(profile, &transliterator, DEFAULT_EMAIL_DOMAIN)
                .await
                .unwrap_err();

            assert_eq!(
                err.error_kind,
                ErrorKind::Identity(IdentityErrorKind::MalformedProfile)
            );
            assert_eq!(transliterator.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_normalize_fails_when_transliteration_fails() {
        let transliterator = StubTransliterator::failing();
        let profile = json!({ "unionId": "U1", "openId": "O1", "nick": "张伟" });

        let err = normalize(profile, &transliterator, DEFAULT_EMAIL_DOMAIN)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Identity(IdentityErrorKind::TransliterationFailed)
        );
    }

    #[tokio::test]
    async fn test_normalize_rejects_blank_transliteration() {
        let transliterator = StubTransliterator::answering("  ");
        let profile = json!({ "unionId": "U1", "nick": "张伟" });

        let err = normalize(profile, &transliterator, DEFAULT_EMAIL_DOMAIN)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Identity(IdentityErrorKind::TransliterationFailed)
        );
    }

    #[tokio::test]
    async fn test_normalize_empty_nick_uses_open_id() {
        let transliterator = StubTransliterator::answering("unused");
        let profile = json!({ "unionId": "U1", "openId": "O1", "nick": "" });

        let identity = normalize(profile, &transliterator, DEFAULT_EMAIL_DOMAIN)
            .await
            .unwrap();

        assert_eq!(identity.username, "o1");
        assert_eq!(identity.last_name, "");
        assert_eq!(identity.first_name, "");
        assert_eq!(identity.email, "o1@dcx.com");
        assert_eq!(transliterator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_normalize_empty_nick_without_open_id_uses_union_id() {
        let transliterator = StubTransliterator::answering("unused");
        let profile = json!({ "unionId": "U1" });

        let identity = normalize(profile, &transliterator, DEFAULT_EMAIL_DOMAIN)
            .await
            .unwrap();

        assert_eq!(identity.username, "u1");
    }

    #[tokio::test]
    async fn test_normalize_single_character_nick() {
        let transliterator = StubTransliterator::answering("wei");
        let profile = json!({ "unionId": "U1", "nick": "伟" });

        let identity = normalize(profile, &transliterator, DEFAULT_EMAIL_DOMAIN)
            .await
            .unwrap();

        assert_eq!(identity.last_name, "伟");
        assert_eq!(identity.first_name, "");
    }

    #[tokio::test]
    async fn test_user_attributes_projection() {
        let transliterator = StubTransliterator::answering("zhangwei");
        let profile = json!({ "unionId": "U1", "nick": "张伟", "mobile": "123" });

        let identity = normalize(profile, &transliterator, DEFAULT_EMAIL_DOMAIN)
            .await
            .unwrap();
        let attributes = identity.user_attributes();

        assert_eq!(attributes.get("username").unwrap(), "zhangwei");
        assert_eq!(attributes.get("firstName").unwrap(), "伟");
        assert_eq!(attributes.get("lastName").unwrap(), "张");
        assert_eq!(attributes.get("email").unwrap(), "zhangwei@dcx.com");
        assert_eq!(attributes.get("mobile").unwrap(), "123");
    }
}
