use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;

/// Default DingTalk authorization endpoint.
pub const DEFAULT_DINGTALK_AUTH_URL: &str = "https://login.dingtalk.com/oauth2/auth";
/// Default DingTalk user access token endpoint.
pub const DEFAULT_DINGTALK_TOKEN_URL: &str =
    "https://api.dingtalk.com/v1.0/oauth2/userAccessToken";
/// Default DingTalk "current user" profile endpoint.
pub const DEFAULT_DINGTALK_PROFILE_URL: &str = "https://api.dingtalk.com/v1.0/contact/users/me";
/// Default transliteration service, running next to the broker.
pub const DEFAULT_TRANSLITERATION_URL: &str = "http://127.0.0.1:28080/topinyin";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The alias the DingTalk provider is registered under. Shows up in logs and audit events.
    #[arg(long, env, default_value = "dingtalk")]
    provider_alias: String,

    /// The DingTalk application's client id (AppKey).
    #[arg(long, env)]
    dingtalk_client_id: Option<String>,

    /// The DingTalk application's client secret (AppSecret).
    #[arg(long, env, hide_env_values = true)]
    dingtalk_client_secret: Option<String>,

    /// The DingTalk authorization endpoint the browser is redirected to.
    #[arg(long, env, default_value = DEFAULT_DINGTALK_AUTH_URL)]
    dingtalk_auth_url: String,

    /// The DingTalk endpoint authorization codes are exchanged at.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_DINGTALK_TOKEN_URL)]
    dingtalk_token_url: String,

    /// The DingTalk endpoint returning the signed-in user's profile.
    #[arg(long, env, default_value = DEFAULT_DINGTALK_PROFILE_URL)]
    dingtalk_profile_url: String,

    /// Scope requested on the authorization redirect.
    #[arg(long, env, default_value = "openid corpid")]
    dingtalk_scope: String,

    /// The callback URL registered with DingTalk. Must route to the broker endpoint.
    #[arg(
        long,
        env,
        default_value = "http://localhost:4000/broker/dingtalk/endpoint"
    )]
    dingtalk_redirect_uri: String,

    /// The transliteration service that turns display names into usernames.
    #[arg(long, env, default_value = DEFAULT_TRANSLITERATION_URL)]
    transliteration_url: String,

    /// Domain used to synthesize an email address when DingTalk does not return one.
    #[arg(long, env, default_value = "dcx.com")]
    email_domain: String,

    /// Connect and read timeout in seconds applied to every outbound call.
    #[arg(long, env, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub http_timeout_secs: u64,

    /// Seconds a pending login (state parameter) stays valid. At most one day.
    #[arg(long, env, default_value_t = 600, value_parser = clap::value_parser!(i64).range(1..=86_400))]
    pub login_ttl_secs: i64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn provider_alias(&self) -> &str {
        &self.provider_alias
    }

    pub fn set_dingtalk_credentials(mut self, client_id: String, client_secret: String) -> Self {
        self.dingtalk_client_id = Some(client_id);
        self.dingtalk_client_secret = Some(client_secret);
        self
    }

    /// Returns the DingTalk client id, if configured.
    pub fn dingtalk_client_id(&self) -> Option<String> {
        self.dingtalk_client_id.clone()
    }

    /// Returns the DingTalk client secret, if configured.
    pub fn dingtalk_client_secret(&self) -> Option<String> {
        self.dingtalk_client_secret.clone()
    }

    pub fn dingtalk_auth_url(&self) -> &str {
        &self.dingtalk_auth_url
    }

    pub fn set_dingtalk_token_url(mut self, url: String) -> Self {
        self.dingtalk_token_url = url;
        self
    }

    pub fn dingtalk_token_url(&self) -> &str {
        &self.dingtalk_token_url
    }

    pub fn set_dingtalk_profile_url(mut self, url: String) -> Self {
        self.dingtalk_profile_url = url;
        self
    }

    pub fn dingtalk_profile_url(&self) -> &str {
        &self.dingtalk_profile_url
    }

    pub fn dingtalk_scope(&self) -> &str {
        &self.dingtalk_scope
    }

    pub fn dingtalk_redirect_uri(&self) -> &str {
        &self.dingtalk_redirect_uri
    }

    pub fn set_transliteration_url(mut self, url: String) -> Self {
        self.transliteration_url = url;
        self
    }

    pub fn transliteration_url(&self) -> &str {
        &self.transliteration_url
    }

    pub fn email_domain(&self) -> &str {
        &self.email_domain
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}
