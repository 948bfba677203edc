//! Application configuration
//!
//! Centralized configuration read once from environment variables at startup.
//! Optional integrations are `None` unless every value they need is present,
//! which is how the portal decides whether a feature is available.

use std::env;
use std::fmt;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 60 * 60;
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com";

/// A configuration value that must never show up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Login and session configuration
    pub auth: AuthConfig,
    /// Newsletter generation backend, if configured
    pub backend: Option<BackendConfig>,
    /// Static assets and email preparation
    pub content: ContentConfig,
    /// Email-marketing provider, if configured
    pub mailchimp: Option<MailchimpConfig>,
    /// AI-review provider, if configured
    pub anthropic: Option<AnthropicConfig>,
    /// Version-control host, if configured
    pub github: Option<GithubConfig>,
    /// Answer generate/review/send with canned results and no outbound calls
    pub mock_mode: bool,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Login and session configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared editor password; `None` disables login entirely
    pub editor_password: Option<Secret>,
    /// Key used to sign session cookies
    pub secret_key: Option<Secret>,
    /// Session lifetime in seconds
    pub session_ttl_secs: u64,
}

/// Generation backend configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend, without trailing slash
    pub base_url: String,
}

/// Static assets and email content preparation
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Stylesheet injected into outgoing email HTML
    pub newsletter_css_path: PathBuf,
}

/// Mailchimp configuration
#[derive(Debug, Clone)]
pub struct MailchimpConfig {
    /// Marketing API key
    pub api_key: Secret,
    /// Data-center prefix, e.g. `us21`
    pub server_prefix: String,
    /// Audience (list) that campaigns are sent to
    pub list_id: String,
    /// Reply-to address on campaigns
    pub reply_to: Option<String>,
    /// Recipient of test emails
    pub editor_email: Option<String>,
    /// Sender name, also used in subject and title
    pub from_name: String,
    /// API base URL, derived from the server prefix unless overridden
    pub base_url: String,
}

/// Anthropic configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key
    pub api_key: Secret,
    /// Model used for reviews
    pub model: String,
    /// API base URL
    pub base_url: String,
}

/// GitHub configuration
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Personal access token
    pub token: Secret,
    /// Repository in `owner/name` form
    pub repo: String,
    /// Branch commits are written to
    pub branch: String,
    /// Directory inside the repository holding newsletters
    pub newsletter_dir: String,
    /// API base URL
    pub base_url: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = get("BACKEND_URL")
            .or_else(|| get("RAILWAY_BACKEND_URL"))
            .map(|url| BackendConfig {
                base_url: url.trim_end_matches('/').to_string(),
            });

        let mailchimp = match (
            get("MAILCHIMP_API_KEY"),
            get("MAILCHIMP_SERVER_PREFIX"),
            get("MAILCHIMP_LIST_ID"),
        ) {
            (Some(api_key), Some(server_prefix), Some(list_id)) => Some(MailchimpConfig {
                base_url: get("MAILCHIMP_API_BASE_URL")
                    .unwrap_or_else(|| format!("https://{}.api.mailchimp.com/3.0", server_prefix)),
                api_key: Secret::new(api_key),
                server_prefix,
                list_id,
                reply_to: get("REPLY_TO_EMAIL"),
                editor_email: get("EDITOR_EMAIL"),
                from_name: get("NEWSLETTER_FROM_NAME").unwrap_or_else(|| "Newsletter".to_string()),
            }),
            _ => None,
        };

        let anthropic = get("ANTHROPIC_API_KEY").map(|api_key| AnthropicConfig {
            api_key: Secret::new(api_key),
            model: get("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            base_url: get("ANTHROPIC_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
        });

        let github = match (get("GITHUB_TOKEN"), get("GITHUB_REPO")) {
            (Some(token), Some(repo)) => Some(GithubConfig {
                token: Secret::new(token),
                repo,
                branch: get("GITHUB_BRANCH").unwrap_or_else(|| "main".to_string()),
                newsletter_dir: get("NEWSLETTER_DIR")
                    .unwrap_or_else(|| "newsletters".to_string())
                    .trim_matches('/')
                    .to_string(),
                base_url: get("GITHUB_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GITHUB_BASE_URL.to_string()),
            }),
            _ => None,
        };

        Self {
            server: ServerConfig {
                port: get("PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(DEFAULT_PORT),
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            },
            auth: AuthConfig {
                editor_password: get("EDITOR_PASSWORD").map(Secret::new),
                secret_key: get("SECRET_KEY").map(Secret::new),
                session_ttl_secs: get("SESSION_TTL_SECS")
                    .and_then(|t| t.parse().ok())
                    .filter(|t| *t > 0)
                    .unwrap_or(DEFAULT_SESSION_TTL_SECS),
            },
            backend,
            content: ContentConfig {
                static_dir: PathBuf::from(get("STATIC_DIR").unwrap_or_else(|| "static".to_string())),
                newsletter_css_path: PathBuf::from(
                    get("NEWSLETTER_CSS_PATH")
                        .unwrap_or_else(|| "static/css/newsletter.css".to_string()),
                ),
            },
            mailchimp,
            anthropic,
            github,
            mock_mode: get("MOCK_MODE")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Whether a password is required to use the portal
    pub fn login_required(&self) -> bool {
        self.auth.editor_password.is_some()
    }
}
