//! Client configuration.

use std::fmt;

use serde::Deserialize;

use crate::error::{Result, SplunkError};
use crate::value::Value;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_TIMEOUT_SECS: u64 = 600;

/// How requests authenticate.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    /// An authentication token, sent as `Authorization: Bearer`.
    Token { token: String },
    /// A session key from `auth/login`, sent as `Authorization: Splunk`.
    SessionKey { key: String },
    /// HTTP basic authentication.
    Basic { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token { .. } => f.write_str("Token(<redacted>)"),
            Credentials::SessionKey { .. } => f.write_str("SessionKey(<redacted>)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Connection settings for [`HttpTransport`](crate::HttpTransport).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Management endpoint, e.g. `https://localhost:8089`.
    pub base_url: String,
    /// Namespace owner; set together with `app`.
    #[serde(default)]
    pub owner: Option<String>,
    /// Namespace app; set together with `owner`.
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Entries requested per page when enumerating; 0 asks for all at once.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_verify_tls() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            owner: None,
            app: None,
            credentials: None,
            verify_tls: default_verify_tls(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Scope relative paths to `/servicesNS/{owner}/{app}`.
    pub fn with_namespace(mut self, owner: impl Into<String>, app: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self.app = Some(app.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn with_timeouts(mut self, connect_secs: u64, request_secs: u64) -> Self {
        self.connect_timeout_secs = connect_secs;
        self.timeout_secs = request_secs;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// The namespace, if both halves are set.
    pub fn namespace(&self) -> Option<(&str, &str)> {
        match (&self.owner, &self.app) {
            (Some(owner), Some(app)) => Some((owner, app)),
            _ => None,
        }
    }

    /// Check the settings before any connection is attempted.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SplunkError::Config(format!(
                "base_url must be an http(s) URL, got `{}`",
                self.base_url
            )));
        }
        if self.owner.is_some() != self.app.is_some() {
            return Err(SplunkError::Config(
                "owner and app must be set together".into(),
            ));
        }
        for (name, secs) in [
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("timeout_secs", self.timeout_secs),
        ] {
            if secs == 0 || secs > MAX_TIMEOUT_SECS {
                return Err(SplunkError::Config(format!(
                    "{name} must be between 1 and {MAX_TIMEOUT_SECS}, got {secs}"
                )));
            }
        }
        Ok(())
    }

    /// Load settings from `SPLUNK_*` environment variables.
    ///
    /// `SPLUNK_URL` is required. Credentials are taken from `SPLUNK_TOKEN`,
    /// then `SPLUNK_SESSION_KEY`, then `SPLUNK_USERNAME` with
    /// `SPLUNK_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url =
            var("SPLUNK_URL").ok_or_else(|| SplunkError::Config("SPLUNK_URL is not set".into()))?;
        let mut config = Self::new(base_url);

        config.owner = var("SPLUNK_OWNER");
        config.app = var("SPLUNK_APP");

        config.credentials = if let Some(token) = var("SPLUNK_TOKEN") {
            Some(Credentials::Token { token })
        } else if let Some(key) = var("SPLUNK_SESSION_KEY") {
            Some(Credentials::SessionKey { key })
        } else if let Some(username) = var("SPLUNK_USERNAME") {
            let password = var("SPLUNK_PASSWORD").ok_or_else(|| {
                SplunkError::Config("SPLUNK_USERNAME is set without SPLUNK_PASSWORD".into())
            })?;
            Some(Credentials::Basic { username, password })
        } else {
            None
        };

        if let Some(raw) = var("SPLUNK_VERIFY_TLS") {
            config.verify_tls = Value::from(raw.as_str()).to_bool().ok_or_else(|| {
                SplunkError::Config(format!("SPLUNK_VERIFY_TLS: not a boolean: `{raw}`"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }
}
