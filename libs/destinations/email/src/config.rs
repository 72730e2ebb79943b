//! Environment and file based configuration.
//!
//! Environment variables:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SMTP_HOST` | required |
//! | `SMTP_PORT` | `587` |
//! | `SMTP_USERNAME` / `SMTP_PASSWORD` | unset (no auth) |
//! | `SMTP_TLS_MODE` | `starttls` (`none`, `starttls`, `tls`) |
//! | `SMTP_TIMEOUT_SECS` | `30` |
//! | `LOG_EMAIL_FROM` | required |
//! | `LOG_EMAIL_RECIPIENTS` | required, comma separated |
//! | `LOG_EMAIL_SUBJECT_TEMPLATE` | default subject template |
//! | `LOG_EMAIL_BODY_TEMPLATE` | default body template |
//! | `LOG_EMAIL_ATTACHMENT_TEMPLATE` | no attachment |
//! | `LOG_EMAIL_JSON_STYLE` | `pretty` (`pretty`, `compact`) |

use crate::builder::SmtpEmailDestinationBuilder;
use crate::destination::EmailDestination;
use crate::error::EmailResult;
use crate::facade::{SmtpClientFacade, StandardSmtpClientFacade};
use crate::serializers::JsonStyle;
use crate::serializers::extended::DEFAULT_EXTENDED_TEMPLATE;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Load an environment variable, falling back to `default`
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Load an environment variable or return [`ConfigError::MissingEnvVar`]
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn env_parse<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    env_or_default(key, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        })
}

/// How the SMTP connection is secured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain text, for local capture servers like Mailpit
    None,
    /// Upgrade with STARTTLS (usually port 587)
    #[default]
    StartTls,
    /// Implicit TLS (usually port 465)
    Tls,
}

impl FromStr for TlsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "false" | "0" => Ok(Self::None),
            "starttls" => Ok(Self::StartTls),
            "tls" | "true" | "1" => Ok(Self::Tls),
            other => Err(format!("unknown TLS mode '{}'", other)),
        }
    }
}

fn default_port() -> u16 {
    587
}

fn default_timeout_secs() -> u64 {
    30
}

/// SMTP server settings
#[derive(Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls_mode: TlsMode,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
            tls_mode: TlsMode::default(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Mailpit/MailHog on localhost:1025 without TLS or auth
    pub fn mailpit() -> Self {
        Self::new("localhost", 1025).with_tls_mode(TlsMode::None)
    }

    pub fn with_tls_mode(mut self, tls_mode: TlsMode) -> Self {
        self.tls_mode = tls_mode;
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("tls_mode", &self.tls_mode)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FromEnv for SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_required("SMTP_HOST")?,
            port: env_parse("SMTP_PORT", "587")?,
            username: env::var("SMTP_USERNAME").ok().filter(|u| !u.is_empty()),
            password: env::var("SMTP_PASSWORD").ok(),
            tls_mode: env_parse("SMTP_TLS_MODE", "starttls")?,
            timeout_secs: env_parse("SMTP_TIMEOUT_SECS", "30")?,
        })
    }
}

/// Everything needed to build an [`EmailDestination`] without code
#[derive(Debug, Clone, Deserialize)]
pub struct EmailDestinationConfig {
    pub smtp: SmtpConfig,
    /// Sender, `"Name <addr>"` or `"addr"`
    pub from: String,
    pub recipients: Vec<String>,
    #[serde(default)]
    pub subject_template: Option<String>,
    #[serde(default)]
    pub body_template: Option<String>,
    #[serde(default)]
    pub attachment_template: Option<String>,
    #[serde(default)]
    pub json_style: JsonStyle,
}

impl FromEnv for EmailDestinationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let json_style = match env_or_default("LOG_EMAIL_JSON_STYLE", "pretty")
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "pretty" => JsonStyle::Pretty,
            "compact" => JsonStyle::Compact,
            other => {
                return Err(ConfigError::ParseError {
                    key: "LOG_EMAIL_JSON_STYLE".to_string(),
                    details: format!("unknown JSON style '{}'", other),
                })
            }
        };

        Ok(Self {
            smtp: SmtpConfig::from_env()?,
            from: env_required("LOG_EMAIL_FROM")?,
            recipients: split_list(&env_required("LOG_EMAIL_RECIPIENTS")?),
            subject_template: env::var("LOG_EMAIL_SUBJECT_TEMPLATE").ok(),
            body_template: env::var("LOG_EMAIL_BODY_TEMPLATE").ok(),
            attachment_template: env::var("LOG_EMAIL_ATTACHMENT_TEMPLATE").ok(),
            json_style,
        })
    }
}

impl EmailDestinationConfig {
    pub fn from_json_str(json: &str) -> EmailResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a destination sending through [`StandardSmtpClientFacade`]
    pub fn build_destination(&self) -> EmailResult<EmailDestination> {
        let facade = StandardSmtpClientFacade::new(self.smtp.clone())?;
        self.build_destination_with(Arc::new(facade))
    }

    /// Build a destination sending through `smtp_client`
    pub fn build_destination_with(
        &self,
        smtp_client: Arc<dyn SmtpClientFacade>,
    ) -> EmailResult<EmailDestination> {
        let mut builder = SmtpEmailDestinationBuilder::new()
            .with_smtp_client_str(smtp_client, &self.from)?
            .with_recipient_list(self.recipients.iter().cloned())?;

        if let Some(template) = &self.subject_template {
            builder = builder.with_subject_template(template)?;
        }
        let body_template = self
            .body_template
            .as_deref()
            .unwrap_or(DEFAULT_EXTENDED_TEMPLATE);
        builder = builder.with_body_template_json(body_template, self.json_style)?;
        if let Some(template) = &self.attachment_template {
            builder = builder.with_attachment_template_json(template, self.json_style)?;
        }

        builder.build()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
