//! Error types for the email destination.

use crate::config::ConfigError;
use thiserror::Error;

/// Result type for email destination operations.
pub type EmailResult<T> = Result<T, EmailDestinationError>;

/// Errors that can occur while configuring or running the email destination.
#[derive(Debug, Error)]
pub enum EmailDestinationError {
    /// A builder stage was called twice.
    #[error("{0} has already been specified during the build process")]
    AlreadySpecified(&'static str),

    /// A mandatory builder stage was skipped.
    #[error("{0} was not specified during the build")]
    NotSpecified(&'static str),

    /// Recipient list is empty or contains blank entries.
    #[error("Invalid recipients: {0}")]
    InvalidRecipients(String),

    /// An address could not be parsed as a mailbox.
    #[error("Invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Template compilation or rendering failed.
    #[error("Template error: {0}")]
    Template(String),

    /// The MIME message could not be assembled.
    #[error("Failed to build email message: {0}")]
    Message(String),

    /// The SMTP transport rejected or failed to deliver the message.
    #[error("SMTP transport error: {0}")]
    Transport(String),

    /// A recipient provider failed to produce recipients.
    #[error("Recipient provider error: {0}")]
    RecipientProvider(String),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EmailDestinationError {
    pub(crate) fn invalid_address(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<handlebars::TemplateError> for EmailDestinationError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<handlebars::RenderError> for EmailDestinationError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<serde_json::Error> for EmailDestinationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<lettre::error::Error> for EmailDestinationError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Message(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for EmailDestinationError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
