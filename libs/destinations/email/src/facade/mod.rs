//! SMTP client facade
//!
//! The facade is the only place that talks to the mail library. The destination
//! hands it a [`LogMail`] and the facade turns that into a MIME message and
//! sends it, which keeps the destination testable without an SMTP server.

pub mod mock;
pub mod smtp;

pub use mock::RecordingSmtpClientFacade;
pub use smtp::StandardSmtpClientFacade;

use crate::error::{EmailDestinationError, EmailResult};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;

/// File name of the attachment part
pub const ATTACHMENT_FILE_NAME: &str = "Log attachment.txt";

/// Rendered mail for one log event
#[derive(Debug, Clone)]
pub struct LogMail {
    pub from: Mailbox,
    pub recipients: Vec<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub attachment: Option<String>,
}

/// Sends rendered log mails
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmtpClientFacade: Send + Sync {
    /// Send a mail, blocking the calling thread
    fn send_email(&self, mail: &LogMail) -> EmailResult<()>;

    /// Send a mail asynchronously
    async fn send_email_async(&self, mail: &LogMail) -> EmailResult<()>;

    /// Check that the SMTP server is reachable
    async fn health_check(&self) -> EmailResult<()>;

    /// Facade name for logging
    fn name(&self) -> &'static str;
}

/// Validate `mail` and build the MIME message for it.
///
/// A missing subject or body becomes an empty string. With an attachment the
/// message is `multipart/mixed` (text body + text attachment), otherwise a
/// single `text/plain` part.
pub fn prepare_message(mail: &LogMail) -> EmailResult<Message> {
    if mail.recipients.is_empty() {
        return Err(EmailDestinationError::InvalidRecipients(
            "Recipients list is empty".to_string(),
        ));
    }
    if mail.recipients.iter().any(|r| r.trim().is_empty()) {
        return Err(EmailDestinationError::InvalidRecipients(
            "Recipients list contains empty values".to_string(),
        ));
    }

    let mut builder = Message::builder()
        .from(mail.from.clone())
        .subject(mail.subject.as_deref().unwrap_or_default());

    for recipient in &mail.recipients {
        let to: Mailbox = recipient
            .trim()
            .parse()
            .map_err(|e| EmailDestinationError::invalid_address(recipient.as_str(), e))?;
        builder = builder.to(to);
    }

    let body = mail.body.clone().unwrap_or_default();

    let message = match &mail.attachment {
        Some(attachment) => builder.multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body))
                .singlepart(
                    Attachment::new(ATTACHMENT_FILE_NAME.to_string())
                        .body(attachment.clone(), ContentType::TEXT_PLAIN),
                ),
        )?,
        None => builder.header(ContentType::TEXT_PLAIN).body(body)?,
    };

    Ok(message)
}
