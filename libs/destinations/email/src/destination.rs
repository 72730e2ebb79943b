//! Log destinations
//!
//! [`LogDestination`] is the extension point a logging pipeline writes events to.
//! [`EmailDestination`] implements it by mailing every event.

use crate::error::EmailResult;
use crate::facade::{LogMail, SmtpClientFacade};
use crate::log_model::LogModel;
use crate::recipients::{EmailListRecipientProvider, RecipientProvider};
use crate::serializers::{ExtendedTemplateLogSerializer, LogSerializer, SimpleTemplateLogSerializer};
use async_trait::async_trait;
use lettre::message::Mailbox;
use std::sync::Arc;
use tracing::{debug, error};

/// Sink for log events
#[async_trait]
pub trait LogDestination: Send + Sync {
    /// Write `logs` in order, blocking the calling thread
    fn send(&self, logs: &[LogModel]) -> EmailResult<()>;

    /// Write `logs` in order
    async fn send_async(&self, logs: &[LogModel]) -> EmailResult<()>;

    /// Destination name for logging
    fn name(&self) -> &'static str;
}

/// Destination that sends each log event as an email.
///
/// Per event the recipient provider is asked for addresses, the subject, body
/// and attachment serializers render their parts (an absent serializer leaves
/// that part empty) and the facade sends the result. The first failure stops
/// the batch and is returned to the caller.
#[derive(Clone)]
pub struct EmailDestination {
    smtp_client: Arc<dyn SmtpClientFacade>,
    from: Mailbox,
    recipient_provider: Arc<dyn RecipientProvider>,
    subject_serializer: Option<Arc<dyn LogSerializer>>,
    body_serializer: Option<Arc<dyn LogSerializer>>,
    attachment_serializer: Option<Arc<dyn LogSerializer>>,
}

impl EmailDestination {
    pub fn new(
        smtp_client: Arc<dyn SmtpClientFacade>,
        from: Mailbox,
        recipient_provider: Arc<dyn RecipientProvider>,
        subject_serializer: Option<Arc<dyn LogSerializer>>,
        body_serializer: Option<Arc<dyn LogSerializer>>,
        attachment_serializer: Option<Arc<dyn LogSerializer>>,
    ) -> Self {
        Self {
            smtp_client,
            from,
            recipient_provider,
            subject_serializer,
            body_serializer,
            attachment_serializer,
        }
    }

    /// Destination mailing a fixed list of recipients with the default subject
    /// and body templates and no attachment
    pub fn with_recipients<I, S>(
        smtp_client: Arc<dyn SmtpClientFacade>,
        from: Mailbox,
        recipients: I,
    ) -> EmailResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = EmailListRecipientProvider::new(recipients)?;
        Self::with_provider(smtp_client, from, Arc::new(provider))
    }

    /// Destination using `recipient_provider` with the default subject and body
    /// templates and no attachment
    pub fn with_provider(
        smtp_client: Arc<dyn SmtpClientFacade>,
        from: Mailbox,
        recipient_provider: Arc<dyn RecipientProvider>,
    ) -> EmailResult<Self> {
        Ok(Self::new(
            smtp_client,
            from,
            recipient_provider,
            Some(Arc::new(SimpleTemplateLogSerializer::default())),
            Some(Arc::new(ExtendedTemplateLogSerializer::with_default_template()?)),
            None,
        ))
    }

    pub fn smtp_client(&self) -> &Arc<dyn SmtpClientFacade> {
        &self.smtp_client
    }

    pub fn from_address(&self) -> &Mailbox {
        &self.from
    }

    pub fn recipient_provider(&self) -> &Arc<dyn RecipientProvider> {
        &self.recipient_provider
    }

    pub fn subject_serializer(&self) -> Option<&Arc<dyn LogSerializer>> {
        self.subject_serializer.as_ref()
    }

    pub fn body_serializer(&self) -> Option<&Arc<dyn LogSerializer>> {
        self.body_serializer.as_ref()
    }

    pub fn attachment_serializer(&self) -> Option<&Arc<dyn LogSerializer>> {
        self.attachment_serializer.as_ref()
    }

    fn render_mail(&self, log: &LogModel, recipients: Vec<String>) -> EmailResult<LogMail> {
        Ok(LogMail {
            from: self.from.clone(),
            recipients,
            subject: render(self.subject_serializer.as_deref(), log)?,
            body: render(self.body_serializer.as_deref(), log)?,
            attachment: render(self.attachment_serializer.as_deref(), log)?,
        })
    }
}

fn render(serializer: Option<&dyn LogSerializer>, log: &LogModel) -> EmailResult<Option<String>> {
    serializer.map(|s| s.serialize(log)).transpose()
}

impl std::fmt::Debug for EmailDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailDestination")
            .field("smtp_client", &self.smtp_client.name())
            .field("from", &self.from.to_string())
            .field("has_subject", &self.subject_serializer.is_some())
            .field("has_body", &self.body_serializer.is_some())
            .field("has_attachment", &self.attachment_serializer.is_some())
            .finish()
    }
}

#[async_trait]
impl LogDestination for EmailDestination {
    fn send(&self, logs: &[LogModel]) -> EmailResult<()> {
        for log in logs {
            let recipients = self.recipient_provider.get_recipients(log)?;
            let mail = self.render_mail(log, recipients)?;

            debug!(
                log_id = %log.log_id,
                recipients = mail.recipients.len(),
                facade = self.smtp_client.name(),
                "Sending log email"
            );

            self.smtp_client.send_email(&mail).map_err(|e| {
                error!(log_id = %log.log_id, error = %e, "Failed to send log email");
                e
            })?;
        }
        Ok(())
    }

    async fn send_async(&self, logs: &[LogModel]) -> EmailResult<()> {
        for log in logs {
            let recipients = self.recipient_provider.get_recipients_async(log).await?;
            let mail = self.render_mail(log, recipients)?;

            debug!(
                log_id = %log.log_id,
                recipients = mail.recipients.len(),
                facade = self.smtp_client.name(),
                "Sending log email"
            );

            if let Err(e) = self.smtp_client.send_email_async(&mail).await {
                error!(log_id = %log.log_id, error = %e, "Failed to send log email");
                return Err(e);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
