//! Recording facade for tests and dry runs

use super::{prepare_message, LogMail, SmtpClientFacade};
use crate::error::{EmailDestinationError, EmailResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

/// Facade that validates mails like the real one and records them instead of
/// sending. Clones share the recorded mails.
#[derive(Clone, Default)]
pub struct RecordingSmtpClientFacade {
    sent: Arc<Mutex<Vec<LogMail>>>,
    failure_message: Option<String>,
}

impl RecordingSmtpClientFacade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a facade whose sends always fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failure_message: Some(message.into()),
        }
    }

    /// All recorded mails, oldest first
    pub fn sent_emails(&self) -> Vec<LogMail> {
        self.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Check whether any recorded mail went to `address`
    pub fn was_sent_to(&self, address: &str) -> bool {
        self.lock()
            .iter()
            .any(|mail| mail.recipients.iter().any(|r| r == address))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogMail>> {
        self.sent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, mail: &LogMail) -> EmailResult<()> {
        if let Some(message) = &self.failure_message {
            return Err(EmailDestinationError::Transport(message.clone()));
        }

        prepare_message(mail)?;
        self.lock().push(mail.clone());
        Ok(())
    }
}

#[async_trait]
impl SmtpClientFacade for RecordingSmtpClientFacade {
    fn send_email(&self, mail: &LogMail) -> EmailResult<()> {
        self.record(mail)
    }

    async fn send_email_async(&self, mail: &LogMail) -> EmailResult<()> {
        self.record(mail)
    }

    async fn health_check(&self) -> EmailResult<()> {
        match &self.failure_message {
            Some(message) => Err(EmailDestinationError::Transport(message.clone())),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
