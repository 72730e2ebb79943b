//! Fixed recipient list

use super::RecipientProvider;
use crate::error::{EmailDestinationError, EmailResult};
use crate::log_model::LogModel;

/// Sends every log event to the same list of addresses
#[derive(Debug, Clone)]
pub struct EmailListRecipientProvider {
    recipients: Vec<String>,
}

impl EmailListRecipientProvider {
    pub fn new<I, S>(recipients: I) -> EmailResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let recipients: Vec<String> = recipients.into_iter().map(Into::into).collect();

        if recipients.is_empty() {
            return Err(EmailDestinationError::InvalidRecipients(
                "Recipients list is empty".to_string(),
            ));
        }
        if recipients.iter().any(|r| r.trim().is_empty()) {
            return Err(EmailDestinationError::InvalidRecipients(
                "Recipients list contains empty values".to_string(),
            ));
        }

        Ok(Self { recipients })
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }
}

impl RecipientProvider for EmailListRecipientProvider {
    fn get_recipients(&self, _log: &LogModel) -> EmailResult<Vec<String>> {
        Ok(self.recipients.clone())
    }
}
