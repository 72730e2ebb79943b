//! Recipient providers
//!
//! A recipient provider decides who receives the mail for a given log event.

pub mod factory;
pub mod list;

pub use factory::FactoryMethodRecipientProvider;
pub use list::EmailListRecipientProvider;

use crate::error::EmailResult;
use crate::log_model::LogModel;
use async_trait::async_trait;

/// Strategy returning the email addresses that should receive a log event
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipientProvider: Send + Sync {
    /// Resolve recipients for `log`
    fn get_recipients(&self, log: &LogModel) -> EmailResult<Vec<String>>;

    /// Async counterpart of [`RecipientProvider::get_recipients`].
    ///
    /// Defaults to the blocking lookup; override it when resolving recipients
    /// involves I/O.
    async fn get_recipients_async(&self, log: &LogModel) -> EmailResult<Vec<String>> {
        self.get_recipients(log)
    }
}
