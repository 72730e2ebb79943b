//! Closure-backed recipient provider

use super::RecipientProvider;
use crate::error::EmailResult;
use crate::log_model::LogModel;
use std::fmt;
use std::sync::Arc;

/// Function deciding the recipients of a log event
pub type RecipientsFn = dyn Fn(&LogModel) -> Vec<String> + Send + Sync;

/// Resolves recipients by calling a user-supplied function for every event.
///
/// ```ignore
/// let provider = FactoryMethodRecipientProvider::new(|log| {
///     if log.log_type_is_in(&[LogType::Error, LogType::Failure, LogType::Critical]) {
///         vec!["oncall@example.com".to_string()]
///     } else {
///         vec!["team@example.com".to_string()]
///     }
/// });
/// ```
#[derive(Clone)]
pub struct FactoryMethodRecipientProvider {
    factory_method: Arc<RecipientsFn>,
}

impl FactoryMethodRecipientProvider {
    pub fn new<F>(factory_method: F) -> Self
    where
        F: Fn(&LogModel) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            factory_method: Arc::new(factory_method),
        }
    }

    pub fn factory_method(&self) -> &Arc<RecipientsFn> {
        &self.factory_method
    }
}

impl fmt::Debug for FactoryMethodRecipientProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethodRecipientProvider").finish_non_exhaustive()
    }
}

impl RecipientProvider for FactoryMethodRecipientProvider {
    fn get_recipients(&self, log: &LogModel) -> EmailResult<Vec<String>> {
        Ok((self.factory_method)(log))
    }
}
