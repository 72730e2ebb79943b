//! Log serializers
//!
//! Serializers render a log event to text. The destination uses up to three of
//! them per mail: subject, body and attachment.
//!
//! - [`SimpleTemplateLogSerializer`]: `$Placeholder` substitution, suited to one-liners
//! - [`ExtendedTemplateLogSerializer`]: Handlebars templates with the event's items as JSON
//! - [`GeneratorFunctionLogSerializer`]: arbitrary closure

pub mod extended;
pub mod generator;
pub mod simple;

pub use extended::{ExtendedTemplateLogSerializer, JsonStyle};
pub use generator::GeneratorFunctionLogSerializer;
pub use simple::SimpleTemplateLogSerializer;

use crate::error::EmailResult;
use crate::log_model::LogModel;

/// Strategy rendering a log event to a string
#[cfg_attr(test, mockall::automock)]
pub trait LogSerializer: Send + Sync {
    fn serialize(&self, log: &LogModel) -> EmailResult<String>;
}
