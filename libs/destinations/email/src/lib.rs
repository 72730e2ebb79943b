//! Email log destination
//!
//! Delivers log events as emails over SMTP. Each event is turned into one mail:
//! recipients come from a [`RecipientProvider`], subject, body and an optional
//! text attachment are rendered by [`LogSerializer`]s and the mail is handed to
//! an [`SmtpClientFacade`].
//!
//! ## Components
//!
//! - **Destination**: `EmailDestination` implementing `LogDestination`
//! - **Builder**: `SmtpEmailDestinationBuilder`, reachable from any
//!   `DestinationsBuilder` through `.email()`
//! - **Recipients**: fixed list or factory closure
//! - **Serializers**: `$Placeholder` templates, Handlebars templates, closures
//! - **Facades**: lettre backed SMTP and a recording facade for tests
//! - **Tracing**: `EmailLayer` forwarding `tracing` events to a destination,
//!   inline or through a bounded worker queue
//!
//! ## Usage
//!
//! ```ignore
//! use email_destination::{EmailDestinationsExt, LogGroupDestinations, StandardSmtpClientFacade, SmtpConfig};
//!
//! let smtp = Arc::new(StandardSmtpClientFacade::new(SmtpConfig::mailpit())?);
//! let mut group = LogGroupDestinations::new();
//! group
//!     .email()
//!     .with_smtp_client_str(smtp, "Logger <logger@example.com>")?
//!     .with_recipient_list(["ops@example.com"])?
//!     .with_subject_template("[$LogType] $Description")?
//!     .add()?;
//! ```

pub mod builder;
pub mod config;
pub mod destination;
pub mod error;
pub mod facade;
pub mod group;
pub mod layer;
pub mod log_model;
pub mod recipients;
pub mod serializers;

pub use builder::{EmailDestinationsExt, SmtpEmailDestinationBuilder};
pub use config::{ConfigError, EmailDestinationConfig, FromEnv, SmtpConfig, TlsMode};
pub use destination::{EmailDestination, LogDestination};
pub use error::{EmailDestinationError, EmailResult};
pub use facade::{
    LogMail, RecordingSmtpClientFacade, SmtpClientFacade, StandardSmtpClientFacade,
    ATTACHMENT_FILE_NAME,
};
pub use group::{DestinationsBuilder, LogGroupDestinations};
pub use layer::{DEFAULT_QUEUE_CAPACITY, EmailLayer, EmailLayerGuard};
pub use log_model::{LogItem, LogModel, LogType};
pub use recipients::{EmailListRecipientProvider, FactoryMethodRecipientProvider, RecipientProvider};
pub use serializers::{
    ExtendedTemplateLogSerializer, GeneratorFunctionLogSerializer, JsonStyle, LogSerializer,
    SimpleTemplateLogSerializer,
};
