//! Fluent builder for [`EmailDestination`]
//!
//! Every stage can be called at most once. The SMTP client, sender address and
//! recipient provider are mandatory; subject and body fall back to the default
//! templates; the attachment is only added when configured.
//!
//! ```ignore
//! let mut group = LogGroupDestinations::new();
//! group
//!     .email()
//!     .with_smtp_client_str(smtp, "Logger <logger@example.com>")?
//!     .with_recipient_list(["ops@example.com"])?
//!     .with_subject_template("[$LogType] $Source")?
//!     .with_attachment_template("{{log_items_json}}")?
//!     .add()?;
//! ```

use crate::destination::EmailDestination;
use crate::error::{EmailDestinationError, EmailResult};
use crate::facade::SmtpClientFacade;
use crate::group::DestinationsBuilder;
use crate::log_model::LogModel;
use crate::recipients::{EmailListRecipientProvider, FactoryMethodRecipientProvider, RecipientProvider};
use crate::serializers::{
    ExtendedTemplateLogSerializer, GeneratorFunctionLogSerializer, JsonStyle, LogSerializer,
    SimpleTemplateLogSerializer,
};
use lettre::message::Mailbox;
use std::sync::Arc;

/// Builds an [`EmailDestination`].
///
/// `P` is the parent the destination is registered with on [`add`](Self::add);
/// standalone builders use `()` and finish with [`build`](Self::build).
pub struct SmtpEmailDestinationBuilder<P = ()> {
    parent: P,
    smtp_client: Option<Arc<dyn SmtpClientFacade>>,
    from_address: Option<Mailbox>,
    recipient_provider: Option<Arc<dyn RecipientProvider>>,
    subject_serializer: Option<Arc<dyn LogSerializer>>,
    body_serializer: Option<Arc<dyn LogSerializer>>,
    attachment_serializer: Option<Arc<dyn LogSerializer>>,
}

impl SmtpEmailDestinationBuilder<()> {
    pub fn new() -> Self {
        Self::with_parent(())
    }
}

impl Default for SmtpEmailDestinationBuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SmtpEmailDestinationBuilder<P> {
    pub fn with_parent(parent: P) -> Self {
        Self {
            parent,
            smtp_client: None,
            from_address: None,
            recipient_provider: None,
            subject_serializer: None,
            body_serializer: None,
            attachment_serializer: None,
        }
    }

    pub fn parent(&self) -> &P {
        &self.parent
    }

    pub fn smtp_client(&self) -> Option<&Arc<dyn SmtpClientFacade>> {
        self.smtp_client.as_ref()
    }

    pub fn from_address(&self) -> Option<&Mailbox> {
        self.from_address.as_ref()
    }

    pub fn recipient_provider(&self) -> Option<&Arc<dyn RecipientProvider>> {
        self.recipient_provider.as_ref()
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

    fn ensure_smtp_client_unset(&self) -> EmailResult<()> {
        if self.smtp_client.is_some() {
            return Err(EmailDestinationError::AlreadySpecified("SMTP client"));
        }
        if self.from_address.is_some() {
            return Err(EmailDestinationError::AlreadySpecified("From address"));
        }
        Ok(())
    }

    /// Set the facade used to send mails and the sender address
    pub fn with_smtp_client(
        mut self,
        smtp_client: Arc<dyn SmtpClientFacade>,
        from_address: Mailbox,
    ) -> EmailResult<Self> {
        self.ensure_smtp_client_unset()?;
        self.smtp_client = Some(smtp_client);
        self.from_address = Some(from_address);
        Ok(self)
    }

    /// Like [`with_smtp_client`](Self::with_smtp_client), parsing the sender
    /// from `"Name <addr>"` or `"addr"`
    pub fn with_smtp_client_str(
        self,
        smtp_client: Arc<dyn SmtpClientFacade>,
        from_address: &str,
    ) -> EmailResult<Self> {
        self.ensure_smtp_client_unset()?;
        let mailbox: Mailbox = from_address
            .parse()
            .map_err(|e| EmailDestinationError::invalid_address(from_address, e))?;
        self.with_smtp_client(smtp_client, mailbox)
    }

    pub fn with_recipients(mut self, recipient_provider: Arc<dyn RecipientProvider>) -> EmailResult<Self> {
        if self.recipient_provider.is_some() {
            return Err(EmailDestinationError::AlreadySpecified("Recipient provider"));
        }
        self.recipient_provider = Some(recipient_provider);
        Ok(self)
    }

    /// Serializer for the mail subject. Defaults to [`SimpleTemplateLogSerializer::default`].
    pub fn with_subject(mut self, serializer: Arc<dyn LogSerializer>) -> EmailResult<Self> {
        if self.subject_serializer.is_some() {
            return Err(EmailDestinationError::AlreadySpecified("Mail subject generator"));
        }
        self.subject_serializer = Some(serializer);
        Ok(self)
    }

    /// Serializer for the mail body. Defaults to the default extended template.
    pub fn with_body(mut self, serializer: Arc<dyn LogSerializer>) -> EmailResult<Self> {
        if self.body_serializer.is_some() {
            return Err(EmailDestinationError::AlreadySpecified("Mail body generator"));
        }
        self.body_serializer = Some(serializer);
        Ok(self)
    }

    /// Serializer for a text attachment. Mails carry no attachment unless set.
    pub fn with_attachment(mut self, serializer: Arc<dyn LogSerializer>) -> EmailResult<Self> {
        if self.attachment_serializer.is_some() {
            return Err(EmailDestinationError::AlreadySpecified(
                "Mail attachment generator",
            ));
        }
        self.attachment_serializer = Some(serializer);
        Ok(self)
    }

    fn finish(self) -> EmailResult<(P, EmailDestination)> {
        let smtp_client = self
            .smtp_client
            .ok_or(EmailDestinationError::NotSpecified("SMTP client"))?;
        let from_address = self
            .from_address
            .ok_or(EmailDestinationError::NotSpecified("From address"))?;
        let recipient_provider = self
            .recipient_provider
            .ok_or(EmailDestinationError::NotSpecified("Recipient provider"))?;

        let subject_serializer: Arc<dyn LogSerializer> = match self.subject_serializer {
            Some(serializer) => serializer,
            None => Arc::new(SimpleTemplateLogSerializer::default()),
        };
        let body_serializer: Arc<dyn LogSerializer> = match self.body_serializer {
            Some(serializer) => serializer,
            None => Arc::new(ExtendedTemplateLogSerializer::with_default_template()?),
        };

        let destination = EmailDestination::new(
            smtp_client,
            from_address,
            recipient_provider,
            Some(subject_serializer),
            Some(body_serializer),
            self.attachment_serializer,
        );

        Ok((self.parent, destination))
    }

    /// Validate the configuration and create the destination
    pub fn build(self) -> EmailResult<EmailDestination> {
        self.finish().map(|(_, destination)| destination)
    }
}

// Shorthands wrapping the stock providers and serializers
impl<P> SmtpEmailDestinationBuilder<P> {
    pub fn with_recipient_list<I, S>(self, recipients: I) -> EmailResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = EmailListRecipientProvider::new(recipients)?;
        self.with_recipients(Arc::new(provider))
    }

    pub fn with_recipients_fn<F>(self, factory_method: F) -> EmailResult<Self>
    where
        F: Fn(&LogModel) -> Vec<String> + Send + Sync + 'static,
    {
        self.with_recipients(Arc::new(FactoryMethodRecipientProvider::new(factory_method)))
    }

    pub fn with_subject_template(self, template: &str) -> EmailResult<Self> {
        self.with_subject(Arc::new(SimpleTemplateLogSerializer::new(template)))
    }

    pub fn with_subject_fn<F>(self, generator: F) -> EmailResult<Self>
    where
        F: Fn(&LogModel) -> String + Send + Sync + 'static,
    {
        self.with_subject(Arc::new(GeneratorFunctionLogSerializer::new(generator)))
    }

    pub fn with_body_template(self, template: &str) -> EmailResult<Self> {
        self.with_body(Arc::new(ExtendedTemplateLogSerializer::new(template)?))
    }

    pub fn with_body_template_json(self, template: &str, json_style: JsonStyle) -> EmailResult<Self> {
        self.with_body(Arc::new(ExtendedTemplateLogSerializer::with_json_style(
            template, json_style,
        )?))
    }

    pub fn with_body_fn<F>(self, generator: F) -> EmailResult<Self>
    where
        F: Fn(&LogModel) -> String + Send + Sync + 'static,
    {
        self.with_body(Arc::new(GeneratorFunctionLogSerializer::new(generator)))
    }

    pub fn with_attachment_template(self, template: &str) -> EmailResult<Self> {
        self.with_attachment(Arc::new(ExtendedTemplateLogSerializer::new(template)?))
    }

    pub fn with_attachment_template_json(
        self,
        template: &str,
        json_style: JsonStyle,
    ) -> EmailResult<Self> {
        self.with_attachment(Arc::new(ExtendedTemplateLogSerializer::with_json_style(
            template, json_style,
        )?))
    }

    pub fn with_attachment_fn<F>(self, generator: F) -> EmailResult<Self>
    where
        F: Fn(&LogModel) -> String + Send + Sync + 'static,
    {
        self.with_attachment(Arc::new(GeneratorFunctionLogSerializer::new(generator)))
    }
}

impl<'a, G: DestinationsBuilder> SmtpEmailDestinationBuilder<&'a mut G> {
    /// Build the destination, register it with the parent and return the parent
    pub fn add(self) -> EmailResult<&'a mut G> {
        let (parent, destination) = self.finish()?;
        parent.custom_destination(Arc::new(destination));
        Ok(parent)
    }
}

/// Adds `.email()` to every [`DestinationsBuilder`]
pub trait EmailDestinationsExt: DestinationsBuilder + Sized {
    fn email(&mut self) -> SmtpEmailDestinationBuilder<&mut Self> {
        SmtpEmailDestinationBuilder::with_parent(self)
    }
}

impl<T: DestinationsBuilder> EmailDestinationsExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::LogDestination;
    use crate::facade::RecordingSmtpClientFacade;
    use crate::group::LogGroupDestinations;

    fn smtp() -> Arc<dyn SmtpClientFacade> {
        Arc::new(RecordingSmtpClientFacade::new())
    }

    fn from() -> Mailbox {
        "logger@example.com".parse().unwrap()
    }

    fn recipients() -> Arc<dyn RecipientProvider> {
        Arc::new(EmailListRecipientProvider::new(["ops@example.com"]).unwrap())
    }

    #[test]
    fn test_new_builder_is_empty() {
        let builder = SmtpEmailDestinationBuilder::new();
        assert!(builder.smtp_client().is_none());
        assert!(builder.from_address().is_none());
        assert!(builder.recipient_provider().is_none());
        assert!(builder.subject_serializer().is_none());
        assert!(builder.body_serializer().is_none());
        assert!(builder.attachment_serializer().is_none());
    }

    #[test]
    fn test_with_smtp_client_sets_client_and_address() {
        let builder = SmtpEmailDestinationBuilder::new()
            .with_smtp_client(smtp(), from())
            .unwrap();

        assert!(builder.smtp_client().is_some());
        assert_eq!(
            builder.from_address().map(|m| m.to_string()),
            Some("logger@example.com".to_string())
        );
    }

    #[test]
    fn test_with_smtp_client_twice_fails() {
        let result = SmtpEmailDestinationBuilder::new()
            .with_smtp_client(smtp(), from())
            .and_then(|b| b.with_smtp_client_str(smtp(), "other@example.com"));

        let err = result.err().unwrap();
        assert!(matches!(err, EmailDestinationError::AlreadySpecified("SMTP client")));
    }

    #[test]
    fn test_with_smtp_client_str_parses_named_mailbox() {
        let builder = SmtpEmailDestinationBuilder::new()
            .with_smtp_client_str(smtp(), "Logger <logger@example.com>")
            .unwrap();

        let from = builder.from_address().unwrap();
        assert_eq!(from.name.as_deref(), Some("Logger"));
        assert_eq!(from.email.to_string(), "logger@example.com");
    }

    #[test]
    fn test_with_smtp_client_str_rejects_invalid_address() {
        let result = SmtpEmailDestinationBuilder::new().with_smtp_client_str(smtp(), "nope");
        assert!(matches!(
            result,
            Err(EmailDestinationError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_each_stage_can_only_be_set_once() {
        let builder = SmtpEmailDestinationBuilder::new()
            .with_recipients(recipients())
            .unwrap();
        let err = builder.with_recipient_list(["x@example.com"]).err().unwrap();
        assert!(err.to_string().contains("Recipient provider has already been specified"));

        let builder = SmtpEmailDestinationBuilder::new()
            .with_subject_template("$Description")
            .unwrap();
        assert!(builder.with_subject_fn(|log| log.description.clone()).is_err());

        let builder = SmtpEmailDestinationBuilder::new()
            .with_body_template("{{description}}")
            .unwrap();
        assert!(builder.with_body_fn(|log| log.description.clone()).is_err());

        let builder = SmtpEmailDestinationBuilder::new()
            .with_attachment_template("{{log_items_json}}")
            .unwrap();
        assert!(builder
            .with_attachment_template_json("{{log_items_json}}", JsonStyle::Compact)
            .is_err());
    }

    #[test]
    fn test_build_requires_smtp_client() {
        let err = SmtpEmailDestinationBuilder::new()
            .with_recipients(recipients())
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "SMTP client was not specified during the build");
    }

    #[test]
    fn test_build_requires_recipient_provider() {
        let err = SmtpEmailDestinationBuilder::new()
            .with_smtp_client(smtp(), from())
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(err, EmailDestinationError::NotSpecified("Recipient provider")));
    }

    #[test]
    fn test_build_applies_default_subject_and_body() {
        let destination = SmtpEmailDestinationBuilder::new()
            .with_smtp_client(smtp(), from())
            .unwrap()
            .with_recipients(recipients())
            .unwrap()
            .build()
            .unwrap();

        assert!(destination.subject_serializer().is_some());
        assert!(destination.body_serializer().is_some());
        assert!(destination.attachment_serializer().is_none());
    }

    #[test]
    fn test_build_keeps_configured_serializers() {
        let subject: Arc<dyn LogSerializer> = Arc::new(SimpleTemplateLogSerializer::new("S"));
        let destination = SmtpEmailDestinationBuilder::new()
            .with_smtp_client(smtp(), from())
            .unwrap()
            .with_recipients(recipients())
            .unwrap()
            .with_subject(subject.clone())
            .unwrap()
            .with_attachment_fn(|_| "attachment".to_string())
            .unwrap()
            .build()
            .unwrap();

        assert!(Arc::ptr_eq(destination.subject_serializer().unwrap(), &subject));
        assert!(destination.attachment_serializer().is_some());
    }

    #[test]
    fn test_invalid_body_template_is_reported() {
        let result = SmtpEmailDestinationBuilder::new().with_body_template("{{#each}}");
        assert!(matches!(result, Err(EmailDestinationError::Template(_))));
    }

    #[test]
    fn test_add_registers_destination_with_parent() {
        let mut group = LogGroupDestinations::new();

        let parent = group
            .email()
            .with_smtp_client(smtp(), from())
            .unwrap()
            .with_recipients_fn(|_| vec!["ops@example.com".to_string()])
            .unwrap()
            .add()
            .unwrap();
        assert_eq!(parent.len(), 1);

        assert_eq!(group.destinations()[0].name(), "email");
    }

    #[test]
    fn test_failed_add_leaves_parent_untouched() {
        let mut group = LogGroupDestinations::new();

        let result = group.email().with_smtp_client(smtp(), from()).unwrap().add();
        assert!(result.is_err());
        assert!(group.is_empty());
    }
}
