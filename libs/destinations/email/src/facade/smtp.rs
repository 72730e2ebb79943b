//! SMTP facade backed by lettre

use super::{prepare_message, LogMail, SmtpClientFacade};
use crate::config::{SmtpConfig, TlsMode};
use crate::error::{EmailDestinationError, EmailResult};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Response;
use lettre::{AsyncSmtpTransport, AsyncTransport, SmtpTransport, Tokio1Executor, Transport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Sends log mails through an SMTP server.
///
/// Holds a blocking and an async transport built from the same configuration so
/// both send paths of the destination hit the same server.
pub struct StandardSmtpClientFacade {
    transport: SmtpTransport,
    async_transport: AsyncSmtpTransport<Tokio1Executor>,
    config: Arc<SmtpConfig>,
}

impl StandardSmtpClientFacade {
    pub fn new(config: SmtpConfig) -> EmailResult<Self> {
        let transport = Self::build_transport(&config)?;
        let async_transport = Self::build_async_transport(&config)?;

        Ok(Self {
            transport,
            async_transport,
            config: Arc::new(config),
        })
    }

    /// Facade for Mailpit/MailHog running on the local machine
    pub fn mailpit() -> EmailResult<Self> {
        Self::new(SmtpConfig::mailpit())
    }

    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    fn credentials(config: &SmtpConfig) -> Option<Credentials> {
        config
            .username
            .as_ref()
            .map(|username| {
                Credentials::new(username.clone(), config.password.clone().unwrap_or_default())
            })
    }

    fn build_transport(config: &SmtpConfig) -> EmailResult<SmtpTransport> {
        let mut builder = match config.tls_mode {
            TlsMode::Tls => SmtpTransport::relay(&config.host)?,
            TlsMode::StartTls => SmtpTransport::starttls_relay(&config.host)?,
            TlsMode::None => SmtpTransport::builder_dangerous(&config.host),
        }
        .port(config.port)
        .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let Some(credentials) = Self::credentials(config) {
            builder = builder.credentials(credentials);
        }

        Ok(builder.build())
    }

    fn build_async_transport(config: &SmtpConfig) -> EmailResult<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = match config.tls_mode {
            TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
            TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?,
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        }
        .port(config.port)
        .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let Some(credentials) = Self::credentials(config) {
            builder = builder.credentials(credentials);
        }

        Ok(builder.build())
    }

    fn log_sent(&self, mail: &LogMail, response: &Response) {
        let server_message = response
            .message()
            .next()
            .map(|s| s.to_string())
            .unwrap_or_default();

        info!(
            host = %self.config.host,
            recipients = mail.recipients.len(),
            subject = mail.subject.as_deref().unwrap_or_default(),
            response = %server_message,
            "Log email sent"
        );
    }
}

#[async_trait]
impl SmtpClientFacade for StandardSmtpClientFacade {
    fn send_email(&self, mail: &LogMail) -> EmailResult<()> {
        let message = prepare_message(mail)?;
        debug!(host = %self.config.host, "Sending log email");

        let response = Transport::send(&self.transport, &message)?;
        self.log_sent(mail, &response);
        Ok(())
    }

    async fn send_email_async(&self, mail: &LogMail) -> EmailResult<()> {
        let message = prepare_message(mail)?;
        debug!(host = %self.config.host, "Sending log email");

        let response = AsyncTransport::send(&self.async_transport, message).await?;
        self.log_sent(mail, &response);
        Ok(())
    }

    async fn health_check(&self) -> EmailResult<()> {
        let connected = self.async_transport.test_connection().await?;
        if !connected {
            return Err(EmailDestinationError::Transport(format!(
                "SMTP server {}:{} did not accept the connection",
                self.config.host, self.config.port
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
