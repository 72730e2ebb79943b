//! Integration tests for the email destination

use email_destination::{
    DEFAULT_QUEUE_CAPACITY, EmailDestinationConfig, EmailDestinationError, EmailDestinationsExt,
    EmailLayer, LogDestination, LogGroupDestinations, LogModel, LogType,
    RecordingSmtpClientFacade, SmtpClientFacade, SmtpEmailDestinationBuilder,
};
use std::sync::Arc;

fn recording() -> (RecordingSmtpClientFacade, Arc<dyn SmtpClientFacade>) {
    let facade = RecordingSmtpClientFacade::new();
    let shared: Arc<dyn SmtpClientFacade> = Arc::new(facade.clone());
    (facade, shared)
}

fn failure(description: &str) -> LogModel {
    LogModel::new(LogType::Failure, description)
        .with_source("billing")
        .with_context("invoice-42")
        .with_item("amount", 1999)
}

mod group_tests {
    use super::*;

    #[tokio::test]
    async fn test_email_destination_registered_through_group() {
        let (facade, smtp) = recording();
        let mut group = LogGroupDestinations::new();

        group
            .email()
            .with_smtp_client_str(smtp, "Logger <logger@example.com>")
            .unwrap()
            .with_recipient_list(["ops@example.com", "dev@example.com"])
            .unwrap()
            .add()
            .unwrap();

        assert_eq!(group.len(), 1);
        let destination = &group.destinations()[0];
        assert_eq!(destination.name(), "email");

        destination
            .send_async(&[failure("Payment declined")])
            .await
            .unwrap();

        let sent = facade.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, ["ops@example.com", "dev@example.com"]);
        assert_eq!(
            sent[0].subject.as_deref(),
            Some("[Failure] billing: Payment declined")
        );

        let body = sent[0].body.as_deref().unwrap();
        assert!(body.contains("Failure from billing"));
        assert!(body.contains("Context: invoice-42"));
        assert!(body.contains("\"amount\""));
        assert!(sent[0].attachment.is_none());
    }

    #[test]
    fn test_group_keeps_registration_order() {
        let (_, smtp) = recording();
        let mut group = LogGroupDestinations::new();

        group
            .email()
            .with_smtp_client_str(smtp.clone(), "first@example.com")
            .unwrap()
            .with_recipient_list(["ops@example.com"])
            .unwrap()
            .add()
            .unwrap()
            .email()
            .with_smtp_client_str(smtp, "second@example.com")
            .unwrap()
            .with_recipient_list(["dev@example.com"])
            .unwrap()
            .add()
            .unwrap();

        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_failed_build_leaves_group_untouched() {
        let (_, smtp) = recording();
        let mut group = LogGroupDestinations::new();

        let result = group
            .email()
            .with_smtp_client_str(smtp, "logger@example.com")
            .unwrap()
            .add();

        assert!(matches!(
            result.err(),
            Some(EmailDestinationError::NotSpecified("Recipient provider"))
        ));
        assert!(group.is_empty());
    }
}

mod destination_tests {
    use super::*;

    #[test]
    fn test_sync_send_with_custom_serializers_and_attachment() {
        let (facade, smtp) = recording();

        let destination = SmtpEmailDestinationBuilder::new()
            .with_smtp_client_str(smtp, "logger@example.com")
            .unwrap()
            .with_recipients_fn(|log| match log.log_type {
                LogType::Critical => vec!["oncall@example.com".to_string()],
                _ => vec!["ops@example.com".to_string()],
            })
            .unwrap()
            .with_subject_fn(|log| format!("{} alert", log.log_type))
            .unwrap()
            .with_body_template("{{description}} ({{context}})")
            .unwrap()
            .with_attachment_template("{{log_items_json}}")
            .unwrap()
            .build()
            .unwrap();

        let critical = LogModel::new(LogType::Critical, "Database down").with_context("primary");
        destination
            .send(&[failure("Payment declined"), critical])
            .unwrap();

        let sent = facade.sent_emails();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].recipients, ["ops@example.com"]);
        assert_eq!(sent[0].subject.as_deref(), Some("Failure alert"));
        assert_eq!(
            sent[0].body.as_deref(),
            Some("Payment declined (invoice-42)")
        );
        assert!(sent[0].attachment.as_deref().unwrap().contains("1999"));

        assert!(facade.was_sent_to("oncall@example.com"));
        assert_eq!(sent[1].subject.as_deref(), Some("Critical alert"));
    }

    #[tokio::test]
    async fn test_transport_failure_stops_batch() {
        let facade = RecordingSmtpClientFacade::failing("Connection refused");

        let destination = SmtpEmailDestinationBuilder::new()
            .with_smtp_client_str(Arc::new(facade.clone()), "logger@example.com")
            .unwrap()
            .with_recipient_list(["ops@example.com"])
            .unwrap()
            .build()
            .unwrap();

        let err = destination
            .send_async(&[failure("one"), failure("two")])
            .await
            .unwrap_err();

        assert!(matches!(err, EmailDestinationError::Transport(_)));
        assert_eq!(facade.sent_count(), 0);
    }

    #[test]
    fn test_invalid_recipient_from_factory_is_rejected() {
        let (facade, smtp) = recording();

        let destination = SmtpEmailDestinationBuilder::new()
            .with_smtp_client_str(smtp, "logger@example.com")
            .unwrap()
            .with_recipients_fn(|_| Vec::new())
            .unwrap()
            .build()
            .unwrap();

        let err = destination.send(&[failure("Payment declined")]).unwrap_err();

        assert!(matches!(err, EmailDestinationError::InvalidRecipients(_)));
        assert_eq!(facade.sent_count(), 0);
    }
}

mod config_tests {
    use super::*;

    #[tokio::test]
    async fn test_destination_from_json_config() {
        let (facade, smtp) = recording();
        let config = EmailDestinationConfig::from_json_str(
            r#"{
                "smtp": { "host": "localhost", "port": 1025, "tls_mode": "none" },
                "from": "Logger <logger@example.com>",
                "recipients": ["ops@example.com"],
                "subject_template": "$LogType: $Description",
                "json_style": "compact"
            }"#,
        )
        .unwrap();

        let destination = config.build_destination_with(smtp).unwrap();
        destination
            .send_async(&[failure("Payment declined")])
            .await
            .unwrap();

        let sent = facade.sent_emails();
        assert_eq!(
            sent[0].subject.as_deref(),
            Some("Failure: Payment declined")
        );
        assert!(sent[0]
            .body
            .as_deref()
            .unwrap()
            .contains(r#"[{"name":"amount","value":1999}]"#));
    }
}

mod layer_tests {
    use super::*;
    use tracing_subscriber::prelude::*;

    #[test]
    fn test_tracing_error_is_mailed() {
        let (facade, smtp) = recording();
        let destination = SmtpEmailDestinationBuilder::new()
            .with_smtp_client_str(smtp, "logger@example.com")
            .unwrap()
            .with_recipient_list(["ops@example.com"])
            .unwrap()
            .with_subject_template("[$LogType] $Description")
            .unwrap()
            .build()
            .unwrap();

        let subscriber =
            tracing_subscriber::registry().with(EmailLayer::new(Arc::new(destination)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "billing", "Invoice created");
            tracing::error!(target: "billing", invoice = 42, "Payment declined");
        });

        let sent = facade.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject.as_deref(), Some("[Error] Payment declined"));
        assert!(sent[0].body.as_deref().unwrap().contains("invoice"));
    }

    #[tokio::test]
    async fn test_queued_tracing_errors_are_mailed_on_shutdown() {
        let (facade, smtp) = recording();
        let destination = SmtpEmailDestinationBuilder::new()
            .with_smtp_client_str(smtp, "logger@example.com")
            .unwrap()
            .with_recipient_list(["ops@example.com"])
            .unwrap()
            .build()
            .unwrap();

        let (layer, guard) = EmailLayer::new(Arc::new(destination))
            .with_worker(&tokio::runtime::Handle::current(), DEFAULT_QUEUE_CAPACITY);
        let subscriber = tracing_subscriber::registry().with(layer);
        let _default = tracing::subscriber::set_default(subscriber);

        tracing::error!(target: "billing", "Payment declined");
        tracing::error!(target: "billing", "Refund failed");
        guard.shutdown().await;

        assert_eq!(facade.sent_count(), 2);
        assert!(facade.was_sent_to("ops@example.com"));
    }
}
