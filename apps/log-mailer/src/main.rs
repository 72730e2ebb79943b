//! Log Mailer
//!
//! Sends a single log event through the email destination, or checks that the
//! configured SMTP server is reachable. Configuration comes from the
//! environment (see `email_destination::config`) or a JSON file.

use clap::{Parser, Subcommand};
use email_destination::{
    EmailDestinationConfig, FromEnv, LogDestination, LogModel, LogType,
    RecordingSmtpClientFacade, SmtpClientFacade, SmtpConfig, StandardSmtpClientFacade,
};
use eyre::{Result, WrapErr};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

mod telemetry;

use telemetry::{Environment, init_tracing, install_color_eyre};

#[derive(Parser)]
#[command(name = "log-mailer")]
#[command(about = "Send log events by email")]
struct Cli {
    /// JSON configuration file. Defaults to environment variables.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one log event
    Send {
        /// Description of the event
        description: String,

        /// Log type (success, info, event, warning, failure, error, critical)
        #[arg(short = 't', long = "type", default_value = "error")]
        log_type: LogType,

        /// Component that produced the event
        #[arg(short, long)]
        source: Option<String>,

        /// Context the event belongs to
        #[arg(short = 'x', long)]
        context: Option<String>,

        /// Extra data as name=value. Values are parsed as JSON when possible.
        #[arg(short, long = "item", value_parser = parse_item)]
        items: Vec<(String, Value)>,

        /// Render the mail and print it instead of sending
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that the SMTP server accepts connections
    Check,
}

fn parse_item(raw: &str) -> std::result::Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing item name in '{}'", raw));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

fn load_config(path: Option<&Path>) -> Result<EmailDestinationConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            Ok(EmailDestinationConfig::from_json_str(&raw)?)
        }
        None => Ok(EmailDestinationConfig::from_env()?),
    }
}

fn load_smtp_config(path: Option<&Path>) -> Result<SmtpConfig> {
    match path {
        Some(_) => Ok(load_config(path)?.smtp),
        None => Ok(SmtpConfig::from_env()?),
    }
}

fn build_log(
    description: String,
    log_type: LogType,
    source: Option<String>,
    context: Option<String>,
    items: Vec<(String, Value)>,
) -> LogModel {
    let mut log = LogModel::new(log_type, description);
    if let Some(source) = source {
        log = log.with_source(source);
    }
    if let Some(context) = context {
        log = log.with_context(context);
    }
    for (name, value) in items {
        log = log.with_item(name, value);
    }
    log
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            description,
            log_type,
            source,
            context,
            items,
            dry_run,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let log = build_log(description, log_type, source, context, items);

            if dry_run {
                let recorder = RecordingSmtpClientFacade::new();
                let destination = config.build_destination_with(Arc::new(recorder.clone()))?;
                destination.send_async(std::slice::from_ref(&log)).await?;

                for mail in recorder.sent_emails() {
                    println!("From: {}", mail.from);
                    println!("To: {}", mail.recipients.join(", "));
                    println!("Subject: {}", mail.subject.unwrap_or_default());
                    println!();
                    println!("{}", mail.body.unwrap_or_default());
                    if let Some(attachment) = mail.attachment {
                        println!();
                        println!("--- {} ---", email_destination::ATTACHMENT_FILE_NAME);
                        println!("{}", attachment);
                    }
                }
                return Ok(());
            }

            let destination = config.build_destination()?;
            info!(log_id = %log.log_id, log_type = %log.log_type, "Sending log event");
            destination
                .send_async(std::slice::from_ref(&log))
                .await
                .wrap_err("Failed to send log event")?;
            info!(log_id = %log.log_id, "Log event sent");
        }

        Commands::Check => {
            let smtp_config = load_smtp_config(cli.config.as_deref())?;
            info!(host = %smtp_config.host, port = smtp_config.port, "Checking SMTP server");

            let facade = StandardSmtpClientFacade::new(smtp_config)?;
            facade
                .health_check()
                .await
                .wrap_err("SMTP health check failed")?;
            println!("SMTP server is reachable");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_json_value() {
        let (name, value) = parse_item("attempts=3").unwrap();
        assert_eq!(name, "attempts");
        assert_eq!(value, Value::from(3));
    }

    #[test]
    fn test_parse_item_plain_string() {
        let (_, value) = parse_item("host=db-01").unwrap();
        assert_eq!(value, Value::String("db-01".to_string()));
    }

    #[test]
    fn test_parse_item_rejects_missing_separator() {
        assert!(parse_item("attempts").is_err());
        assert!(parse_item("=3").is_err());
    }

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::try_parse_from([
            "log-mailer",
            "send",
            "Payment declined",
            "--type",
            "failure",
            "--source",
            "billing",
            "-i",
            "amount=1999",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Send {
                description,
                log_type,
                source,
                items,
                dry_run,
                ..
            } => {
                assert_eq!(description, "Payment declined");
                assert_eq!(log_type, LogType::Failure);
                assert_eq!(source.as_deref(), Some("billing"));
                assert_eq!(items.len(), 1);
                assert!(dry_run);
            }
            Commands::Check => panic!("Expected send command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_log_type() {
        assert!(Cli::try_parse_from(["log-mailer", "send", "x", "--type", "loud"]).is_err());
    }

    #[test]
    fn test_build_log_collects_items() {
        let log = build_log(
            "Disk full".to_string(),
            LogType::Warning,
            Some("storage".to_string()),
            None,
            vec![("free_mb".to_string(), Value::from(12))],
        );

        assert_eq!(log.source.as_deref(), Some("storage"));
        assert!(log.context.is_none());
        assert_eq!(log.log_items[0].name, "free_mb");
    }

    #[test]
    fn test_load_config_missing_env_reports_variable() {
        temp_env::with_var_unset("SMTP_HOST", || {
            let err = load_config(None).unwrap_err();
            assert!(err.to_string().contains("SMTP_HOST"));
        });
    }
}
