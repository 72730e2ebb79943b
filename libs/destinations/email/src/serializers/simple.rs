//! `$Placeholder` template serializer

use super::LogSerializer;
use crate::error::{EmailDestinationError, EmailResult};
use crate::log_model::LogModel;
use std::fmt::Write;

/// Template used for mail subjects when none is configured
pub const DEFAULT_SIMPLE_TEMPLATE: &str = "[$LogType] $Source: $Description";

const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

const PLACEHOLDERS: [&str; 6] = [
    "LogId",
    "LogType",
    "LogDate",
    "Source",
    "Context",
    "Description",
];

/// Renders log events by substituting `$Placeholder` tokens.
///
/// Supported placeholders: `$LogId`, `$LogType`, `$Source`, `$Context`,
/// `$Description`, `$LogDate` and `$LogDate(<strftime format>)`. Anything else
/// following a `$` is copied as-is.
#[derive(Debug, Clone)]
pub struct SimpleTemplateLogSerializer {
    template: String,
}

impl SimpleTemplateLogSerializer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn render(&self, log: &LogModel) -> EmailResult<String> {
        let mut out = String::with_capacity(self.template.len() + log.description.len());
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos + 1..];

            let Some(name) = PLACEHOLDERS.iter().find(|p| tail.starts_with(*p)) else {
                out.push('$');
                rest = tail;
                continue;
            };
            let after = &tail[name.len()..];

            match *name {
                "LogDate" => {
                    let (format, remaining) = match parse_format_argument(after) {
                        Some((format, remaining)) => (format, remaining),
                        None => (DEFAULT_DATE_FORMAT, after),
                    };
                    write!(out, "{}", log.log_date.format(format)).map_err(|_| {
                        EmailDestinationError::Template(format!(
                            "Invalid date format '{}'",
                            format
                        ))
                    })?;
                    rest = remaining;
                }
                "LogId" => {
                    out.push_str(&log.log_id);
                    rest = after;
                }
                "LogType" => {
                    out.push_str(log.log_type.as_str());
                    rest = after;
                }
                "Source" => {
                    out.push_str(log.source.as_deref().unwrap_or_default());
                    rest = after;
                }
                "Context" => {
                    out.push_str(log.context.as_deref().unwrap_or_default());
                    rest = after;
                }
                _ => {
                    out.push_str(&log.description);
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        Ok(out)
    }
}

impl Default for SimpleTemplateLogSerializer {
    fn default() -> Self {
        Self::new(DEFAULT_SIMPLE_TEMPLATE)
    }
}

impl LogSerializer for SimpleTemplateLogSerializer {
    fn serialize(&self, log: &LogModel) -> EmailResult<String> {
        self.render(log)
    }
}

/// Split `(fmt)rest` into `fmt` and `rest`
fn parse_format_argument(input: &str) -> Option<(&str, &str)> {
    let inner = input.strip_prefix('(')?;
    let end = inner.find(')')?;
    Some((&inner[..end], &inner[end + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_model::LogType;
    use chrono::{TimeZone, Utc};

    fn sample_log() -> LogModel {
        LogModel::new(LogType::Error, "Connection refused")
            .with_source("payments")
            .with_context("checkout")
            .with_date(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap())
    }

    #[test]
    fn test_default_template() {
        let serializer = SimpleTemplateLogSerializer::default();
        assert_eq!(
            serializer.serialize(&sample_log()).unwrap(),
            "[Error] payments: Connection refused"
        );
    }

    #[test]
    fn test_all_placeholders() {
        let log = sample_log();
        let serializer =
            SimpleTemplateLogSerializer::new("$LogId|$LogType|$Source|$Context|$Description");

        let expected = format!("{}|Error|payments|checkout|Connection refused", log.log_id);
        assert_eq!(serializer.serialize(&log).unwrap(), expected);
    }

    #[test]
    fn test_log_date_default_and_custom_format() {
        let serializer = SimpleTemplateLogSerializer::new("$LogDate / $LogDate(%Y-%m-%d)!");
        assert_eq!(
            serializer.serialize(&sample_log()).unwrap(),
            "09.03.2024 14:05:07 / 2024-03-09!"
        );
    }

    #[test]
    fn test_missing_optional_values_render_empty() {
        let log = LogModel::new(LogType::Info, "Started");
        let serializer = SimpleTemplateLogSerializer::new("<$Source><$Context>");
        assert_eq!(serializer.serialize(&log).unwrap(), "<><>");
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let serializer = SimpleTemplateLogSerializer::new("Cost: $5 $Unknown $Description");
        assert_eq!(
            serializer.serialize(&sample_log()).unwrap(),
            "Cost: $5 $Unknown Connection refused"
        );
    }

    #[test]
    fn test_unterminated_date_format_falls_back_to_default() {
        let serializer = SimpleTemplateLogSerializer::new("$LogDate(%Y");
        assert_eq!(
            serializer.serialize(&sample_log()).unwrap(),
            "09.03.2024 14:05:07(%Y"
        );
    }

    #[test]
    fn test_invalid_date_format_is_an_error() {
        let serializer = SimpleTemplateLogSerializer::new("$LogDate(%Q)");
        let err = serializer.serialize(&sample_log()).unwrap_err();
        assert!(matches!(err, EmailDestinationError::Template(_)));
    }
}
