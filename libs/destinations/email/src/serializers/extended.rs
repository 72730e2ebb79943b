//! Handlebars template serializer

use super::LogSerializer;
use crate::error::EmailResult;
use crate::log_model::{LogItem, LogModel};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

/// Template used for mail bodies when none is configured
pub const DEFAULT_EXTENDED_TEMPLATE: &str = r#"{{log_type}} from {{source}}
Context: {{context}}
Date: {{log_date}}
Log id: {{log_id}}

{{description}}
{{#if log_items}}

Log items:
{{log_items_json}}
{{/if}}"#;

const TEMPLATE_NAME: &str = "log";

/// Layout of the `log_items_json` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonStyle {
    #[default]
    Pretty,
    Compact,
}

/// Values exposed to the template
#[derive(Serialize)]
struct TemplateData<'a> {
    log_id: &'a str,
    context: Option<&'a str>,
    source: Option<&'a str>,
    log_type: &'static str,
    description: &'a str,
    log_date: String,
    log_items: &'a [LogItem],
    log_items_json: String,
}

/// Renders log events with a Handlebars template.
///
/// Available values: `log_id`, `context`, `source`, `log_type`, `description`,
/// `log_date` (RFC 3339), `log_items` (array of `{name, value}`) and
/// `log_items_json` (the items serialized per [`JsonStyle`]).
///
/// HTML escaping is disabled since the output ends up in `text/plain` parts.
pub struct ExtendedTemplateLogSerializer {
    handlebars: Handlebars<'static>,
    template: String,
    json_style: JsonStyle,
}

impl ExtendedTemplateLogSerializer {
    /// Compile `template`; syntax errors are reported here rather than per event
    pub fn new(template: impl Into<String>) -> EmailResult<Self> {
        Self::with_json_style(template, JsonStyle::default())
    }

    pub fn with_json_style(template: impl Into<String>, json_style: JsonStyle) -> EmailResult<Self> {
        let template = template.into();

        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_template_string(TEMPLATE_NAME, &template)?;

        Ok(Self {
            handlebars,
            template,
            json_style,
        })
    }

    /// Serializer using [`DEFAULT_EXTENDED_TEMPLATE`]
    pub fn with_default_template() -> EmailResult<Self> {
        Self::new(DEFAULT_EXTENDED_TEMPLATE)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn json_style(&self) -> JsonStyle {
        self.json_style
    }

    fn items_json(&self, items: &[LogItem]) -> EmailResult<String> {
        let json = match self.json_style {
            JsonStyle::Pretty => serde_json::to_string_pretty(items)?,
            JsonStyle::Compact => serde_json::to_string(items)?,
        };
        Ok(json)
    }
}

impl std::fmt::Debug for ExtendedTemplateLogSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedTemplateLogSerializer")
            .field("template", &self.template)
            .field("json_style", &self.json_style)
            .finish()
    }
}

impl LogSerializer for ExtendedTemplateLogSerializer {
    fn serialize(&self, log: &LogModel) -> EmailResult<String> {
        let data = TemplateData {
            log_id: &log.log_id,
            context: log.context.as_deref(),
            source: log.source.as_deref(),
            log_type: log.log_type.as_str(),
            description: &log.description,
            log_date: log.log_date.to_rfc3339(),
            log_items: &log.log_items,
            log_items_json: self.items_json(&log.log_items)?,
        };

        Ok(self.handlebars.render(TEMPLATE_NAME, &data)?)
    }
}
