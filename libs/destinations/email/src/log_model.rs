//! Log event model handed to destinations by the logging pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity/category of a log event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum LogType {
    Success,
    #[default]
    Info,
    Event,
    Warning,
    Failure,
    Error,
    Critical,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Info => "Info",
            Self::Event => "Event",
            Self::Warning => "Warning",
            Self::Failure => "Failure",
            Self::Error => "Error",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "info" => Ok(Self::Info),
            "event" => Ok(Self::Event),
            "warning" | "warn" => Ok(Self::Warning),
            "failure" => Ok(Self::Failure),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown log type: {}", other)),
        }
    }
}

impl From<tracing::Level> for LogType {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::INFO => Self::Info,
            _ => Self::Event,
        }
    }
}

/// Named piece of structured data attached to a log event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogItem {
    pub name: String,
    pub value: serde_json::Value,
}

impl LogItem {
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single log event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogModel {
    /// Unique identifier of the event
    pub log_id: String,
    /// Logical context (request, job, ...) the event belongs to
    pub context: Option<String>,
    /// Component that produced the event
    pub source: Option<String>,
    pub log_type: LogType,
    pub description: String,
    #[serde(default)]
    pub log_items: Vec<LogItem>,
    pub log_date: DateTime<Utc>,
}

impl LogModel {
    /// Create a new event stamped with the current time
    pub fn new(log_type: LogType, description: impl Into<String>) -> Self {
        Self {
            log_id: uuid::Uuid::new_v4().to_string(),
            context: None,
            source: None,
            log_type,
            description: description.into(),
            log_items: Vec::new(),
            log_date: Utc::now(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_item(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.log_items.push(LogItem::new(name, value));
        self
    }

    pub fn with_date(mut self, log_date: DateTime<Utc>) -> Self {
        self.log_date = log_date;
        self
    }

    /// Check whether the event's type is one of `types`
    pub fn log_type_is_in(&self, types: &[LogType]) -> bool {
        types.contains(&self.log_type)
    }
}
