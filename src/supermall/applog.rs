//! Persisted application log.
//!
//! A capped list of [`LogEntry`] values kept under the `appLogs` key of the same backend
//! the records live in, so activity survives between runs and can be inspected or
//! exported later. Once the cap is reached the oldest entries are dropped.
//!
//! Recording is fire-and-forget: [`AppLog::record`] never returns an error. A failed
//! write is reported through `tracing` and otherwise ignored, so logging can never
//! fail the operation being logged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{Result, StoreError};
use crate::model::{iso_millis, now_millis};
use crate::store::StorageBackend;

pub const APP_LOG_KEY: &str = "appLogs";
pub const DEFAULT_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "DEBUG" => Ok(LogLevel::Debug),
            other => Err(StoreError::InvalidPayload(format!(
                "unknown log level '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub context: Value,
}

pub struct AppLog<'a, B: StorageBackend> {
    backend: &'a B,
    capacity: usize,
}

impl<'a, B: StorageBackend> AppLog<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Append an entry, dropping the oldest ones beyond capacity.
    pub fn record(&self, level: LogLevel, message: &str, context: Value) {
        let entry = LogEntry {
            timestamp: now_millis(),
            level,
            message: message.to_string(),
            context,
        };
        if let Err(e) = self.append(entry) {
            warn!(error = %e, "Failed to save application log entry");
        }
    }

    pub fn info(&self, message: &str, context: Value) {
        self.record(LogLevel::Info, message, context);
    }

    pub fn warning(&self, message: &str, context: Value) {
        self.record(LogLevel::Warning, message, context);
    }

    pub fn error(&self, message: &str, context: Value) {
        self.record(LogLevel::Error, message, context);
    }

    fn append(&self, entry: LogEntry) -> Result<()> {
        // A corrupt log is replaced rather than blocking new entries.
        let mut entries = self.entries().unwrap_or_default();
        entries.push(entry);
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }
        let raw = serde_json::to_string(&entries)?;
        self.backend.set_item(APP_LOG_KEY, &raw)
    }

    /// All stored entries, oldest first.
    pub fn entries(&self) -> Result<Vec<LogEntry>> {
        match self.backend.get_item(APP_LOG_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn by_level(&self, level: LogLevel) -> Result<Vec<LogEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.level == level)
            .collect())
    }

    /// Entries with `start <= timestamp <= end`.
    pub fn in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<LogEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .collect())
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.remove_item(APP_LOG_KEY)
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn records_in_order_with_context() {
        let backend = MemBackend::new();
        let log = AppLog::new(&backend);
        log.info("Created new shops item", json!({"id": "shops_1"}));
        log.error("Failed to update offers", json!({"error": "Item not found"}));

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[0].context["id"], "shops_1");
        assert_eq!(entries[1].level, LogLevel::Error);
    }

    #[test]
    fn drops_oldest_beyond_capacity() {
        let backend = MemBackend::new();
        let log = AppLog::new(&backend).with_capacity(3);
        for i in 0..5 {
            log.info(&format!("entry {}", i), Value::Null);
        }
        let messages: Vec<_> = log.entries().unwrap().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn record_swallows_write_failures() {
        let backend = MemBackend::new();
        backend.set_simulate_write_error(true);
        let log = AppLog::new(&backend);
        log.warning("ignored", Value::Null);
        assert!(log.entries().unwrap().is_empty());
    }

    #[test]
    fn corrupt_log_is_replaced_on_next_record() {
        let backend = MemBackend::new();
        backend.insert_raw(APP_LOG_KEY, "garbage");
        let log = AppLog::new(&backend);
        assert!(log.entries().is_err());

        log.info("fresh", Value::Null);
        assert_eq!(log.entries().unwrap().len(), 1);
    }

    #[test]
    fn filters_and_clear() {
        let backend = MemBackend::new();
        let log = AppLog::new(&backend);
        log.info("a", Value::Null);
        log.error("b", Value::Null);

        assert_eq!(log.by_level(LogLevel::Error).unwrap().len(), 1);
        let now = Utc::now();
        assert_eq!(
            log.in_range(now - Duration::minutes(1), now + Duration::minutes(1))
                .unwrap()
                .len(),
            2
        );
        assert!(log
            .in_range(now + Duration::hours(1), now + Duration::hours(2))
            .unwrap()
            .is_empty());

        log.clear().unwrap();
        assert!(log.entries().unwrap().is_empty());
        assert_eq!(log.export_json().unwrap(), "[]");
    }

    #[test]
    fn level_parsing() {
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("Error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
