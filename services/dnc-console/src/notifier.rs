//! Notifications: transient success/failure messages after an action

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const SUCCESS_DISMISS: Duration = Duration::from_secs(3);
const ERROR_DISMISS: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
}

/// A notification to be shown; never blocks the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub auto_dismiss: Duration,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
            auto_dismiss: SUCCESS_DISMISS,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            auto_dismiss: ERROR_DISMISS,
        }
    }
}

/// Record of a shown notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub entity: String,
    pub operation: String,
    pub message: String,
    pub success: bool,
    pub timestamp_epoch_ms: u64,
}

/// Trait for surfacing notifications to the user
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "log")
    fn type_name(&self) -> &str;

    async fn notify(&self, notification: &Notification) -> crate::Result<()>;
}

/// Writes notifications to the tracing subscriber
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn type_name(&self) -> &str {
        "log"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        match notification.severity {
            Severity::Success => tracing::info!("{}", notification.message),
            Severity::Error => tracing::error!("{}", notification.message),
        }
        Ok(())
    }
}
