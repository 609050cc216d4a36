//! User-facing notifications (toasts).

use crate::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationAction {
    /// Open a finished export.
    Download { label: String, url: String },
    Retry,
    Dismiss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub action: Option<NotificationAction>,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            action: None,
            created_at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.action = Some(action);
        self
    }

    /// URL of a download action, if this notification carries one.
    pub fn download_url(&self) -> Option<&str> {
        match &self.action {
            Some(NotificationAction::Download { url, .. }) => Some(url),
            _ => None,
        }
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that logs every notification and keeps a bounded history.
#[derive(Debug)]
pub struct NotificationCenter {
    history: Mutex<Vec<Notification>>,
    capacity: usize,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` notifications; the oldest are dropped first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn history(&self) -> Vec<Notification> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|n| n.level == level)
            .count()
    }

    pub fn len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take all notifications, leaving the history empty.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.history.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => {
                tracing::warn!(text = %notification.message, "notification")
            }
            level => tracing::info!(?level, text = %notification.message, "notification"),
        }
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.len() == self.capacity {
            history.remove(0);
        }
        history.push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_counts_by_level() {
        let center = NotificationCenter::new();
        center.notify(Notification::success("Candidate moved successfully!"));
        center.notify(Notification::error("Failed to move candidate"));
        center.notify(Notification::info("Job posting archived"));

        assert_eq!(center.len(), 3);
        assert_eq!(center.count(NotificationLevel::Success), 1);
        assert_eq!(center.count(NotificationLevel::Error), 1);
        assert_eq!(center.count(NotificationLevel::Warning), 0);
    }

    #[test]
    fn test_center_is_bounded() {
        let center = NotificationCenter::with_capacity(2);
        for i in 0..5 {
            center.notify(Notification::info(format!("n{i}")));
        }
        let history = center.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, "n3");
        assert_eq!(history[1].message, "n4");
    }

    #[test]
    fn test_download_action() {
        let n = Notification::success("CSV export ready for download!").with_action(
            NotificationAction::Download {
                label: "Download".to_string(),
                url: "https://x".to_string(),
            },
        );
        assert_eq!(n.download_url(), Some("https://x"));
        assert_eq!(Notification::info("x").download_url(), None);
    }

    #[test]
    fn test_drain_empties_history() {
        let center = NotificationCenter::new();
        center.notify(Notification::info("a"));
        assert_eq!(center.drain().len(), 1);
        assert!(center.is_empty());
    }
}
