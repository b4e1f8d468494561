//! User-facing notifications (toasts).
//!
//! The cart store reports every rejected operation through a [`Notifier`].
//! The storefront uses a [`NotificationQueue`]: messages are buffered and the
//! next rendered page drains and shows them.

use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Error,
    Success,
}

/// A message shown to the user once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    /// CSS modifier for the toast.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.level {
            NotificationLevel::Error => "toast--error",
            NotificationLevel::Success => "toast--success",
        }
    }
}

/// Fire-and-forget sink for user-facing messages.
pub trait Notifier: Send + Sync {
    fn notify_error(&self, message: &str);

    fn notify_success(&self, message: &str);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify_error(&self, message: &str) {
        (**self).notify_error(message);
    }

    fn notify_success(&self, message: &str) {
        (**self).notify_success(message);
    }
}

/// Buffers notifications until a page takes them.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: Mutex<Vec<Notification>>,
}

impl NotificationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all pending notifications, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.pending
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default()
    }

    fn push(&self, level: NotificationLevel, message: &str) {
        match self.pending.lock() {
            Ok(mut pending) => pending.push(Notification {
                level,
                message: message.to_string(),
            }),
            Err(_) => tracing::error!(
                notification = message,
                "Notification queue poisoned, dropping message"
            ),
        }
    }
}

impl Notifier for NotificationQueue {
    fn notify_error(&self, message: &str) {
        tracing::warn!(notification = message, "Error notification");
        self.push(NotificationLevel::Error, message);
    }

    fn notify_success(&self, message: &str) {
        tracing::info!(notification = message, "Success notification");
        self.push(NotificationLevel::Success, message);
    }
}
