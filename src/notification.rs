use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel, duration: Duration) -> Self {
        let now = Instant::now();
        Self {
            message: message.into(),
            level,
            created_at: now,
            expires_at: now + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn time_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

#[derive(Debug)]
struct NotifierInner {
    notifications: Vec<Notification>,
    default_duration: Duration,
}

/// Shared publish surface for transient user-facing messages. Every
/// collaborator gets a clone at construction; the coordinator holds one too,
/// but only to expire entries on tick and to render the single toast sink.
/// It never rewrites or filters what collaborators push.
#[derive(Debug, Clone)]
pub struct Notifier {
    inner: Arc<Mutex<NotifierInner>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_default_duration(Duration::from_secs(5))
    }

    pub fn with_default_duration(default_duration: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NotifierInner {
                notifications: Vec::new(),
                default_duration,
            })),
        }
    }

    pub fn notify(&self, message: impl Into<String>, level: NotificationLevel) {
        let mut inner = self.lock();
        let duration = inner.default_duration;
        let notification = Notification::new(message, level, duration);
        inner.notifications.insert(0, notification);
    }

    pub fn notify_for(
        &self,
        message: impl Into<String>,
        level: NotificationLevel,
        duration: Duration,
    ) {
        let notification = Notification::new(message, level, duration);
        self.lock().notifications.insert(0, notification);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Info);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Warning);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Error);
    }

    /// Remove expired notifications, returns true if any were removed
    pub fn update(&self) -> bool {
        let mut inner = self.lock();
        let initial_len = inner.notifications.len();
        inner.notifications.retain(|n| !n.is_expired());
        inner.notifications.len() != initial_len
    }

    /// Newest notification first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    pub fn current(&self) -> Option<Notification> {
        self.lock().notifications.first().cloned()
    }

    pub fn dismiss_current(&self) -> bool {
        let mut inner = self.lock();
        if inner.notifications.is_empty() {
            false
        } else {
            inner.notifications.remove(0);
            true
        }
    }

    pub fn clear(&self) {
        self.lock().notifications.clear();
    }

    pub fn has_notifications(&self) -> bool {
        !self.lock().notifications.is_empty()
    }

    pub fn count(&self) -> usize {
        self.lock().notifications.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NotifierInner> {
        // Single-threaded event loop: poisoning can only come from a panic
        // that is already unwinding the process.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
