//! Transient notifications.
//!
//! A [`NotificationCenter`] owns the alert container. The container does not
//! exist until the first notification is shown; after that it is reused.
//! Every alert carries a deadline and disappears once [`NotificationCenter::sweep`]
//! runs past it.

use std::time::{Duration, Instant};

/// Alert style, matching the Bootstrap `alert-*` classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationKind {
    #[default]
    Success,
    Info,
    Warning,
    Danger,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct NotificationCenter {
    ttl: Duration,
    container: Option<Vec<Notification>>,
    next_id: u64,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            container: None,
            next_id: 1,
        }
    }

    /// Shows a notification that expires `ttl` from now.
    pub fn show(&mut self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        self.show_at(message, kind, Instant::now())
    }

    /// Shows a notification as if the current time were `now`.
    pub fn show_at(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        now: Instant,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let container = self.container.get_or_insert_with(Vec::new);
        container.push(Notification {
            id,
            message: message.into(),
            kind,
            expires_at: now + self.ttl,
        });
        id
    }

    /// Closes a notification before its deadline.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let Some(container) = self.container.as_mut() else {
            return false;
        };
        let before = container.len();
        container.retain(|n| n.id != id);
        container.len() != before
    }

    /// Drops every notification whose deadline is at or before `now`.
    /// Returns how many were removed. The container itself stays.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let Some(container) = self.container.as_mut() else {
            return 0;
        };
        let before = container.len();
        container.retain(|n| n.expires_at > now);
        before - container.len()
    }

    pub fn has_container(&self) -> bool {
        self.container.is_some()
    }

    pub fn active(&self) -> &[Notification] {
        self.container.as_deref().unwrap_or(&[])
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000))
    }
}
