use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;
use taskboard_core::AppConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

/// Where the engine reports outcomes.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink {
    fn notify(&self, notification: Notification);
}

struct QueueState {
    current: watch::Sender<Option<Notification>>,
    shown_at: Cell<Option<Instant>>,
    timer: RefCell<Option<JoinHandle<()>>>,
    generation: Cell<u64>,
}

impl QueueState {
    fn clear(&self) {
        self.shown_at.set(None);
        self.current.send_replace(None);
    }
}

/// Holds at most one visible notification.
///
/// A new notification replaces the current one and restarts the
/// auto-dismiss timer. The timer runs on the current `LocalSet`.
pub struct NotificationQueue {
    state: Rc<QueueState>,
    ttl: Duration,
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            state: Rc::new(QueueState {
                current,
                shown_at: Cell::new(None),
                timer: RefCell::new(None),
                generation: Cell::new(0),
            }),
            ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.notification_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn show(&self, notification: Notification) {
        tracing::debug!("Showing {:?} notification: {}", notification.kind, notification.message);
        self.cancel_timer();
        let generation = self.state.generation.get() + 1;
        self.state.generation.set(generation);
        self.state.shown_at.set(Some(Instant::now()));
        self.state.current.send_replace(Some(notification));

        let state: Weak<QueueState> = Rc::downgrade(&self.state);
        let ttl = self.ttl;
        let timer = tokio::task::spawn_local(async move {
            tokio::time::sleep(ttl).await;
            if let Some(state) = state.upgrade() {
                if state.generation.get() == generation {
                    state.clear();
                }
            }
        });
        *self.state.timer.borrow_mut() = Some(timer);
    }

    pub fn dismiss(&self) {
        self.cancel_timer();
        self.state.generation.set(self.state.generation.get() + 1);
        self.state.clear();
    }

    /// The visible notification, if any and not yet expired.
    pub fn current(&self) -> Option<Notification> {
        let shown_at = self.state.shown_at.get()?;
        if shown_at.elapsed() >= self.ttl {
            return None;
        }
        self.state.current.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_none()
    }

    /// Follow changes, including auto-dismissal.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.state.current.subscribe()
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self.state.timer.borrow_mut().take() {
            timer.abort();
        }
    }
}

impl NotificationSink for NotificationQueue {
    fn notify(&self, notification: Notification) {
        self.show(notification);
    }
}

impl Drop for NotificationQueue {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
