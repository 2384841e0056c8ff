use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{InboxKey, Notification};

/// Key-value persistence for bounded inboxes. Lists are stored newest first.
pub trait NotificationStore: Send + Sync {
    fn load(&self, key: &InboxKey) -> Result<Vec<Notification>, NotificationError>;
    fn store(&self, key: &InboxKey, inbox: Vec<Notification>) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("notification not found")]
    NotFound,
    #[error("notification store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default, Clone)]
pub struct MemoryNotificationStore {
    inboxes: Arc<Mutex<HashMap<InboxKey, Vec<Notification>>>>,
}

impl NotificationStore for MemoryNotificationStore {
    fn load(&self, key: &InboxKey) -> Result<Vec<Notification>, NotificationError> {
        let guard = self.inboxes.lock().expect("notification mutex poisoned");
        Ok(guard.get(key).cloned().unwrap_or_default())
    }

    fn store(&self, key: &InboxKey, inbox: Vec<Notification>) -> Result<(), NotificationError> {
        let mut guard = self.inboxes.lock().expect("notification mutex poisoned");
        guard.insert(key.clone(), inbox);
        Ok(())
    }
}
