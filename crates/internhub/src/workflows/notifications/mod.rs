//! Best-effort notification fan-out between students and companies.

pub mod center;
pub mod domain;
pub mod router;
pub mod store;
pub mod templates;

pub use center::NotificationCenter;
pub use domain::{
    ApplicationSummary, Audience, InboxKey, Notification, NotificationId, NotificationKind,
};
pub use router::notification_router;
pub use store::{MemoryNotificationStore, NotificationError, NotificationStore};
