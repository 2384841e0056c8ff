use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::debug;

use super::domain::{
    ApplicationSummary, Audience, InboxKey, Notification, NotificationId, NotificationKind,
};
use super::store::{NotificationError, NotificationStore};
use super::templates::{self, Rendered};
use crate::workflows::internships::domain::{InternshipSummary, UserId};
use crate::workflows::internships::status::ApplicationStatus;

const TOPIC_CAPACITY: usize = 64;

static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notification_id() -> NotificationId {
    let id = NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NotificationId(format!("ntf-{id:06}"))
}

/// One broadcast topic per audience.
struct NotificationHub {
    student: broadcast::Sender<Notification>,
    company: broadcast::Sender<Notification>,
}

impl NotificationHub {
    fn new() -> Self {
        let (student, _) = broadcast::channel(TOPIC_CAPACITY);
        let (company, _) = broadcast::channel(TOPIC_CAPACITY);
        Self { student, company }
    }

    fn topic(&self, audience: Audience) -> &broadcast::Sender<Notification> {
        match audience {
            Audience::Student => &self.student,
            Audience::Company => &self.company,
        }
    }
}

/// Persists notifications into bounded per-recipient inboxes and publishes them per audience.
///
/// Delivery is fire-and-forget: nobody acknowledges a publish and nothing is retried.
pub struct NotificationCenter {
    store: Arc<dyn NotificationStore>,
    retention: usize,
    hub: NotificationHub,
    // serializes load-modify-store cycles against the key-value store
    write_lock: Mutex<()>,
}

impl NotificationCenter {
    pub fn new(store: Arc<dyn NotificationStore>, retention: usize) -> Self {
        Self {
            store,
            retention: retention.max(1),
            hub: NotificationHub::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn notify_application_submitted(
        &self,
        student: &UserId,
        internship: &InternshipSummary,
    ) -> Result<Notification, NotificationError> {
        let mut metadata = BTreeMap::new();
        metadata.insert("internshipId".to_string(), internship.id.0.clone());
        self.push(
            InboxKey::student(student),
            NotificationKind::ApplicationSubmitted,
            templates::application_submitted(internship),
            metadata,
        )
    }

    pub fn notify_new_application(
        &self,
        summary: &ApplicationSummary,
    ) -> Result<Notification, NotificationError> {
        let mut metadata = BTreeMap::new();
        metadata.insert("internshipId".to_string(), summary.internship.id.0.clone());
        metadata.insert("applicationId".to_string(), summary.application_id.0.clone());
        metadata.insert("studentId".to_string(), summary.student.0.clone());
        self.push(
            InboxKey::company(&summary.internship.posted_by),
            NotificationKind::NewApplication,
            templates::new_application(summary),
            metadata,
        )
    }

    pub fn notify_status_change(
        &self,
        student: &UserId,
        internship: &InternshipSummary,
        old_status: ApplicationStatus,
        new_status: ApplicationStatus,
    ) -> Result<Notification, NotificationError> {
        let mut metadata = BTreeMap::new();
        metadata.insert("internshipId".to_string(), internship.id.0.clone());
        metadata.insert("oldStatus".to_string(), old_status.label().to_string());
        metadata.insert("newStatus".to_string(), new_status.label().to_string());
        self.push(
            InboxKey::student(student),
            NotificationKind::StatusChange,
            templates::status_change(internship, new_status),
            metadata,
        )
    }

    pub fn notify_milestone(
        &self,
        internship: &InternshipSummary,
        applicants: u32,
    ) -> Result<Notification, NotificationError> {
        let mut metadata = BTreeMap::new();
        metadata.insert("internshipId".to_string(), internship.id.0.clone());
        metadata.insert("applicants".to_string(), applicants.to_string());
        self.push(
            InboxKey::company(&internship.posted_by),
            NotificationKind::Milestone,
            templates::applicant_milestone(internship, applicants),
            metadata,
        )
    }

    /// Newest first.
    pub fn list(&self, key: &InboxKey) -> Result<Vec<Notification>, NotificationError> {
        self.store.load(key)
    }

    pub fn unread_count(&self, key: &InboxKey) -> Result<usize, NotificationError> {
        Ok(self
            .store
            .load(key)?
            .iter()
            .filter(|notification| !notification.read)
            .count())
    }

    /// Flip one entry to read. Already-read entries are returned unchanged.
    pub fn mark_read(
        &self,
        key: &InboxKey,
        id: &NotificationId,
    ) -> Result<Notification, NotificationError> {
        let _guard = self.write_lock.lock().expect("notification write lock poisoned");
        let mut inbox = self.store.load(key)?;
        let entry = inbox
            .iter_mut()
            .find(|notification| &notification.id == id)
            .ok_or(NotificationError::NotFound)?;

        if entry.read {
            return Ok(entry.clone());
        }

        entry.read = true;
        let updated = entry.clone();
        self.store.store(key, inbox)?;
        Ok(updated)
    }

    /// Returns how many entries changed.
    pub fn mark_all_read(&self, key: &InboxKey) -> Result<usize, NotificationError> {
        let _guard = self.write_lock.lock().expect("notification write lock poisoned");
        let mut inbox = self.store.load(key)?;
        let mut changed = 0;
        for notification in inbox.iter_mut().filter(|notification| !notification.read) {
            notification.read = true;
            changed += 1;
        }
        if changed > 0 {
            self.store.store(key, inbox)?;
        }
        Ok(changed)
    }

    pub fn subscribe(&self, audience: Audience) -> broadcast::Receiver<Notification> {
        self.hub.topic(audience).subscribe()
    }

    fn push(
        &self,
        key: InboxKey,
        kind: NotificationKind,
        rendered: Rendered,
        metadata: BTreeMap<String, String>,
    ) -> Result<Notification, NotificationError> {
        let notification = Notification {
            id: next_notification_id(),
            audience: key.audience,
            recipient: key.recipient.clone(),
            kind,
            title: rendered.title,
            message: rendered.message,
            read: false,
            created_at: Utc::now(),
            metadata,
        };

        {
            let _guard = self.write_lock.lock().expect("notification write lock poisoned");
            let mut inbox = self.store.load(&key)?;
            inbox.insert(0, notification.clone());
            inbox.truncate(self.retention);
            self.store.store(&key, inbox)?;
        }

        // no subscribers is not an error
        let receivers = self
            .hub
            .topic(key.audience)
            .send(notification.clone())
            .unwrap_or(0);
        debug!(
            notification = %notification.id.0,
            kind = notification.kind.label(),
            recipient = %notification.recipient.0,
            receivers,
            "notification published"
        );

        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::internships::domain::{ApplicationId, InternshipId};
    use crate::workflows::notifications::store::MemoryNotificationStore;

    fn center(retention: usize) -> NotificationCenter {
        NotificationCenter::new(Arc::new(MemoryNotificationStore::default()), retention)
    }

    fn internship() -> InternshipSummary {
        InternshipSummary {
            id: InternshipId("int-1".to_string()),
            title: "Backend Intern".to_string(),
            company: "Acme".to_string(),
            posted_by: UserId("acme".to_string()),
        }
    }

    #[test]
    fn status_change_lands_unread_in_student_inbox() {
        let center = center(50);
        let student = UserId("stu-1".to_string());
        let key = InboxKey::student(&student);

        let notification = center
            .notify_status_change(
                &student,
                &internship(),
                ApplicationStatus::Pending,
                ApplicationStatus::Interview,
            )
            .expect("notification stored");

        let inbox = center.list(&key).expect("inbox loads");
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::StatusChange);
        assert!(inbox[0].title.contains("Interview"));
        assert_eq!(
            inbox[0].metadata.get("oldStatus").map(String::as_str),
            Some("pending")
        );
        assert_eq!(
            inbox[0].metadata.get("newStatus").map(String::as_str),
            Some("interview")
        );
        assert_eq!(center.unread_count(&key).expect("count"), 1);

        let read = center
            .mark_read(&key, &notification.id)
            .expect("mark read");
        assert!(read.read);
        assert_eq!(center.unread_count(&key).expect("count"), 0);
        assert!(center
            .list(&InboxKey::company(&student))
            .expect("other audience loads")
            .is_empty());
    }

    #[test]
    fn mark_read_touches_only_the_target() {
        let center = center(50);
        let student = UserId("stu-2".to_string());
        let key = InboxKey::student(&student);
        let first = center
            .notify_application_submitted(&student, &internship())
            .expect("stored");
        center
            .notify_status_change(
                &student,
                &internship(),
                ApplicationStatus::Pending,
                ApplicationStatus::Reviewing,
            )
            .expect("stored");

        center.mark_read(&key, &first.id).expect("mark read");
        center.mark_read(&key, &first.id).expect("idempotent");

        let inbox = center.list(&key).expect("inbox loads");
        let unread: Vec<_> = inbox.iter().filter(|n| !n.read).collect();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::StatusChange);
    }

    #[test]
    fn inbox_is_bounded_and_newest_first() {
        let center = center(3);
        let student = UserId("stu-3".to_string());
        let key = InboxKey::student(&student);

        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(
                center
                    .notify_application_submitted(&student, &internship())
                    .expect("stored")
                    .id,
            );
        }

        let inbox = center.list(&key).expect("inbox loads");
        let stored: Vec<_> = inbox.iter().map(|n| n.id.clone()).collect();
        assert_eq!(stored, vec![ids[4].clone(), ids[3].clone(), ids[2].clone()]);
    }

    #[test]
    fn unknown_notification_is_not_found() {
        let center = center(50);
        let key = InboxKey::student(&UserId("stu-4".to_string()));
        assert_eq!(
            center.mark_read(&key, &NotificationId("ntf-missing".to_string())),
            Err(NotificationError::NotFound)
        );
    }

    #[test]
    fn mark_all_read_reports_changes() {
        let center = center(50);
        let company = UserId("acme".to_string());
        let summary = ApplicationSummary {
            internship: internship(),
            application_id: ApplicationId("app-1".to_string()),
            student: UserId("stu-5".to_string()),
            student_name: "Sam".to_string(),
        };
        center.notify_new_application(&summary).expect("stored");
        center.notify_milestone(&internship(), 5).expect("stored");

        let key = InboxKey::company(&company);
        assert_eq!(center.mark_all_read(&key).expect("marked"), 2);
        assert_eq!(center.mark_all_read(&key).expect("marked"), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_their_audience_only() {
        let center = center(50);
        let mut students = center.subscribe(Audience::Student);
        let mut companies = center.subscribe(Audience::Company);
        let student = UserId("stu-6".to_string());

        center
            .notify_application_submitted(&student, &internship())
            .expect("stored");

        let received = students.recv().await.expect("student topic delivers");
        assert_eq!(received.recipient, student);
        assert!(matches!(
            companies.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
